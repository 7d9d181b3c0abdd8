//! Alibaba Cloud machine translation, `Translate` action with the `title` scene.
//!
//! `appId` is the AccessKeyId and `appKey` the AccessKeySecret. Requests are
//! signed with ACS3-HMAC-SHA256 and carry their parameters in the query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::errors::{Result, SlugError};
use crate::core::models::{ProviderCredential, ProviderKind};
use crate::core::validator;
use crate::providers::signing::{canonical_query, hmac_sha256_hex, sha256_hex};
use crate::providers::{read_json, transport_error, Translator};

const HOST: &str = "mt.cn-hangzhou.aliyuncs.com";
const ACTION: &str = "Translate";
const VERSION: &str = "2018-10-12";
const ALGORITHM: &str = "ACS3-HMAC-SHA256";
const SIGNED_HEADERS: &str =
    "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";

/// Alibaba Cloud machine translation client
#[derive(Debug, Clone)]
pub struct AlibabaTranslator {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: String,
}

/// Headers that take part in the signature, in canonical order
struct SignedRequest {
    date: String,
    nonce: String,
    content_sha256: String,
    authorization: String,
}

fn sign(
    access_key_id: &str,
    access_key_secret: &str,
    query: &str,
    now: DateTime<Utc>,
    nonce: String,
) -> SignedRequest {
    let date = now.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let content_sha256 = sha256_hex("");

    let canonical_headers = format!(
        "host:{}\nx-acs-action:{}\nx-acs-content-sha256:{}\nx-acs-date:{}\nx-acs-signature-nonce:{}\nx-acs-version:{}\n",
        HOST, ACTION, content_sha256, date, nonce, VERSION
    );
    let canonical_request = format!(
        "POST\n/\n{}\n{}\n{}\n{}",
        query, canonical_headers, SIGNED_HEADERS, content_sha256
    );
    let string_to_sign = format!("{}\n{}", ALGORITHM, sha256_hex(&canonical_request));
    let signature = hmac_sha256_hex(access_key_secret.as_bytes(), &string_to_sign);

    SignedRequest {
        authorization: format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            ALGORITHM, access_key_id, SIGNED_HEADERS, signature
        ),
        date,
        nonce,
        content_sha256,
    }
}

impl AlibabaTranslator {
    /// Client for `credential`, sharing `client`
    pub fn new(client: reqwest::Client, credential: ProviderCredential) -> Self {
        Self {
            client,
            credential,
            endpoint: format!("https://{}/", HOST),
        }
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for AlibabaTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Alibaba
    }

    fn validate_config(&self) -> bool {
        validator::has_required_fields(ProviderKind::Alibaba, &self.credential)
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let (key_id, key_secret) = match (&self.credential.app_id, &self.credential.app_key) {
            (Some(id), Some(secret)) if self.validate_config() => (id, secret),
            _ => return Err(SlugError::ProviderConfigError { provider: self.kind() }),
        };

        let query = canonical_query(&[
            ("FormatType", "text"),
            ("Scene", "title"),
            ("SourceLanguage", from),
            ("SourceText", text),
            ("TargetLanguage", to),
        ]);
        let nonce = format!("{:032x}", rand::random::<u128>());
        let signed = sign(key_id, key_secret, &query, Utc::now(), nonce);

        let response = self
            .client
            .post(format!("{}?{}", self.endpoint, query))
            .header("Authorization", signed.authorization)
            .header("x-acs-action", ACTION)
            .header("x-acs-version", VERSION)
            .header("x-acs-date", signed.date)
            .header("x-acs-signature-nonce", signed.nonce)
            .header("x-acs-content-sha256", signed.content_sha256)
            .send()
            .await
            .map_err(|e| transport_error(self.kind(), e))?;

        let json = read_json(self.kind(), response).await?;

        match json["Code"].as_str() {
            Some("200") | None => {}
            Some(code) => {
                let message = json["Message"].as_str().unwrap_or("unknown error");
                return Err(SlugError::api(self.kind(), format!("{} ({})", message, code)));
            }
        }

        json["Data"]["Translated"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlugError::invalid_response(self.kind(), "no translation result returned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_signature_is_stable_per_nonce() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let a = sign("LTAI", "secret", "A=1", now, "n1".to_string());
        let b = sign("LTAI", "secret", "A=1", now, "n1".to_string());
        let c = sign("LTAI", "secret", "A=1", now, "n2".to_string());

        assert_eq!(a.authorization, b.authorization);
        assert_ne!(a.authorization, c.authorization);
        assert_eq!(a.date, "2024-05-01T08:00:00Z");
        assert!(a.authorization.starts_with("ACS3-HMAC-SHA256 Credential=LTAI,SignedHeaders=host;"));
    }

    #[tokio::test]
    async fn test_translate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-acs-action", "Translate"))
            .and(query_param("Scene", "title"))
            .and(query_param("SourceText", "新年快乐"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Code": "200",
                "Data": {"Translated": "Happy New Year", "WordCount": "4"},
                "RequestId": "r"
            })))
            .mount(&server)
            .await;

        let translator = AlibabaTranslator::new(
            reqwest::Client::new(),
            ProviderCredential::enabled().with_app("LTAI", "secret"),
        )
        .with_endpoint(format!("{}/", server.uri()));

        assert_eq!(
            translator.translate("新年快乐", "auto", "en").await.unwrap(),
            "Happy New Year"
        );
    }

    #[tokio::test]
    async fn test_http_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("{\"Code\":\"Forbidden\"}"))
            .mount(&server)
            .await;

        let translator = AlibabaTranslator::new(
            reqwest::Client::new(),
            ProviderCredential::enabled().with_app("LTAI", "secret"),
        )
        .with_endpoint(format!("{}/", server.uri()));

        assert!(matches!(
            translator.translate("新年", "auto", "en").await,
            Err(SlugError::ApiError { .. })
        ));
    }
}
