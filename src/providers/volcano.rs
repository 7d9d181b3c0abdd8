//! Volcano Engine `TranslateText` (volcengine V4 HMAC-SHA256 signing)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::core::errors::{Result, SlugError};
use crate::core::models::{ProviderCredential, ProviderKind};
use crate::core::validator;
use crate::providers::signing::{hmac_sha256, hmac_sha256_hex, sha256_hex};
use crate::providers::{read_json, transport_error, Translator};

const HOST: &str = "translate.volcengineapi.com";
const SERVICE: &str = "translate";
const QUERY: &str = "Action=TranslateText&Version=2020-06-01";
const DEFAULT_REGION: &str = "cn-north-1";
const SIGNED_HEADERS: &str = "content-type;host;x-content-sha256;x-date";

/// Volcano Engine translate client
#[derive(Debug, Clone)]
pub struct VolcanoTranslator {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: String,
}

/// Returns `(x-date, x-content-sha256, authorization)`
pub(crate) fn sign(
    access_key: &str,
    secret_key: &str,
    region: &str,
    payload: &str,
    now: DateTime<Utc>,
) -> (String, String, String) {
    let x_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let short_date = now.format("%Y%m%d").to_string();
    let payload_hash = sha256_hex(payload);

    let canonical_request = format!(
        "POST\n/\n{}\ncontent-type:application/json\nhost:{}\nx-content-sha256:{}\nx-date:{}\n\n{}\n{}",
        QUERY, HOST, payload_hash, x_date, SIGNED_HEADERS, payload_hash
    );
    let scope = format!("{}/{}/{}/request", short_date, region, SERVICE);
    let string_to_sign = format!(
        "HMAC-SHA256\n{}\n{}\n{}",
        x_date,
        scope,
        sha256_hex(&canonical_request)
    );

    let k_date = hmac_sha256(secret_key.as_bytes(), &short_date);
    let k_region = hmac_sha256(&k_date, region);
    let k_service = hmac_sha256(&k_region, SERVICE);
    let k_signing = hmac_sha256(&k_service, "request");
    let signature = hmac_sha256_hex(&k_signing, &string_to_sign);

    let authorization = format!(
        "HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        access_key, scope, SIGNED_HEADERS, signature
    );

    (x_date, payload_hash, authorization)
}

impl VolcanoTranslator {
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
impl Translator for VolcanoTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Volcano
    }

    fn validate_config(&self) -> bool {
        validator::has_required_fields(ProviderKind::Volcano, &self.credential)
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let (access_key, secret_key) = match (&self.credential.app_id, &self.credential.app_key) {
            (Some(id), Some(key)) if self.validate_config() => (id, key),
            _ => return Err(SlugError::ProviderConfigError { provider: self.kind() }),
        };
        let region = self.credential.region.as_deref().unwrap_or(DEFAULT_REGION);

        // omitted source language means auto-detect
        let mut body = json!({ "TargetLanguage": to, "TextList": [text] });
        if from != "auto" {
            body["SourceLanguage"] = json!(from);
        }
        let payload = body.to_string();

        let (x_date, payload_hash, authorization) =
            sign(access_key, secret_key, region, &payload, Utc::now());

        let response = self
            .client
            .post(format!("{}?{}", self.endpoint, QUERY))
            .header("Content-Type", "application/json")
            .header("X-Date", x_date)
            .header("X-Content-Sha256", payload_hash)
            .header("Authorization", authorization)
            .body(payload)
            .send()
            .await
            .map_err(|e| transport_error(self.kind(), e))?;

        let json = read_json(self.kind(), response).await?;

        if let Some(error) = json["ResponseMetadata"].get("Error") {
            let message = error["Message"].as_str().unwrap_or("unknown error");
            return Err(SlugError::api(self.kind(), message));
        }

        json["TranslationList"][0]["Translation"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlugError::invalid_response(self.kind(), "missing TranslationList"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_sign_scope() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let (x_date, hash, auth) = sign("AK", "SK", "cn-north-1", "{}", now);

        assert_eq!(x_date, "20240501T083000Z");
        assert_eq!(hash, sha256_hex("{}"));
        assert!(auth.starts_with("HMAC-SHA256 Credential=AK/20240501/cn-north-1/translate/request, "));
    }

    #[tokio::test]
    async fn test_translate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("Action", "TranslateText"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "TranslationList": [{"Translation": "Mid-Autumn Festival", "DetectedSourceLanguage": "zh"}],
                "ResponseMetadata": {"RequestId": "r"}
            })))
            .mount(&server)
            .await;

        let translator = VolcanoTranslator::new(
            reqwest::Client::new(),
            ProviderCredential::enabled().with_app("AK", "SK"),
        )
        .with_endpoint(format!("{}/", server.uri()));

        assert_eq!(
            translator.translate("中秋节", "auto", "en").await.unwrap(),
            "Mid-Autumn Festival"
        );
    }

    #[tokio::test]
    async fn test_vendor_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ResponseMetadata": {"Error": {"Code": "SignatureDoesNotMatch", "Message": "bad signature"}}
            })))
            .mount(&server)
            .await;

        let translator = VolcanoTranslator::new(
            reqwest::Client::new(),
            ProviderCredential::enabled().with_app("AK", "SK"),
        )
        .with_endpoint(format!("{}/", server.uri()));

        let err = translator.translate("中秋节", "auto", "en").await.unwrap_err();
        assert!(err.to_string().contains("bad signature"));
    }
}
