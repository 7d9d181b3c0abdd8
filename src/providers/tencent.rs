//! Tencent Cloud machine translation (TC3-HMAC-SHA256)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::core::errors::{Result, SlugError};
use crate::core::models::{ProviderCredential, ProviderKind};
use crate::core::validator;
use crate::providers::signing::{hmac_sha256, hmac_sha256_hex, sha256_hex};
use crate::providers::{read_json, transport_error, Translator};

const HOST: &str = "tmt.tencentcloudapi.com";
const SERVICE: &str = "tmt";
const ACTION: &str = "TextTranslate";
const VERSION: &str = "2018-03-21";
const DEFAULT_REGION: &str = "ap-beijing";

/// Tencent Cloud TMT client
#[derive(Debug, Clone)]
pub struct TencentTranslator {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: String,
}

/// `Authorization` header value for one request body at `now`
pub(crate) fn authorization(secret_id: &str, secret_key: &str, payload: &str, now: DateTime<Utc>) -> String {
    let timestamp = now.timestamp();
    let date = now.format("%Y-%m-%d").to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:application/json\nhost:{}\n\ncontent-type;host\n{}",
        HOST,
        sha256_hex(payload)
    );
    let scope = format!("{}/{}/tc3_request", date, SERVICE);
    let string_to_sign = format!(
        "TC3-HMAC-SHA256\n{}\n{}\n{}",
        timestamp,
        scope,
        sha256_hex(&canonical_request)
    );

    let secret_date = hmac_sha256(format!("TC3{}", secret_key).as_bytes(), &date);
    let secret_service = hmac_sha256(&secret_date, SERVICE);
    let secret_signing = hmac_sha256(&secret_service, "tc3_request");
    let signature = hmac_sha256_hex(&secret_signing, &string_to_sign);

    format!(
        "TC3-HMAC-SHA256 Credential={}/{}, SignedHeaders=content-type;host, Signature={}",
        secret_id, scope, signature
    )
}

impl TencentTranslator {
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
impl Translator for TencentTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tencent
    }

    fn validate_config(&self) -> bool {
        validator::has_required_fields(ProviderKind::Tencent, &self.credential)
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let (secret_id, secret_key) = match (&self.credential.secret_id, &self.credential.secret_key) {
            (Some(id), Some(key)) if self.validate_config() => (id, key),
            _ => return Err(SlugError::ProviderConfigError { provider: self.kind() }),
        };

        let project_id = self
            .credential
            .project_id
            .as_deref()
            .and_then(|p| p.parse::<i64>().ok())
            .unwrap_or(0);
        let region = self.credential.region.as_deref().unwrap_or(DEFAULT_REGION);

        let payload = json!({
            "SourceText": text,
            "Source": from,
            "Target": to,
            "ProjectId": project_id,
        })
        .to_string();

        let now = Utc::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", authorization(secret_id, secret_key, &payload, now))
            .header("X-TC-Action", ACTION)
            .header("X-TC-Version", VERSION)
            .header("X-TC-Timestamp", now.timestamp().to_string())
            .header("X-TC-Region", region)
            .body(payload)
            .send()
            .await
            .map_err(|e| transport_error(self.kind(), e))?;

        let json = read_json(self.kind(), response).await?;
        let body = &json["Response"];

        if let Some(error) = body.get("Error") {
            let message = error["Message"].as_str().unwrap_or("unknown error");
            return Err(SlugError::api(self.kind(), message));
        }

        body["TargetText"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlugError::invalid_response(self.kind(), "missing TargetText"))
    }
}
