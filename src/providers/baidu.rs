//! Baidu Fanyi general translation API

use async_trait::async_trait;
use tracing::debug;

use crate::core::errors::{Result, SlugError};
use crate::core::models::{ProviderCredential, ProviderKind};
use crate::core::validator;
use crate::providers::signing::md5_hex;
use crate::providers::{read_json, transport_error, Translator};

const API_URL: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

/// Signs each request with `md5(appid + q + salt + key)`
#[derive(Debug, Clone)]
pub struct BaiduTranslator {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: String,
}

impl BaiduTranslator {
    /// Client for `credential`, sharing `client`
    pub fn new(client: reqwest::Client, credential: ProviderCredential) -> Self {
        Self {
            client,
            credential,
            endpoint: API_URL.to_string(),
        }
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for BaiduTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Baidu
    }

    fn validate_config(&self) -> bool {
        validator::has_required_fields(ProviderKind::Baidu, &self.credential)
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let (app_id, app_key) = match (&self.credential.app_id, &self.credential.app_key) {
            (Some(id), Some(key)) if self.validate_config() => (id, key),
            _ => return Err(SlugError::ProviderConfigError { provider: self.kind() }),
        };

        let salt = chrono::Utc::now().timestamp_millis().to_string();
        let sign = md5_hex(format!("{}{}{}{}", app_id, text, salt, app_key));

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", text),
                ("from", from),
                ("to", to),
                ("appid", app_id.as_str()),
                ("salt", salt.as_str()),
                ("sign", sign.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(self.kind(), e))?;

        let json = read_json(self.kind(), response).await?;

        if let Some(code) = json.get("error_code") {
            let message = json["error_msg"].as_str().unwrap_or("unknown error");
            return Err(SlugError::api(self.kind(), format!("{} ({})", message, code)));
        }

        let segments: Vec<&str> = json["trans_result"]
            .as_array()
            .map(|items| items.iter().filter_map(|item| item["dst"].as_str()).collect())
            .unwrap_or_default();

        if segments.is_empty() {
            return Err(SlugError::invalid_response(self.kind(), "missing trans_result"));
        }

        debug!("Baidu translated {} segment(s)", segments.len());
        Ok(segments.join(" "))
    }
}
