//! DeepL API v2

use async_trait::async_trait;

use crate::core::errors::{Result, SlugError};
use crate::core::models::{ProviderCredential, ProviderKind};
use crate::core::validator;
use crate::providers::{read_json, transport_error, Translator};

const API_URL_FREE: &str = "https://api-free.deepl.com/v2/translate";
const API_URL_PRO: &str = "https://api.deepl.com/v2/translate";

/// DeepL API client
#[derive(Debug, Clone)]
pub struct DeepLTranslator {
    client: reqwest::Client,
    credential: ProviderCredential,
    endpoint: Option<String>,
}

impl DeepLTranslator {
    /// Client for `credential`, sharing `client`
    pub fn new(client: reqwest::Client, credential: ProviderCredential) -> Self {
        Self {
            client,
            credential,
            endpoint: None,
        }
    }

    /// Override the API endpoint, ignoring the key suffix
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Free-plan keys carry the `:fx` suffix
    fn api_url(&self, api_key: &str) -> &str {
        match &self.endpoint {
            Some(endpoint) => endpoint,
            None if api_key.ends_with(":fx") => API_URL_FREE,
            None => API_URL_PRO,
        }
    }
}

#[async_trait]
impl Translator for DeepLTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Deepl
    }

    fn validate_config(&self) -> bool {
        validator::has_required_fields(ProviderKind::Deepl, &self.credential)
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let api_key = match &self.credential.api_key {
            Some(key) if self.validate_config() => key,
            _ => return Err(SlugError::ProviderConfigError { provider: self.kind() }),
        };

        let target = to.to_uppercase();
        let source = from.to_uppercase();
        let mut form = vec![("text", text), ("target_lang", target.as_str())];
        if from != "auto" {
            form.push(("source_lang", source.as_str()));
        }

        let response = self
            .client
            .post(self.api_url(api_key))
            .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(self.kind(), e))?;

        let json = read_json(self.kind(), response).await?;

        json["translations"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SlugError::invalid_response(self.kind(), "no translation result from DeepL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_api_url_by_key_suffix() {
        let free = DeepLTranslator::new(reqwest::Client::new(), ProviderCredential::enabled());
        assert_eq!(free.api_url("abc:fx"), API_URL_FREE);
        assert_eq!(free.api_url("abc"), API_URL_PRO);
    }

    #[tokio::test]
    async fn test_translate_omits_auto_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "DeepL-Auth-Key key:fx"))
            .and(body_string_contains("target_lang=EN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "translations": [{"detected_source_language": "ZH", "text": "Dragon Boat"}]
            })))
            .mount(&server)
            .await;

        let translator = DeepLTranslator::new(
            reqwest::Client::new(),
            ProviderCredential::enabled().with_api_key("key:fx"),
        )
        .with_endpoint(server.uri());

        assert_eq!(translator.translate("龙舟", "auto", "en").await.unwrap(), "Dragon Boat");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(!body.contains("source_lang"));
    }

    #[tokio::test]
    async fn test_empty_translations_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"translations": []})))
            .mount(&server)
            .await;

        let translator = DeepLTranslator::new(
            reqwest::Client::new(),
            ProviderCredential::enabled().with_api_key("key"),
        )
        .with_endpoint(server.uri());

        assert!(matches!(
            translator.translate("龙舟", "zh", "en").await,
            Err(SlugError::InvalidResponseError { .. })
        ));
    }
}
