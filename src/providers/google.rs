//! Keyless Google translate endpoint

use async_trait::async_trait;

use crate::core::errors::{Result, SlugError};
use crate::core::models::ProviderKind;
use crate::providers::{read_json, transport_error, Translator};

const API_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Google translate client, no credentials needed
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    /// Client using the public endpoint
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
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
impl Translator for GoogleTranslator {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn validate_config(&self) -> bool {
        true
    }

    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("client", "gtx"), ("sl", from), ("tl", to), ("dt", "t"), ("q", text)])
            .send()
            .await
            .map_err(|e| transport_error(self.kind(), e))?;

        let json = read_json(self.kind(), response).await?;

        // [[["translated", "source", ...], ...], ...]
        let translated: String = json[0]
            .as_array()
            .map(|segments| {
                segments
                    .iter()
                    .filter_map(|segment| segment[0].as_str())
                    .collect()
            })
            .unwrap_or_default();

        if translated.is_empty() {
            return Err(SlugError::invalid_response(self.kind(), "no translated segments"));
        }

        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_segments_are_joined() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("tl", "en"))
            .and(query_param("client", "gtx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                [["Hello ", "你好", null, null], ["world", "世界", null, null]],
                null,
                "zh-CN"
            ])))
            .mount(&server)
            .await;

        let translator = GoogleTranslator::new(reqwest::Client::new()).with_endpoint(server.uri());
        assert!(translator.validate_config());
        assert_eq!(translator.translate("你好世界", "auto", "en").await.unwrap(), "Hello world");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let translator = GoogleTranslator::new(reqwest::Client::new()).with_endpoint(server.uri());
        assert!(matches!(
            translator.translate("你好", "auto", "en").await,
            Err(SlugError::ApiError { .. })
        ));
    }
}
