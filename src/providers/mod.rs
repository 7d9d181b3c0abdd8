//! Translation provider clients
//!
//! Every vendor is one type implementing [`Translator`]. Signing and payload
//! shapes stay inside each client; the orchestrator only sees `translate`.

pub mod alibaba;
pub mod baidu;
pub mod deepl;
pub mod google;
pub mod signing;
pub mod tencent;
pub mod volcano;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::errors::{Result, SlugError};
use crate::core::models::{ProviderCredential, ProviderKind};

pub use alibaba::AlibabaTranslator;
pub use baidu::BaiduTranslator;
pub use deepl::DeepLTranslator;
pub use google::GoogleTranslator;
pub use tencent::TencentTranslator;
pub use volcano::VolcanoTranslator;

/// Anything that can translate text and say whether it is minimally configured
#[async_trait]
pub trait Translator: Send + Sync {
    /// Provider identity, used for logging and usage accounting
    fn kind(&self) -> ProviderKind;

    /// Required credential fields are present
    fn validate_config(&self) -> bool;

    /// Translate `text`; `from` may be `"auto"`
    async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String>;
}

/// Provider registry: builds a client for a named provider
pub trait ClientFactory: Send + Sync {
    /// Client for `kind` using `credential`
    fn create(&self, kind: ProviderKind, credential: &ProviderCredential) -> Arc<dyn Translator>;
}

/// Builds the real HTTP clients, all sharing one connection pool
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    client: reqwest::Client,
}

impl HttpClientFactory {
    /// Factory whose clients time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self { client })
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, kind: ProviderKind, credential: &ProviderCredential) -> Arc<dyn Translator> {
        let client = self.client.clone();
        let credential = credential.clone();
        match kind {
            ProviderKind::Baidu => Arc::new(BaiduTranslator::new(client, credential)),
            ProviderKind::Tencent => Arc::new(TencentTranslator::new(client, credential)),
            ProviderKind::Alibaba => Arc::new(AlibabaTranslator::new(client, credential)),
            ProviderKind::Deepl => Arc::new(DeepLTranslator::new(client, credential)),
            ProviderKind::Volcano => Arc::new(VolcanoTranslator::new(client, credential)),
            ProviderKind::Google => Arc::new(GoogleTranslator::new(client)),
        }
    }
}

/// Check the HTTP status and decode the JSON body of a vendor response
pub(crate) async fn read_json(
    provider: ProviderKind,
    response: reqwest::Response,
) -> Result<serde_json::Value> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        return Err(SlugError::api(
            provider,
            format!("HTTP {}: {}", status.as_u16(), snippet),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| SlugError::invalid_response(provider, e.to_string()))
}

pub(crate) fn transport_error(provider: ProviderKind, err: reqwest::Error) -> SlugError {
    if err.is_timeout() {
        SlugError::network(provider, "request timed out")
    } else {
        SlugError::network(provider, err)
    }
}
