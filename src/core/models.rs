//! Core data models for slug generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::errors::SlugError;

/// Translation vendors, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Baidu Fanyi
    Baidu,
    /// Tencent Machine Translation
    Tencent,
    /// Alibaba Cloud Machine Translation
    Alibaba,
    /// DeepL API
    Deepl,
    /// Volcano Engine translate
    Volcano,
    /// Google public translate endpoint
    Google,
}

impl ProviderKind {
    /// All providers in registration order; ties in priority mode keep this order
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Baidu,
        ProviderKind::Tencent,
        ProviderKind::Alibaba,
        ProviderKind::Deepl,
        ProviderKind::Volcano,
        ProviderKind::Google,
    ];

    /// Settings key for this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Baidu => "baidu",
            ProviderKind::Tencent => "tencent",
            ProviderKind::Alibaba => "alibaba",
            ProviderKind::Deepl => "deepl",
            ProviderKind::Volcano => "volcano",
            ProviderKind::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SlugError::UnknownProvider { name: s.to_string() })
    }
}

/// Global slug generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Machine-translate, then format
    #[default]
    Translation,
    /// Local transliteration only
    Pinyin,
}

/// Provider attempt ordering strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageMode {
    /// Ascending numeric priority
    #[default]
    Priority,
    /// Uniform random shuffle
    Balanced,
}

fn default_priority() -> u32 {
    999
}

/// Credentials and policy for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredential {
    /// Provider takes part in selection
    #[serde(default)]
    pub enabled: bool,
    /// App id (Baidu), access key id (Alibaba, Volcano)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// App key (Baidu), access key secret (Alibaba, Volcano)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_key: Option<String>,
    /// Tencent secret id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
    /// Tencent secret key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// DeepL API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Vendor region, where the vendor has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Tencent project id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Lower is tried first
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Zero means unlimited
    #[serde(default)]
    pub monthly_char_limit: u64,
}

impl Default for ProviderCredential {
    fn default() -> Self {
        Self {
            enabled: false,
            app_id: None,
            app_key: None,
            secret_id: None,
            secret_key: None,
            api_key: None,
            region: None,
            project_id: None,
            priority: default_priority(),
            monthly_char_limit: 0,
        }
    }
}

impl ProviderCredential {
    /// Enabled credential with no secrets
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Set the app id / key pair
    pub fn with_app(mut self, app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self.app_key = Some(app_key.into());
        self
    }

    /// Set the secret id / key pair
    pub fn with_secret(mut self, secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.secret_id = Some(secret_id.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the priority, lower first
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Monthly character limit, zero for unlimited
    pub fn with_limit(mut self, monthly_char_limit: u64) -> Self {
        self.monthly_char_limit = monthly_char_limit;
        self
    }
}

/// Monthly character usage for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// `YYYY-MM` in which `chars_used` was accumulated
    pub current_month: String,
    /// Input characters counted this month
    pub chars_used: u64,
    /// When the counter was last zeroed
    pub last_reset_date: DateTime<Utc>,
}

impl UsageRecord {
    /// Zeroed record stamped with the given month
    pub fn fresh(current_month: String, now: DateTime<Utc>) -> Self {
        Self {
            current_month,
            chars_used: 0,
            last_reset_date: now,
        }
    }
}

/// Read-only projection of one provider's usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStat {
    /// Input characters counted this month
    pub chars_used: u64,
    /// Configured monthly limit, zero for unlimited
    pub limit: u64,
    /// Remaining characters; `None` when the provider is unlimited
    pub available: Option<u64>,
    /// `YYYY-MM` the counter belongs to
    pub current_month: String,
    /// When the counter was last zeroed
    pub last_reset_date: DateTime<Utc>,
}

/// Content type field wiring kept with the settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Content type uid
    pub content_type: String,
    /// Field the slug is generated from
    pub source_field: String,
    /// Field receiving the slug
    pub target_field: String,
}

/// Per-request overrides for slug generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Overrides the configured mode
    #[serde(default)]
    pub mode: Option<GenerationMode>,
    /// Overrides the configured target language
    #[serde(default)]
    pub target_lang: Option<String>,
}

impl GenerateOptions {
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_target_lang(mut self, target_lang: impl Into<String>) -> Self {
        self.target_lang = Some(target_lang.into());
        self
    }
}

/// Where a generated slug came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "provider")]
pub enum SlugSource {
    /// Translated by a remote provider
    Provider(ProviderKind),
    /// Local transliteration
    Pinyin,
}

/// Outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedSlug {
    /// Formatted slug, possibly empty
    pub slug: String,
    /// What produced the slug
    pub source: SlugSource,
}

/// Result of a translator self-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    /// Whether the test translation succeeded
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

impl TestReport {
    /// Successful report
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed report
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("deepl".parse::<ProviderKind>().unwrap(), ProviderKind::Deepl);
        assert!("bing".parse::<ProviderKind>().is_err());
        assert_eq!(ProviderKind::Volcano.to_string(), "volcano");
    }

    #[test]
    fn test_credential_defaults() {
        let cred: ProviderCredential = serde_json::from_str(r#"{"enabled": true, "apiKey": "k"}"#).unwrap();
        assert_eq!(cred.priority, 999);
        assert_eq!(cred.monthly_char_limit, 0);
        assert_eq!(cred.api_key.as_deref(), Some("k"));
    }
}
