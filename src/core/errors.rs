//! Custom error types for slug generation

use thiserror::Error;

use crate::core::models::ProviderKind;

/// Slug generation errors
#[derive(Error, Debug)]
pub enum SlugError {
    /// Provider answered with a vendor error code
    #[error("{provider} API error: {message}")]
    ApiError {
        provider: ProviderKind,
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from a provider
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponseError {
        provider: ProviderKind,
        message: String,
    },

    /// Provider returned an empty translation
    #[error("{provider} returned an empty translation")]
    EmptyTranslation {
        provider: ProviderKind,
    },

    /// Single provider attempt timed out
    #[error("Request to {provider} timed out after {timeout_ms} ms")]
    TimeoutError {
        provider: ProviderKind,
        timeout_ms: u64,
    },

    /// Provider credentials are incomplete
    #[error("{provider} translator config is invalid")]
    ProviderConfigError {
        provider: ProviderKind,
    },

    /// Provider name not recognised
    #[error("Unknown translator: {name}")]
    UnknownProvider {
        name: String,
    },

    /// Nothing to generate a slug from
    #[error("Text is required")]
    EmptyInput,

    /// Every candidate was skipped or failed and pinyin fallback is disabled
    #[error("All translators failed and fallback is disabled")]
    AllProvidersFailed,

    /// Uniqueness backend could not be reached; the slug may still be valid
    #[error("Could not validate slug: {message}")]
    CheckUnavailable {
        message: String,
    },

    /// Settings store failure
    #[error("Settings store error: {message}")]
    StoreError {
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Config crate error
    #[error("Config error: {0}")]
    SettingsFileError(#[from] ::config::ConfigError),
}

impl SlugError {
    /// Network-level failure, tagged with the provider that produced it
    pub fn network(provider: ProviderKind, err: impl std::fmt::Display) -> Self {
        SlugError::NetworkError {
            message: format!("{}: {}", provider, err),
        }
    }

    /// Malformed or unexpected payload from a provider
    pub fn invalid_response(provider: ProviderKind, message: impl Into<String>) -> Self {
        SlugError::InvalidResponseError {
            provider,
            message: message.into(),
        }
    }

    /// Vendor-reported error
    pub fn api(provider: ProviderKind, message: impl Into<String>) -> Self {
        SlugError::ApiError {
            provider,
            message: message.into(),
        }
    }
}

/// Result type for slug operations
pub type Result<T> = std::result::Result<T, SlugError>;
