//! Slug Translator - URL slug generation from free text
//!
//! Titles are translated through a prioritized set of machine translation
//! providers with monthly quotas and failover, normalized into URL-safe
//! slugs, and checked for uniqueness. Pinyin transliteration is the local
//! fallback when no provider can answer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod core;
pub mod providers;
pub mod server;
pub mod cli;

// Re-export key types for convenience
pub use self::core::{
    config::AppConfig,
    errors::SlugError,
    models::{GenerateOptions, GeneratedSlug, GenerationMode, ProviderCredential, ProviderKind, UsageMode},
    orchestrator::SlugOrchestrator,
    pinyin::transliterate,
    settings::{Settings, SettingsService},
    slug::format_slug,
    uniqueness::{CheckResult, SlugIndex, UniquenessChecker},
};

pub use providers::{ClientFactory, HttpClientFactory, Translator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
