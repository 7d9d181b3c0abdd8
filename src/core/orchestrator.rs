//! Slug generation with provider failover and pinyin fallback

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::AppConfig;
use crate::core::errors::{Result, SlugError};
use crate::core::models::{
    GenerateOptions, GeneratedSlug, GenerationMode, ProviderCredential, ProviderKind, SlugSource,
    TestReport,
};
use crate::core::pinyin::transliterate;
use crate::core::selection::{ProviderSelector, TranslationAttempt};
use crate::core::settings::SettingsService;
use crate::core::slug::{ensure_locale_suffix, format_slug};
use crate::core::store::JsonFileStore;
use crate::core::uniqueness::{check_slug, CheckResult, SlugTarget, UniquenessChecker};
use crate::core::usage::UsageLedger;
use crate::providers::{ClientFactory, HttpClientFactory};

/// Source language hint for slug generation
const SOURCE_LANG: &str = "auto";

/// Fixed request used by the translator self-test
const SELF_TEST_TEXT: &str = "Hello";
const SELF_TEST_FROM: &str = "en";
const SELF_TEST_TO: &str = "zh";

/// Generated slug together with its uniqueness verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedSlug {
    /// Generated slug and its source
    pub generated: GeneratedSlug,
    /// Uniqueness verdict for `generated.slug`
    pub check: CheckResult,
}

/// Drives provider attempts for slug generation
#[derive(Clone)]
pub struct SlugOrchestrator {
    settings: SettingsService,
    ledger: UsageLedger,
    selector: ProviderSelector,
    factory: Arc<dyn ClientFactory>,
    attempt_timeout: Duration,
}

impl SlugOrchestrator {
    /// Create an orchestrator over the given settings and client factory
    pub fn new(settings: SettingsService, factory: Arc<dyn ClientFactory>, attempt_timeout: Duration) -> Self {
        let ledger = UsageLedger::new(settings.clone());
        Self::with_ledger(settings, ledger, factory, attempt_timeout)
    }

    /// Same as [`SlugOrchestrator::new`] with an explicit ledger
    pub fn with_ledger(
        settings: SettingsService,
        ledger: UsageLedger,
        factory: Arc<dyn ClientFactory>,
        attempt_timeout: Duration,
    ) -> Self {
        let selector = ProviderSelector::new(ledger.clone(), factory.clone());
        Self {
            settings,
            ledger,
            selector,
            factory,
            attempt_timeout,
        }
    }

    /// File-backed settings and real HTTP clients
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(JsonFileStore::new(config.store_path.clone()));
        let factory = Arc::new(HttpClientFactory::new(config.attempt_timeout())?);
        Ok(Self::new(SettingsService::new(store), factory, config.attempt_timeout()))
    }

    /// Settings service backing this orchestrator
    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    /// Usage ledger shared with provider selection
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Generate a slug for `text`.
    ///
    /// Providers are tried one at a time; the first non-empty translation
    /// wins. When every provider is skipped or fails, the pinyin fallback is
    /// used if enabled, otherwise [`SlugError::AllProvidersFailed`].
    pub async fn generate_slug(&self, text: &str, options: &GenerateOptions) -> Result<GeneratedSlug> {
        if text.trim().is_empty() {
            return Err(SlugError::EmptyInput);
        }

        let settings = self.settings.load().await?;
        let mode = options.mode.unwrap_or(settings.mode);

        if mode == GenerationMode::Pinyin {
            return Ok(Self::pinyin_slug(text));
        }

        let target_lang = options
            .target_lang
            .as_deref()
            .filter(|lang| !lang.trim().is_empty())
            .unwrap_or(settings.default_target_language.as_str());

        let attempts = self.selector.select(&settings).await?;
        if let Some(slug) = self.translate_with_failover(text, target_lang, &attempts).await {
            return Ok(slug);
        }

        if settings.auto_switch_on_failure {
            info!("All translators failed, falling back to pinyin");
            return Ok(Self::pinyin_slug(text));
        }

        warn!("All translators failed and fallback is disabled");
        Err(SlugError::AllProvidersFailed)
    }

    fn pinyin_slug(text: &str) -> GeneratedSlug {
        GeneratedSlug {
            slug: transliterate(text),
            source: SlugSource::Pinyin,
        }
    }

    /// First successful attempt, or `None` when the list is exhausted
    async fn translate_with_failover(
        &self,
        text: &str,
        target_lang: &str,
        attempts: &[TranslationAttempt],
    ) -> Option<GeneratedSlug> {
        for attempt in attempts {
            let provider = attempt.provider;

            // quota may have been consumed by a concurrent request since selection
            match self.ledger.is_available(provider).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Skipping {}: quota exhausted since selection", provider);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping {}: usage check failed: {}", provider, e);
                    continue;
                }
            }

            match self.attempt(attempt, text, SOURCE_LANG, target_lang).await {
                Ok(translated) => {
                    let char_count = text.chars().count() as u64;
                    if let Err(e) = self.ledger.record_usage(provider, char_count).await {
                        warn!("Failed to record usage for {}: {}", provider, e);
                    }

                    info!("Translated with {}", provider);
                    return Some(GeneratedSlug {
                        slug: format_slug(&translated),
                        source: SlugSource::Provider(provider),
                    });
                }
                Err(e) => {
                    warn!("Translator {} failed: {}", provider, e);
                    continue;
                }
            }
        }

        None
    }

    /// One provider call bounded by the attempt timeout
    async fn attempt(
        &self,
        attempt: &TranslationAttempt,
        text: &str,
        from: &str,
        to: &str,
    ) -> Result<String> {
        let call = attempt.client.translate(text, from, to);

        let translated = tokio::time::timeout(self.attempt_timeout, call)
            .await
            .map_err(|_| SlugError::TimeoutError {
                provider: attempt.provider,
                timeout_ms: self.attempt_timeout.as_millis() as u64,
            })??;

        if translated.trim().is_empty() {
            return Err(SlugError::EmptyTranslation {
                provider: attempt.provider,
            });
        }

        Ok(translated)
    }

    /// Generate, then validate against `checker` before accepting
    pub async fn generate_checked(
        &self,
        text: &str,
        options: &GenerateOptions,
        checker: &dyn UniquenessChecker,
        target: &SlugTarget,
    ) -> Result<CheckedSlug> {
        let mut generated = self.generate_slug(text, options).await?;
        if !generated.slug.is_empty() {
            generated.slug = ensure_locale_suffix(&generated.slug, target.locale.as_deref(), target.localized);
        }

        let check = check_slug(checker, &target.query(generated.slug.clone())).await?;
        Ok(CheckedSlug { generated, check })
    }

    /// Build the named client and translate a fixed sample text
    pub async fn test_translator(&self, name: &str, credential: &ProviderCredential) -> TestReport {
        let kind = match name.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(_) => return TestReport::failed("Unknown translator"),
        };

        let client = self.factory.create(kind, credential);
        if !client.validate_config() {
            return TestReport::failed("Invalid configuration");
        }

        let attempt = TranslationAttempt {
            provider: kind,
            client,
            priority: credential.priority,
        };

        match self.attempt(&attempt, SELF_TEST_TEXT, SELF_TEST_FROM, SELF_TEST_TO).await {
            Ok(_) => TestReport::ok("Test successful"),
            Err(e) => TestReport::failed(e.to_string()),
        }
    }
}
