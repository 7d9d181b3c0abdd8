//! Provider selection: filtering and attempt ordering

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::errors::Result;
use crate::core::models::{ProviderKind, UsageMode};
use crate::core::settings::Settings;
use crate::core::usage::UsageLedger;
use crate::core::validator;
use crate::providers::{ClientFactory, Translator};

/// One candidate for a single request
#[derive(Clone)]
pub struct TranslationAttempt {
    /// Provider tried by this attempt
    pub provider: ProviderKind,
    /// Client built for this request
    pub client: Arc<dyn Translator>,
    /// Configured priority, lower first
    pub priority: u32,
}

impl std::fmt::Debug for TranslationAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationAttempt")
            .field("provider", &self.provider)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Order attempts in place. Priority mode is a stable ascending sort, so
/// equal priorities keep registration order; balanced mode is a
/// Fisher-Yates shuffle.
pub fn order_attempts<R: Rng + ?Sized>(attempts: &mut [TranslationAttempt], mode: UsageMode, rng: &mut R) {
    match mode {
        UsageMode::Priority => attempts.sort_by_key(|attempt| attempt.priority),
        UsageMode::Balanced => attempts.shuffle(rng),
    }
}

/// Builds the ordered candidate list for one request
#[derive(Clone)]
pub struct ProviderSelector {
    ledger: UsageLedger,
    factory: Arc<dyn ClientFactory>,
}

impl ProviderSelector {
    /// Create a selector over `ledger` and `factory`
    pub fn new(ledger: UsageLedger, factory: Arc<dyn ClientFactory>) -> Self {
        Self { ledger, factory }
    }

    /// Enabled, credentialed, within-quota providers in attempt order
    pub async fn select(&self, settings: &Settings) -> Result<Vec<TranslationAttempt>> {
        let mut attempts = Vec::new();

        for (provider, credential) in settings.configured_providers() {
            if !validator::validate(provider.as_str(), credential) {
                debug!("Skipping {}: disabled or incomplete credentials", provider);
                continue;
            }

            match self.ledger.is_available(provider).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Skipping {}: monthly quota reached", provider);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping {}: usage check failed: {}", provider, e);
                    continue;
                }
            }

            attempts.push(TranslationAttempt {
                provider,
                client: self.factory.create(provider, credential),
                priority: credential.priority,
            });
        }

        order_attempts(&mut attempts, settings.usage_mode, &mut rand::thread_rng());

        debug!(
            "Selected providers: {:?}",
            attempts.iter().map(|a| a.provider).collect::<Vec<_>>()
        );
        Ok(attempts)
    }
}
