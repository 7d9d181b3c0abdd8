//! Settings aggregate and its persistence path

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::errors::Result;
use crate::core::models::{
    FieldMapping, GenerationMode, ProviderCredential, ProviderKind, UsageMode, UsageRecord,
};
use crate::core::store::SettingsStore;

/// Store key holding the whole aggregate
pub const SETTINGS_KEY: &str = "settings";

/// Single source of truth for credentials, usage and global policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Default generation mode
    pub mode: GenerationMode,
    /// Keyed by provider name; unknown names are kept but never selected
    pub translators: BTreeMap<String, ProviderCredential>,
    /// Target language when a request names none
    pub default_target_language: String,
    /// Fall back to pinyin when every provider fails
    pub auto_switch_on_failure: bool,
    /// How providers are ordered
    pub usage_mode: UsageMode,
    /// Monthly counters keyed by provider name
    pub usage_stats: BTreeMap<String, UsageRecord>,
    /// Content type wiring used by the admin UI
    pub field_mappings: Vec<FieldMapping>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Translation,
            translators: BTreeMap::new(),
            default_target_language: "en".to_string(),
            auto_switch_on_failure: true,
            usage_mode: UsageMode::Priority,
            usage_stats: BTreeMap::new(),
            field_mappings: Vec::new(),
        }
    }
}

impl Settings {
    /// Credential for `kind`, if configured
    pub fn credential(&self, kind: ProviderKind) -> Option<&ProviderCredential> {
        self.translators.get(kind.as_str())
    }

    /// Usage record for `kind`, if any
    pub fn usage(&self, kind: ProviderKind) -> Option<&UsageRecord> {
        self.usage_stats.get(kind.as_str())
    }

    /// Insert or replace the credential for `kind`
    pub fn set_credential(&mut self, kind: ProviderKind, credential: ProviderCredential) {
        self.translators.insert(kind.as_str().to_string(), credential);
    }

    /// Configured providers in registration order
    pub fn configured_providers(&self) -> impl Iterator<Item = (ProviderKind, &ProviderCredential)> {
        ProviderKind::ALL
            .into_iter()
            .filter_map(move |kind| self.credential(kind).map(|cred| (kind, cred)))
    }

    /// Merge a partial update; provider maps merge per entry so siblings survive
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(lang) = patch.default_target_language {
            self.default_target_language = lang;
        }
        if let Some(auto_switch) = patch.auto_switch_on_failure {
            self.auto_switch_on_failure = auto_switch;
        }
        if let Some(usage_mode) = patch.usage_mode {
            self.usage_mode = usage_mode;
        }
        if let Some(translators) = patch.translators {
            self.translators.extend(translators);
        }
        if let Some(usage_stats) = patch.usage_stats {
            self.usage_stats.extend(usage_stats);
        }
        if let Some(field_mappings) = patch.field_mappings {
            self.field_mappings = field_mappings;
        }
    }
}

/// Partial settings update as accepted by the settings endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub mode: Option<GenerationMode>,
    /// Merged per provider
    pub translators: Option<BTreeMap<String, ProviderCredential>>,
    pub default_target_language: Option<String>,
    pub auto_switch_on_failure: Option<bool>,
    pub usage_mode: Option<UsageMode>,
    /// Merged per provider
    pub usage_stats: Option<BTreeMap<String, UsageRecord>>,
    /// Replaces the whole list
    pub field_mappings: Option<Vec<FieldMapping>>,
}

/// Reads and writes the settings aggregate through a [`SettingsStore`]
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    write_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for SettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsService").finish_non_exhaustive()
    }
}

impl SettingsService {
    /// Service over `store`
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current snapshot, stored values layered over defaults
    pub async fn load(&self) -> Result<Settings> {
        match self.store.get(SETTINGS_KEY).await? {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
            _ => Ok(Settings::default()),
        }
    }

    /// Overwrite the whole aggregate
    pub async fn save(&self, settings: &Settings) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.set(SETTINGS_KEY, serde_json::to_value(settings)?).await
    }

    /// Read-merge-write of a partial update
    pub async fn update(&self, patch: SettingsPatch) -> Result<Settings> {
        self.modify(|settings| {
            settings.apply(patch);
            settings.clone()
        })
        .await
    }

    /// Atomic read-modify-write; persists only when `f` changed something
    pub async fn modify<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> Result<R> {
        let _guard = self.write_lock.lock().await;

        let original = self.load().await?;
        let mut settings = original.clone();
        let result = f(&mut settings);

        if settings != original {
            self.store
                .set(SETTINGS_KEY, serde_json::to_value(&settings)?)
                .await?;
            debug!("Settings persisted");
        }

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> SettingsService {
        SettingsService::new(Arc::new(MemoryStore::new()))
    }

    /// Store that counts writes
    #[derive(Default)]
    pub(crate) struct CountingStore {
        inner: MemoryStore,
        pub(crate) writes: AtomicUsize,
    }

    #[async_trait]
    impl SettingsStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let settings = service().load().await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_target_language, "en");
        assert!(settings.auto_switch_on_failure);
    }

    #[tokio::test]
    async fn test_partial_stored_value_merges_over_defaults() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(SETTINGS_KEY, json!({"mode": "pinyin", "usageMode": "balanced"}))
            .await
            .unwrap();

        let settings = SettingsService::new(store).load().await.unwrap();
        assert_eq!(settings.mode, GenerationMode::Pinyin);
        assert_eq!(settings.usage_mode, UsageMode::Balanced);
        assert_eq!(settings.default_target_language, "en");
    }

    #[tokio::test]
    async fn test_update_keeps_sibling_providers() {
        let service = service();
        let mut initial = Settings::default();
        initial.set_credential(ProviderKind::Baidu, ProviderCredential::enabled().with_app("id", "key"));
        initial.set_credential(ProviderKind::Deepl, ProviderCredential::enabled().with_api_key("k"));
        service.save(&initial).await.unwrap();

        let patch: SettingsPatch = serde_json::from_value(json!({
            "translators": {"deepl": {"enabled": false, "apiKey": "k2"}},
            "autoSwitchOnFailure": false
        }))
        .unwrap();
        let updated = service.update(patch).await.unwrap();

        assert!(updated.credential(ProviderKind::Baidu).unwrap().enabled);
        let deepl = updated.credential(ProviderKind::Deepl).unwrap();
        assert!(!deepl.enabled);
        assert_eq!(deepl.api_key.as_deref(), Some("k2"));
        assert!(!updated.auto_switch_on_failure);
        assert_eq!(service.load().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_modify_skips_write_when_unchanged() {
        let store = Arc::new(CountingStore::default());
        let service = SettingsService::new(store.clone());

        service.modify(|_| ()).await.unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);

        service
            .modify(|s| s.default_target_language = "ja".to_string())
            .await
            .unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_modify_loses_nothing() {
        let service = service();
        let mut handles = Vec::new();
        for _ in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .modify(|s| {
                        let count = s.field_mappings.len();
                        s.field_mappings.push(FieldMapping {
                            content_type: format!("type-{}", count),
                            source_field: "title".to_string(),
                            target_field: "slug".to_string(),
                        });
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(service.load().await.unwrap().field_mappings.len(), 32);
    }
}
