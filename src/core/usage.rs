//! Monthly character usage tracking and quota management

use chrono::{DateTime, Local, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::errors::Result;
use crate::core::models::{ProviderKind, UsageRecord, UsageStat};
use crate::core::settings::{Settings, SettingsService};
use crate::core::validator;

/// Wall-clock source
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// System time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `YYYY-MM` of the local calendar month containing `now`
pub fn month_key(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%Y-%m").to_string()
}

/// Zero the record for `name` when it is missing or from another month.
/// Returns true when the record was (re)created.
fn ensure_current(settings: &mut Settings, name: &str, month: &str, now: DateTime<Utc>) -> bool {
    match settings.usage_stats.get(name) {
        Some(record) if record.current_month == month => false,
        _ => {
            settings
                .usage_stats
                .insert(name.to_string(), UsageRecord::fresh(month.to_string(), now));
            true
        }
    }
}

/// Per-provider monthly usage counters stored in the settings aggregate
#[derive(Clone)]
pub struct UsageLedger {
    settings: SettingsService,
    clock: Arc<dyn Clock>,
}

impl UsageLedger {
    /// Ledger on the system clock
    pub fn new(settings: SettingsService) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Ledger on an explicit clock
    pub fn with_clock(settings: SettingsService, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    fn current_month(&self) -> (String, DateTime<Utc>) {
        let now = self.clock.now();
        (month_key(now), now)
    }

    /// Whether `provider` is enabled, credentialed and within its monthly limit
    pub async fn is_available(&self, provider: ProviderKind) -> Result<bool> {
        let (month, now) = self.current_month();
        let name = provider.as_str();

        self.settings
            .modify(|settings| {
                let limit = match settings.credential(provider) {
                    Some(cred) if validator::validate(name, cred) => cred.monthly_char_limit,
                    _ => return false,
                };

                if ensure_current(settings, name, &month, now) {
                    debug!("Usage for {} reset for {}", provider, month);
                    return true;
                }

                let used = settings.usage(provider).map(|r| r.chars_used).unwrap_or(0);
                limit == 0 || used < limit
            })
            .await
    }

    /// Add `char_count` input characters to `provider`'s counter
    pub async fn record_usage(&self, provider: ProviderKind, char_count: u64) -> Result<u64> {
        let (month, now) = self.current_month();
        let name = provider.as_str();

        let total = self
            .settings
            .modify(|settings| {
                ensure_current(settings, name, &month, now);
                match settings.usage_stats.get_mut(name) {
                    Some(record) => {
                        record.chars_used = record.chars_used.saturating_add(char_count);
                        record.chars_used
                    }
                    None => 0,
                }
            })
            .await?;

        debug!("Recorded {} chars for {}, month total {}", char_count, provider, total);
        Ok(total)
    }

    /// Force a zeroed record for the current month
    pub async fn reset(&self, provider: &str) -> Result<()> {
        let (month, now) = self.current_month();

        self.settings
            .modify(|settings| {
                settings
                    .usage_stats
                    .insert(provider.to_string(), UsageRecord::fresh(month.clone(), now));
            })
            .await?;

        info!("Usage stats reset for {}", provider);
        Ok(())
    }

    /// Usage projection for every configured or previously tracked provider.
    /// Stale months found on the way are corrected in one write.
    pub async fn stats_snapshot(&self) -> Result<BTreeMap<String, UsageStat>> {
        let (month, now) = self.current_month();

        self.settings
            .modify(|settings| {
                let names: Vec<String> = settings
                    .translators
                    .keys()
                    .chain(settings.usage_stats.keys())
                    .cloned()
                    .collect();

                let mut stats = BTreeMap::new();
                for name in names {
                    if stats.contains_key(&name) {
                        continue;
                    }
                    ensure_current(settings, &name, &month, now);

                    let limit = settings
                        .translators
                        .get(&name)
                        .map(|c| c.monthly_char_limit)
                        .unwrap_or(0);
                    if let Some(record) = settings.usage_stats.get(&name) {
                        let available = (limit > 0).then(|| limit.saturating_sub(record.chars_used));
                        stats.insert(
                            name,
                            UsageStat {
                                chars_used: record.chars_used,
                                limit,
                                available,
                                current_month: record.current_month.clone(),
                                last_reset_date: record.last_reset_date,
                            },
                        );
                    }
                }
                stats
            })
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::ProviderCredential;
    use crate::core::settings::tests::CountingStore;
    use crate::core::store::MemoryStore;
    use std::sync::atomic::Ordering;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Clock pinned to an adjustable instant
    pub(crate) struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        pub(crate) fn at(year: i32, month: u32) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Self::mid_month(year, month))))
        }

        fn mid_month(year: i32, month: u32) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap()
        }

        pub(crate) fn set(&self, year: i32, month: u32) {
            *self.0.lock().unwrap() = Self::mid_month(year, month);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    async fn ledger_with(
        credential: ProviderCredential,
        usage: Option<UsageRecord>,
    ) -> (UsageLedger, SettingsService, Arc<FixedClock>) {
        let service = SettingsService::new(Arc::new(MemoryStore::new()));
        let mut settings = Settings::default();
        settings.set_credential(ProviderKind::Baidu, credential);
        if let Some(record) = usage {
            settings.usage_stats.insert("baidu".to_string(), record);
        }
        service.save(&settings).await.unwrap();

        let clock = FixedClock::at(2024, 2);
        (UsageLedger::with_clock(service.clone(), clock.clone()), service, clock)
    }

    fn record(month: &str, used: u64) -> UsageRecord {
        UsageRecord {
            current_month: month.to_string(),
            chars_used: used,
            last_reset_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn baidu(limit: u64) -> ProviderCredential {
        ProviderCredential::enabled().with_app("id", "key").with_limit(limit)
    }

    #[test]
    fn test_month_key_is_zero_padded() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(month_key(now), "2024-03");
    }

    #[tokio::test]
    async fn test_quota_exclusion_and_recovery() {
        let (ledger, service, _) = ledger_with(baidu(100), Some(record("2024-02", 100))).await;
        assert!(!ledger.is_available(ProviderKind::Baidu).await.unwrap());

        service
            .modify(|s| s.usage_stats.get_mut("baidu").unwrap().chars_used = 50)
            .await
            .unwrap();
        assert!(ledger.is_available(ProviderKind::Baidu).await.unwrap());
    }

    #[tokio::test]
    async fn test_month_advance_restores_eligibility() {
        let (ledger, _, clock) = ledger_with(baidu(100), Some(record("2024-02", 100))).await;
        assert!(!ledger.is_available(ProviderKind::Baidu).await.unwrap());

        clock.set(2024, 3);
        assert!(ledger.is_available(ProviderKind::Baidu).await.unwrap());
    }

    #[tokio::test]
    async fn test_rollover_rewrites_stale_record() {
        let (ledger, service, _) = ledger_with(baidu(1000), Some(record("2024-01", 500))).await;

        assert!(ledger.is_available(ProviderKind::Baidu).await.unwrap());

        let stored = service.load().await.unwrap();
        let usage = stored.usage(ProviderKind::Baidu).unwrap();
        assert_eq!(usage.current_month, "2024-02");
        assert_eq!(usage.chars_used, 0);
        assert_eq!(usage.last_reset_date, Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_unlimited_and_disabled() {
        let (ledger, _, _) = ledger_with(baidu(0), Some(record("2024-02", 1_000_000))).await;
        assert!(ledger.is_available(ProviderKind::Baidu).await.unwrap());
        assert!(!ledger.is_available(ProviderKind::Tencent).await.unwrap());

        let (ledger, _, _) = ledger_with(ProviderCredential::default().with_app("id", "key"), None).await;
        assert!(!ledger.is_available(ProviderKind::Baidu).await.unwrap());
    }

    #[tokio::test]
    async fn test_record_usage_accumulates() {
        let (ledger, service, _) = ledger_with(baidu(0), None).await;

        assert_eq!(ledger.record_usage(ProviderKind::Baidu, 10).await.unwrap(), 10);
        assert_eq!(ledger.record_usage(ProviderKind::Baidu, 5).await.unwrap(), 15);
        assert_eq!(
            service.load().await.unwrap().usage(ProviderKind::Baidu).unwrap().chars_used,
            15
        );
    }

    #[tokio::test]
    async fn test_record_usage_on_stale_record_starts_from_zero() {
        let (ledger, _, _) = ledger_with(baidu(0), Some(record("2023-12", 900))).await;
        assert_eq!(ledger.record_usage(ProviderKind::Baidu, 7).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (ledger, service, _) = ledger_with(baidu(100), Some(record("2024-02", 80))).await;

        ledger.reset("baidu").await.unwrap();
        let first = service.load().await.unwrap();
        ledger.reset("baidu").await.unwrap();
        let second = service.load().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.usage(ProviderKind::Baidu).unwrap().chars_used, 0);
        assert_eq!(second.usage(ProviderKind::Baidu).unwrap().current_month, "2024-02");
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let (ledger, service, _) = ledger_with(baidu(100), Some(record("2024-02", 130))).await;
        service
            .modify(|s| {
                s.set_credential(ProviderKind::Google, ProviderCredential::enabled());
                s.usage_stats.insert("deepl".to_string(), record("2024-01", 42));
            })
            .await
            .unwrap();

        let stats = ledger.stats_snapshot().await.unwrap();

        let baidu = &stats["baidu"];
        assert_eq!(baidu.limit, 100);
        assert_eq!(baidu.available, Some(0));

        let google = &stats["google"];
        assert_eq!(google.chars_used, 0);
        assert_eq!(google.available, None);

        // orphaned record is kept and rolled over
        let deepl = &stats["deepl"];
        assert_eq!(deepl.chars_used, 0);
        assert_eq!(deepl.current_month, "2024-02");

        let stored = service.load().await.unwrap();
        assert_eq!(stored.usage_stats["deepl"].current_month, "2024-02");
    }

    #[tokio::test]
    async fn test_stats_snapshot_batches_rollover_into_one_write() {
        let store = Arc::new(CountingStore::default());
        let service = SettingsService::new(store.clone());
        let mut settings = Settings::default();
        settings.set_credential(ProviderKind::Baidu, baidu(100));
        settings.set_credential(ProviderKind::Deepl, ProviderCredential::enabled().with_api_key("k"));
        settings.usage_stats.insert("baidu".to_string(), record("2024-01", 80));
        settings.usage_stats.insert("deepl".to_string(), record("2024-01", 20));
        settings.usage_stats.insert("volcano".to_string(), record("2024-01", 5));
        service.save(&settings).await.unwrap();
        let writes_before = store.writes.load(Ordering::SeqCst);

        let ledger = UsageLedger::with_clock(service.clone(), FixedClock::at(2024, 2));
        let stats = ledger.stats_snapshot().await.unwrap();

        assert_eq!(store.writes.load(Ordering::SeqCst), writes_before + 1);
        assert!(stats.values().all(|s| s.chars_used == 0 && s.current_month == "2024-02"));

        ledger.stats_snapshot().await.unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), writes_before + 1);
    }
}
