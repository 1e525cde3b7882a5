//! Per-monitor rate limiting of DOWN alerts.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Default suppression window for repeated DOWN alerts
pub const ALERT_THROTTLE_MINUTES: i64 = 15;

/// Records untouched for this long are evicted
const RECORD_MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleRecord {
    pub last_alert_at: DateTime<Utc>,
    pub alert_count: u32,
}

/// In-memory throttle shared by every dispatch.
///
/// Starts empty on each process start; losing it only means one extra
/// alert after a restart.
pub struct AlertThrottle {
    window: Duration,
    records: Mutex<HashMap<Uuid, ThrottleRecord>>,
}

impl Default for AlertThrottle {
    fn default() -> Self {
        Self::new(ALERT_THROTTLE_MINUTES)
    }
}

impl AlertThrottle {
    pub fn new(window_minutes: i64) -> Self {
        Self { window: Duration::minutes(window_minutes), records: Mutex::new(HashMap::new()) }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a DOWN alert for this monitor must be suppressed right now
    pub fn is_throttled(&self, monitor_id: Uuid) -> bool {
        self.is_throttled_at(monitor_id, Utc::now())
    }

    pub fn is_throttled_at(&self, monitor_id: Uuid, now: DateTime<Utc>) -> bool {
        let records = self.lock();
        records.get(&monitor_id).is_some_and(|record| now.signed_duration_since(record.last_alert_at) < self.window)
    }

    /// Note a delivered DOWN alert and drop stale records
    pub fn record_alert(&self, monitor_id: Uuid) {
        self.record_alert_at(monitor_id, Utc::now());
    }

    pub fn record_alert_at(&self, monitor_id: Uuid, now: DateTime<Utc>) {
        let mut records = self.lock();

        let count = records.get(&monitor_id).map_or(0, |r| r.alert_count);
        records.insert(monitor_id, ThrottleRecord { last_alert_at: now, alert_count: count + 1 });

        let max_age = Duration::hours(RECORD_MAX_AGE_HOURS);
        records.retain(|_, record| now.signed_duration_since(record.last_alert_at) <= max_age);
    }

    pub fn record(&self, monitor_id: Uuid) -> Option<ThrottleRecord> {
        self.lock().get(&monitor_id).copied()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ThrottleRecord>> {
        // The map holds plain data; a panic elsewhere cannot leave it half-updated.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_monitor_is_not_throttled() {
        let throttle = AlertThrottle::default();
        assert!(!throttle.is_throttled(Uuid::new_v4()));
        assert!(throttle.is_empty());
    }

    #[test]
    fn test_window_boundaries() {
        let throttle = AlertThrottle::default();
        let monitor = Uuid::new_v4();
        let t0 = Utc::now();

        throttle.record_alert_at(monitor, t0);
        assert!(throttle.is_throttled_at(monitor, t0 + Duration::minutes(14)));
        assert!(!throttle.is_throttled_at(monitor, t0 + Duration::minutes(15)));
        assert!(!throttle.is_throttled_at(Uuid::new_v4(), t0));
    }

    #[test]
    fn test_alert_count_accumulates() {
        let throttle = AlertThrottle::new(1);
        let monitor = Uuid::new_v4();
        let t0 = Utc::now();

        throttle.record_alert_at(monitor, t0);
        throttle.record_alert_at(monitor, t0 + Duration::minutes(20));

        let record = throttle.record(monitor).unwrap();
        assert_eq!(record.alert_count, 2);
        assert_eq!(record.last_alert_at, t0 + Duration::minutes(20));
    }

    #[test]
    fn test_stale_records_evicted_on_update() {
        let throttle = AlertThrottle::default();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        let t0 = Utc::now();

        throttle.record_alert_at(stale, t0);
        throttle.record_alert_at(fresh, t0 + Duration::hours(25));

        assert_eq!(throttle.len(), 1);
        assert!(throttle.record(stale).is_none());
        assert!(throttle.record(fresh).is_some());
    }
}
