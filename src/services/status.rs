//! Expiry status classification
//!
//! The classifier is the single source of truth for how a raw expiry date
//! (plus optional time-of-day) maps onto `valid` / `expiring_soon` /
//! `expired`. It is a pure function: "now" is injected by the caller,
//! never sampled internally, so every call site and every test sees the
//! same rules.
//!
//! Status is re-derived on every read. Persisting a classification would
//! let it go stale as the clock crosses midnight, so nothing in the system
//! trusts a stored status.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::PolicyConfig;
use crate::models::{ExpiryStatus, ValidityRecord};

/// Classification policy.
///
/// The expiring-soon window has varied between 1 and 7 days across product
/// iterations; it is a configuration value, defaulting to 7.
#[derive(Debug, Clone, Copy)]
pub struct StatusPolicy {
    /// Days ahead (inclusive) within which a record counts as expiring soon
    pub threshold_days: i64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self { threshold_days: 7 }
    }
}

impl From<&PolicyConfig> for StatusPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            threshold_days: config.expiring_soon_days,
        }
    }
}

/// Classify an expiry date against the given instant.
///
/// Rules, in order:
/// - expiry date before today: expired, regardless of any time
/// - expiry date today with a recorded time: expired once the wall clock
///   passes it, expiring soon until then
/// - expiry date today without a time: expiring soon (nothing to compare
///   the clock against)
/// - expiry date within `threshold_days`: expiring soon
/// - otherwise: valid
///
/// The time-of-day is only ever consulted for same-day records.
pub fn classify(
    expiry_date: NaiveDate,
    expiry_time: Option<NaiveTime>,
    now: NaiveDateTime,
    policy: &StatusPolicy,
) -> ExpiryStatus {
    let diff_days = (expiry_date - now.date()).num_days();

    if diff_days < 0 {
        return ExpiryStatus::Expired;
    }

    if diff_days == 0 {
        if let Some(time) = expiry_time {
            if now.time() > time {
                return ExpiryStatus::Expired;
            }
        }
        return ExpiryStatus::ExpiringSoon;
    }

    if diff_days <= policy.threshold_days {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Valid
    }
}

/// Classify a record against the given instant
pub fn classify_record(
    record: &ValidityRecord,
    now: NaiveDateTime,
    policy: &StatusPolicy,
) -> ExpiryStatus {
    classify(record.expiry_date, record.expiry_time(), now, policy)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (2020i32..2030, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn time_strategy() -> impl Strategy<Value = NaiveTime> {
        (0u32..24, 0u32..60).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    proptest! {
        /// Any date strictly before today classifies as expired, no matter
        /// what time is attached or what the threshold is.
        #[test]
        fn property_past_dates_always_expired(
            today in date_strategy(),
            days_past in 1i64..1000,
            now_time in time_strategy(),
            expiry_time in proptest::option::of(time_strategy()),
            threshold in 0i64..30,
        ) {
            let policy = StatusPolicy { threshold_days: threshold };
            let now = today.and_time(now_time);
            let status = classify(today - Duration::days(days_past), expiry_time, now, &policy);
            prop_assert_eq!(status, ExpiryStatus::Expired);
        }

        /// Any date strictly beyond the threshold classifies as valid.
        #[test]
        fn property_far_future_always_valid(
            today in date_strategy(),
            days_beyond in 1i64..1000,
            now_time in time_strategy(),
            expiry_time in proptest::option::of(time_strategy()),
            threshold in 0i64..30,
        ) {
            let policy = StatusPolicy { threshold_days: threshold };
            let now = today.and_time(now_time);
            let expiry = today + Duration::days(threshold + days_beyond);
            let status = classify(expiry, expiry_time, now, &policy);
            prop_assert_eq!(status, ExpiryStatus::Valid);
        }

        /// Same-day classification only ever yields expired or expiring
        /// soon, decided by comparing the clock against the recorded time.
        #[test]
        fn property_same_day_never_valid(
            today in date_strategy(),
            now_time in time_strategy(),
            expiry_time in proptest::option::of(time_strategy()),
            threshold in 0i64..30,
        ) {
            let policy = StatusPolicy { threshold_days: threshold };
            let now = today.and_time(now_time);
            let status = classify(today, expiry_time, now, &policy);
            prop_assert_ne!(status, ExpiryStatus::Valid);
            match expiry_time {
                Some(t) if now.time() > t => prop_assert_eq!(status, ExpiryStatus::Expired),
                _ => prop_assert_eq!(status, ExpiryStatus::ExpiringSoon),
            }
        }
    }
}
