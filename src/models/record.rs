//! Validity record model
//!
//! A validity record is one concrete expiry observation: which product,
//! when it expires, and who registered it under which period. The expiry
//! status is a computed view over the record's date and time relative to
//! "now" - it is derived on every read and never persisted as
//! authoritative, since a stored status goes stale the moment the clock
//! crosses a day boundary.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::Period;

/// Derived expiry classification of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// Safely within shelf life
    Valid,
    /// Within the expiring-soon window (or expiring today)
    ExpiringSoon,
    /// Past its expiry date/time
    Expired,
}

impl fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryStatus::Valid => write!(f, "valid"),
            ExpiryStatus::ExpiringSoon => write!(f, "expiring_soon"),
            ExpiryStatus::Expired => write!(f, "expired"),
        }
    }
}

impl FromStr for ExpiryStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(ExpiryStatus::Valid),
            "expiring_soon" => Ok(ExpiryStatus::ExpiringSoon),
            "expired" => Ok(ExpiryStatus::Expired),
            _ => Err(anyhow::anyhow!("Invalid expiry status: {}", s)),
        }
    }
}

/// Sentinel used when the operator explicitly registered "no time"
const NO_TIME: &str = "no time";

/// Time-of-day attached to a record, or an explicit "no time" marker.
///
/// Operators either read a printed time off the product or tick a
/// "no time" box; an absent value is not allowed, so this is a tagged
/// value rather than an `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedTime {
    /// A wall-clock time read off the product
    At(NaiveTime),
    /// The operator explicitly recorded that no time is printed
    NotRecorded,
}

impl RecordedTime {
    /// The wall-clock time, if one was recorded
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            RecordedTime::At(t) => Some(*t),
            RecordedTime::NotRecorded => None,
        }
    }
}

impl fmt::Display for RecordedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordedTime::At(t) => write!(f, "{}", t.format("%H:%M")),
            RecordedTime::NotRecorded => write!(f, "{}", NO_TIME),
        }
    }
}

impl FromStr for RecordedTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(NO_TIME) {
            return Ok(RecordedTime::NotRecorded);
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(RecordedTime::At)
            .map_err(|_| anyhow::anyhow!("Invalid recorded time: {}", s))
    }
}

// Stored and serialized as the display string ("HH:MM" or "no time"),
// matching the wire format the clients already speak.
impl Serialize for RecordedTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordedTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One expiry observation tied to a template, a period and an operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidityRecord {
    /// Unique identifier
    pub id: String,
    /// Template this record was created from
    pub template_id: String,
    /// Product name, snapshotted from the template at registration
    pub product_name: String,
    /// Image reference, snapshotted from the template
    pub image_url: String,
    /// Expiry date printed on the product
    pub expiry_date: NaiveDate,
    /// Expiry time-of-day, or an explicit "no time"
    pub recorded_time: RecordedTime,
    /// Check period the record was registered under
    pub period: Period,
    /// Store the record belongs to
    pub store: String,
    /// Id of the registering user
    pub created_by_id: String,
    /// Name of the registering operator
    pub created_by_name: String,
}

impl ValidityRecord {
    /// Expiry time-of-day, if one was recorded
    pub fn expiry_time(&self) -> Option<NaiveTime> {
        self.recorded_time.as_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_time_display() {
        let t = RecordedTime::At(NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(t.to_string(), "08:30");
        assert_eq!(RecordedTime::NotRecorded.to_string(), "no time");
    }

    #[test]
    fn test_recorded_time_parse() {
        assert_eq!(
            RecordedTime::from_str("14:05").unwrap(),
            RecordedTime::At(NaiveTime::from_hms_opt(14, 5, 0).unwrap())
        );
        assert_eq!(
            RecordedTime::from_str("14:05:30").unwrap(),
            RecordedTime::At(NaiveTime::from_hms_opt(14, 5, 30).unwrap())
        );
        assert_eq!(
            RecordedTime::from_str("no time").unwrap(),
            RecordedTime::NotRecorded
        );
        assert_eq!(
            RecordedTime::from_str("No Time").unwrap(),
            RecordedTime::NotRecorded
        );
        assert!(RecordedTime::from_str("25:00").is_err());
        assert!(RecordedTime::from_str("later").is_err());
    }

    #[test]
    fn test_recorded_time_serde_round_trip() {
        let t = RecordedTime::At(NaiveTime::from_hms_opt(21, 15, 0).unwrap());
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"21:15\"");
        assert_eq!(serde_json::from_str::<RecordedTime>(&json).unwrap(), t);

        let json = serde_json::to_string(&RecordedTime::NotRecorded).unwrap();
        assert_eq!(json, "\"no time\"");
        assert_eq!(
            serde_json::from_str::<RecordedTime>(&json).unwrap(),
            RecordedTime::NotRecorded
        );
    }

    #[test]
    fn test_expiry_status_display() {
        assert_eq!(ExpiryStatus::Valid.to_string(), "valid");
        assert_eq!(ExpiryStatus::ExpiringSoon.to_string(), "expiring_soon");
        assert_eq!(ExpiryStatus::Expired.to_string(), "expired");
    }

    #[test]
    fn test_expiry_status_from_str() {
        assert_eq!(
            ExpiryStatus::from_str("expiring_soon").unwrap(),
            ExpiryStatus::ExpiringSoon
        );
        assert!(ExpiryStatus::from_str("stale").is_err());
    }
}
