use chrono::{DateTime, TimeZone, Utc};
use sha2::{Digest, Sha256};

use crate::model::report::SharedInfo;

/// The atom of consumption in the privacy-budget ledger. Two reports whose
/// shared_info derives the same key and window share budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrivacyBudgetUnit {
    /// 64-hex SHA-256 over the budget-relevant shared_info fields.
    pub key: String,

    /// Hour-truncated scheduled report time.
    pub scheduled_time: DateTime<Utc>,
}

impl PrivacyBudgetUnit {
    pub fn new(key: impl Into<String>, scheduled_time: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            scheduled_time,
        }
    }
}

/// Truncates an instant to the start of its hour.
pub fn truncate_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    let secs = instant.timestamp();
    Utc.timestamp_opt(secs - secs.rem_euclid(3600), 0)
        .single()
        .unwrap_or(instant)
}

/// Derives the budget unit for a report. The field encoding below is the
/// ledger contract: changing it silently decouples new runs from budget
/// already consumed under the old encoding.
pub fn derive_budget_unit(shared_info: &SharedInfo) -> PrivacyBudgetUnit {
    let window = truncate_to_hour(shared_info.scheduled_report_time);
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "api={}\norigin={}\nwindow={}\ndestination={}\nversion={}",
        shared_info.api,
        shared_info.reporting_origin,
        window.to_rfc3339(),
        shared_info.attribution_destination.as_deref().unwrap_or(""),
        shared_info.version,
    ));
    PrivacyBudgetUnit {
        key: hex::encode(hasher.finalize()),
        scheduled_time: window,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn shared_info(report_id: &str, time: DateTime<Utc>) -> SharedInfo {
        SharedInfo {
            api: "attribution-reporting".to_string(),
            version: "0.1".to_string(),
            report_id: report_id.to_string(),
            reporting_origin: "https://adtech.example".to_string(),
            scheduled_report_time: time,
            attribution_destination: Some("https://shoes.example".to_string()),
            debug_mode: None,
        }
    }

    #[test]
    fn same_envelope_different_report_id_shares_budget() {
        let t = Utc.with_ymd_and_hms(2021, 1, 1, 10, 0, 0).unwrap();
        let a = derive_budget_unit(&shared_info("report-a", t));
        let b = derive_budget_unit(&shared_info("report-b", t));
        assert_eq!(a, b);
    }

    #[test]
    fn window_is_hour_truncated() {
        let in_hour = Utc.with_ymd_and_hms(2021, 1, 1, 10, 42, 17).unwrap();
        let hour = Utc.with_ymd_and_hms(2021, 1, 1, 10, 0, 0).unwrap();
        let unit = derive_budget_unit(&shared_info("report", in_hour));
        assert_eq!(unit.scheduled_time, hour);
        assert_eq!(unit, derive_budget_unit(&shared_info("report", hour)));
    }

    #[test]
    fn different_hours_are_different_units() {
        let a = derive_budget_unit(&shared_info(
            "report",
            Utc.with_ymd_and_hms(2021, 1, 1, 10, 0, 0).unwrap(),
        ));
        let b = derive_budget_unit(&shared_info(
            "report",
            Utc.with_ymd_and_hms(2021, 1, 1, 11, 0, 0).unwrap(),
        ));
        assert_ne!(a, b);
    }

    #[test]
    fn key_is_64_hex() {
        let unit = derive_budget_unit(&shared_info(
            "report",
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        ));
        assert_eq!(unit.key.len(), 64);
        assert!(unit.key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
