//! Creating and updating schedule records.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigureError;
use crate::record::{PeriodType, ScheduleRecord};

/// Requested changes for one event. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub period_seconds: Option<u64>,
    pub period_type: Option<PeriodType>,
    pub enabled: Option<bool>,
    pub description: Option<String>,
    /// Day the first heartbeat is expected (UTC).
    pub initial_date: Option<NaiveDate>,
    /// Time of day the first heartbeat is expected (UTC).
    pub initial_time: Option<NaiveTime>,
}

/// Resolve the first expected due time from the requested date/time.
///
/// The date defaults to today. When only a time is given and that time has
/// already passed today, the anchor moves to tomorrow so that a freshly
/// configured event does not start out late.
pub fn resolve_anchor(
    initial_date: Option<NaiveDate>,
    initial_time: Option<NaiveTime>,
    now: DateTime<Utc>,
) -> Result<Option<i64>, ConfigureError> {
    if initial_date.is_none() && initial_time.is_none() {
        return Ok(None);
    }

    let mut date = initial_date.unwrap_or_else(|| now.date_naive());
    if let (None, Some(time)) = (initial_date, initial_time) {
        if now.time() > time {
            date = date
                .checked_add_days(Days::new(1))
                .ok_or(ConfigureError::InvalidAnchor)?;
        }
    }

    let time = initial_time.unwrap_or(NaiveTime::MIN);
    Ok(Some(date.and_time(time).and_utc().timestamp()))
}

/// Apply `request` to the stored record for `name`, or build a new one.
///
/// New records need a period and a period type and start with a zero error
/// count. Updates never touch the error count.
pub fn apply_configuration(
    existing: Option<&ScheduleRecord>,
    name: &str,
    request: &ConfigureRequest,
    now: DateTime<Utc>,
) -> Result<ScheduleRecord, ConfigureError> {
    if request.period_seconds == Some(0) {
        return Err(ConfigureError::ZeroPeriod);
    }

    let mut record = match existing {
        Some(current) => current.clone(),
        None => {
            let period = request.period_seconds.ok_or(ConfigureError::PeriodRequired)?;
            let period_type = request.period_type.ok_or(ConfigureError::PeriodTypeRequired)?;
            ScheduleRecord::with_schedule(name, period, period_type)
        }
    };

    if let Some(period) = request.period_seconds {
        record.period_seconds = Some(period);
    }
    if let Some(period_type) = request.period_type {
        record.period_type = Some(period_type);
    }
    if let Some(enabled) = request.enabled {
        record.enabled = enabled;
    }
    if let Some(description) = &request.description {
        record.description = Some(description.clone());
    }

    if let Some(anchor) = resolve_anchor(request.initial_date, request.initial_time, now)? {
        let period = record
            .period_seconds
            .ok_or(ConfigureError::AnchorWithoutPeriod)?;
        let period = i64::try_from(period).map_err(|_| ConfigureError::InvalidAnchor)?;
        record.next_block_time = Some(anchor);
        record.last_block_time = Some(
            anchor
                .checked_sub(period)
                .ok_or(ConfigureError::InvalidAnchor)?,
        );
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap().timestamp()
    }

    #[test]
    fn create_with_anchor() {
        let request = ConfigureRequest {
            period_seconds: Some(1),
            period_type: Some(PeriodType::Fixed),
            enabled: Some(true),
            description: Some("desc".into()),
            initial_date: NaiveDate::from_ymd_opt(2010, 1, 1),
            initial_time: NaiveTime::from_hms_opt(1, 2, 0),
        };
        let record = apply_configuration(None, "newName", &request, noon()).unwrap();
        assert_eq!(record.name, "newName");
        assert_eq!(record.period_seconds, Some(1));
        assert_eq!(record.period_type, Some(PeriodType::Fixed));
        assert!(record.enabled);
        assert_eq!(record.description.as_deref(), Some("desc"));
        assert_eq!(record.error_count, 0);
        assert_eq!(record.next_block_time, Some(ts(2010, 1, 1, 1, 2)));
        assert_eq!(record.last_block_time, Some(ts(2010, 1, 1, 1, 2) - 1));
    }

    #[test]
    fn create_requires_period_and_type() {
        let request = ConfigureRequest {
            period_type: Some(PeriodType::Rolling),
            ..Default::default()
        };
        assert_eq!(
            apply_configuration(None, "x", &request, noon()),
            Err(ConfigureError::PeriodRequired)
        );

        let request = ConfigureRequest {
            period_seconds: Some(60),
            ..Default::default()
        };
        assert_eq!(
            apply_configuration(None, "x", &request, noon()),
            Err(ConfigureError::PeriodTypeRequired)
        );
    }

    #[test]
    fn create_defaults_to_enabled() {
        let request = ConfigureRequest {
            period_seconds: Some(60),
            period_type: Some(PeriodType::Rolling),
            ..Default::default()
        };
        let record = apply_configuration(None, "x", &request, noon()).unwrap();
        assert!(record.enabled);
        assert_eq!(record.next_block_time, None);
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let mut existing = ScheduleRecord::with_schedule("Test", 1, PeriodType::Rolling);
        existing.description = Some("desc".into());
        existing.error_count = 2;

        let request = ConfigureRequest {
            period_seconds: Some(2),
            enabled: Some(true),
            ..Default::default()
        };
        let record = apply_configuration(Some(&existing), "Test", &request, noon()).unwrap();
        assert_eq!(record.period_seconds, Some(2));
        assert_eq!(record.period_type, Some(PeriodType::Rolling));
        assert_eq!(record.description.as_deref(), Some("desc"));
        assert_eq!(record.error_count, 2);
    }

    #[test]
    fn date_only_anchors_at_midnight() {
        let existing = ScheduleRecord::with_schedule("Test", 1, PeriodType::Rolling);
        let request = ConfigureRequest {
            period_seconds: Some(3),
            enabled: Some(false),
            period_type: Some(PeriodType::Fixed),
            initial_date: NaiveDate::from_ymd_opt(2010, 1, 1),
            ..Default::default()
        };
        let record = apply_configuration(Some(&existing), "Test", &request, noon()).unwrap();
        assert!(!record.enabled);
        assert_eq!(record.next_block_time, Some(ts(2010, 1, 1, 0, 0)));
        assert_eq!(record.last_block_time, Some(ts(2010, 1, 1, 0, 0) - 3));
    }

    #[test]
    fn time_only_later_today() {
        let anchor = resolve_anchor(None, NaiveTime::from_hms_opt(13, 30, 0), noon()).unwrap();
        assert_eq!(anchor, Some(ts(2024, 3, 10, 13, 30)));
    }

    #[test]
    fn time_only_already_passed_moves_to_tomorrow() {
        let anchor = resolve_anchor(None, NaiveTime::from_hms_opt(1, 2, 0), noon()).unwrap();
        assert_eq!(anchor, Some(ts(2024, 3, 11, 1, 2)));
    }

    #[test]
    fn no_anchor_requested() {
        assert_eq!(resolve_anchor(None, None, noon()), Ok(None));
    }

    #[test]
    fn zero_period_rejected() {
        let request = ConfigureRequest {
            period_seconds: Some(0),
            period_type: Some(PeriodType::Fixed),
            ..Default::default()
        };
        assert_eq!(
            apply_configuration(None, "x", &request, noon()),
            Err(ConfigureError::ZeroPeriod)
        );
    }

    #[test]
    fn anchor_on_record_without_period() {
        let existing = ScheduleRecord::new("blank");
        let request = ConfigureRequest {
            initial_date: NaiveDate::from_ymd_opt(2010, 1, 1),
            ..Default::default()
        };
        assert_eq!(
            apply_configuration(Some(&existing), "blank", &request, noon()),
            Err(ConfigureError::AnchorWithoutPeriod)
        );
    }
}
