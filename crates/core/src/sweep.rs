//! Overdue detection for the periodic sweep.
//!
//! Each missed cycle pushes the next alert one more period out:
//! `next_notify = next_block_time + error_count * period_seconds`.
//! Once `max_notify_count` alerts have gone out the sweep keeps counting
//! but stops alerting until a heartbeat resets the counter.

use crate::record::ScheduleRecord;

/// What the sweep should do with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DowntimeDecision {
    /// Disabled, never scheduled, or not yet due.
    NotDue,
    /// Has a deadline but no period; cannot compute backoff.
    Unschedulable,
    /// Overdue: write `record` and send a Down alert.
    Notify { record: ScheduleRecord },
    /// Overdue past the alert budget: write `record` only.
    Suppressed { record: ScheduleRecord },
}

impl DowntimeDecision {
    /// The record to write back, if the sweep changed it.
    pub fn updated(&self) -> Option<&ScheduleRecord> {
        match self {
            Self::Notify { record } | Self::Suppressed { record } => Some(record),
            Self::NotDue | Self::Unschedulable => None,
        }
    }
}

/// The instant at which the next Down alert for `record` becomes due.
pub fn next_notify_time(record: &ScheduleRecord) -> Option<i64> {
    let next_block = record.next_block_time?;
    let period = i64::try_from(record.period_seconds?).ok()?;
    i64::try_from(record.error_count)
        .ok()?
        .checked_mul(period)
        .and_then(|backoff| next_block.checked_add(backoff))
}

pub fn evaluate_downtime(record: &ScheduleRecord, now: i64, max_notify_count: u32) -> DowntimeDecision {
    if !record.enabled || record.next_block_time.is_none() {
        return DowntimeDecision::NotDue;
    }
    let Some(next_notify) = next_notify_time(record) else {
        return DowntimeDecision::Unschedulable;
    };
    if next_notify > now {
        return DowntimeDecision::NotDue;
    }

    let updated = ScheduleRecord {
        error_count: record.error_count.saturating_add(1),
        ..record.clone()
    };
    if record.error_count < u64::from(max_notify_count) {
        DowntimeDecision::Notify { record: updated }
    } else {
        DowntimeDecision::Suppressed { record: updated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PeriodType;

    fn down(error_count: u64) -> ScheduleRecord {
        ScheduleRecord {
            error_count,
            last_block_time: Some(1),
            next_block_time: Some(6),
            last_success_time: Some(1),
            ..ScheduleRecord::with_schedule("down", 5, PeriodType::Rolling)
        }
    }

    #[test]
    fn overdue_within_budget_notifies() {
        let decision = evaluate_downtime(&down(1), 12, 3);
        match decision {
            DowntimeDecision::Notify { record } => assert_eq!(record.error_count, 2),
            other => panic!("expected Notify, got {other:?}"),
        }
    }

    #[test]
    fn disabled_is_left_alone() {
        let mut record = down(1);
        record.enabled = false;
        assert_eq!(evaluate_downtime(&record, 12, 3), DowntimeDecision::NotDue);
    }

    #[test]
    fn backoff_pushes_next_alert_out() {
        // next_notify = 6 + 2 * 5 = 16
        assert_eq!(next_notify_time(&down(2)), Some(16));
        assert_eq!(evaluate_downtime(&down(2), 15, 3), DowntimeDecision::NotDue);
        assert!(matches!(evaluate_downtime(&down(2), 16, 3), DowntimeDecision::Notify { .. }));
    }

    #[test]
    fn budget_exhausted_still_counts() {
        let decision = evaluate_downtime(&down(3), 1_000, 3);
        match decision {
            DowntimeDecision::Suppressed { record } => assert_eq!(record.error_count, 4),
            other => panic!("expected Suppressed, got {other:?}"),
        }
    }

    #[test]
    fn counter_grows_past_u32_range() {
        let record = ScheduleRecord {
            error_count: u64::from(u32::MAX),
            next_block_time: Some(0),
            ..ScheduleRecord::with_schedule("ancient", 1, PeriodType::Rolling)
        };
        match evaluate_downtime(&record, 5_000_000_000, 3) {
            DowntimeDecision::Suppressed { record } => {
                assert_eq!(record.error_count, u64::from(u32::MAX) + 1)
            }
            other => panic!("expected Suppressed, got {other:?}"),
        }
    }

    #[test]
    fn unscheduled_record_is_not_due() {
        let record = ScheduleRecord::with_schedule("test", 1, PeriodType::Rolling);
        assert_eq!(evaluate_downtime(&record, i64::MAX, 3), DowntimeDecision::NotDue);
    }

    #[test]
    fn due_time_without_period_is_unschedulable() {
        let mut record = ScheduleRecord::new("odd");
        record.next_block_time = Some(1);
        assert_eq!(evaluate_downtime(&record, 100, 3), DowntimeDecision::Unschedulable);
    }

    #[test]
    fn not_yet_due() {
        let mut record = down(0);
        record.next_block_time = Some(105);
        assert_eq!(evaluate_downtime(&record, 100, 3), DowntimeDecision::NotDue);
    }

    #[test]
    fn zero_budget_never_alerts() {
        assert!(matches!(
            evaluate_downtime(&down(0), 100, 0),
            DowntimeDecision::Suppressed { .. }
        ));
    }
}
