//! Heartbeat evaluation.
//!
//! [`evaluate_heartbeat`] turns the stored record (if any) and a heartbeat
//! time into the record to write back and the alert to raise. It never
//! touches a store; the caller reads, evaluates, writes and dispatches.

use crate::error::PolicyError;
use crate::notification::NotificationKind;
use crate::period;
use crate::record::ScheduleRecord;

/// Result of evaluating one heartbeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// No record exists for the name.
    UnknownEvent,
    /// The record cannot be advanced.
    Misconfigured(PolicyError),
    /// Older than the last accepted heartbeat; drop it.
    Stale,
    /// Write `record` back and raise `notification` if set.
    Accepted {
        record: ScheduleRecord,
        notification: Option<NotificationKind>,
    },
}

impl HeartbeatOutcome {
    /// The alert this outcome calls for, if any.
    pub fn notification(&self) -> Option<NotificationKind> {
        match self {
            Self::UnknownEvent | Self::Misconfigured(_) => Some(NotificationKind::ConfigError),
            Self::Stale => None,
            Self::Accepted { notification, .. } => *notification,
        }
    }
}

pub fn evaluate_heartbeat(current: Option<&ScheduleRecord>, event_time: i64) -> HeartbeatOutcome {
    let Some(current) = current else {
        return HeartbeatOutcome::UnknownEvent;
    };

    let Some(period_seconds) = current.period_seconds else {
        return HeartbeatOutcome::Misconfigured(PolicyError::MissingPeriod);
    };
    let Some(period_type) = current.period_type else {
        return HeartbeatOutcome::Misconfigured(PolicyError::MissingPeriodType);
    };

    if current.is_stale(event_time) {
        return HeartbeatOutcome::Stale;
    }

    let notification = if current.enabled && current.is_overdue_at(event_time) {
        if current.error_count == 0 {
            Some(NotificationKind::Late)
        } else {
            Some(NotificationKind::Up)
        }
    } else {
        None
    };

    let block = match period::advance(period_type, period_seconds, current.last_block_time, event_time) {
        Ok(block) => block,
        Err(e) => return HeartbeatOutcome::Misconfigured(e),
    };

    let record = ScheduleRecord {
        last_block_time: Some(block.last_block_time),
        next_block_time: Some(block.next_block_time),
        last_success_time: Some(event_time),
        error_count: 0,
        ..current.clone()
    };

    HeartbeatOutcome::Accepted { record, notification }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PeriodType;

    fn scheduled(period_type: PeriodType) -> ScheduleRecord {
        ScheduleRecord {
            last_block_time: Some(5),
            next_block_time: Some(10),
            last_success_time: Some(5),
            ..ScheduleRecord::with_schedule("job", 5, period_type)
        }
    }

    fn accepted(outcome: HeartbeatOutcome) -> (ScheduleRecord, Option<NotificationKind>) {
        match outcome {
            HeartbeatOutcome::Accepted { record, notification } => (record, notification),
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn fixed_on_time() {
        let (record, notification) = accepted(evaluate_heartbeat(Some(&scheduled(PeriodType::Fixed)), 8));
        assert_eq!(record.last_block_time, Some(10));
        assert_eq!(record.next_block_time, Some(15));
        assert_eq!(record.last_success_time, Some(8));
        assert_eq!(notification, None);
    }

    #[test]
    fn fixed_late_first_time() {
        let (record, notification) = accepted(evaluate_heartbeat(Some(&scheduled(PeriodType::Fixed)), 12));
        assert_eq!(record.last_block_time, Some(15));
        assert_eq!(record.next_block_time, Some(20));
        assert_eq!(record.last_success_time, Some(12));
        assert_eq!(notification, Some(NotificationKind::Late));
    }

    #[test]
    fn rolling_recovers_after_down() {
        let mut current = scheduled(PeriodType::Rolling);
        current.error_count = 1;
        let (record, notification) = accepted(evaluate_heartbeat(Some(&current), 12));
        assert_eq!(notification, Some(NotificationKind::Up));
        assert_eq!(record.error_count, 0);
        assert_eq!(record.last_block_time, Some(12));
        assert_eq!(record.next_block_time, Some(17));
    }

    #[test]
    fn exact_deadline_is_on_time() {
        let (_, notification) = accepted(evaluate_heartbeat(Some(&scheduled(PeriodType::Fixed)), 10));
        assert_eq!(notification, None);
    }

    #[test]
    fn disabled_never_alerts_but_still_advances() {
        let mut current = scheduled(PeriodType::Rolling);
        current.enabled = false;
        current.error_count = 4;
        let (record, notification) = accepted(evaluate_heartbeat(Some(&current), 50));
        assert_eq!(notification, None);
        assert_eq!(record.next_block_time, Some(55));
        assert_eq!(record.error_count, 0);
        assert!(!record.enabled);
    }

    #[test]
    fn stale_heartbeat_is_ignored() {
        let current = scheduled(PeriodType::Rolling);
        assert_eq!(evaluate_heartbeat(Some(&current), 1), HeartbeatOutcome::Stale);
        assert_eq!(HeartbeatOutcome::Stale.notification(), None);
    }

    #[test]
    fn equal_to_last_success_is_accepted() {
        let current = scheduled(PeriodType::Rolling);
        let (record, _) = accepted(evaluate_heartbeat(Some(&current), 5));
        assert_eq!(record.last_success_time, Some(5));
    }

    #[test]
    fn unknown_event() {
        let outcome = evaluate_heartbeat(None, 1);
        assert_eq!(outcome, HeartbeatOutcome::UnknownEvent);
        assert_eq!(outcome.notification(), Some(NotificationKind::ConfigError));
    }

    #[test]
    fn blank_record_is_misconfigured() {
        let outcome = evaluate_heartbeat(Some(&ScheduleRecord::new("blank")), 1);
        assert_eq!(outcome, HeartbeatOutcome::Misconfigured(PolicyError::MissingPeriod));
        assert_eq!(outcome.notification(), Some(NotificationKind::ConfigError));
    }

    #[test]
    fn missing_period_type_is_misconfigured() {
        let mut current = ScheduleRecord::new("half");
        current.period_seconds = Some(60);
        assert_eq!(
            evaluate_heartbeat(Some(&current), 1),
            HeartbeatOutcome::Misconfigured(PolicyError::MissingPeriodType)
        );
    }

    #[test]
    fn unrecognized_discipline_suppresses_late() {
        let mut current = scheduled(PeriodType::Unrecognized);
        current.next_block_time = Some(1);
        let outcome = evaluate_heartbeat(Some(&current), 100);
        assert_eq!(outcome, HeartbeatOutcome::Misconfigured(PolicyError::UnknownDiscipline));
        assert_eq!(outcome.notification(), Some(NotificationKind::ConfigError));
    }

    #[test]
    fn first_heartbeat_on_new_record() {
        let mut current = ScheduleRecord::with_schedule("test", 1, PeriodType::Rolling);
        current.description = Some("desc".into());
        let (record, notification) = accepted(evaluate_heartbeat(Some(&current), 50));
        assert_eq!(record.last_block_time, Some(50));
        assert_eq!(record.next_block_time, Some(51));
        assert_eq!(record.last_success_time, Some(50));
        assert_eq!(record.description.as_deref(), Some("desc"));
        assert_eq!(notification, None);
    }

    #[test]
    fn stale_after_newer_leaves_state_alone() {
        let current = scheduled(PeriodType::Fixed);
        let (after_first, _) = accepted(evaluate_heartbeat(Some(&current), 30));
        for earlier in [0, 6, 29] {
            assert_eq!(evaluate_heartbeat(Some(&after_first), earlier), HeartbeatOutcome::Stale);
        }
    }
}
