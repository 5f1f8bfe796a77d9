//! Next-deadline arithmetic for the supported period disciplines.
//!
//! Pure functions only: callers pass the current block and the heartbeat
//! time and get the new block back.

use crate::error::PolicyError;
use crate::record::PeriodType;

/// A schedule block: `[last_block_time, next_block_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub last_block_time: i64,
    pub next_block_time: i64,
}

/// Compute the block that follows a heartbeat at `event_time`.
///
/// Rolling restarts the window at the heartbeat. Fixed snaps forward to the
/// first grid point at or after the heartbeat, always moving at least one
/// period, so a very late heartbeat skips missed slots instead of leaving a
/// backlog. An unanchored fixed grid is anchored at the first heartbeat.
pub fn advance(
    period_type: PeriodType,
    period_seconds: u64,
    last_block_time: Option<i64>,
    event_time: i64,
) -> Result<Block, PolicyError> {
    if period_seconds == 0 {
        return Err(PolicyError::ZeroPeriod);
    }
    let period = i64::try_from(period_seconds).map_err(|_| PolicyError::Overflow)?;

    let last = match (period_type, last_block_time) {
        (PeriodType::Rolling, _) | (PeriodType::Fixed, None) => event_time,
        (PeriodType::Fixed, Some(anchor)) => {
            let periods = periods_to_reach(anchor, period, event_time);
            periods
                .checked_mul(period)
                .and_then(|offset| anchor.checked_add(offset))
                .ok_or(PolicyError::Overflow)?
        }
        (PeriodType::Unrecognized, _) => return Err(PolicyError::UnknownDiscipline),
    };

    let next = last.checked_add(period).ok_or(PolicyError::Overflow)?;
    Ok(Block {
        last_block_time: last,
        next_block_time: next,
    })
}

/// Smallest `k >= 1` with `anchor + period * k >= event_time`.
fn periods_to_reach(anchor: i64, period: i64, event_time: i64) -> i64 {
    let behind = i128::from(event_time) - i128::from(anchor);
    if behind <= i128::from(period) {
        return 1;
    }
    let period = i128::from(period);
    let k = (behind + period - 1) / period;
    i64::try_from(k).unwrap_or(i64::MAX)
}
