//! Day-bounded session records.
//!
//! A stopped timer yields one raw interval which may span local
//! midnights (overnight study). [`split_interval`] turns it into one
//! record per calendar day touched, keeping segments contiguous and
//! total-span-preserving so downstream per-day statistics never double
//! count or lose time.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, RawInterval};

/// One persisted, single-calendar-day slice of a timer interval.
///
/// Immutable once created; the engine only inserts these, never updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub subject_ref: String,
    pub owner_ref: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Local calendar date the segment falls on.
    pub day: NaiveDate,
    pub phase: Phase,
    pub interval_mode: bool,
    pub cycle: u32,
    pub paused_seconds: u64,
}

impl SessionRecord {
    /// Net seconds of the segment (span minus attributed pause).
    pub fn duration_secs(&self) -> u64 {
        let span = (self.end_time - self.start_time).num_seconds().max(0) as u64;
        span.saturating_sub(self.paused_seconds)
    }
}

/// Split a raw interval into calendar-day-bounded records.
///
/// Walks forward from the interval start; each segment ends at the next
/// local midnight or the interval end, whichever comes first. Pause time
/// is attributed entirely to the first segment (deliberately not
/// apportioned across day boundaries). A single-day interval yields
/// exactly one record.
pub fn split_interval<Tz: TimeZone>(
    interval: &RawInterval,
    owner_ref: &str,
    tz: &Tz,
) -> Vec<SessionRecord> {
    let end_ms = interval.end_epoch_ms as i64;
    let mut cur_ms = interval.start_epoch_ms as i64;
    let mut records = Vec::new();

    while cur_ms < end_ms {
        let Some(local) = tz.timestamp_millis_opt(cur_ms).single() else {
            break;
        };
        let day = local.date_naive();
        let next_midnight_ms = day
            .succ_opt()
            .map(|d| d.and_time(NaiveTime::MIN))
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|dt| dt.timestamp_millis())
            // A timezone where midnight does not exist (DST gap) folds
            // the remainder into the current segment.
            .unwrap_or(end_ms);
        let seg_end_ms = if next_midnight_ms > cur_ms {
            next_midnight_ms.min(end_ms)
        } else {
            end_ms
        };

        let (Some(start_time), Some(end_time)) = (
            DateTime::<Utc>::from_timestamp_millis(cur_ms),
            DateTime::<Utc>::from_timestamp_millis(seg_end_ms),
        ) else {
            break;
        };

        records.push(SessionRecord {
            subject_ref: interval.subject_ref.clone(),
            owner_ref: owner_ref.to_string(),
            start_time,
            end_time,
            day,
            phase: interval.phase,
            interval_mode: interval.interval_mode,
            cycle: interval.cycle,
            paused_seconds: if records.is_empty() {
                interval.paused_seconds
            } else {
                0
            },
        });
        cur_ms = seg_end_ms;
    }
    records
}
