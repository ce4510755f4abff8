//! Phase scheduling.
//!
//! The schedule is a pure function of wall-clock time: every caller
//! re-evaluates it independently, and no shared signal synchronizes
//! participants. The weekday table below is the single source of truth;
//! [`next_transition`] is derived from the same table, so user-facing
//! messaging cannot disagree with operation gating.
//!
//! Weekly schedule (UTC):
//! - Sunday, Monday: submissions are open
//! - Tuesday, Wednesday: voting is open
//! - Thursday: the winner is revealed
//! - Friday, Saturday: voting (late ballot edits for the closing week)

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};

use crate::types::{NightId, Phase};

/// 2021-06-27T00:00:00Z, a Sunday. Nights are counted in whole weeks from
/// this instant.
const ANCHOR_UNIX: i64 = 1_624_752_000;

const WEEK_SECONDS: i64 = 7 * 24 * 3600;

/// The active night at the given instant: `ceil(weeks since anchor)`,
/// floored at 1. Monotonically non-decreasing in `now`.
pub fn night_for(now: DateTime<Utc>) -> NightId {
    let elapsed = now.timestamp() - ANCHOR_UNIX;
    // Ceiling division; euclidean ops keep partial weeks before the anchor
    // from rounding towards zero.
    let weeks = elapsed.div_euclid(WEEK_SECONDS) + i64::from(elapsed.rem_euclid(WEEK_SECONDS) > 0);
    NightId(weeks.max(1) as u32)
}

/// The phase at the given instant.
pub fn phase_at(now: DateTime<Utc>) -> Phase {
    phase_for_weekday(now.weekday())
}

fn phase_for_weekday(day: Weekday) -> Phase {
    match day {
        Weekday::Sun | Weekday::Mon => Phase::Submission,
        Weekday::Thu => Phase::Winner,
        _ => Phase::Voting,
    }
}

/// The next instant at which [`phase_at`] changes value: the first upcoming
/// UTC midnight whose weekday maps to a different phase.
pub fn next_transition(now: DateTime<Utc>) -> DateTime<Utc> {
    let current = phase_at(now);
    for offset in 1..=7 {
        let day = now.date_naive() + Duration::days(offset);
        if phase_for_weekday(day.weekday()) != current {
            return day.and_time(NaiveTime::MIN).and_utc();
        }
    }
    // Unreachable: the weekly table always changes phase within seven days.
    now
}
