//! Errors surfaced by engine operations.
//!
//! Every failure is returned as a typed result; the engine never panics on
//! bad input. Malformed tally input (orphaned ballots) is not an error at
//! all, it is silently filtered (see [`crate::tally`]).

use snafu::Snafu;

use crate::store::StoreError;
use crate::types::{CandidateId, NightId, Phase, UserId};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EngineError {
    /// The user already owns the maximum number of live submissions for the
    /// night. Recoverable; the user can withdraw one first.
    #[snafu(display("user {user} already owns {limit} submissions for night {night}"))]
    QuotaExceeded {
        user: UserId,
        night: NightId,
        limit: usize,
    },

    /// The operation was attempted outside its allowed phase. Recoverable;
    /// surfaced as user guidance.
    #[snafu(display("operation requires the {required:?} phase, current phase is {actual:?}"))]
    InvalidPhase { required: Phase, actual: Phase },

    /// The ranking draft targets a night that is no longer active, for
    /// example when an edit session is held open across a week boundary.
    /// Recoverable; the draft must be re-seeded for the current night.
    #[snafu(display("ranking draft targets night {night}, the active night is {active}"))]
    StaleRanking { night: NightId, active: NightId },

    /// The user tried to withdraw a candidate they did not submit.
    #[snafu(display("candidate {candidate} is not owned by user {user}"))]
    NotCandidateOwner {
        candidate: CandidateId,
        user: UserId,
    },

    /// Ballot replacement was interrupted between delete and insert: the
    /// user currently has no ballots for the night. The whole ranking
    /// submission must be retried; never present this as success.
    #[snafu(display(
        "ballot replacement for user {user} in night {night} was interrupted, resubmit the ranking"
    ))]
    PartialReplacement {
        user: UserId,
        night: NightId,
        source: StoreError,
    },

    /// A storage failure unrelated to the two-step replacement. The engine
    /// performs no retries; retry policy belongs to the caller.
    #[snafu(display("storage operation failed"))]
    Storage { source: StoreError },
}

pub type EngineResult<T> = Result<T, EngineError>;
