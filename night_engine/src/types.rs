// ********* Core data model ***********

use std::fmt::Display;

use chrono::{DateTime, Utc};

/// The maximum number of live submissions a single user may own in one night.
pub const MAX_SUBMISSIONS: usize = 2;

/// Identifier of one weekly cycle. Derived from elapsed weeks since a fixed
/// anchor date, never below 1. See [`crate::phase::night_for`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct NightId(pub u32);

impl Display for NightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a participant. Issued by the surrounding application
/// (authentication is out of scope for the engine).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct UserId(pub u64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a submitted candidate, assigned by the store.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u64);

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External movie identifier. Opaque to the engine; it is only carried
/// around as a tally-time label and resolved for display through
/// [`crate::metadata::CandidateMetadata`].
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct MovieRef(pub String);

impl Display for MovieRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of operations that is currently legal.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Phase {
    /// Submitting and withdrawing candidates is open.
    Submission,
    /// Editing and submitting rankings is open.
    Voting,
    /// The outcome may be revealed.
    Winner,
}

/// One weekly cycle. Created lazily the first time a submission targets it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Night {
    pub id: NightId,
    pub created_at: DateTime<Utc>,
    /// Filled once an outcome has been recorded by the surrounding
    /// application. The engine itself never writes this field.
    pub decided: Option<CandidateId>,
}

/// A submission competing for one night's outcome.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub night: NightId,
    pub submitted_by: UserId,
    pub movie: MovieRef,
}

/// One voter's rank assignment to one candidate.
///
/// Invariant: for a given (user, night), the ranks across all of that user's
/// ballots form a dense sequence 1..k with no gaps or duplicates. The engine
/// only ever writes ballots through [`crate::ranking`], which materializes
/// dense ranks wholesale.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub candidate: CandidateId,
    pub user: UserId,
    pub rank: u32,
}

/// The derived result of tallying one night. Never stored.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Outcome {
    Winner(Candidate),
    /// The candidate pool was empty, or every candidate was eliminated
    /// without a majority ever being reached.
    NoWinner,
}
