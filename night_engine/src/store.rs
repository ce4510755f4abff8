//! The storage collaborator interface.
//!
//! Persistence is external to the engine: every mutation is a single
//! request/response operation against a [`Store`], and the engine performs no
//! retries of its own. [`MemoryStore`] is the reference implementation used
//! by tests and by offline tabulation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use snafu::Snafu;

use crate::types::{Ballot, Candidate, CandidateId, MovieRef, Night, NightId, UserId};

/// Failures reported by a [`Store`].
#[derive(Debug, Snafu)]
pub enum StoreError {
    /// A row with the same key already exists. Callers creating nights must
    /// treat this as success (two first submissions may race).
    #[snafu(display("duplicate key: night {night} already exists"))]
    DuplicateKey { night: NightId },

    /// A candidate with the same id already exists.
    #[snafu(display("duplicate candidate id {candidate}"))]
    DuplicateCandidate { candidate: CandidateId },

    /// The night does not exist.
    #[snafu(display("night {night} not found"))]
    NightNotFound { night: NightId },

    /// The candidate does not exist, or is not owned by the given user.
    #[snafu(display("candidate {candidate} not found for owner {owner}"))]
    CandidateNotFound {
        candidate: CandidateId,
        owner: UserId,
    },

    /// The backing store cannot be reached. Propagated as-is.
    #[snafu(display("storage unavailable: {message}"))]
    Unavailable { message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for ballot listing. An empty filter selects every ballot.
#[derive(Debug, Clone, Default)]
pub struct BallotFilter {
    pub user: Option<UserId>,
    pub candidates: Option<Vec<CandidateId>>,
}

impl BallotFilter {
    fn matches(&self, ballot: &Ballot) -> bool {
        if let Some(user) = self.user {
            if ballot.user != user {
                return false;
            }
        }
        if let Some(cands) = &self.candidates {
            if !cands.contains(&ballot.candidate) {
                return false;
            }
        }
        true
    }
}

/// The narrow storage surface the engine relies on.
///
/// Conflicting writes to the same row are assumed to be serialized by the
/// implementation; the engine holds no locks.
pub trait Store {
    fn get_night(&self, id: NightId) -> StoreResult<Option<Night>>;

    /// Creates a night with no decided movie. Fails with
    /// [`StoreError::DuplicateKey`] if the night already exists.
    fn create_night(&mut self, id: NightId, created_at: DateTime<Utc>) -> StoreResult<Night>;

    /// Candidates of a night, in insertion order.
    fn list_candidates(&self, night: NightId) -> StoreResult<Vec<Candidate>>;

    fn create_candidate(
        &mut self,
        night: NightId,
        user: UserId,
        movie: MovieRef,
    ) -> StoreResult<Candidate>;

    /// Deletes a candidate, but only if `owner` submitted it. Ballots cast
    /// for the candidate are left behind; the tally filters them.
    fn delete_candidate(&mut self, id: CandidateId, owner: UserId) -> StoreResult<()>;

    fn list_ballots(&self, filter: &BallotFilter) -> StoreResult<Vec<Ballot>>;

    /// Deletes all of `user`'s ballots referencing the given candidates.
    /// Deleting nothing is not an error.
    fn delete_ballots(&mut self, user: UserId, candidates: &[CandidateId]) -> StoreResult<()>;

    fn insert_ballots(&mut self, ballots: &[Ballot]) -> StoreResult<()>;
}

/// In-memory [`Store`]. Insertion order of candidates is preserved, which is
/// the order the tally uses for tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nights: BTreeMap<NightId, Night>,
    candidates: Vec<Candidate>,
    ballots: Vec<Ballot>,
    next_candidate_id: u64,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Seeds a candidate with an explicit id, for snapshot loading.
    /// Fails with [`StoreError::DuplicateCandidate`] on an id collision.
    pub fn seed_candidate(&mut self, candidate: Candidate) -> StoreResult<()> {
        if self.candidates.iter().any(|c| c.id == candidate.id) {
            return Err(StoreError::DuplicateCandidate {
                candidate: candidate.id,
            });
        }
        self.next_candidate_id = self.next_candidate_id.max(candidate.id.0 + 1);
        self.candidates.push(candidate);
        Ok(())
    }

    pub fn nights(&self) -> impl Iterator<Item = &Night> {
        self.nights.values()
    }
}

impl Store for MemoryStore {
    fn get_night(&self, id: NightId) -> StoreResult<Option<Night>> {
        Ok(self.nights.get(&id).cloned())
    }

    fn create_night(&mut self, id: NightId, created_at: DateTime<Utc>) -> StoreResult<Night> {
        if self.nights.contains_key(&id) {
            return Err(StoreError::DuplicateKey { night: id });
        }
        let night = Night {
            id,
            created_at,
            decided: None,
        };
        self.nights.insert(id, night.clone());
        Ok(night)
    }

    fn list_candidates(&self, night: NightId) -> StoreResult<Vec<Candidate>> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.night == night)
            .cloned()
            .collect())
    }

    fn create_candidate(
        &mut self,
        night: NightId,
        user: UserId,
        movie: MovieRef,
    ) -> StoreResult<Candidate> {
        let candidate = Candidate {
            id: CandidateId(self.next_candidate_id),
            night,
            submitted_by: user,
            movie,
        };
        self.next_candidate_id += 1;
        self.candidates.push(candidate.clone());
        Ok(candidate)
    }

    fn delete_candidate(&mut self, id: CandidateId, owner: UserId) -> StoreResult<()> {
        let before = self.candidates.len();
        self.candidates
            .retain(|c| !(c.id == id && c.submitted_by == owner));
        if self.candidates.len() == before {
            return Err(StoreError::CandidateNotFound {
                candidate: id,
                owner,
            });
        }
        Ok(())
    }

    fn list_ballots(&self, filter: &BallotFilter) -> StoreResult<Vec<Ballot>> {
        Ok(self
            .ballots
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect())
    }

    fn delete_ballots(&mut self, user: UserId, candidates: &[CandidateId]) -> StoreResult<()> {
        self.ballots
            .retain(|b| !(b.user == user && candidates.contains(&b.candidate)));
        Ok(())
    }

    fn insert_ballots(&mut self, ballots: &[Ballot]) -> StoreResult<()> {
        self.ballots.extend_from_slice(ballots);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
    }

    #[test]
    fn create_night_rejects_duplicates() {
        let mut store = MemoryStore::new();
        store.create_night(NightId(3), now()).unwrap();
        let err = store.create_night(NightId(3), now()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { night: NightId(3) }));
    }

    #[test]
    fn delete_candidate_checks_ownership() {
        let mut store = MemoryStore::new();
        let cand = store
            .create_candidate(NightId(1), UserId(7), MovieRef("tt0111161".to_string()))
            .unwrap();
        assert!(store.delete_candidate(cand.id, UserId(8)).is_err());
        store.delete_candidate(cand.id, UserId(7)).unwrap();
        assert!(store.list_candidates(NightId(1)).unwrap().is_empty());
    }

    #[test]
    fn withdrawn_candidate_leaves_ballots_behind() {
        let mut store = MemoryStore::new();
        let cand = store
            .create_candidate(NightId(1), UserId(7), MovieRef("tt0068646".to_string()))
            .unwrap();
        store
            .insert_ballots(&[Ballot {
                candidate: cand.id,
                user: UserId(9),
                rank: 1,
            }])
            .unwrap();
        store.delete_candidate(cand.id, UserId(7)).unwrap();
        let orphans = store.list_ballots(&BallotFilter::default()).unwrap();
        assert_eq!(orphans.len(), 1);
    }

    #[test]
    fn ballot_filter_selects_by_user_and_candidate_set() {
        let mut store = MemoryStore::new();
        store
            .insert_ballots(&[
                Ballot {
                    candidate: CandidateId(1),
                    user: UserId(1),
                    rank: 1,
                },
                Ballot {
                    candidate: CandidateId(2),
                    user: UserId(1),
                    rank: 2,
                },
                Ballot {
                    candidate: CandidateId(1),
                    user: UserId(2),
                    rank: 1,
                },
            ])
            .unwrap();
        let filter = BallotFilter {
            user: Some(UserId(1)),
            candidates: Some(vec![CandidateId(1)]),
        };
        let found = store.list_ballots(&filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user, UserId(1));
        assert_eq!(found[0].candidate, CandidateId(1));
    }
}
