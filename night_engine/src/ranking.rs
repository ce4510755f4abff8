//! Ranking edition and ballot materialization.
//!
//! The working ordering is a plain sequence of candidate ids; reordering is
//! a pure move and materialization assigns dense ranks 1..k from positions.
//! Submitting a ranking replaces all of the user's existing ballots for the
//! night wholesale, so resubmitting an unchanged ordering is idempotent.

use log::debug;
use snafu::prelude::*;

use crate::error::{EngineResult, PartialReplacementSnafu, StorageSnafu};
use crate::store::{BallotFilter, Store};
use crate::types::{Ballot, CandidateId, NightId, UserId};

/// Moves the element at `from` to position `to`, shifting the elements in
/// between. Out-of-range indices leave the sequence unchanged; `to` is
/// clamped to the end.
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Vec<T> {
    let mut out = list.to_vec();
    if from >= out.len() {
        return out;
    }
    let item = out.remove(from);
    let to = to.min(out.len());
    out.insert(to, item);
    out
}

/// Dense rank assignment: position 0 becomes rank 1, and so on.
pub fn materialize(list: &[CandidateId]) -> Vec<(CandidateId, u32)> {
    list.iter()
        .enumerate()
        .map(|(idx, &cid)| (cid, idx as u32 + 1))
        .collect()
}

/// One user's working ordering over a night's candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingDraft {
    user: UserId,
    night: NightId,
    order: Vec<CandidateId>,
}

impl RankingDraft {
    /// Seeds the working list from the user's last-submitted ordering, or,
    /// absent one, from all current candidates in fetch order.
    pub fn seed<S: Store>(store: &S, user: UserId, night: NightId) -> EngineResult<RankingDraft> {
        let night_candidates: Vec<CandidateId> = store
            .list_candidates(night)
            .context(StorageSnafu)?
            .iter()
            .map(|c| c.id)
            .collect();
        let filter = BallotFilter {
            user: Some(user),
            candidates: Some(night_candidates.clone()),
        };
        let mut mine = store.list_ballots(&filter).context(StorageSnafu)?;
        let order = if mine.is_empty() {
            night_candidates
        } else {
            mine.sort_by_key(|b| b.rank);
            mine.iter().map(|b| b.candidate).collect()
        };
        Ok(RankingDraft { user, night, order })
    }

    pub fn order(&self) -> &[CandidateId] {
        &self.order
    }

    pub fn night(&self) -> NightId {
        self.night
    }

    pub fn user(&self) -> UserId {
        self.user
    }

    /// Moves one entry of the working list.
    pub fn move_item(&mut self, from: usize, to: usize) {
        self.order = reorder(&self.order, from, to);
    }

    /// Replaces all of the user's ballots for the night with the
    /// materialized working list: delete existing, then insert fresh.
    ///
    /// The two steps are not transactional. If the insert fails after the
    /// delete completed, the user is left with zero ballots for the night
    /// and the failure is reported as
    /// [`EngineError::PartialReplacement`](crate::error::EngineError); the
    /// caller must retry the whole submission.
    pub fn submit<S: Store>(&self, store: &mut S) -> EngineResult<Vec<Ballot>> {
        let night_candidates: Vec<CandidateId> = store
            .list_candidates(self.night)
            .context(StorageSnafu)?
            .iter()
            .map(|c| c.id)
            .collect();
        store
            .delete_ballots(self.user, &night_candidates)
            .context(StorageSnafu)?;
        let fresh: Vec<Ballot> = materialize(&self.order)
            .iter()
            .map(|&(candidate, rank)| Ballot {
                candidate,
                user: self.user,
                rank,
            })
            .collect();
        store.insert_ballots(&fresh).context(PartialReplacementSnafu {
            user: self.user,
            night: self.night,
        })?;
        debug!(
            "submit_ranking: user {} ranked {} candidates for night {}",
            self.user,
            fresh.len(),
            self.night
        );
        Ok(fresh)
    }
}
