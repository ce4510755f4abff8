//! Submission bookkeeping for the active night.
//!
//! Nights are created lazily and idempotently the first time a submission
//! targets them. Two concurrent first submissions may both observe a missing
//! night and both attempt creation; the loser of that race sees
//! [`StoreError::DuplicateKey`] and treats the other caller's row as its own
//! success.

use chrono::{DateTime, Utc};
use log::debug;
use snafu::prelude::*;

use crate::error::{EngineResult, NotCandidateOwnerSnafu, QuotaExceededSnafu, StorageSnafu};
use crate::store::{Store, StoreError};
use crate::types::{Candidate, CandidateId, MovieRef, Night, NightId, UserId, MAX_SUBMISSIONS};

/// Fetches the night, creating it with no decided movie if absent.
pub fn ensure_night<S: Store>(
    store: &mut S,
    id: NightId,
    now: DateTime<Utc>,
) -> EngineResult<Night> {
    if let Some(night) = store.get_night(id).context(StorageSnafu)? {
        return Ok(night);
    }
    match store.create_night(id, now) {
        Ok(night) => {
            debug!("ensure_night: created night {}", id);
            Ok(night)
        }
        Err(StoreError::DuplicateKey { .. }) => {
            // Lost the check-then-create race; the other caller's row wins.
            debug!("ensure_night: night {} created concurrently", id);
            store
                .get_night(id)
                .context(StorageSnafu)?
                .ok_or(StoreError::NightNotFound { night: id })
                .context(StorageSnafu)
        }
        Err(e) => Err(e).context(StorageSnafu),
    }
}

/// Records a new candidate for `user` in `night`, enforcing the per-user
/// quota of [`MAX_SUBMISSIONS`] live candidates.
///
/// Identical movie references are not de-duplicated: two users may submit
/// the same film as distinct candidates.
pub fn submit<S: Store>(
    store: &mut S,
    night: NightId,
    user: UserId,
    movie: MovieRef,
    now: DateTime<Utc>,
) -> EngineResult<Candidate> {
    ensure_night(store, night, now)?;
    let owned = store
        .list_candidates(night)
        .context(StorageSnafu)?
        .iter()
        .filter(|c| c.submitted_by == user)
        .count();
    ensure!(
        owned < MAX_SUBMISSIONS,
        QuotaExceededSnafu {
            user,
            night,
            limit: MAX_SUBMISSIONS,
        }
    );
    store.create_candidate(night, user, movie).context(StorageSnafu)
}

/// Withdraws one of `user`'s own candidates. Ballots already cast for it are
/// not purged; the tally treats them as orphans and ignores them.
pub fn withdraw<S: Store>(
    store: &mut S,
    candidate: CandidateId,
    user: UserId,
) -> EngineResult<()> {
    match store.delete_candidate(candidate, user) {
        Ok(()) => Ok(()),
        Err(StoreError::CandidateNotFound { .. }) => {
            NotCandidateOwnerSnafu { candidate, user }.fail()
        }
        Err(e) => Err(e).context(StorageSnafu),
    }
}
