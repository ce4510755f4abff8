//! The engine context.
//!
//! All engine state lives in one explicit object passed to each operation:
//! the storage collaborator, a clock, and the sticky administrative phase
//! override. Phase, night, candidate and ballot snapshots are read fresh on
//! every call; nothing is cached across an unbounded lifetime.

use chrono::{DateTime, Utc};
use log::info;
use snafu::prelude::*;

use crate::error::{EngineResult, InvalidPhaseSnafu, StaleRankingSnafu, StorageSnafu};
use crate::ledger;
use crate::phase;
use crate::ranking::RankingDraft;
use crate::store::{BallotFilter, Store};
use crate::tally;
use crate::types::{Candidate, CandidateId, MovieRef, NightId, Outcome, Phase, UserId};

/// Wall-clock source, injectable so tests can pin the schedule.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock in UTC.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// The decision engine for the active movie night.
///
/// The engine has no internal threads and no locks: every operation is a
/// synchronous request/response exchange with the store, and conflicting
/// writes are assumed to be serialized there.
pub struct Engine<S, C = SystemClock> {
    store: S,
    clock: C,
    /// Sticky administrative override. Replaces the computed phase outright
    /// until cleared; intended for manual operation, not for participants.
    phase_override: Option<Phase>,
}

impl<S: Store> Engine<S, SystemClock> {
    pub fn new(store: S) -> Engine<S, SystemClock> {
        Engine::with_clock(store, SystemClock)
    }
}

impl<S: Store, C: Clock> Engine<S, C> {
    pub fn with_clock(store: S, clock: C) -> Engine<S, C> {
        Engine {
            store,
            clock,
            phase_override: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The currently legal operation set.
    pub fn current_phase(&self) -> Phase {
        self.phase_override
            .unwrap_or_else(|| phase::phase_at(self.clock.now()))
    }

    /// The active night id.
    pub fn current_night(&self) -> NightId {
        phase::night_for(self.clock.now())
    }

    /// When the computed phase next changes, for user-facing messaging.
    pub fn next_transition(&self) -> DateTime<Utc> {
        phase::next_transition(self.clock.now())
    }

    pub fn override_phase(&mut self, phase: Phase) {
        info!("engine: phase override set to {:?}", phase);
        self.phase_override = Some(phase);
    }

    pub fn clear_phase_override(&mut self) {
        info!("engine: phase override cleared");
        self.phase_override = None;
    }

    fn require_phase(&self, required: Phase) -> EngineResult<()> {
        let actual = self.current_phase();
        ensure!(actual == required, InvalidPhaseSnafu { required, actual });
        Ok(())
    }

    /// Submits a movie for the active night. Legal in the submission phase.
    pub fn submit(&mut self, user: UserId, movie: MovieRef) -> EngineResult<Candidate> {
        self.require_phase(Phase::Submission)?;
        let night = self.current_night();
        let now = self.clock.now();
        ledger::submit(&mut self.store, night, user, movie, now)
    }

    /// Withdraws one of the user's own candidates. Legal in the submission
    /// phase.
    pub fn withdraw(&mut self, user: UserId, candidate: CandidateId) -> EngineResult<()> {
        self.require_phase(Phase::Submission)?;
        ledger::withdraw(&mut self.store, candidate, user)
    }

    /// Opens a ranking edit session for the active night, seeded from the
    /// user's last-submitted ordering. Legal in the voting phase.
    pub fn start_ranking(&self, user: UserId) -> EngineResult<RankingDraft> {
        self.require_phase(Phase::Voting)?;
        RankingDraft::seed(&self.store, user, self.current_night())
    }

    /// Persists a ranking draft, replacing the user's previous ballots for
    /// the night. Legal in the voting phase, and only for a draft seeded
    /// against the still-active night: a draft held open across a week
    /// boundary may not rewrite a past night's ballots.
    pub fn submit_ranking(&mut self, draft: &RankingDraft) -> EngineResult<()> {
        self.require_phase(Phase::Voting)?;
        let active = self.current_night();
        ensure!(
            draft.night() == active,
            StaleRankingSnafu {
                night: draft.night(),
                active,
            }
        );
        draft.submit(&mut self.store)?;
        Ok(())
    }

    /// Tallies the given night and reveals its outcome. Legal in the winner
    /// phase; the outcome is the only state exposed then.
    pub fn reveal(&self, night: NightId) -> EngineResult<Outcome> {
        self.require_phase(Phase::Winner)?;
        let candidates = self.store.list_candidates(night).context(StorageSnafu)?;
        let filter = BallotFilter {
            user: None,
            candidates: Some(candidates.iter().map(|c| c.id).collect()),
        };
        let ballots = self.store.list_ballots(&filter).context(StorageSnafu)?;
        let result = tally::run_tally(&candidates, &ballots);
        info!(
            "reveal: night {} tallied over {} rounds, winner: {:?}",
            night,
            result.rounds.len(),
            result.winner
        );
        let outcome = result
            .winner
            .and_then(|cid| candidates.iter().find(|c| c.id == cid))
            .map_or(Outcome::NoWinner, |c| Outcome::Winner(c.clone()));
        Ok(outcome)
    }
}
