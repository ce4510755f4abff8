/*!
Decision engine for weekly movie nights.

Every week a fixed group of participants submits movies, ranks the
submissions, and gets a single winner back. This crate is the engine behind
that cycle:

- [`phase`] maps wall-clock time to the currently legal operation set
  (`submission`, `voting`, `winner`) and derives the weekly night id;
- [`ledger`] enforces the per-user submission quota and creates nights
  lazily and idempotently;
- [`ranking`] edits one user's ordering and materializes it into dense
  ranked ballots;
- [`tally`] reduces the ballots to a winner by instant-runoff elimination;
- [`engine`] packages all of it behind one phase-gated context object.

Storage and movie metadata are external collaborators behind the [`store`]
and [`metadata`] traits. The crate assumes a small, trusted voter
population: it optimizes for simplicity and auditability, not
fraud-resistance.

```
use night_engine::{run_tally, Ballot, Candidate, CandidateId, MovieRef, NightId, UserId};

let candidates = vec![
    Candidate {
        id: CandidateId(1),
        night: NightId(1),
        submitted_by: UserId(1),
        movie: MovieRef("tt0111161".to_string()),
    },
    Candidate {
        id: CandidateId(2),
        night: NightId(1),
        submitted_by: UserId(2),
        movie: MovieRef("tt0068646".to_string()),
    },
];
let ballots = vec![
    Ballot { candidate: CandidateId(1), user: UserId(1), rank: 1 },
    Ballot { candidate: CandidateId(2), user: UserId(1), rank: 2 },
    Ballot { candidate: CandidateId(1), user: UserId(2), rank: 1 },
];
let result = run_tally(&candidates, &ballots);
assert_eq!(result.winner, Some(CandidateId(1)));
```
*/

pub mod engine;
pub mod error;
pub mod ledger;
pub mod metadata;
pub mod phase;
pub mod ranking;
pub mod store;
pub mod tally;
mod types;

pub use crate::engine::{Clock, Engine, SystemClock};
pub use crate::error::{EngineError, EngineResult};
pub use crate::metadata::{CandidateMetadata, MetadataError, MovieDetails, MovieSummary};
pub use crate::phase::{next_transition, night_for, phase_at};
pub use crate::ranking::{materialize, reorder, RankingDraft};
pub use crate::store::{BallotFilter, MemoryStore, Store, StoreError, StoreResult};
pub use crate::tally::{run_tally, RoundTally, TallyResult, VoteCount};
pub use crate::types::*;
