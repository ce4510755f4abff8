//! Instant-runoff tallying.
//!
//! The tally is stateless and pure: it copies the rank data it is given,
//! never mutates the caller's ballots, and yields the same outcome for the
//! same snapshot. Elimination runs at most one round per candidate, so the
//! whole computation is bounded by O(candidates²) over the ballot count.

use std::collections::{HashMap, HashSet};
use std::iter::Sum;
use std::ops::AddAssign;

use log::debug;

use crate::types::{Ballot, Candidate, CandidateId, UserId};

/// A count of first-place ballots.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct VoteCount(pub u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

/// First-place counts for one elimination round, in candidate order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundTally {
    pub counts: Vec<(CandidateId, VoteCount)>,
    /// The candidate removed at the end of this round, or `None` on the
    /// round that produced a winner.
    pub eliminated: Option<CandidateId>,
}

/// The full audit trail of one tally.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyResult {
    pub winner: Option<CandidateId>,
    pub rounds: Vec<RoundTally>,
}

/// Reduces a candidate set and its ranked ballots to a single winner.
///
/// Candidates are scanned in the order given by the caller; that order
/// decides ties both at the majority boundary and at elimination. Ballots
/// referencing a candidate outside `candidates` (left behind by a withdrawn
/// submission) are silently dropped.
///
/// Returns no winner when `candidates` is empty or every candidate is
/// eliminated without a majority — including the degenerate sole survivor
/// with zero first-place ballots, which is eliminated on its own round
/// rather than declared winner by default.
pub fn run_tally(candidates: &[Candidate], ballots: &[Ballot]) -> TallyResult {
    let mut remaining: Vec<CandidateId> = candidates.iter().map(|c| c.id).collect();
    let known: HashSet<CandidateId> = remaining.iter().copied().collect();

    // Local copy: elimination rewrites ranks, and the caller keeps its ballots.
    let mut pool: Vec<Ballot> = ballots
        .iter()
        .filter(|b| known.contains(&b.candidate))
        .cloned()
        .collect();

    let mut rounds: Vec<RoundTally> = Vec::new();

    while !remaining.is_empty() {
        let counts: Vec<(CandidateId, VoteCount)> = remaining
            .iter()
            .map(|&cid| {
                let count = pool
                    .iter()
                    .filter(|b| b.candidate == cid && b.rank == 1)
                    .count() as u64;
                (cid, VoteCount(count))
            })
            .collect();
        let total: VoteCount = counts.iter().map(|(_, vc)| *vc).sum();
        debug!(
            "run_tally: round {} counts: {:?} total: {:?}",
            rounds.len() + 1,
            counts,
            total
        );

        // Majority check: strictly more than half of the first-place votes,
        // first qualifying candidate in order. A true majority is unique, so
        // the order only matters at the exact boundary.
        if let Some(&(winner, _)) = counts.iter().find(|(_, vc)| vc.0 * 2 > total.0) {
            debug!("run_tally: {} holds a majority, done", winner);
            rounds.push(RoundTally {
                counts,
                eliminated: None,
            });
            return TallyResult {
                winner: Some(winner),
                rounds,
            };
        }

        // No majority: eliminate the first candidate holding the minimum
        // count and redistribute its voters' next preferences.
        let min_count = counts
            .iter()
            .map(|(_, vc)| *vc)
            .min()
            .unwrap_or(VoteCount::EMPTY);
        let eliminated = counts
            .iter()
            .find(|(_, vc)| *vc == min_count)
            .map(|(cid, _)| *cid);
        let Some(eliminated) = eliminated else {
            // Cannot happen while `remaining` is non-empty.
            break;
        };
        debug!(
            "run_tally: no majority, eliminating {} with {:?} first-place votes",
            eliminated, min_count
        );

        remaining.retain(|&cid| cid != eliminated);
        pool = collapse_ranks(&pool, eliminated);
        rounds.push(RoundTally {
            counts,
            eliminated: Some(eliminated),
        });
    }

    TallyResult {
        winner: None,
        rounds,
    }
}

/// Removes the eliminated candidate's ballots and compacts every affected
/// voter's remaining ranks, so each voter's sequence stays dense from 1 and
/// their next preference moves up to first place.
fn collapse_ranks(pool: &[Ballot], eliminated: CandidateId) -> Vec<Ballot> {
    let dropped_rank: HashMap<UserId, u32> = pool
        .iter()
        .filter(|b| b.candidate == eliminated)
        .map(|b| (b.user, b.rank))
        .collect();

    pool.iter()
        .filter(|b| b.candidate != eliminated)
        .map(|b| {
            let mut ballot = b.clone();
            if let Some(&gone) = dropped_rank.get(&ballot.user) {
                if ballot.rank > gone {
                    ballot.rank -= 1;
                }
            }
            ballot
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MovieRef;
    use crate::types::NightId;

    fn candidate(id: u64) -> Candidate {
        Candidate {
            id: CandidateId(id),
            night: NightId(1),
            submitted_by: UserId(id),
            movie: MovieRef(format!("tt{:07}", id)),
        }
    }

    fn ballot(candidate: u64, user: u64, rank: u32) -> Ballot {
        Ballot {
            candidate: CandidateId(candidate),
            user: UserId(user),
            rank,
        }
    }

    /// A full ranking over the given candidates for one user.
    fn ranking(user: u64, order: &[u64]) -> Vec<Ballot> {
        order
            .iter()
            .enumerate()
            .map(|(idx, &cid)| ballot(cid, user, idx as u32 + 1))
            .collect()
    }

    #[test]
    fn empty_candidate_pool_has_no_winner() {
        let res = run_tally(&[], &[ballot(1, 1, 1)]);
        assert_eq!(res.winner, None);
        assert!(res.rounds.is_empty());
    }

    #[test]
    fn strict_majority_wins_on_the_first_round() {
        let candidates = vec![candidate(1), candidate(2)];
        let mut ballots = Vec::new();
        for user in 1..=3 {
            ballots.extend(ranking(user, &[1, 2]));
        }
        ballots.extend(ranking(4, &[2, 1]));
        let res = run_tally(&candidates, &ballots);
        assert_eq!(res.winner, Some(CandidateId(1)));
        assert_eq!(res.rounds.len(), 1);
        assert_eq!(res.rounds[0].eliminated, None);
    }

    #[test]
    fn exactly_half_is_not_a_majority() {
        // Two candidates at 1-1: no majority, the first in order is
        // eliminated, then the survivor wins with the transferred vote.
        let candidates = vec![candidate(1), candidate(2)];
        let mut ballots = ranking(1, &[1, 2]);
        ballots.extend(ranking(2, &[2, 1]));
        let res = run_tally(&candidates, &ballots);
        assert_eq!(res.rounds[0].eliminated, Some(CandidateId(1)));
        assert_eq!(res.winner, Some(CandidateId(2)));
    }

    #[test]
    fn round_scenario_redistributes_eliminated() {
        // A: 5 first-place, B: 3, C: 2, total 10. A has no strict majority,
        // C is eliminated, C's voters fall back to B, and B still trails A;
        // B is eliminated next and A wins.
        let candidates = vec![candidate(1), candidate(2), candidate(3)];
        let mut ballots = Vec::new();
        for user in 1..=5 {
            ballots.extend(ranking(user, &[1, 2, 3]));
        }
        for user in 6..=8 {
            ballots.extend(ranking(user, &[2, 3, 1]));
        }
        for user in 9..=10 {
            ballots.extend(ranking(user, &[3, 2, 1]));
        }
        let res = run_tally(&candidates, &ballots);
        assert_eq!(res.rounds[0].eliminated, Some(CandidateId(3)));
        // After redistribution: A 5, B 5. Still no strict majority of 10.
        assert_eq!(
            res.rounds[1].counts,
            vec![
                (CandidateId(1), VoteCount(5)),
                (CandidateId(2), VoteCount(5))
            ]
        );
        assert_eq!(res.rounds[1].eliminated, Some(CandidateId(1)));
        assert_eq!(res.winner, Some(CandidateId(2)));
    }

    #[test]
    fn elimination_tie_removes_the_earlier_candidate() {
        let candidates = vec![candidate(1), candidate(2), candidate(3)];
        let mut ballots = Vec::new();
        ballots.extend(ranking(1, &[1, 3, 2]));
        ballots.extend(ranking(2, &[2, 3, 1]));
        ballots.extend(ranking(3, &[3, 1, 2]));
        ballots.extend(ranking(4, &[3, 2, 1]));
        // First round is 1-1-2 out of 4: no majority. Candidates 1 and 2
        // tie at the minimum; 1 comes first in the caller-supplied order
        // and must be the one eliminated.
        let res = run_tally(&candidates, &ballots);
        assert_eq!(res.rounds[0].eliminated, Some(CandidateId(1)));
        assert_eq!(res.winner, Some(CandidateId(3)));
    }

    #[test]
    fn sole_candidate_with_a_ballot_wins_trivially() {
        let candidates = vec![candidate(1)];
        let ballots = ranking(1, &[1]);
        let res = run_tally(&candidates, &ballots);
        assert_eq!(res.winner, Some(CandidateId(1)));
    }

    #[test]
    fn sole_candidate_with_zero_ballots_is_not_a_winner() {
        let candidates = vec![candidate(1)];
        let res = run_tally(&candidates, &[]);
        assert_eq!(res.winner, None);
        assert_eq!(res.rounds.len(), 1);
        assert_eq!(res.rounds[0].eliminated, Some(CandidateId(1)));
    }

    #[test]
    fn orphaned_ballots_are_ignored() {
        let candidates = vec![candidate(1), candidate(2)];
        let mut ballots = Vec::new();
        ballots.extend(ranking(1, &[1, 2]));
        ballots.extend(ranking(2, &[1, 2]));
        // User 3 ranked a since-withdrawn candidate first; only the orphaned
        // ballot is dropped, their second choice keeps its recorded rank.
        ballots.push(ballot(99, 3, 1));
        ballots.push(ballot(2, 3, 2));
        let res = run_tally(&candidates, &ballots);
        assert_eq!(res.winner, Some(CandidateId(1)));
        assert_eq!(
            res.rounds[0].counts,
            vec![
                (CandidateId(1), VoteCount(2)),
                (CandidateId(2), VoteCount(0))
            ]
        );
    }

    #[test]
    fn tally_does_not_mutate_the_callers_ballots() {
        let candidates = vec![candidate(1), candidate(2), candidate(3)];
        let mut ballots = Vec::new();
        ballots.extend(ranking(1, &[1, 2, 3]));
        ballots.extend(ranking(2, &[2, 1, 3]));
        ballots.extend(ranking(3, &[3, 2, 1]));
        let before = ballots.clone();
        let first = run_tally(&candidates, &ballots);
        assert_eq!(ballots, before);
        // Same snapshot, same outcome.
        assert_eq!(run_tally(&candidates, &ballots), first);
    }

    #[test]
    fn collapse_compacts_only_the_affected_voter() {
        let pool = vec![
            ballot(1, 1, 1),
            ballot(2, 1, 2),
            ballot(3, 1, 3),
            ballot(3, 2, 1),
            ballot(1, 2, 2),
        ];
        // Eliminate candidate 2: user 1's third choice moves up, user 2
        // never ranked it and keeps their ranks.
        let collapsed = collapse_ranks(&pool, CandidateId(2));
        assert!(collapsed.contains(&ballot(1, 1, 1)));
        assert!(collapsed.contains(&ballot(3, 1, 2)));
        assert!(collapsed.contains(&ballot(3, 2, 1)));
        assert!(collapsed.contains(&ballot(1, 2, 2)));
        assert_eq!(collapsed.len(), 4);
    }
}
