//! Offline tabulation over store snapshots.
//!
//! The driver reads a snapshot file, reports the schedule as of the
//! requested instant, tabulates one night, and optionally checks the
//! summary against a reference file.

use log::{info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;

use chrono::{DateTime, Utc};
use night_engine::{
    next_transition, night_for, phase_at, run_tally, BallotFilter, CandidateId, MemoryStore,
    NightId, Store, StoreError, TallyResult,
};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::driver::snapshot::{Catalog, Snapshot};

pub mod snapshot;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DriverError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid --at timestamp {value}"))]
    ParsingTimestamp {
        source: chrono::ParseError,
        value: String,
    },
    #[snafu(display("night {night} is not present in the snapshot"))]
    UnknownNight { night: u32 },
    #[snafu(display(""))]
    Store { source: StoreError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Builds the summary document: per-round first-place tallies with catalog
/// labels, the eliminated candidate of each round, and the winner.
fn summary_to_json(
    night: NightId,
    result: &TallyResult,
    store: &MemoryStore,
    catalog: &Catalog,
) -> DriverResult<JSValue> {
    let candidates = store.list_candidates(night).context(StoreSnafu)?;
    let label = |cid: CandidateId| -> String {
        candidates
            .iter()
            .find(|c| c.id == cid)
            .map(|c| catalog.label(&c.movie))
            .unwrap_or_else(|| cid.to_string())
    };

    let mut rounds: Vec<JSValue> = Vec::new();
    for (idx, round) in result.rounds.iter().enumerate() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for &(cid, count) in &round.counts {
            tally.insert(label(cid), json!(count.0.to_string()));
        }
        let eliminated = round.eliminated.map(label);
        rounds.push(json!({
            "round": idx + 1,
            "tally": tally,
            "eliminated": eliminated,
        }));
    }

    Ok(json!({
        "night": night.0,
        "winner": result.winner.map(label),
        "rounds": rounds,
    }))
}

fn read_reference(path: &str) -> DriverResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu)
}

pub fn run(args: &Args) -> DriverResult<()> {
    let at: DateTime<Utc> = match &args.at {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .context(ParsingTimestampSnafu {
                value: value.clone(),
            })?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let contents = fs::read_to_string(&args.input).context(OpeningJsonSnafu {
        path: args.input.clone(),
    })?;
    let snap: Snapshot = serde_json::from_str(&contents).context(ParsingJsonSnafu)?;
    let store = snap.build_store()?;
    let catalog = Catalog::new(snap.movies.clone());

    println!("phase: {:?}", phase_at(at));
    println!("active night: {}", night_for(at));
    println!("next transition: {}", next_transition(at).to_rfc3339());
    if args.status {
        return Ok(());
    }

    let night = match args.night {
        Some(n) => NightId(n),
        None => match snap.latest_night() {
            Some(id) => id,
            None => whatever!("The snapshot contains no nights to tabulate"),
        },
    };
    let candidates = store.list_candidates(night).context(StoreSnafu)?;
    let night_known = store.get_night(night).context(StoreSnafu)?.is_some();
    if candidates.is_empty() && !night_known {
        return UnknownNightSnafu { night: night.0 }.fail();
    }
    info!(
        "run: tabulating night {} with {} candidates",
        night,
        candidates.len()
    );

    let filter = BallotFilter {
        user: None,
        candidates: Some(candidates.iter().map(|c| c.id).collect()),
    };
    let ballots = store.list_ballots(&filter).context(StoreSnafu)?;
    let result = run_tally(&candidates, &ballots);
    info!("run: result {:?}", result);

    let result_js = summary_to_json(night, &result, &store, &catalog)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu)?;
    println!("stats:{}", pretty_js_stats);

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        let summary_ref = read_reference(reference_path)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu)?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::snapshot::{BallotRow, CandidateRow, MovieRow, NightRow, Snapshot};
    use super::*;
    use chrono::TimeZone;
    use night_engine::CandidateMetadata;

    fn movie(id: &str, title: &str) -> MovieRow {
        MovieRow {
            external_id: id.to_string(),
            title: title.to_string(),
            release_date: None,
            overview: None,
            poster_ref: None,
            runtime_minutes: None,
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            nights: vec![NightRow {
                id: 1,
                created_at: Utc.with_ymd_and_hms(2026, 8, 23, 0, 0, 0).unwrap(),
            }],
            candidates: vec![
                CandidateRow {
                    id: 1,
                    night: 1,
                    submitted_by: 10,
                    movie: "tt0111161".to_string(),
                },
                CandidateRow {
                    id: 2,
                    night: 1,
                    submitted_by: 11,
                    movie: "tt0068646".to_string(),
                },
            ],
            ballots: vec![
                BallotRow {
                    candidate: 1,
                    user: 20,
                    rank: 1,
                },
                BallotRow {
                    candidate: 2,
                    user: 20,
                    rank: 2,
                },
                BallotRow {
                    candidate: 1,
                    user: 21,
                    rank: 1,
                },
                BallotRow {
                    candidate: 2,
                    user: 22,
                    rank: 1,
                },
            ],
            movies: vec![
                movie("tt0111161", "The Shawshank Redemption"),
                movie("tt0068646", "The Godfather"),
            ],
        }
    }

    #[test]
    fn snapshot_round_trips_through_the_store() {
        let snap = sample_snapshot();
        let store = snap.build_store().unwrap();
        assert_eq!(store.list_candidates(NightId(1)).unwrap().len(), 2);
        assert_eq!(
            store.list_ballots(&BallotFilter::default()).unwrap().len(),
            4
        );
        assert_eq!(snap.latest_night(), Some(NightId(1)));
    }

    #[test]
    fn summary_labels_candidates_through_the_catalog() {
        let snap = sample_snapshot();
        let store = snap.build_store().unwrap();
        let catalog = Catalog::new(snap.movies.clone());
        let candidates = store.list_candidates(NightId(1)).unwrap();
        let ballots = store.list_ballots(&BallotFilter::default()).unwrap();
        let result = run_tally(&candidates, &ballots);
        let js = summary_to_json(NightId(1), &result, &store, &catalog).unwrap();
        assert_eq!(js["winner"], json!("The Shawshank Redemption"));
        assert_eq!(js["night"], json!(1));
        assert_eq!(
            js["rounds"][0]["tally"]["The Shawshank Redemption"],
            json!("2")
        );
        assert_eq!(js["rounds"][0]["eliminated"], JSValue::Null);
    }

    #[test]
    fn catalog_search_is_case_insensitive() {
        let catalog = Catalog::new(sample_snapshot().movies);
        let hits = catalog.search("godfather").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].external_id, "tt0068646");
        assert!(catalog.search("alien").unwrap().is_empty());
    }

    #[test]
    fn unknown_movie_refs_fall_back_to_the_raw_reference() {
        let catalog = Catalog::new(Vec::new());
        let label = catalog.label(&night_engine::MovieRef("tt9999999".to_string()));
        assert_eq!(label, "tt9999999");
    }

    #[test]
    fn empty_snapshot_parses_with_defaults() {
        let snap: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.nights.is_empty());
        assert_eq!(snap.latest_night(), None);
    }

    #[test]
    fn snapshot_fields_use_camel_case() {
        let raw = r#"{
            "nights": [{"id": 1, "createdAt": "2026-08-23T00:00:00Z"}],
            "candidates": [{"id": 1, "night": 1, "submittedBy": 10, "movie": "tt0111161"}],
            "ballots": [{"candidate": 1, "user": 20, "rank": 1}],
            "movies": [{"externalId": "tt0111161", "title": "The Shawshank Redemption",
                        "releaseDate": "1994-09-23", "overview": null, "posterRef": null,
                        "runtimeMinutes": 142}]
        }"#;
        let snap: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snap.candidates[0].submitted_by, 10);
        assert_eq!(snap.movies[0].runtime_minutes, Some(142));
    }
}
