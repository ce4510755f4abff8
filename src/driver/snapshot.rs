//! The JSON snapshot input format.
//!
//! A snapshot is an export of the shared store at one instant: the nights,
//! their candidates, the collected ballots, and a small movie catalog used
//! only to label the output. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};
use night_engine::{
    Ballot, Candidate, CandidateId, CandidateMetadata, MemoryStore, MetadataError, MovieDetails,
    MovieRef, MovieSummary, NightId, Store, UserId,
};
use snafu::prelude::*;

use crate::driver::{DriverResult, StoreSnafu};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct NightRow {
    pub id: u32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRow {
    pub id: u64,
    pub night: u32,
    #[serde(rename = "submittedBy")]
    pub submitted_by: u64,
    pub movie: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotRow {
    pub candidate: u64,
    pub user: u64,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MovieRow {
    #[serde(rename = "externalId")]
    pub external_id: String,
    pub title: String,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<String>,
    pub overview: Option<String>,
    #[serde(rename = "posterRef")]
    pub poster_ref: Option<String>,
    #[serde(rename = "runtimeMinutes")]
    pub runtime_minutes: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nights: Vec<NightRow>,
    #[serde(default)]
    pub candidates: Vec<CandidateRow>,
    #[serde(default)]
    pub ballots: Vec<BallotRow>,
    #[serde(default)]
    pub movies: Vec<MovieRow>,
}

impl Snapshot {
    /// Loads the snapshot into a fresh in-memory store. Candidate order in
    /// the file is preserved, which is the order the tally breaks ties in.
    pub fn build_store(&self) -> DriverResult<MemoryStore> {
        let mut store = MemoryStore::new();
        for night in &self.nights {
            store
                .create_night(NightId(night.id), night.created_at)
                .context(StoreSnafu)?;
        }
        for cand in &self.candidates {
            store
                .seed_candidate(Candidate {
                    id: CandidateId(cand.id),
                    night: NightId(cand.night),
                    submitted_by: UserId(cand.submitted_by),
                    movie: MovieRef(cand.movie.clone()),
                })
                .context(StoreSnafu)?;
        }
        let ballots: Vec<Ballot> = self
            .ballots
            .iter()
            .map(|b| Ballot {
                candidate: CandidateId(b.candidate),
                user: UserId(b.user),
                rank: b.rank,
            })
            .collect();
        store.insert_ballots(&ballots).context(StoreSnafu)?;
        Ok(store)
    }

    /// The highest night id present in the snapshot, if any.
    pub fn latest_night(&self) -> Option<NightId> {
        self.nights
            .iter()
            .map(|n| n.id)
            .chain(self.candidates.iter().map(|c| c.night))
            .max()
            .map(NightId)
    }
}

/// The snapshot's movie catalog, exposed through the metadata interface so
/// labelling works the same way it would against a live provider.
pub struct Catalog {
    movies: Vec<MovieRow>,
}

impl Catalog {
    pub fn new(movies: Vec<MovieRow>) -> Catalog {
        Catalog { movies }
    }

    /// Display label for a movie reference: the catalog title, or the raw
    /// reference when the catalog does not know it.
    pub fn label(&self, movie: &MovieRef) -> String {
        match self.fetch_details(&movie.0) {
            Ok(Some(details)) => details.title,
            _ => movie.0.clone(),
        }
    }
}

impl CandidateMetadata for Catalog {
    fn search(&self, query: &str) -> Result<Vec<MovieSummary>, MetadataError> {
        let needle = query.to_lowercase();
        Ok(self
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .map(|m| MovieSummary {
                external_id: m.external_id.clone(),
                title: m.title.clone(),
                release_date: m.release_date.clone(),
            })
            .collect())
    }

    fn fetch_details(&self, external_id: &str) -> Result<Option<MovieDetails>, MetadataError> {
        Ok(self
            .movies
            .iter()
            .find(|m| m.external_id == external_id)
            .map(|m| MovieDetails {
                title: m.title.clone(),
                release_date: m.release_date.clone(),
                overview: m.overview.clone(),
                poster_ref: m.poster_ref.clone(),
                runtime_minutes: m.runtime_minutes,
            }))
    }
}
