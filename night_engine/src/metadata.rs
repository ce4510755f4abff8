//! Movie metadata collaborator interface.
//!
//! Lookup is display-only: the tally never consults it, and the engine
//! treats external ids as opaque labels.

use snafu::Snafu;

/// One search hit, ranked by the provider.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MovieSummary {
    pub external_id: String,
    pub title: String,
    pub release_date: Option<String>,
}

/// Full details for one movie.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MovieDetails {
    pub title: String,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_ref: Option<String>,
    pub runtime_minutes: Option<u32>,
}

#[derive(Debug, Snafu)]
pub enum MetadataError {
    #[snafu(display("metadata provider unavailable: {message}"))]
    ProviderUnavailable { message: String },
}

/// A third-party movie catalog.
pub trait CandidateMetadata {
    /// Ranked search results for a free-text query.
    fn search(&self, query: &str) -> Result<Vec<MovieSummary>, MetadataError>;

    /// Details for one external id, or `None` if the catalog does not know
    /// it.
    fn fetch_details(&self, external_id: &str) -> Result<Option<MovieDetails>, MetadataError>;
}
