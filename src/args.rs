use clap::Parser;

/// Status and tabulation tool for weekly movie-night elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) A JSON snapshot of the nights, candidates, ballots and
    /// movie catalog to tabulate. See the documentation for the format.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (integer, optional) The night to tabulate. Defaults to the latest
    /// night present in the snapshot.
    #[clap(short, long, value_parser)]
    pub night: Option<u32>,

    /// (file path, optional) A reference file containing the expected outcome
    /// in JSON format. If provided, movienight will check that the tabulated
    /// summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (RFC 3339 timestamp, optional) Evaluate the phase and the active night
    /// as of this instant instead of the current time.
    #[clap(long, value_parser)]
    pub at: Option<String>,

    /// If passed as an argument, only print the current phase, night and next
    /// transition, without tabulating.
    #[clap(long, takes_value = false)]
    pub status: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard
    /// output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
