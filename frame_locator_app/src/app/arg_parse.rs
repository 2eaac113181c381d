use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use frame_locator_lib::{DEFAULT_MAX_DISTANCE, DEFAULT_MAX_RESULTS};

/// Index video episodes into a fingerprint table, and locate which
/// episode and frame a screenshot was taken from.
#[derive(Parser, Debug)]
#[command(name = "frame_locator", version, about)]
pub struct Cli {
    /// Only print warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug information.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fingerprint a video file at 6 frames per second and emit one
    /// record per sampled frame.
    Index(IndexArgs),

    /// Search the fingerprint table for the frames closest to an image.
    Query(QueryArgs),
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// The video file to index. Requires ffmpeg on the command line.
    pub video: PathBuf,

    /// Episode number to stamp on every emitted record.
    #[arg(long)]
    pub episode: u16,

    /// Source/series identifier to stamp on every emitted record.
    #[arg(long)]
    pub source: u8,

    /// Write the JSON record array here instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// The query image (any format the image crate can decode).
    pub image: PathBuf,

    /// The fingerprint table to search (JSON record array).
    #[arg(long)]
    pub table: PathBuf,

    /// Reject candidates at this bit distance or more.
    #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE)]
    pub max_distance: u32,

    /// Return at most this many matches.
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub limit: usize,

    /// Print matches as JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

impl Cli {
    pub fn verbosity(&self) -> ReportVerbosity {
        if self.quiet {
            ReportVerbosity::Quiet
        } else if self.verbose {
            ReportVerbosity::Verbose
        } else {
            ReportVerbosity::Default
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn malformed_episode_is_rejected_before_any_work() {
        let result = Cli::try_parse_from([
            "frame_locator",
            "index",
            "ep01.mkv",
            "--episode",
            "not-a-number",
            "--source",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_source_is_rejected() {
        let result = Cli::try_parse_from([
            "frame_locator",
            "index",
            "ep01.mkv",
            "--episode",
            "1",
            "--source",
            "300",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn index_args_parse() {
        let cli = Cli::try_parse_from([
            "frame_locator",
            "index",
            "ep01.mkv",
            "--episode",
            "3",
            "--source",
            "1",
        ])
        .unwrap();

        let Command::Index(args) = cli.command else {
            panic!("expected the index subcommand")
        };
        assert_eq!(args.episode, 3);
        assert_eq!(args.source, 1);
        assert_eq!(args.video, PathBuf::from("ep01.mkv"));
    }

    #[test]
    fn query_defaults_match_the_library_defaults() {
        let cli = Cli::try_parse_from([
            "frame_locator",
            "query",
            "shot.png",
            "--table",
            "table.json",
        ])
        .unwrap();

        let Command::Query(args) = cli.command else {
            panic!("expected the query subcommand")
        };
        assert_eq!(args.max_distance, DEFAULT_MAX_DISTANCE);
        assert_eq!(args.limit, DEFAULT_MAX_RESULTS);
        assert!(!args.json);
    }
}
