mod arg_parse;
mod errors;

use std::fs::File;
use std::io::BufWriter;

use frame_locator_lib::{
    index_video, locate, FingerprintTable, SearchOptions, INDEX_FPS,
};

use arg_parse::{Cli, Command, IndexArgs, QueryArgs, ReportVerbosity};
use errors::AppError;

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.verbosity());

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            error!("{fatal_error}");
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &Cli) -> Result<(), AppError> {
    match &cfg.command {
        Command::Index(args) => run_index(args),
        Command::Query(args) => run_query(args),
    }
}

fn run_index(args: &IndexArgs) -> Result<(), AppError> {
    info!(
        "indexing {} as episode {} of source {}",
        args.video.display(),
        args.episode,
        args.source
    );

    let outcome = index_video(&args.video, args.episode, args.source)?;

    if !outcome.decoder_exit.is_clean() {
        //frames already emitted are still valid; report and carry on
        warn!("decoder {}", outcome.decoder_exit);
    }
    info!("indexed {} frames", outcome.records.len());

    let table = FingerprintTable::new(outcome.records);
    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| AppError::Output {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            table.to_json_writer(BufWriter::new(file))?;
            info!("wrote {} records to {}", table.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout().lock();
            table.to_json_writer(stdout)?;
        }
    }

    Ok(())
}

fn run_query(args: &QueryArgs) -> Result<(), AppError> {
    let table_file = File::open(&args.table).map_err(|e| AppError::TableOpen {
        path: args.table.clone(),
        reason: e.to_string(),
    })?;
    let table = FingerprintTable::from_json_reader(std::io::BufReader::new(table_file))?;
    info!("loaded {} records from {}", table.len(), args.table.display());

    let img = image::open(&args.image)
        .map_err(|e| AppError::ImageLoad(e.to_string()))?
        .to_rgba8();

    let opts = SearchOptions {
        max_distance: args.max_distance,
        max_results: args.limit,
    };

    //a resize failure aborts only this query; the table stays valid
    let matches = locate(&table, &img, &opts)?;

    if args.json {
        let stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(stdout, &matches)
            .map_err(|e| AppError::Output {
                path: "-".into(),
                reason: e.to_string(),
            })?;
        println!();
        return Ok(());
    }

    if matches.is_empty() {
        //an empty match list is a valid answer, not a failure
        println!("No match found (threshold {})", opts.max_distance);
        return Ok(());
    }

    for m in &matches {
        println!(
            "source {} episode {:2} frame {:5} at {} (distance {})",
            m.source_id,
            m.episode,
            m.frame,
            timestamp(m.frame),
            m.distance
        );
    }

    Ok(())
}

/// Where in the episode a sampled frame sits, from the indexer's fixed
/// sampling rate.
fn timestamp(frame: u16) -> String {
    let seconds = f64::from(frame) / f64::from(INDEX_FPS);
    format!("{:02}:{:04.1}", (seconds / 60.0) as u32, seconds % 60.0)
}

fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}
