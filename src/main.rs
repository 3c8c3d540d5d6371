use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing::Level;

use mp4timefix::{
    consts::{CREATION_DATE, GOPRO_MET},
    fix::report,
    fix_timestamp,
    FixOptions,
};

/// Sets MP4 creation times to the start of recording,
/// derived from GPS time in GoPro GPMF telemetry.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Input MP4.
    input: PathBuf,

    /// Output path. Defaults to '<INPUT>.new'.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace input with the patched file.
    #[arg(long)]
    overwrite: bool,

    /// Fail unless recording started this year.
    #[arg(long)]
    sanity_year: Option<i32>,

    /// Field to set.
    #[arg(long, default_value = CREATION_DATE)]
    field: String,

    /// Handler name for telemetry track.
    #[arg(long, default_value = GOPRO_MET)]
    handler: String,

    /// Write an unmodified copy even if nothing needs changing.
    #[arg(long)]
    copy_unchanged: bool,

    /// Log level, repeat for more output.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let options = FixOptions::default()
        .with_output(args.output.as_deref())
        .with_overwrite(args.overwrite)
        .with_sanity_year(args.sanity_year)
        .with_field(&args.field)
        .with_handler_name(&args.handler)
        .with_copy_unchanged(args.copy_unchanged);

    match report(&args.input, &fix_timestamp(&args.input, &options)) {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    }
}
