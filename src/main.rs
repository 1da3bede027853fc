use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use beamline_merge::config::Config;
use beamline_merge::pipeline;

/// Fill timegaps in a beamline log and merge other instrument logs onto its time axis.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Pipeline configuration .yml file
    #[clap(short, long, value_parser)]
    config: PathBuf,

    /// Write a template configuration to the config path and exit
    #[clap(long, action)]
    new: bool,

    /// Output .csv file, overriding the one in the configuration
    #[clap(short, long, value_parser)]
    out: Option<PathBuf>,

    /// Log every filled timegap
    #[clap(short, long, action)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    if args.new {
        log::info!(
            "Making a template config at {}...",
            args.config.to_string_lossy()
        );
        Config::write_template(&args.config)?;
        log::info!("Done.");
        return Ok(());
    }

    log::info!("Loading config from {}...", args.config.to_string_lossy());
    let mut config = Config::read_config_file(&args.config)?;
    if let Some(out) = args.out {
        config.output = out;
    }
    log::info!("Primary: {}", config.primary.path.to_string_lossy());
    log::info!("Secondaries: {}", config.secondaries.len());
    log::info!("Output: {}", config.output.to_string_lossy());

    pipeline::process(&config)?;

    log::info!("Done.");
    Ok(())
}
