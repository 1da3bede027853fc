use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::result::Result;

use super::config::Config;
use super::error::PipelineError;
use super::gap_filler::fill_timegaps;
use super::interpolation::interpolative_merge_in_place;
use super::loader::load_source;
use super::timestamp::with_elapsed_seconds;

/// Load the primary series, fill its timegaps and merge every secondary onto it.
pub fn run(config: &Config) -> Result<DataFrame, PipelineError> {
    config.validate()?;

    let primary_time = config.primary.timestamp_column.as_str();
    let mut df = load_source(&config.primary)?;

    if let Some(gap_fill) = &config.gap_fill {
        log::info!(
            "Filling timegaps over {}s at {} in {}...",
            gap_fill.threshold_seconds,
            gap_fill.frequency,
            config.primary.path.to_string_lossy()
        );
        df = fill_timegaps(
            &df,
            primary_time,
            gap_fill.threshold_seconds,
            gap_fill.frequency,
            &gap_fill.fill_value,
            gap_fill.cyclic_column.as_deref(),
        )?;
    }

    for secondary in &config.secondaries {
        log::info!(
            "Merging {:?} from {}...",
            secondary.columns,
            secondary.source.path.to_string_lossy()
        );
        let other = load_source(&secondary.source)?;
        let columns: Vec<&str> = secondary.columns.iter().map(String::as_str).collect();
        let floor: Vec<&str> = secondary.floor.iter().map(String::as_str).collect();
        interpolative_merge_in_place(
            &mut df,
            &other,
            primary_time,
            &secondary.source.timestamp_column,
            &columns,
            &floor,
        )?;
    }

    if let Some(name) = &config.elapsed_column {
        with_elapsed_seconds(&mut df, primary_time, name)?;
    }

    log::info!(
        "Merged table has {} row(s) and {} column(s)",
        df.height(),
        df.width()
    );
    Ok(df)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    let mut writer = CsvWriter::new(file);
    writer.finish(df)?;
    Ok(())
}

/// Run the pipeline and write the merged table to the configured output
pub fn process(config: &Config) -> Result<(), PipelineError> {
    let mut df = run(config)?;
    log::info!("Writing {}...", config.output.to_string_lossy());
    write_csv(&mut df, &config.output)?;
    Ok(())
}
