use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::result::Result;

use super::error::LoaderError;

/// Describes one delimited instrument log and how to read its timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub timestamp_column: String,
    /// chrono style format of the timestamp column, e.g. `%d-%m-%Y %H:%M:%S%.f`
    pub timestamp_format: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    #[serde(default)]
    pub skip_rows: usize,
    /// Keep only every n-th row. Diffraction timestamp files log each frame of a scan; the
    /// scan itself is every 10th.
    #[serde(default)]
    pub every_nth: Option<usize>,
}

fn default_delimiter() -> char {
    ','
}

fn default_has_header() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("None"),
            timestamp_column: String::from("Timestamp"),
            timestamp_format: String::from("%Y-%m-%d %H:%M:%S%.f"),
            delimiter: default_delimiter(),
            has_header: default_has_header(),
            skip_rows: 0,
            every_nth: None,
        }
    }
}

/// Read a delimited log into a DataFrame with its timestamp column parsed to
/// Datetime(Microseconds).
pub fn load_source(source: &SourceConfig) -> Result<DataFrame, LoaderError> {
    if !source.path.exists() {
        return Err(LoaderError::BadFilePath(source.path.clone()));
    }
    let delimiter = u8::try_from(source.delimiter)
        .map_err(|_| LoaderError::BadDelimiter(source.path.clone(), source.delimiter))?;

    let df = CsvReader::from_path(source.path.clone())?
        .has_header(source.has_header)
        .with_delimiter(delimiter)
        .with_skip_rows(source.skip_rows)
        .finish()?;

    if df.column(&source.timestamp_column).is_err() {
        return Err(LoaderError::MissingColumn(
            source.path.clone(),
            source.timestamp_column.clone(),
        ));
    }

    let df = match source.every_nth {
        Some(n) if n > 1 => {
            let rows: Vec<IdxSize> = (0..df.height()).step_by(n).map(|i| i as IdxSize).collect();
            df.take(&IdxCa::from_vec("rows", rows))?
        }
        _ => df,
    };

    let df = parse_timestamps(df, &source.timestamp_column, &source.timestamp_format)?;
    log::info!(
        "Loaded {} row(s) and {} column(s) from {}",
        df.height(),
        df.width(),
        source.path.to_string_lossy()
    );
    Ok(df)
}

/// Turn a text timestamp column into a Datetime column, keeping its position in the table
pub fn parse_timestamps(df: DataFrame, name: &str, format: &str) -> Result<DataFrame, PolarsError> {
    df.lazy()
        .with_column(
            col(name)
                .str()
                .strptime(StrpTimeOptions {
                    date_dtype: DataType::Datetime(TimeUnit::Microseconds, None),
                    fmt: Some(format.to_string()),
                    strict: true,
                    exact: true,
                })
                .alias(name),
        )
        .collect()
}
