use polars::prelude::{DataType, PolarsError};
use std::path::PathBuf;
use thiserror::Error;

use super::frequency::Frequency;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrequencyError {
    #[error("Fill frequency expression is empty")]
    Empty,
    #[error("Fill frequency {0:?} has an invalid magnitude")]
    BadMagnitude(String),
    #[error("Fill frequency {0:?} has unknown unit {1:?}")]
    UnknownUnit(String, String),
    #[error("Fill frequency {0:?} must be a positive interval")]
    NotPositive(String),
}

#[derive(Debug, Error)]
pub enum TimeSeriesError {
    #[error("Column {0:?} does not exist in the table")]
    MissingColumn(String),
    #[error("Column {0:?} has type {1:?}; a datetime column is required")]
    NotTemporal(String, DataType),
    #[error("Timestamp column {0:?} contains {1} null value(s)")]
    NullTimestamp(String, usize),
    #[error("Timestamp column {0:?} decreases at row {1}; the series must be time ordered")]
    UnorderedTimestamps(String, usize),
    #[error("Column {0:?} has type {1:?}; a numeric column is required")]
    NonNumeric(String, DataType),
    #[error("Table has {0} row(s); at least 2 are required")]
    EmptyInput(usize),
    #[error("Gap threshold must be a positive number of seconds; got {0}")]
    BadThreshold(f64),
    #[error("Fill frequency {0} is not a whole number of ticks of timestamp column {1:?}")]
    FrequencyBelowResolution(Frequency, String),
    #[error("Cyclic column {0:?} is the timestamp column")]
    CyclicIsTimestamp(String),
    #[error("Timegap between rows {before} and {after} has no interior predecessor \
             in a table of {height} rows")]
    MalformedGap {
        before: usize,
        after: usize,
        height: usize,
    },
    #[error("Secondary column {0:?} has no non-null values to interpolate from")]
    NoControlPoints(String),
    #[error("Time series operation failed due to polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Could not load source because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Source {0:?} has no timestamp column {1:?}")]
    MissingColumn(PathBuf, String),
    #[error("Source {0:?} has delimiter {1:?}, which is not a single byte character")]
    BadDelimiter(PathBuf, char),
    #[error("Loader failed due to polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config is invalid: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Pipeline failed due to Loader error: {0}")]
    LoaderError(#[from] LoaderError),
    #[error("Pipeline failed due to time series error: {0}")]
    TimeSeriesError(#[from] TimeSeriesError),
    #[error("Pipeline failed to write output: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Pipeline failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}
