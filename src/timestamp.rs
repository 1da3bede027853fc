use polars::prelude::*;
use std::result::Result;

use super::error::TimeSeriesError;

pub(crate) fn ticks_per_second(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    }
}

fn nanos_per_tick(unit: TimeUnit) -> i64 {
    1_000_000_000 / ticks_per_second(unit)
}

/// The timestamp column of a table, unpacked into its physical tick values.
///
/// Keeps the unit and time zone of the source column so synthesized timestamps can be
/// packed back into a column with the identical datatype.
#[derive(Debug, Clone)]
pub struct TimeAxis {
    pub name: String,
    pub unit: TimeUnit,
    pub tz: Option<String>,
    pub ticks: Vec<i64>,
}

impl TimeAxis {
    pub fn from_frame(df: &DataFrame, name: &str) -> Result<Self, TimeSeriesError> {
        let column = df
            .column(name)
            .map_err(|_| TimeSeriesError::MissingColumn(name.to_string()))?;
        let (unit, tz) = match column.dtype() {
            DataType::Datetime(unit, tz) => (*unit, tz.clone()),
            other => {
                return Err(TimeSeriesError::NotTemporal(
                    name.to_string(),
                    other.clone(),
                ))
            }
        };

        let nulls = column.null_count();
        if nulls > 0 {
            return Err(TimeSeriesError::NullTimestamp(name.to_string(), nulls));
        }

        let physical = column.cast(&DataType::Int64)?;
        let ticks = physical.i64()?.into_no_null_iter().collect();
        Ok(Self {
            name: name.to_string(),
            unit,
            tz,
            ticks,
        })
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn dtype(&self) -> DataType {
        DataType::Datetime(self.unit, self.tz.clone())
    }

    pub fn to_nanos(&self, tick: i64) -> i64 {
        tick.saturating_mul(nanos_per_tick(self.unit))
    }

    pub fn first_nanos(&self) -> Option<i64> {
        self.ticks.first().map(|tick| self.to_nanos(*tick))
    }

    /// Seconds between each timestamp and a zero point given in nanoseconds
    pub fn elapsed_seconds(&self, zero_nanos: i64) -> Vec<f64> {
        self.ticks
            .iter()
            .map(|tick| (self.to_nanos(*tick) - zero_nanos) as f64 / 1e9)
            .collect()
    }

    /// Deltas between adjacent timestamps in seconds. Entry i is the step from row i to i+1.
    pub fn deltas_seconds(&self) -> impl Iterator<Item = f64> + '_ {
        let scale = ticks_per_second(self.unit) as f64;
        self.ticks
            .windows(2)
            .map(move |pair| (pair[1] - pair[0]) as f64 / scale)
    }

    /// Position of the first row whose timestamp is earlier than its predecessor
    pub fn first_decrease(&self) -> Option<usize> {
        self.ticks
            .windows(2)
            .position(|pair| pair[1] < pair[0])
            .map(|idx| idx + 1)
    }

    /// Pack tick values into a datetime series matching this axis
    pub fn to_series(&self, ticks: &[i64]) -> Result<Series, TimeSeriesError> {
        Ok(Series::new(&self.name, ticks).cast(&self.dtype())?)
    }
}

/// Reorder the columns of a table so that the timestamp column comes first.
pub fn timestamp_first(df: &DataFrame, name: &str) -> Result<DataFrame, TimeSeriesError> {
    let names = df.get_column_names();
    if !names.contains(&name) {
        return Err(TimeSeriesError::MissingColumn(name.to_string()));
    }
    if names.first() == Some(&name) {
        return Ok(df.clone());
    }

    let order: Vec<&str> = std::iter::once(name)
        .chain(names.iter().copied().filter(|other| *other != name))
        .collect();
    Ok(df.select(order)?)
}

/// Add a Float64 column holding the seconds elapsed since the first timestamp of the table.
/// Gives plotting consumers a numeric x-axis.
pub fn with_elapsed_seconds(
    df: &mut DataFrame,
    timestamp_column: &str,
    name: &str,
) -> Result<(), TimeSeriesError> {
    let axis = TimeAxis::from_frame(df, timestamp_column)?;
    let zero = axis.first_nanos().unwrap_or_default();
    df.with_column(Series::new(name, axis.elapsed_seconds(zero)))?;
    Ok(())
}
