use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::result::Result;

use super::error::TimeSeriesError;
use super::frequency::Frequency;
use super::timestamp::{timestamp_first, TimeAxis};

/// A break in the sampling of a series: the step from row `before` to row `after` took longer
/// than the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timegap {
    pub before: usize,
    pub after: usize,
    pub duration_seconds: f64,
}

/// Value written to the non-timestamp columns of placeholder rows.
/// Cast to the datatype of each column; values that don't fit a column become null there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl FillValue {
    fn block(&self, name: &str, len: usize, dtype: &DataType) -> Result<Series, PolarsError> {
        let series = match self {
            FillValue::Missing => return Ok(Series::full_null(name, len, dtype)),
            FillValue::Int(value) => Series::new(name, vec![*value; len]),
            FillValue::Float(value) => Series::new(name, vec![*value; len]),
            FillValue::Text(value) => Series::new(name, vec![value.as_str(); len]),
        };
        series.cast(dtype)
    }
}

fn check_threshold(threshold_seconds: f64) -> Result<(), TimeSeriesError> {
    if threshold_seconds.is_finite() && threshold_seconds > 0.0 {
        Ok(())
    } else {
        Err(TimeSeriesError::BadThreshold(threshold_seconds))
    }
}

fn gaps_in(axis: &TimeAxis, threshold_seconds: f64) -> Vec<Timegap> {
    axis.deltas_seconds()
        .enumerate()
        .filter(|(_, delta)| *delta > threshold_seconds)
        .map(|(before, delta)| Timegap {
            before,
            after: before + 1,
            duration_seconds: delta,
        })
        .collect()
}

/// Find every timegap longer than `threshold_seconds`, in row order.
pub fn find_timegaps(
    df: &DataFrame,
    timestamp_column: &str,
    threshold_seconds: f64,
) -> Result<Vec<Timegap>, TimeSeriesError> {
    check_threshold(threshold_seconds)?;
    let axis = TimeAxis::from_frame(df, timestamp_column)?;
    if axis.len() < 2 {
        return Err(TimeSeriesError::EmptyInput(axis.len()));
    }
    Ok(gaps_in(&axis, threshold_seconds))
}

/// Fill every timegap of a series with placeholder rows spaced `frequency` apart.
///
/// The returned table has the timestamp column first. Rows on both sides of a gap are kept
/// as they are; placeholders take the timestamps `before + k * frequency` for `k >= 1` that
/// are strictly earlier than the row after the gap. Non-timestamp columns of the placeholders
/// hold `fill_value`, except `cyclic_column` (if given), which continues the repeating sequence
/// of values seen before the gap.
///
/// The spacing must not exceed the threshold for the output to be free of gaps. This is logged
/// but not enforced.
pub fn fill_timegaps(
    df: &DataFrame,
    timestamp_column: &str,
    threshold_seconds: f64,
    frequency: Frequency,
    fill_value: &FillValue,
    cyclic_column: Option<&str>,
) -> Result<DataFrame, TimeSeriesError> {
    check_threshold(threshold_seconds)?;
    let df = timestamp_first(df, timestamp_column)?;
    let axis = TimeAxis::from_frame(&df, timestamp_column)?;
    let height = axis.len();
    if height < 2 {
        return Err(TimeSeriesError::EmptyInput(height));
    }

    let gaps = gaps_in(&axis, threshold_seconds);
    if gaps.is_empty() {
        log::debug!("No timegaps over {threshold_seconds}s in {timestamp_column:?}");
        return Ok(df);
    }
    if frequency.as_secs_f64() > threshold_seconds {
        log::warn!(
            "Fill frequency {frequency} is longer than the gap threshold of {threshold_seconds}s; \
             filled series will still contain gaps"
        );
    }

    let step = frequency
        .in_unit(axis.unit)
        .ok_or_else(|| TimeSeriesError::FrequencyBelowResolution(frequency, axis.name.clone()))?;

    let mut cycle = match cyclic_column {
        Some(name) if name == timestamp_column => {
            return Err(TimeSeriesError::CyclicIsTimestamp(name.to_string()))
        }
        Some(name) => Some(ScanCycle::new(&df, name)?),
        None => None,
    };

    let mut filled = df.slice(0, 0);
    let mut start = 0;
    let mut inserted = 0;
    for gap in &gaps {
        if gap.after == 0
            || gap.before + 1 != gap.after
            || gap.after >= height
            || gap.before < start
        {
            return Err(TimeSeriesError::MalformedGap {
                before: gap.before,
                after: gap.after,
                height,
            });
        }

        filled.vstack_mut(&df.slice(start as i64, gap.after - start))?;

        let stamps = placeholder_ticks(axis.ticks[gap.before], axis.ticks[gap.after], step);
        log::debug!(
            "Filling {:.1}s timegap after row {} with {} placeholder row(s)",
            gap.duration_seconds,
            gap.before,
            stamps.len()
        );
        if !stamps.is_empty() {
            let cyclic = match cycle.as_mut() {
                Some(cycle) => cycle.continue_after(&df, gap.before, stamps.len())?,
                None => None,
            };
            let block = placeholder_block(&df, &axis, &stamps, fill_value, cyclic)?;
            filled.vstack_mut(&block)?;
            inserted += stamps.len();
        }
        start = gap.after;
    }
    filled.vstack_mut(&df.slice(start as i64, height - start))?;
    filled.rechunk();

    log::info!(
        "Filled {} timegap(s) in {timestamp_column:?} with {inserted} placeholder row(s)",
        gaps.len()
    );
    Ok(filled)
}

fn placeholder_ticks(before: i64, after: i64, step: i64) -> Vec<i64> {
    let mut ticks = Vec::new();
    let mut next = before.checked_add(step);
    while let Some(tick) = next.filter(|tick| *tick < after) {
        ticks.push(tick);
        next = tick.checked_add(step);
    }
    ticks
}

fn placeholder_block(
    df: &DataFrame,
    axis: &TimeAxis,
    stamps: &[i64],
    fill_value: &FillValue,
    cyclic: Option<Series>,
) -> Result<DataFrame, TimeSeriesError> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name();
        let series = if name == axis.name {
            axis.to_series(stamps)?
        } else {
            match &cyclic {
                Some(values) if values.name() == name => values.clone(),
                _ => fill_value.block(name, stamps.len(), column.dtype())?,
            }
        };
        columns.push(series);
    }
    Ok(DataFrame::new(columns)?)
}

/// Tracks the repeating sequence of a scan position column.
///
/// The cycle is the list of distinct values in order of first appearance. It grows as gaps
/// further down the table are reached, so each gap sees every value observed before it.
struct ScanCycle {
    name: String,
    keys: Vec<Option<String>>,
    positions: HashMap<String, usize>,
    first_rows: Vec<IdxSize>,
    scanned: usize,
}

impl ScanCycle {
    fn new(df: &DataFrame, name: &str) -> Result<Self, TimeSeriesError> {
        let column = df
            .column(name)
            .map_err(|_| TimeSeriesError::MissingColumn(name.to_string()))?;
        let keys = column
            .cast(&DataType::Utf8)?
            .utf8()?
            .into_iter()
            .map(|key| key.map(str::to_string))
            .collect();
        Ok(Self {
            name: name.to_string(),
            keys,
            positions: HashMap::new(),
            first_rows: Vec::new(),
            scanned: 0,
        })
    }

    fn observe_through(&mut self, row: usize) {
        while self.scanned <= row {
            if let Some(key) = &self.keys[self.scanned] {
                if !self.positions.contains_key(key) {
                    self.positions.insert(key.clone(), self.first_rows.len());
                    self.first_rows.push(self.scanned as IdxSize);
                }
            }
            self.scanned += 1;
        }
    }

    /// Values for `len` placeholder rows following row `before`, or None when no value has
    /// been seen yet.
    fn continue_after(
        &mut self,
        df: &DataFrame,
        before: usize,
        len: usize,
    ) -> Result<Option<Series>, TimeSeriesError> {
        self.observe_through(before);
        let last = self.keys[..=before]
            .iter()
            .rev()
            .find_map(|key| key.as_ref())
            .and_then(|key| self.positions.get(key));
        let Some(&last) = last else {
            return Ok(None);
        };

        let n = self.first_rows.len();
        let rows: Vec<IdxSize> = (0..len)
            .map(|k| self.first_rows[(last + 1 + k) % n])
            .collect();
        let indices = IdxCa::from_vec(&self.name, rows);
        Ok(Some(df.column(&self.name)?.take(&indices)?))
    }
}
