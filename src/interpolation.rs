use polars::prelude::*;
use std::result::Result;

use super::error::TimeSeriesError;
use super::timestamp::TimeAxis;

/// One dimensional linear interpolation of the control points `(xp, fp)` at each `x`.
///
/// `xp` must be non-decreasing and the same length as `fp`. Points left of `xp[0]` take
/// `fp[0]` and points right of the last control point take the last value. A point that sits
/// exactly on a control point returns that control point's value unchanged.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter().map(|x| interp_one(*x, xp, fp)).collect()
}

fn interp_one(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[last] {
        return fp[last];
    }

    // First control point strictly right of x; always in 1..=last here
    let hi = xp.partition_point(|p| *p <= x);
    let lo = hi - 1;
    if xp[lo] == x {
        return fp[lo];
    }
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + t * (fp[hi] - fp[lo])
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, TimeSeriesError> {
    let column = df
        .column(name)
        .map_err(|_| TimeSeriesError::MissingColumn(name.to_string()))?;
    if !column.dtype().is_numeric() {
        return Err(TimeSeriesError::NonNumeric(
            name.to_string(),
            column.dtype().clone(),
        ));
    }
    Ok(column.cast(&DataType::Float64)?.f64()?.into_iter().collect())
}

fn floored(column: &Series) -> Result<Series, TimeSeriesError> {
    let values: Vec<Option<i64>> = column
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| v.is_finite()).map(|v| v.floor() as i64))
        .collect();
    Ok(Series::new(column.name(), values))
}

/// Merge columns of `secondary` into a copy of `primary`, interpolated onto the primary's
/// timestamps. See [`interpolative_merge_in_place`].
pub fn interpolative_merge(
    primary: &DataFrame,
    secondary: &DataFrame,
    primary_time: &str,
    secondary_time: &str,
    columns: &[&str],
    floor: &[&str],
) -> Result<DataFrame, TimeSeriesError> {
    let mut merged = primary.clone();
    interpolative_merge_in_place(
        &mut merged,
        secondary,
        primary_time,
        secondary_time,
        columns,
        floor,
    )?;
    Ok(merged)
}

/// Merge columns of `secondary` into `primary`, interpolated onto the primary's timestamps.
///
/// Both time columns are converted to seconds since the first primary timestamp. Every column
/// in `columns` is linearly interpolated at the primary times and written to `primary` under
/// its own name as Float64, replacing a column of the same name. Null values in the secondary
/// are skipped. Primary times outside the secondary's range take the nearest endpoint value; a
/// warning is logged when that happens.
///
/// Afterwards every column in `floor` is rounded down and stored as Int64.
///
/// Nothing is written to `primary` unless the whole merge succeeds.
pub fn interpolative_merge_in_place(
    primary: &mut DataFrame,
    secondary: &DataFrame,
    primary_time: &str,
    secondary_time: &str,
    columns: &[&str],
    floor: &[&str],
) -> Result<(), TimeSeriesError> {
    let primary_axis = TimeAxis::from_frame(primary, primary_time)?;
    let secondary_axis = TimeAxis::from_frame(secondary, secondary_time)?;
    for axis in [&primary_axis, &secondary_axis] {
        if axis.len() < 2 {
            return Err(TimeSeriesError::EmptyInput(axis.len()));
        }
    }
    if let Some(row) = secondary_axis.first_decrease() {
        return Err(TimeSeriesError::UnorderedTimestamps(
            secondary_time.to_string(),
            row,
        ));
    }

    let zero = primary_axis.first_nanos().unwrap_or_default();
    let x = primary_axis.elapsed_seconds(zero);
    let secondary_x = secondary_axis.elapsed_seconds(zero);

    for name in floor {
        let known = columns.contains(name) || primary.get_column_names().contains(name);
        if !known {
            return Err(TimeSeriesError::MissingColumn(name.to_string()));
        }
    }

    let mut merged = Vec::with_capacity(columns.len());
    for name in columns {
        let values = numeric_column(secondary, name)?;
        let (xp, fp): (Vec<f64>, Vec<f64>) = secondary_x
            .iter()
            .zip(values)
            .filter_map(|(x, value)| value.map(|v| (*x, v)))
            .unzip();
        if xp.is_empty() {
            return Err(TimeSeriesError::NoControlPoints(name.to_string()));
        }

        let outside = x
            .iter()
            .filter(|x| **x < xp[0] || **x > xp[xp.len() - 1])
            .count();
        if outside > 0 {
            log::warn!(
                "{outside} of {} primary timestamp(s) lie outside the range of {name:?}; \
                 holding its endpoint values there",
                x.len()
            );
        }

        merged.push(Series::new(name, interp(&x, &xp, &fp)));
    }

    let mut floored_columns = Vec::with_capacity(floor.len());
    for name in floor {
        let source = match merged.iter().find(|s| s.name() == *name) {
            Some(series) => series,
            None => primary.column(name)?,
        };
        floored_columns.push(floored(source)?);
    }

    for series in merged.into_iter().chain(floored_columns) {
        primary.with_column(series)?;
    }

    log::debug!(
        "Merged {} column(s) from {secondary_time:?} onto {primary_time:?}",
        columns.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::test_util::*;

    fn secondary() -> DataFrame {
        DataFrame::new(vec![
            seconds_series("time", &[0, 10]),
            Series::new("temperature", &[10.0, 20.0]),
        ])
        .unwrap()
    }

    fn primary(seconds: &[i64]) -> DataFrame {
        let scans: Vec<i64> = (0..seconds.len() as i64).collect();
        DataFrame::new(vec![seconds_series("stamp", seconds), Series::new("scan", scans)]).unwrap()
    }

    #[test]
    fn interp_matches_control_points_and_clamps() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [5.0, 7.0, 3.0];
        let out = interp(&[-1.0, 0.0, 0.5, 1.0, 2.0, 3.0, 9.0], &xp, &fp);
        assert_eq!(out, vec![5.0, 5.0, 6.0, 7.0, 5.0, 3.0, 3.0]);
    }

    #[test]
    fn interpolates_between_control_points() {
        let merged = interpolative_merge(
            &primary(&[0, 5, 10]),
            &secondary(),
            "stamp",
            "time",
            &["temperature"],
            &[],
        )
        .unwrap();

        assert_eq!(
            column_f64(&merged, "temperature"),
            vec![Some(10.0), Some(15.0), Some(20.0)]
        );
    }

    #[test]
    fn clamps_beyond_secondary_range() {
        let merged = interpolative_merge(
            &primary(&[5, 20]),
            &secondary(),
            "stamp",
            "time",
            &["temperature"],
            &[],
        )
        .unwrap();

        // Zero point is the primary's first timestamp, so the secondary's 10s sits at 5s here
        assert_eq!(column_f64(&merged, "temperature"), vec![Some(15.0), Some(20.0)]);
    }

    #[test]
    fn keeps_primary_row_count_and_columns() {
        let primary = primary(&[0, 1, 2, 3, 4, 5, 6, 30]);
        let merged = interpolative_merge(
            &primary,
            &secondary(),
            "stamp",
            "time",
            &["temperature"],
            &[],
        )
        .unwrap();

        assert_eq!(merged.height(), primary.height());
        assert_eq!(merged.get_column_names(), vec!["stamp", "scan", "temperature"]);
        assert!(merged.column("scan").unwrap().series_equal(primary.column("scan").unwrap()));
    }

    #[test]
    fn floors_merged_columns_to_integers() {
        let secondary = DataFrame::new(vec![
            seconds_series("time", &[0, 10]),
            Series::new("x", &[3.0, 4.0]),
        ])
        .unwrap();
        let merged = interpolative_merge(
            &primary(&[0, 9, 10]),
            &secondary,
            "stamp",
            "time",
            &["x"],
            &["x"],
        )
        .unwrap();

        let x = merged.column("x").unwrap();
        assert_eq!(x.dtype(), &DataType::Int64);
        let values: Vec<Option<i64>> = x.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(3), Some(3), Some(4)]);
    }

    #[test]
    fn in_place_merge_overwrites_existing_column() {
        let mut target = primary(&[0, 5]);
        target
            .with_column(Series::new("temperature", &[0.0, 0.0]))
            .unwrap();

        interpolative_merge_in_place(
            &mut target,
            &secondary(),
            "stamp",
            "time",
            &["temperature"],
            &[],
        )
        .unwrap();

        assert_eq!(target.width(), 3);
        assert_eq!(column_f64(&target, "temperature"), vec![Some(10.0), Some(15.0)]);
    }

    #[test]
    fn skips_null_control_points() {
        let secondary = DataFrame::new(vec![
            seconds_series("time", &[0, 5, 10]),
            Series::new("flow", &[Some(1.0), None, Some(3.0)]),
        ])
        .unwrap();
        let merged = interpolative_merge(
            &primary(&[0, 5]),
            &secondary,
            "stamp",
            "time",
            &["flow"],
            &[],
        )
        .unwrap();
        assert_eq!(column_f64(&merged, "flow"), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn failed_merge_leaves_primary_untouched() {
        let mut target = primary(&[0, 5]);
        let result = interpolative_merge_in_place(
            &mut target,
            &secondary(),
            "stamp",
            "time",
            &["temperature", "pressure"],
            &[],
        );

        assert!(matches!(result, Err(TimeSeriesError::MissingColumn(name)) if name == "pressure"));
        assert_eq!(target.get_column_names(), vec!["stamp", "scan"]);
    }

    #[test]
    fn rejects_bad_secondaries() {
        let target = primary(&[0, 5]);

        let unordered = DataFrame::new(vec![
            seconds_series("time", &[0, 10, 5]),
            Series::new("temperature", &[1.0, 2.0, 3.0]),
        ])
        .unwrap();
        assert!(matches!(
            interpolative_merge(&target, &unordered, "stamp", "time", &["temperature"], &[]),
            Err(TimeSeriesError::UnorderedTimestamps(_, 2))
        ));

        let short = DataFrame::new(vec![
            seconds_series("time", &[0]),
            Series::new("temperature", &[1.0]),
        ])
        .unwrap();
        assert!(matches!(
            interpolative_merge(&target, &short, "stamp", "time", &["temperature"], &[]),
            Err(TimeSeriesError::EmptyInput(1))
        ));

        let text = DataFrame::new(vec![
            seconds_series("time", &[0, 10]),
            Series::new("label", &["a", "b"]),
        ])
        .unwrap();
        assert!(matches!(
            interpolative_merge(&target, &text, "stamp", "time", &["label"], &[]),
            Err(TimeSeriesError::NonNumeric(_, _))
        ));

        let empty = DataFrame::new(vec![
            seconds_series("time", &[0, 10]),
            Series::new("flow", &[None::<f64>, None]),
        ])
        .unwrap();
        assert!(matches!(
            interpolative_merge(&target, &empty, "stamp", "time", &["flow"], &[]),
            Err(TimeSeriesError::NoControlPoints(_))
        ));
    }
}
