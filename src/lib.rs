//! # beamline-merge
//!
//! Normalizes time-stamped instrument logs from a beamline experiment (diffraction scan
//! timestamps, refined parameters, mass spectrometer traces, heater and gas-flow logs) and
//! fuses them onto one time axis.
//!
//! The two transforms that do the work are:
//!
//! - [`gap_filler::fill_timegaps`]: finds places where the sampling of a series stops for
//! longer than a threshold and splices evenly spaced placeholder rows into the hole.
//! - [`interpolation::interpolative_merge`]: projects columns of a secondary series onto the
//! timestamps of a primary series by linear interpolation.
//!
//! Both work on polars [`DataFrame`](polars::prelude::DataFrame)s. The [`pipeline`] module
//! ties them to the [`loader`] and a YAML [`config`] so the `beamline-merge` binary can run
//! the whole thing from a single file:
//!
//! ```yml
//! primary:
//!   path: xrd_timestamps.csv
//!   timestamp_column: XRDTimeStamp
//!   timestamp_format: "%Y-%m-%d %H:%M:%S%.f"
//! gap_fill:
//!   threshold_seconds: 30.0
//!   frequency: 10s
//! secondaries:
//!   - source:
//!       path: heater.csv
//!       timestamp_column: HistoricalTimeString
//!       timestamp_format: "%d-%m-%y %H:%M:%S"
//!     columns: [Temperature]
//! output: merged.csv
//! ```
pub mod config;
pub mod error;
pub mod frequency;
pub mod gap_filler;
pub mod interpolation;
pub mod loader;
pub mod pipeline;
pub mod timestamp;
