use chrono::prelude::*;
use tracing::warn;
pub mod cli;
pub mod config;
pub mod error;
pub mod plot;
pub mod record;
pub mod store;

use error::{FeverError, Result};
use store::{Table, COL_DATETIME, COL_TEMPERATURE};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// timestamp format of the store, e.g. 02-Jan-2026 09:05 PM
pub const DT_FORMAT: &str = "%d-%b-%Y %I:%M %p";

/// One health observation
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub feeling: String,
    pub medicine: String,
    pub notes: String,
}

/// The temperature time series read back from the store
#[derive(Debug, Clone)]
pub struct FeverSeries {
    pub time: Vec<NaiveDateTime>,
    pub temperature: Vec<f64>,
}

impl FeverSeries {
    pub fn new(capacity: usize) -> FeverSeries {
        FeverSeries {
            time: Vec::with_capacity(capacity),
            temperature: Vec::with_capacity(capacity),
        }
    }

    /// Init a FeverSeries from the store table,
    /// setting temperature to NAN when it does not parse
    /// and skipping rows whose datetime does not parse.
    /// Keeps the store order, see `sort_by_time`.
    pub fn from_table(table: &Table) -> Result<FeverSeries> {
        if table.rows.is_empty() {
            return Err(FeverError::NoData);
        }
        let it = table
            .column_index(COL_TEMPERATURE)
            .ok_or_else(|| FeverError::MissingColumn(COL_TEMPERATURE.to_string()))?;
        let idt = table
            .column_index(COL_DATETIME)
            .ok_or_else(|| FeverError::MissingColumn(COL_DATETIME.to_string()))?;
        let mut series = FeverSeries::new(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            let raw_dt = row[idt].to_string();
            let dt = match NaiveDateTime::parse_from_str(raw_dt.trim(), DT_FORMAT) {
                Ok(dt) => dt,
                Err(e) => {
                    warn!(row = i + 2, value = %raw_dt, error = %e, "skipping row with invalid datetime");
                    continue;
                }
            };
            let raw_t = &row[it];
            let t = match raw_t.as_f64() {
                Some(t) => t,
                None => {
                    warn!(row = i + 2, value = %raw_t, "invalid temperature, kept as missing");
                    f64::NAN
                }
            };
            series.time.push(dt);
            series.temperature.push(t);
        }
        if series.is_empty() {
            return Err(FeverError::NoData);
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// stable sort by datetime, equal datetimes keep their store order
    pub fn sort_by_time(&mut self) {
        let mut pairs: Vec<(NaiveDateTime, f64)> = self
            .time
            .iter()
            .copied()
            .zip(self.temperature.iter().copied())
            .collect();
        pairs.sort_by_key(|&(dt, _)| dt);
        let (time, temperature) = pairs.into_iter().unzip();
        self.time = time;
        self.temperature = temperature;
    }

    /// last reading of the series, the latest one once sorted
    pub fn latest(&self) -> Option<(NaiveDateTime, f64)> {
        Some((*self.time.last()?, *self.temperature.last()?))
    }

    /// min and max of the non-missing temperatures
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        let finite: Vec<f64> = self
            .temperature
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .collect();
        min_and_max(&finite[..])
    }
}

/// Formats a temperature the way it is typed: whole values keep one decimal.
pub fn fmt_temp(t: f64) -> String {
    if t.is_finite() && t.fract() == 0.0 {
        format!("{:.1}", t)
    } else {
        format!("{}", t)
    }
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

/// x tick format, always with date and time
pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::weeks(1) {
        "%d-%b %I %p"
    } else {
        "%d-%b %I:%M %p"
    }
}
