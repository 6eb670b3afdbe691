use std::{
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    errors::StoreError,
    models::{DailyRate, RateSeries},
    traits::RateRepository,
};

#[derive(Deserialize)]
struct StoredRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "TTS")]
    sell_rate: Decimal,
    #[serde(rename = "TTB")]
    buy_rate: Decimal,
    #[serde(rename = "TTM")]
    mid_rate: Decimal,
}

/// Durable rate series kept as a `Date,TTS,TTB,TTM` table.
///
/// Only one process is expected to write the file at a time; there is no
/// locking.
pub struct RateStore {
    path: PathBuf,
}

impl RateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RateStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the series, treating an absent or unreadable file as empty.
    pub fn load_or_empty(&self) -> RateSeries {
        match self.load() {
            Ok(Some(series)) => series,
            Ok(None) => RateSeries::new(),
            Err(e) => {
                warn!("{e}; starting from an empty rate series");
                RateSeries::new()
            }
        }
    }

    fn unavailable(&self, reason: impl ToString) -> StoreError {
        StoreError::Unavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RateRepository for RateStore {
    fn load(&self) -> Result<Option<RateSeries>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.unavailable(e)),
        };

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut rates = Vec::new();
        for (line, rec) in reader.deserialize::<StoredRow>().enumerate() {
            let row = match rec {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(self.unavailable(e)),
                Err(e) => {
                    warn!("{}: row {} skipped, {e}", self.path.display(), line + 1);
                    continue;
                }
            };

            // TTM is derived, never trusted from disk.
            let rate = DailyRate::new(row.date, row.sell_rate, row.buy_rate);
            if *rate.mid_rate() != row.mid_rate {
                warn!(
                    "{}: stored TTM {} for {} recomputed as {}",
                    self.path.display(),
                    row.mid_rate,
                    row.date,
                    rate.mid_rate()
                );
            }
            rates.push(rate);
        }

        Ok(Some(RateSeries::from_rates(rates)))
    }

    fn persist(&self, series: &RateSeries) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let temp = self.temp_path();
        {
            let mut writer = WriterBuilder::new().has_headers(true).from_path(&temp)?;
            for rate in series.iter() {
                writer.serialize(rate)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp, &self.path)?;

        info!("stored {} daily rates in {}", series.len(), self.path.display());
        Ok(())
    }
}
