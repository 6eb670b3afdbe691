use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    errors::{FetchError, StoreError},
    models::RateSeries,
};

/// CSVWrite trait provides a method to write a record to a CSV file.
pub trait CSVWrite {
    /// Writes a record to a CSV file.
    ///
    /// # Arguments
    /// * `record` - The record to write to the CSV file that is Serializable.
    ///
    /// # Returns
    /// A Result indicating success or failure.
    fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()>;

    /// Flushes buffered records to the underlying sink.
    fn flush(&mut self) -> Result<()>;
}

/// RateSource fetches the two-sided USD quote published for a single day.
pub trait RateSource {
    /// Fetches the sell (TTS) and buy (TTB) quotes for `date`.
    ///
    /// # Returns
    /// `FetchError::NoData` when nothing is published for the date (weekends,
    /// holidays, not yet published) and `FetchError::Unreachable` when the
    /// source itself cannot be reached.
    fn fetch(&self, date: NaiveDate) -> Result<(Decimal, Decimal), FetchError>;
}

/// RateRepository persists the full rate series.
pub trait RateRepository {
    /// Reads the persisted series, `None` when nothing was persisted yet.
    fn load(&self) -> Result<Option<RateSeries>, StoreError>;

    /// Replaces the persisted series with `series`.
    fn persist(&self, series: &RateSeries) -> Result<(), StoreError>;
}
