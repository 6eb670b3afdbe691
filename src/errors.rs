use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate source unreachable: {0}")]
    Unreachable(String),

    #[error("no rate published: {0}")]
    NoData(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rate store {path} is unavailable: {reason}")]
    Unavailable { path: PathBuf, reason: String },

    #[error("rate store i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("rate store csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot parse amount {0:?}")]
    Amount(String),

    #[error("cannot parse date {0:?}")]
    Date(String),
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("column {0:?} not found in upload")]
    UnknownColumn(String),

    #[error("value overflow")]
    ValueOverflow,
}
