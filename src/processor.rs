use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    aggregator::{Upload, aggregate},
    joiner::join,
    models::{ConvertedRecord, RateSeries},
    traits::CSVWrite,
};
use anyhow::Result;

const JPY_COLUMN: &str = "JPY";

#[derive(Serialize)]
struct DownloadRow {
    date: NaiveDate,
    amount_usd: Decimal,
    amount_jpy: Option<Decimal>,
}

impl From<&ConvertedRecord> for DownloadRow {
    fn from(record: &ConvertedRecord) -> Self {
        DownloadRow {
            date: *record.date(),
            amount_usd: *record.amount_usd(),
            amount_jpy: *record.amount_jpy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    pub unmatched: Vec<NaiveDate>,
}

/// Converts an upload into JPY and writes the download table.
pub struct Engine<'a, T> {
    writer: T,
    upload: Upload,
    rates: &'a RateSeries,
}

impl<'a, T> Engine<'a, T>
where
    T: CSVWrite,
{
    pub fn new(writer: T, upload: Upload, rates: &'a RateSeries) -> Self {
        Self {
            writer,
            upload,
            rates,
        }
    }

    pub fn run(&mut self, date_field: &str, amount_field: &str) -> Result<ConversionSummary> {
        let aggregated = aggregate(&self.upload, date_field, amount_field)?;
        let records = join(&aggregated, self.rates);

        self.writer
            .write_record(&[date_field, amount_field, JPY_COLUMN])?;
        for record in &records {
            self.writer.write_record(&DownloadRow::from(record))?;
        }
        self.writer.flush()?;

        let unmatched: Vec<NaiveDate> = records
            .iter()
            .filter(|r| !r.is_matched())
            .map(|r| *r.date())
            .collect();
        for date in &unmatched {
            warn!("{date}: no TTM stored, JPY left empty");
        }
        let converted = records.len() - unmatched.len();
        info!(
            "converted {converted} of {} dates from {} rows",
            records.len(),
            self.upload.len()
        );

        Ok(ConversionSummary {
            converted,
            unmatched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyRate;
    use rust_decimal::prelude::*;

    struct MockCSVWriter {
        records: Vec<String>,
        flushed: bool,
    }

    impl MockCSVWriter {
        fn new() -> Self {
            Self {
                records: Vec::new(),
                flushed: false,
            }
        }
    }

    impl CSVWrite for &mut MockCSVWriter {
        fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
            let line = serde_json::to_string(record)?;
            self.records.push(line);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    fn date(s: &str) -> Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    #[test]
    fn test_engine_writes_header_and_sorted_rows() -> Result<()> {
        let upload = Upload::from_reader(
            "Date,Salary\n\
             2025-01-03,$10\n\
             2025-01-01,$100\n\
             2025-01-01,$50.5\n"
                .as_bytes(),
        )?;
        let rates = RateSeries::from_rates(vec![DailyRate::new(
            date("2025-01-01")?,
            dec!(151.0),
            dec!(149.0),
        )]);
        let mut writer = MockCSVWriter::new();

        let summary = Engine::new(&mut writer, upload, &rates).run("Date", "Salary")?;

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.unmatched, vec![date("2025-01-03")?]);
        assert!(writer.flushed);
        assert_eq!(writer.records.len(), 3);
        assert_eq!(writer.records[0], r#"["Date","Salary","JPY"]"#);

        let first: serde_json::Value = serde_json::from_str(&writer.records[1])?;
        assert_eq!(first["date"], "2025-01-01");
        assert_eq!(first["amount_usd"], "150.5");
        let jpy = first["amount_jpy"].as_str().unwrap_or_default().parse::<Decimal>()?;
        assert_eq!(jpy, dec!(22575));

        let second: serde_json::Value = serde_json::from_str(&writer.records[2])?;
        assert_eq!(second["date"], "2025-01-03");
        assert!(second["amount_jpy"].is_null());
        Ok(())
    }

    #[test]
    fn test_engine_rejects_unknown_column() -> Result<()> {
        let upload = Upload::from_reader("Date,Salary\n2025-01-01,1\n".as_bytes())?;
        let rates = RateSeries::new();
        let mut writer = MockCSVWriter::new();

        let res = Engine::new(&mut writer, upload, &rates).run("Date", "Gross");

        assert!(res.is_err());
        assert!(writer.records.is_empty());
        Ok(())
    }
}
