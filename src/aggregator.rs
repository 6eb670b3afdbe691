use std::{collections::BTreeMap, io::Read};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use rust_decimal::Decimal;

use crate::{
    errors::{AggregateError, ParseError},
    models::AggregatedTransaction,
};

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%Y年%m月%d日",
];

const DATE_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A tabular upload with caller-chosen columns.
pub struct Upload {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl Upload {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for rec in reader.records() {
            rows.push(rec?);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fails when either column is missing, before any output is produced.
    pub fn check_columns(&self, date_field: &str, amount_field: &str) -> Result<(), AggregateError> {
        self.column(date_field)?;
        self.column(amount_field)?;
        Ok(())
    }

    fn column(&self, name: &str) -> Result<usize, AggregateError> {
        self.headers
            .iter()
            .position(|h| h == name.trim())
            .ok_or_else(|| AggregateError::UnknownColumn(name.to_string()))
    }
}

/// Groups upload rows by calendar date and sums their amounts.
///
/// Rows whose date or amount cannot be parsed are left out of the sums.
pub fn aggregate(
    upload: &Upload,
    date_field: &str,
    amount_field: &str,
) -> Result<Vec<AggregatedTransaction>, AggregateError> {
    let date_idx = upload.column(date_field)?;
    let amount_idx = upload.column(amount_field)?;

    let mut sums: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (line, row) in upload.rows.iter().enumerate() {
        let parsed = parse_date(row.get(date_idx).unwrap_or_default())
            .and_then(|date| {
                parse_amount(row.get(amount_idx).unwrap_or_default()).map(|amount| (date, amount))
            });

        let (date, amount) = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                debug!("row {}: {e}, skipped", line + 1);
                continue;
            }
        };

        let sum = sums.entry(date).or_insert(Decimal::ZERO);
        *sum = sum
            .checked_add(amount)
            .ok_or(AggregateError::ValueOverflow)?;
    }

    Ok(sums
        .into_iter()
        .map(|(date, sum)| AggregatedTransaction::new(date, sum))
        .collect())
}

/// Parses a currency-formatted amount such as `$1,234.50` or `(20.00)`.
pub fn parse_amount(raw: &str) -> Result<Decimal, ParseError> {
    let trimmed = raw.trim();
    let negative = trimmed.starts_with('(') && trimmed.ends_with(')');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let amount = cleaned
        .parse::<Decimal>()
        .map_err(|_| ParseError::Amount(raw.to_string()))?;

    Ok(if negative { -amount.abs() } else { amount })
}

/// Normalizes a textual date, or the date part of a date-time, to a calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ParseError> {
    let text = raw.trim();

    if text.len() == 8 && text.chars().all(|c| c.is_ascii_digit()) {
        let iso = format!("{}-{}-{}", &text[..4], &text[4..6], &text[6..]);
        if let Ok(date) = NaiveDate::parse_from_str(&iso, "%Y-%m-%d") {
            return Ok(date);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or_else(|| ParseError::Date(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::*;

    fn date(s: &str) -> Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    fn upload(text: &str) -> Result<Upload> {
        Upload::from_reader(text.as_bytes())
    }

    #[test]
    fn test_aggregate_sums_amounts_per_date() -> Result<()> {
        let upload = upload(
            "Date,Salary\n\
             2025-01-01,$100\n\
             2025-01-01,$50.5\n\
             2025-01-02,$10\n",
        )?;

        let aggregated = aggregate(&upload, "Date", "Salary")?;

        assert_eq!(aggregated.len(), 2);
        assert!(aggregated.contains(&AggregatedTransaction::new(date("2025-01-01")?, dec!(150.5))));
        assert!(aggregated.contains(&AggregatedTransaction::new(date("2025-01-02")?, dec!(10))));
        Ok(())
    }

    #[test]
    fn test_aggregate_merges_different_date_spellings() -> Result<()> {
        let upload = upload(
            "Paid on,Memo,Gross\n\
             2025-01-15,jan,\"$1,000.00\"\n\
             01/15/2025,bonus,$250\n\
             2025/01/15 09:30:00,fix,$0.25\n",
        )?;

        let aggregated = aggregate(&upload, "Paid on", "Gross")?;

        assert_eq!(
            aggregated,
            vec![AggregatedTransaction::new(date("2025-01-15")?, dec!(1250.25))]
        );
        Ok(())
    }

    #[test]
    fn test_aggregate_skips_unparseable_rows() -> Result<()> {
        let upload = upload(
            "Date,Amount\n\
             2025-01-01,$100\n\
             2025-01-01,n/a\n\
             someday,$5\n\
             2025-01-02\n",
        )?;

        let aggregated = aggregate(&upload, "Date", "Amount")?;

        assert_eq!(
            aggregated,
            vec![AggregatedTransaction::new(date("2025-01-01")?, dec!(100))]
        );
        Ok(())
    }

    #[test]
    fn test_aggregate_unknown_column() -> Result<()> {
        let upload = upload("Date,Amount\n2025-01-01,1\n")?;
        let res = aggregate(&upload, "Date", "Salary");
        assert!(matches!(res, Err(AggregateError::UnknownColumn(c)) if c == "Salary"));
        Ok(())
    }

    #[test]
    fn test_check_columns() -> Result<()> {
        let upload = upload("Date,Amount\n2025-01-01,1\n")?;
        upload.check_columns("Date", "Amount")?;
        assert!(matches!(
            upload.check_columns("Paid on", "Amount"),
            Err(AggregateError::UnknownColumn(c)) if c == "Paid on"
        ));
        assert!(upload.check_columns("Date", "Gross").is_err());
        Ok(())
    }

    #[test]
    fn test_upload_strips_bom_from_headers() -> Result<()> {
        let upload = upload("\u{feff}Date, Amount\n2025-01-01,1\n")?;
        assert_eq!(upload.headers(), ["Date", "Amount"]);
        assert_eq!(upload.len(), 1);
        Ok(())
    }

    #[test]
    fn test_parse_amount_cleans_currency_text() -> Result<()> {
        assert_eq!(parse_amount("$1,234.50")?, dec!(1234.50));
        assert_eq!(parse_amount(" USD 99 ")?, dec!(99));
        assert_eq!(parse_amount("-$12.5")?, dec!(-12.5));
        assert_eq!(parse_amount("($20.00)")?, dec!(-20.00));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("$").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_date_formats() -> Result<()> {
        let expected = date("2025-01-31")?;
        for raw in [
            "2025-01-31",
            "2025/01/31",
            "01/31/2025",
            "1/31/2025",
            "31.01.2025",
            "20250131",
            "Jan 31, 2025",
            "January 31, 2025",
            "31 Jan 2025",
            "2025年1月31日",
            "2025-01-31 23:59:59",
            "2025-01-31T08:00:00",
            "2025-01-31T08:00:00+09:00",
        ] {
            assert_eq!(parse_date(raw)?, expected, "{raw}");
        }
        assert!(parse_date("31/31/2025").is_err());
        assert!(parse_date("").is_err());
        Ok(())
    }
}
