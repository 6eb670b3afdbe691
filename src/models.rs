use std::collections::{BTreeMap, btree_map::Entry};

use chrono::NaiveDate;
use getset::Getters;
use rust_decimal::prelude::*;
use serde::Serialize;

const MID_RATE_DECIMALS: u32 = 3;

/// Computes TTM, the mid rate between the sell (TTS) and buy (TTB) quotes,
/// rounded to three decimals.
pub fn mid_rate(sell_rate: Decimal, buy_rate: Decimal) -> Decimal {
    ((sell_rate + buy_rate) / dec!(2)).round_dp(MID_RATE_DECIMALS)
}

/// One day of published USD/JPY quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct DailyRate {
    #[getset(get = "pub")]
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[getset(get = "pub")]
    #[serde(rename = "TTS")]
    sell_rate: Decimal,
    #[getset(get = "pub")]
    #[serde(rename = "TTB")]
    buy_rate: Decimal,
    #[getset(get = "pub")]
    #[serde(rename = "TTM")]
    mid_rate: Decimal,
}

impl DailyRate {
    pub fn new(date: NaiveDate, sell_rate: Decimal, buy_rate: Decimal) -> Self {
        DailyRate {
            date,
            sell_rate,
            buy_rate,
            mid_rate: mid_rate(sell_rate, buy_rate),
        }
    }
}

/// Date-ordered daily rates with at most one entry per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSeries {
    rates: BTreeMap<NaiveDate, DailyRate>,
}

impl RateSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series keeping the first rate seen for each date.
    pub fn from_rates(rates: impl IntoIterator<Item = DailyRate>) -> Self {
        let mut series = Self::new();
        for rate in rates {
            series.insert(rate);
        }
        series
    }

    /// Appends a rate. Stored rates are never replaced, so a date that is
    /// already covered leaves the series untouched and returns `false`.
    pub fn insert(&mut self, rate: DailyRate) -> bool {
        match self.rates.entry(*rate.date()) {
            Entry::Vacant(entry) => {
                entry.insert(rate);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&DailyRate> {
        self.rates.get(date)
    }

    pub fn latest(&self) -> Option<&DailyRate> {
        self.rates.values().next_back()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rates.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyRate> {
        self.rates.values()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Sum of uploaded amounts sharing one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct AggregatedTransaction {
    #[getset(get = "pub")]
    date: NaiveDate,
    #[getset(get = "pub")]
    amount_sum: Decimal,
}

impl AggregatedTransaction {
    pub fn new(date: NaiveDate, amount_sum: Decimal) -> Self {
        AggregatedTransaction { date, amount_sum }
    }
}

/// A dated USD amount with its JPY conversion. `mid_rate` and `amount_jpy`
/// are `None` when no rate was published for the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct ConvertedRecord {
    #[getset(get = "pub")]
    date: NaiveDate,
    #[getset(get = "pub")]
    amount_usd: Decimal,
    #[getset(get = "pub")]
    mid_rate: Option<Decimal>,
    #[getset(get = "pub")]
    amount_jpy: Option<Decimal>,
}

impl ConvertedRecord {
    pub fn matched(date: NaiveDate, amount_usd: Decimal, mid_rate: Decimal) -> Self {
        ConvertedRecord {
            date,
            amount_usd,
            mid_rate: Some(mid_rate),
            amount_jpy: Some(amount_usd * mid_rate),
        }
    }

    pub fn unmatched(date: NaiveDate, amount_usd: Decimal) -> Self {
        ConvertedRecord {
            date,
            amount_usd,
            mid_rate: None,
            amount_jpy: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.mid_rate.is_some()
    }
}
