use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use scraper::{Html, Selector};

use crate::{config::RateSourceConfig, errors::FetchError, traits::RateSource};

const CURRENCY_LABEL: &str = "US Dollar";
const DATE_KEY_FORMAT: &str = "%y%m%d";
const SELL_COLUMN: usize = 3;
const BUY_COLUMN: usize = 4;

/// Scrapes the daily quote tables published by MUFG Research & Consulting.
pub struct MufgRateFetcher {
    client: Client,
    base_url: String,
}

impl MufgRateFetcher {
    pub fn new(config: &RateSourceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Unreachable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn url_for(&self, date: NaiveDate) -> String {
        format!("{}{}", self.base_url, date_key(date))
    }
}

impl RateSource for MufgRateFetcher {
    fn fetch(&self, date: NaiveDate) -> Result<(Decimal, Decimal), FetchError> {
        let url = self.url_for(date);
        debug!("fetching {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::Unreachable(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(FetchError::Unreachable(format!(
                "{url}: status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .map_err(|e| FetchError::Unreachable(format!("{url}: {e}")))?;

        parse_quote(&body)
    }
}

/// Formats a date as the source's page key, e.g. `250106` for 2025-01-06.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Extracts the (TTS, TTB) pair from the "US Dollar" row of a quote page.
pub fn parse_quote(html: &str) -> Result<(Decimal, Decimal), FetchError> {
    let document = Html::parse_document(html);
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();

        if !cells.iter().any(|cell| cell == CURRENCY_LABEL) {
            continue;
        }

        let sell = parse_rate(cells.get(SELL_COLUMN))?;
        let buy = parse_rate(cells.get(BUY_COLUMN))?;
        return Ok((sell, buy));
    }

    Err(FetchError::NoData(format!("no {CURRENCY_LABEL} row")))
}

fn parse_rate(cell: Option<&String>) -> Result<Decimal, FetchError> {
    let text = cell.ok_or(FetchError::NoData("missing rate cell".to_string()))?;
    let rate = text
        .replace(',', "")
        .parse::<Decimal>()
        .map_err(|_| FetchError::NoData(format!("unparseable rate {text:?}")))?;

    if rate <= Decimal::ZERO {
        return Err(FetchError::NoData(format!("non-positive rate {rate}")));
    }
    Ok(rate)
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::NoData(format!("bad selector {css:?}: {e}")))
}
