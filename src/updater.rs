use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Tokyo;
use getset::Getters;
use log::{debug, info, warn};

use crate::{
    errors::{FetchError, StoreError},
    models::{DailyRate, RateSeries},
    traits::{RateRepository, RateSource},
};

/// Dates strictly between the last covered date and `today`, oldest first.
pub struct PendingDates {
    next: Option<NaiveDate>,
    today: NaiveDate,
}

impl Iterator for PendingDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let date = self.next.filter(|d| *d < self.today)?;
        self.next = date.succ_opt();
        Some(date)
    }
}

pub fn pending_dates(last_covered: NaiveDate, today: NaiveDate) -> PendingDates {
    PendingDates {
        next: last_covered.succ_opt(),
        today,
    }
}

/// The current calendar day on the source's (Tokyo) business calendar.
pub fn today_in_tokyo() -> NaiveDate {
    Utc::now().with_timezone(&Tokyo).date_naive()
}

#[derive(Debug)]
pub struct Interruption {
    pub date: NaiveDate,
    pub error: FetchError,
}

#[derive(Debug, Getters)]
pub struct UpdateReport {
    #[getset(get = "pub")]
    series: RateSeries,
    #[getset(get = "pub")]
    added: usize,
    #[getset(get = "pub")]
    interrupted: Option<Interruption>,
}

/// Brings the stored rate series up to yesterday, one day at a time.
pub struct RateUpdater<F, R> {
    source: F,
    repository: R,
    anchor: DailyRate,
}

impl<F, R> RateUpdater<F, R>
where
    F: RateSource,
    R: RateRepository,
{
    pub fn new(source: F, repository: R, anchor: DailyRate) -> Self {
        Self {
            source,
            repository,
            anchor,
        }
    }

    pub fn update(&self) -> Result<UpdateReport, StoreError> {
        self.update_until(today_in_tokyo())
    }

    /// Fetches every missing day before `today` and persists the merged series.
    ///
    /// A day without a published quote is skipped. An unreachable source stops
    /// the backfill; days fetched up to that point are still persisted and the
    /// failing day is reported in `UpdateReport::interrupted`. A store that
    /// cannot be read is left untouched and its error returned.
    pub fn update_until(&self, today: NaiveDate) -> Result<UpdateReport, StoreError> {
        let mut series = match self.repository.load()? {
            Some(series) => series,
            None => RateSeries::from_rates([self.anchor.clone()]),
        };

        let last_covered = series.last_date().unwrap_or(*self.anchor.date());
        let mut added = 0;
        let mut interrupted = None;

        for date in pending_dates(last_covered, today) {
            match self.source.fetch(date) {
                Ok((sell, buy)) => {
                    let rate = DailyRate::new(date, sell, buy);
                    debug!("{date}: TTS {sell} TTB {buy} TTM {}", rate.mid_rate());
                    if series.insert(rate) {
                        added += 1;
                    }
                }
                Err(FetchError::NoData(reason)) => debug!("{date}: skipped, {reason}"),
                Err(error) => {
                    warn!("{date}: {error}; stopping update");
                    interrupted = Some(Interruption { date, error });
                    break;
                }
            }
        }

        self.repository.persist(&series)?;
        info!(
            "added {added} daily rates, covered through {}",
            series
                .last_date()
                .map(|d| d.to_string())
                .unwrap_or_default()
        );

        Ok(UpdateReport {
            series,
            added,
            interrupted,
        })
    }
}
