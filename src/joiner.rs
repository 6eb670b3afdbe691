use crate::models::{AggregatedTransaction, ConvertedRecord, RateSeries};

/// Left-joins aggregated amounts against the rate series on exact date.
///
/// Every aggregated date yields one record, sorted by date; dates without a
/// stored rate come back unmatched rather than being dropped.
pub fn join(aggregated: &[AggregatedTransaction], rates: &RateSeries) -> Vec<ConvertedRecord> {
    let mut records: Vec<ConvertedRecord> = aggregated
        .iter()
        .map(|tx| match rates.get(tx.date()) {
            Some(rate) => ConvertedRecord::matched(*tx.date(), *tx.amount_sum(), *rate.mid_rate()),
            None => ConvertedRecord::unmatched(*tx.date(), *tx.amount_sum()),
        })
        .collect();

    records.sort_by_key(|record| *record.date());
    records
}
