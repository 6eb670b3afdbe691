use std::fmt;

use rust_decimal::Decimal;

use crate::models::RateSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Gain,
    Loss,
    Even,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Gain => write!(f, "gain"),
            Outcome::Loss => write!(f, "loss"),
            Outcome::Even => write!(f, "none"),
        }
    }
}

/// Realized FX gain/loss in JPY: `usd_amount * (benchmark_rate - actual_rate)`.
///
/// The polarity is kept as is: a positive value means the benchmark was above
/// the rate actually obtained.
pub fn compute(benchmark_rate: Decimal, actual_rate: Decimal, usd_amount: Decimal) -> Decimal {
    usd_amount * (benchmark_rate - actual_rate)
}

/// Latest stored mid rate, or `fallback` when nothing is stored.
pub fn benchmark_rate(series: &RateSeries, fallback: Decimal) -> Decimal {
    series.latest().map(|rate| *rate.mid_rate()).unwrap_or(fallback)
}

pub fn classify(value: Decimal) -> Outcome {
    if value > Decimal::ZERO {
        Outcome::Gain
    } else if value < Decimal::ZERO {
        Outcome::Loss
    } else {
        Outcome::Even
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyRate;
    use anyhow::Result;
    use chrono::NaiveDate;
    use rust_decimal::prelude::*;

    #[test]
    fn test_compute_uses_benchmark_minus_actual() {
        assert_eq!(compute(dec!(158.18), dec!(150.0), dec!(1000)), dec!(8180.0));
        assert_eq!(compute(dec!(150.0), dec!(158.18), dec!(1000)), dec!(-8180.0));
    }

    #[test]
    fn test_compute_accepts_zero_and_negative_inputs() {
        assert_eq!(compute(dec!(158.18), dec!(0), dec!(0)), dec!(0));
        assert_eq!(compute(dec!(150), dec!(151), dec!(-10)), dec!(10));
    }

    #[test]
    fn test_benchmark_rate_prefers_latest_stored_rate() -> Result<()> {
        let series = RateSeries::from_rates(vec![
            DailyRate::new(NaiveDate::parse_from_str("2025-01-06", "%Y-%m-%d")?, dec!(158.43), dec!(156.43)),
            DailyRate::new(NaiveDate::parse_from_str("2025-01-03", "%Y-%m-%d")?, dec!(159.0), dec!(157.0)),
        ]);
        assert_eq!(benchmark_rate(&series, dec!(158.18)), dec!(157.43));
        assert_eq!(benchmark_rate(&RateSeries::new(), dec!(158.18)), dec!(158.18));
        Ok(())
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(dec!(8180.0)), Outcome::Gain);
        assert_eq!(classify(dec!(-0.01)), Outcome::Loss);
        assert_eq!(classify(Decimal::ZERO), Outcome::Even);
        assert_eq!(Outcome::Loss.to_string(), "loss");
    }
}
