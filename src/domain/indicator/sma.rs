//! Simple Moving Average indicator.
//!
//! SMA(n) = (P[i-n+1] + ... + P[i]) / n
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Sma(period),
            values: vec![None; closes.len()],
        };
    }

    // Each window is averaged as offsets from its first close, so a constant
    // window yields exactly that close and crossover ties compare exactly.
    let values = (0..closes.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &closes[i + 1 - period..=i];
                let anchor = window[0];
                let offset: f64 = window.iter().map(|c| c - anchor).sum();
                Some(anchor + offset / period as f64)
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(series.values[0], None);
        assert_eq!(series.values[1], None);
        assert!(series.values[2].is_some());
        assert!(series.values[4].is_some());
    }

    #[test]
    fn sma_values() {
        let series = calculate_sma(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert_eq!(series.get(2), Some(20.0));
        assert_eq!(series.get(3), Some(30.0));
        assert_eq!(series.get(4), Some(40.0));
    }

    #[test]
    fn sma_period_one_is_close() {
        let closes = [3.0, 1.0, 4.0];
        let series = calculate_sma(&closes, 1);
        assert_eq!(series.values, vec![Some(3.0), Some(1.0), Some(4.0)]);
    }

    #[test]
    fn sma_longer_than_series() {
        let series = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(series.values, vec![None, None]);
    }

    #[test]
    fn sma_zero_period_is_all_undefined() {
        let series = calculate_sma(&[1.0, 2.0], 0);
        assert_eq!(series.values, vec![None, None]);
    }

    #[test]
    fn sma_flat_series_is_exact() {
        let closes = vec![0.1; 30];
        let short = calculate_sma(&closes, 3);
        let long = calculate_sma(&closes, 7);
        for i in 6..30 {
            assert_eq!(short.get(i), Some(0.1));
            assert_eq!(long.get(i), Some(0.1));
        }
    }
}
