use serde::Deserialize;
use crate::models::{DayTag, LevelCounts, PeakAnalysis, PriceLevel, PriceSeries, PriceStatistics, StatBlock, Volatility};

/// Computes price statistics per day present in the series.
///
/// Today gets the full set including volatility and peak/off-peak analysis while Tomorrow,
/// being provisional, only gets min, max and average.
///
/// # Arguments
///
/// * 'series' - the canonical price series
pub fn compute_statistics(series: &PriceSeries) -> PriceStatistics {
    let today = series.day_prices(DayTag::Today);
    let tomorrow = series.day_prices(DayTag::Tomorrow);

    PriceStatistics {
        today: today_block(&today),
        tomorrow: summary_block(&tomorrow),
    }
}

/// Average price for the given day, or zero if there are no prices for that day
///
/// # Arguments
///
/// * 'series' - the canonical price series
/// * 'day' - day to average
pub fn daily_average(series: &PriceSeries, day: DayTag) -> f64 {
    mean(&series.day_prices(day)).unwrap_or(0.0)
}

fn today_block(prices: &[f64]) -> Option<StatBlock> {
    let mut block = summary_block(prices)?;

    let q25 = percentile(prices, 25.0)?;
    let q75 = percentile(prices, 75.0)?;
    block.std = std_dev(prices);
    block.q25 = Some(q25);
    block.q75 = Some(q75);
    block.volatility = volatility(prices);
    block.peak_analysis = Some(peak_analysis(prices, q25, q75));

    Some(block)
}

fn summary_block(prices: &[f64]) -> Option<StatBlock> {
    Some(StatBlock {
        min: prices.iter().copied().reduce(f64::min)?,
        max: prices.iter().copied().reduce(f64::max)?,
        avg: mean(prices)?,
        std: None,
        q25: None,
        q75: None,
        volatility: None,
        peak_analysis: None,
    })
}

/// Max and mean of absolute changes between successive prices, requires at least two prices
///
/// # Arguments
///
/// * 'prices' - prices in timestamp order
fn volatility(prices: &[f64]) -> Option<Volatility> {
    let changes = prices.windows(2).map(|w| (w[1] - w[0]).abs()).collect::<Vec<f64>>();

    Some(Volatility {
        max_change: changes.iter().copied().reduce(f64::max)?,
        avg_change: mean(&changes)?,
    })
}

/// Splits prices into peak (at or above q75) and off-peak (at or below q25).
/// The two sets may share prices equal to a threshold.
///
/// # Arguments
///
/// * 'prices' - the day's prices
/// * 'q25' - off-peak threshold
/// * 'q75' - peak threshold
fn peak_analysis(prices: &[f64], q25: f64, q75: f64) -> PeakAnalysis {
    let peak = prices.iter().copied().filter(|&p| p >= q75).collect::<Vec<f64>>();
    let off_peak = prices.iter().copied().filter(|&p| p <= q25).collect::<Vec<f64>>();

    PeakAnalysis {
        peak_count: peak.len(),
        off_peak_count: off_peak.len(),
        peak_avg: mean(&peak).unwrap_or(0.0),
        off_peak_avg: mean(&off_peak).unwrap_or(0.0),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;

    Some(variance.sqrt())
}

/// Percentile with linear interpolation between the closest ranks
///
/// # Arguments
///
/// * 'values' - values in any order
/// * 'p' - percentile, 0-100
fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Price bands used to classify single slots as cheap or expensive
#[derive(Deserialize, Clone, Debug)]
pub struct PriceBands {
    #[serde(default = "default_cheap_below")]
    pub cheap_below: f64,
    #[serde(default = "default_expensive_above")]
    pub expensive_above: f64,
}

fn default_cheap_below() -> f64 { 0.14 }
fn default_expensive_above() -> f64 { 0.24 }

impl Default for PriceBands {
    fn default() -> Self {
        PriceBands {
            cheap_below: default_cheap_below(),
            expensive_above: default_expensive_above(),
        }
    }
}

impl PriceBands {
    pub fn price_level(&self, price: f64) -> PriceLevel {
        if price > self.expensive_above {
            PriceLevel::Expensive
        } else if price < self.cheap_below {
            PriceLevel::Cheap
        } else {
            PriceLevel::Normal
        }
    }

    /// Counts the slots of a day per price level
    ///
    /// # Arguments
    ///
    /// * 'series' - the canonical price series
    /// * 'day' - day to count for
    pub fn level_counts(&self, series: &PriceSeries, day: DayTag) -> LevelCounts {
        series.day_prices(day)
            .into_iter()
            .fold(LevelCounts::default(), |mut acc, p| {
                match self.price_level(p) {
                    PriceLevel::Cheap => acc.cheap += 1,
                    PriceLevel::Normal => acc.normal += 1,
                    PriceLevel::Expensive => acc.expensive += 1,
                }
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};
    use crate::models::PriceSlot;
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    fn series(today: &[f64], tomorrow: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2025, 10, 22).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut slots = Vec::new();
        for (day, prices, offset) in [(DayTag::Today, today, 0), (DayTag::Tomorrow, tomorrow, 1)] {
            for (i, p) in prices.iter().enumerate() {
                slots.push(PriceSlot {
                    day,
                    timestamp: base + TimeDelta::days(offset) + TimeDelta::minutes(15 * i as i64),
                    price: *p,
                    sequence_index: slots.len(),
                });
            }
        }

        PriceSeries::new(slots)
    }

    #[test]
    fn four_price_day() {
        let stats = compute_statistics(&series(&[0.10, 0.20, 0.30, 0.40], &[]));
        let today = stats.today.unwrap();

        assert_close(today.min, 0.10);
        assert_close(today.max, 0.40);
        assert_close(today.avg, 0.25);
        assert_close(today.q25.unwrap(), 0.175);
        assert_close(today.q75.unwrap(), 0.325);
        assert!((today.std.unwrap() - 0.1118).abs() < 1e-4);
        assert!(stats.tomorrow.is_none());
    }

    #[test]
    fn volatility_and_peaks() {
        let stats = compute_statistics(&series(&[0.10, 0.30, 0.20, 0.40], &[]));
        let today = stats.today.unwrap();

        let volatility = today.volatility.unwrap();
        assert_close(volatility.max_change, 0.20);
        assert_close(volatility.avg_change, (0.20 + 0.10 + 0.20) / 3.0);

        let peak = today.peak_analysis.unwrap();
        assert_eq!(peak.peak_count, 1);
        assert_eq!(peak.off_peak_count, 1);
        assert_close(peak.peak_avg, 0.40);
        assert_close(peak.off_peak_avg, 0.10);
    }

    #[test]
    fn flat_day_overlaps_peak_and_off_peak() {
        let stats = compute_statistics(&series(&[0.25; 8], &[]));
        let peak = stats.today.unwrap().peak_analysis.unwrap();

        assert_eq!(peak.peak_count, 8);
        assert_eq!(peak.off_peak_count, 8);
    }

    #[test]
    fn single_slot_has_no_volatility() {
        let stats = compute_statistics(&series(&[0.25], &[]));
        let today = stats.today.unwrap();

        assert!(today.volatility.is_none());
        assert_close(today.std.unwrap(), 0.0);
        assert_close(today.q25.unwrap(), 0.25);
    }

    #[test]
    fn tomorrow_is_summary_only() {
        let stats = compute_statistics(&series(&[], &[0.3, 0.1, 0.2]));
        let tomorrow = stats.tomorrow.unwrap();

        assert!(stats.today.is_none());
        assert_close(tomorrow.min, 0.1);
        assert_close(tomorrow.max, 0.3);
        assert_close(tomorrow.avg, 0.2);
        assert!(tomorrow.std.is_none() && tomorrow.q25.is_none() && tomorrow.q75.is_none());
        assert!(tomorrow.volatility.is_none() && tomorrow.peak_analysis.is_none());
    }

    #[test]
    fn daily_averages() {
        let s = series(&[0.1, 0.3], &[0.5]);
        assert_close(daily_average(&s, DayTag::Today), 0.2);
        assert_close(daily_average(&s, DayTag::Tomorrow), 0.5);
        assert_eq!(daily_average(&series(&[], &[]), DayTag::Today), 0.0);
    }

    #[test]
    fn price_levels() {
        let bands = PriceBands::default();
        assert_eq!(bands.price_level(0.10), PriceLevel::Cheap);
        assert_eq!(bands.price_level(0.14), PriceLevel::Normal);
        assert_eq!(bands.price_level(0.24), PriceLevel::Normal);
        assert_eq!(bands.price_level(0.25), PriceLevel::Expensive);

        let counts = bands.level_counts(&series(&[0.1, 0.2, 0.3, 0.05], &[0.3]), DayTag::Today);
        assert_eq!(counts, LevelCounts { cheap: 2, normal: 1, expensive: 1 });
    }
}
