use crate::models::{DayTag, PriceSeries, PriceSlot, Window, WindowSearch};

const SLOTS_PER_HOUR: usize = 4;
const TOP_SLOTS: usize = 10;
const TOP_WINDOWS_PER_SIZE: usize = 5;

/// Finds the cheapest and most expensive slots, and the cheapest windows of the requested sizes,
/// for one day.
///
/// Windows slide over positionally adjacent slots, i.e. a gap in the day's series is not
/// detected and a window may span it.
///
/// # Arguments
///
/// * 'series' - the canonical price series
/// * 'day' - the day to search
/// * 'window_sizes' - window sizes in whole hours, duplicates are ignored
pub fn find_windows(series: &PriceSeries, day: DayTag, window_sizes: &[u32]) -> WindowSearch {
    let slots = series.day_slots(day);
    if slots.is_empty() {
        return WindowSearch::default();
    }

    let mut by_price = slots.clone();
    by_price.sort_by(|a, b| a.price.total_cmp(&b.price).then(a.timestamp.cmp(&b.timestamp)));
    let best_slots = by_price.iter().take(TOP_SLOTS).map(|&s| s.clone()).collect::<Vec<PriceSlot>>();

    by_price.sort_by(|a, b| b.price.total_cmp(&a.price).then(a.timestamp.cmp(&b.timestamp)));
    let worst_slots = by_price.iter().take(TOP_SLOTS).map(|&s| s.clone()).collect::<Vec<PriceSlot>>();

    let mut sizes: Vec<u32> = Vec::with_capacity(window_sizes.len());
    window_sizes.iter().for_each(|s| if !sizes.contains(s) { sizes.push(*s) });

    let mut windows: Vec<Window> = sizes.iter()
        .flat_map(|&size| sliding_windows(&slots, size))
        .collect();
    windows.sort_by(|a, b| a.avg_price.total_cmp(&b.avg_price));

    let mut best_windows: Vec<Window> = Vec::new();
    for size in sizes {
        best_windows.extend(windows.iter().filter(|w| w.size_hours == size).take(TOP_WINDOWS_PER_SIZE).cloned());
    }

    WindowSearch {
        best_slots,
        best_windows,
        worst_slots,
    }
}

/// Returns all windows of the given size in timestamp order
///
/// # Arguments
///
/// * 'slots' - one day's slots in timestamp order
/// * 'size' - window size in hours
fn sliding_windows(slots: &[&PriceSlot], size: u32) -> Vec<Window> {
    let length = size as usize * SLOTS_PER_HOUR;
    if length == 0 || length > slots.len() {
        return Vec::new();
    }

    slots.windows(length)
        .map(|w| {
            let member_prices = w.iter().map(|s| s.price).collect::<Vec<f64>>();
            Window {
                start: w[0].timestamp,
                end: w[length - 1].timestamp,
                size_hours: size,
                avg_price: member_prices.iter().sum::<f64>() / length as f64,
                member_prices,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use super::*;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 22).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn series(prices: &[f64]) -> PriceSeries {
        let slots = prices.iter()
            .enumerate()
            .map(|(i, p)| PriceSlot {
                day: DayTag::Today,
                timestamp: start() + TimeDelta::minutes(15 * i as i64),
                price: *p,
                sequence_index: i,
            })
            .collect();

        PriceSeries::new(slots)
    }

    #[test]
    fn empty_day_gives_empty_result() {
        let result = find_windows(&series(&[0.1, 0.2]), DayTag::Tomorrow, &[3]);
        assert_eq!(result, WindowSearch::default());
    }

    #[test]
    fn best_and_worst_slots() {
        let prices = (0..24).map(|i| ((i * 7) % 24) as f64 / 100.0).collect::<Vec<f64>>();
        let result = find_windows(&series(&prices), DayTag::Today, &[]);

        assert_eq!(result.best_slots.len(), 10);
        assert_eq!(result.worst_slots.len(), 10);
        assert!(result.best_windows.is_empty());
        assert!(result.best_slots.windows(2).all(|w| w[0].price <= w[1].price));
        assert!(result.worst_slots.windows(2).all(|w| w[0].price >= w[1].price));
        assert_eq!(result.best_slots[0].price, 0.0);
        assert_eq!(result.worst_slots[0].price, 0.23);
    }

    #[test]
    fn ties_are_broken_by_time() {
        let result = find_windows(&series(&[0.2, 0.1, 0.2, 0.1]), DayTag::Today, &[]);

        let best = result.best_slots.iter().map(|s| s.sequence_index).collect::<Vec<usize>>();
        let worst = result.worst_slots.iter().map(|s| s.sequence_index).collect::<Vec<usize>>();
        assert_eq!(best, vec![1, 3, 0, 2]);
        assert_eq!(worst, vec![0, 2, 1, 3]);
    }

    #[test]
    fn flat_prices_give_equal_windows() {
        let result = find_windows(&series(&[0.25; 40]), DayTag::Today, &[3, 6]);

        assert!(result.best_windows.iter().all(|w| w.avg_price == 0.25));
        let mut best = result.best_slots.iter().map(|s| s.price).collect::<Vec<f64>>();
        let mut worst = result.worst_slots.iter().map(|s| s.price).collect::<Vec<f64>>();
        best.sort_by(|a, b| a.total_cmp(b));
        worst.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(best, worst);
    }

    #[test]
    fn top_five_per_size() {
        // 96 slots with a cheap valley around noon
        let prices = (0..96).map(|i| (i as f64 - 48.0).abs() / 100.0).collect::<Vec<f64>>();
        let result = find_windows(&series(&prices), DayTag::Today, &[3, 6, 3]);

        assert_eq!(result.best_windows.len(), 10);
        assert!(result.best_windows[..5].iter().all(|w| w.size_hours == 3 && w.member_prices.len() == 12));
        assert!(result.best_windows[5..].iter().all(|w| w.size_hours == 6 && w.member_prices.len() == 24));
        assert!(result.best_windows[..5].windows(2).all(|w| w[0].avg_price <= w[1].avg_price));

        let cheapest = &result.best_windows[0];
        assert_eq!(cheapest.end - cheapest.start, TimeDelta::minutes(15 * 11));
        assert!(cheapest.start <= start() + TimeDelta::hours(12));
        assert!(cheapest.end >= start() + TimeDelta::hours(12));
    }

    #[test]
    fn window_spans_gap_in_series() {
        // 00:00-00:45 and 02:00-02:45, hour 01 missing
        let minutes = [0, 15, 30, 45, 120, 135, 150, 165];
        let slots = minutes.iter()
            .enumerate()
            .map(|(i, m)| PriceSlot {
                day: DayTag::Today,
                timestamp: start() + TimeDelta::minutes(*m),
                price: (i + 1) as f64 / 10.0,
                sequence_index: i,
            })
            .collect();
        let result = find_windows(&PriceSeries::new(slots), DayTag::Today, &[1]);

        assert_eq!(result.best_windows.len(), 5);
        let spanning = result.best_windows.iter()
            .find(|w| w.start == start() + TimeDelta::minutes(15))
            .unwrap();
        assert_eq!(spanning.end, start() + TimeDelta::hours(2));
        assert_eq!(spanning.member_prices.len(), 4);
        assert!((spanning.avg_price - 0.35).abs() < 1e-9);
    }

    #[test]
    fn oversized_window_contributes_nothing() {
        let result = find_windows(&series(&[0.1; 20]), DayTag::Today, &[6, 1, 0]);

        assert_eq!(result.best_windows.len(), 5);
        assert!(result.best_windows.iter().all(|w| w.size_hours == 1));
    }
}
