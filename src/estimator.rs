use crate::models::{Comparison, Estimate, Prediction};

/// Historical average price (€/kWh) used when no baseline is configured
pub const DEFAULT_HISTORICAL_AVG: f64 = 0.18;

/// Compares today's average price with a historical baseline and classifies the difference.
///
/// This is a static threshold comparison, not a forecasting model. The baseline is passed
/// through unchecked, a zero baseline gives a non-finite percentage which ends up in the
/// last band.
///
/// # Arguments
///
/// * 'today_prices' - today's prices
/// * 'historical_avg' - historical average price to compare with
pub fn estimate(today_prices: &[f64], historical_avg: f64) -> Estimate {
    if today_prices.is_empty() {
        return Estimate {
            prediction: Prediction::NoData,
            confidence: 0.0,
            comparison: None,
        };
    }

    let today_avg = today_prices.iter().sum::<f64>() / today_prices.len() as f64;
    let difference = today_avg - historical_avg;
    let difference_percent = difference / historical_avg * 100.0;

    let (prediction, confidence) = classify(difference_percent);

    Estimate {
        prediction,
        confidence,
        comparison: Some(Comparison {
            today_avg,
            historical_avg,
            difference,
            difference_percent,
        }),
    }
}

/// Half-open bands evaluated in ascending order
fn classify(difference_percent: f64) -> (Prediction, f64) {
    if difference_percent < -10.0 {
        (Prediction::SignificantlyCheaper, 0.8)
    } else if difference_percent < -5.0 {
        (Prediction::Cheaper, 0.6)
    } else if difference_percent < 5.0 {
        (Prediction::Normal, 0.5)
    } else if difference_percent < 10.0 {
        (Prediction::MoreExpensive, 0.6)
    } else {
        (Prediction::SignificantlyExpensive, 0.8)
    }
}
