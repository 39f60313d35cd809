use chrono::TimeDelta;
use crate::models::{ConsumptionBlock, PriceSeries, PriceSlot};

const SLOT_MINUTES: i64 = 15;

/// Merges slots priced at or below the threshold into contiguous blocks and estimates what
/// running an appliance through each block would save compared to the reference average.
///
/// Slots from both days are considered and only the time gap decides where a block ends, so
/// a block may run from Today into Tomorrow. The block price is the price of its last slot.
///
/// # Arguments
///
/// * 'series' - the canonical price series
/// * 'threshold' - highest price to count as cheap
/// * 'power_kw' - appliance power rating
/// * 'reference_avg' - average price to compare each block against
pub fn plan_blocks(series: &PriceSeries, threshold: f64, power_kw: f64, reference_avg: f64) -> Vec<ConsumptionBlock> {
    let mut cheap = series.slots()
        .iter()
        .filter(|s| s.price <= threshold)
        .collect::<Vec<&PriceSlot>>();
    cheap.sort_by_key(|s| s.timestamp);

    let mut blocks: Vec<ConsumptionBlock> = Vec::new();
    let mut iter = cheap.into_iter();
    let Some(mut start) = iter.next() else {
        return blocks;
    };

    let mut prev = start;
    for slot in iter {
        if slot.timestamp - prev.timestamp > TimeDelta::minutes(SLOT_MINUTES) {
            blocks.push(consumption_block(start, prev, power_kw, reference_avg));
            start = slot;
        }
        prev = slot;
    }
    blocks.push(consumption_block(start, prev, power_kw, reference_avg));

    blocks
}

/// Creates a consumption block spanning first to last slot
///
/// # Arguments
///
/// * 'first' - first slot in the block
/// * 'last' - last slot in the block, also gives the block price
/// * 'power_kw' - appliance power rating
/// * 'reference_avg' - average price to compare against
fn consumption_block(first: &PriceSlot, last: &PriceSlot, power_kw: f64, reference_avg: f64) -> ConsumptionBlock {
    let span = last.timestamp - first.timestamp + TimeDelta::minutes(SLOT_MINUTES);
    let duration_hours = span.num_seconds() as f64 / 3600.0;
    let price = last.price;

    let savings = (reference_avg - price) * power_kw * duration_hours;
    let (estimated_savings, estimated_cost) = if savings > 0.0 {
        (Some(savings), None)
    } else {
        (None, Some(price * power_kw * duration_hours))
    };

    ConsumptionBlock {
        start: first.timestamp,
        end: last.timestamp,
        representative_price: price,
        duration_hours,
        estimated_cost,
        estimated_savings,
    }
}
