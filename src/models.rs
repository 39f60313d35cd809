use std::fmt;
use std::fmt::Formatter;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// The two halves of a day-ahead price release
#[derive(Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DayTag {
    Today,
    Tomorrow,
}

impl DayTag {
    /// Parses a day tag as used in raw table column labels
    ///
    /// # Arguments
    ///
    /// * 'tag' - the tag to parse, i.e. "Today" or "Tomorrow"
    pub fn parse(tag: &str) -> Option<DayTag> {
        match tag {
            "Today" => Some(DayTag::Today),
            "Tomorrow" => Some(DayTag::Tomorrow),
            _ => None,
        }
    }

    /// Returns the calendar date the tag refers to given the date of today
    ///
    /// # Arguments
    ///
    /// * 'today' - the date of today
    pub fn date(&self, today: NaiveDate) -> NaiveDate {
        match self {
            DayTag::Today => today,
            DayTag::Tomorrow => today.succ_opt().unwrap_or(today),
        }
    }
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for DayTag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DayTag::Today    => write!(f, "Today"),
            DayTag::Tomorrow => write!(f, "Tomorrow"),
        }
    }
}

/// One row of a raw price table, cells are aligned with the table's columns
#[derive(Clone, PartialEq, Debug)]
pub struct RawPriceRow {
    pub hour: String,
    pub cells: Vec<Option<f64>>,
}

/// Price table as scraped from the source, columns are labelled "<DayTag> <HH:MM>"
#[derive(Clone, PartialEq, Debug, Default)]
pub struct RawPriceTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawPriceRow>,
}

/// One 15-minute pricing interval
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct PriceSlot {
    pub day: DayTag,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub sequence_index: usize,
}

/// Time ordered series of price slots for one or both days.
///
/// The series can't be changed once created, analysis functions derive new structures from it.
#[derive(Serialize, Clone, PartialEq, Debug, Default)]
pub struct PriceSeries {
    slots: Vec<PriceSlot>,
}

impl PriceSeries {
    /// Creates a new series from slots already sorted and indexed
    ///
    /// # Arguments
    ///
    /// * 'slots' - sorted slots with sequence index assigned
    pub(crate) fn new(slots: Vec<PriceSlot>) -> PriceSeries {
        PriceSeries { slots }
    }

    pub fn slots(&self) -> &[PriceSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the slots for the given day in timestamp order
    ///
    /// # Arguments
    ///
    /// * 'day' - day to filter on
    pub fn day_slots(&self, day: DayTag) -> Vec<&PriceSlot> {
        self.slots.iter().filter(|s| s.day == day).collect()
    }

    /// Returns the prices for the given day in timestamp order
    ///
    /// # Arguments
    ///
    /// * 'day' - day to filter on
    pub fn day_prices(&self, day: DayTag) -> Vec<f64> {
        self.slots.iter().filter(|s| s.day == day).map(|s| s.price).collect()
    }
}

/// A fixed length run of consecutive slots evaluated by its average price
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub size_hours: u32,
    pub avg_price: f64,
    pub member_prices: Vec<f64>,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Window {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}h -> {} - {}: avg {:>7.4}",
               self.size_hours,
               self.start.format("%d %H:%M"),
               self.end.format("%d %H:%M"),
               self.avg_price)
    }
}

#[derive(Serialize, Clone, PartialEq, Debug, Default)]
pub struct WindowSearch {
    pub best_slots: Vec<PriceSlot>,
    pub best_windows: Vec<Window>,
    pub worst_slots: Vec<PriceSlot>,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Volatility {
    pub max_change: f64,
    pub avg_change: f64,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct PeakAnalysis {
    pub peak_count: usize,
    pub off_peak_count: usize,
    pub peak_avg: f64,
    pub off_peak_avg: f64,
}

/// Descriptive statistics for one day.
///
/// Tomorrow only carries min, max and avg since its data is provisional.
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct StatBlock {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q75: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Volatility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_analysis: Option<PeakAnalysis>,
}

#[derive(Serialize, Clone, PartialEq, Debug, Default)]
pub struct PriceStatistics {
    pub today: Option<StatBlock>,
    pub tomorrow: Option<StatBlock>,
}

/// Price level of a single slot in relation to configured price bands
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PriceLevel {
    Cheap,
    Normal,
    Expensive,
}

#[derive(Serialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct LevelCounts {
    pub cheap: usize,
    pub normal: usize,
    pub expensive: usize,
}

/// Qualitative outcome of comparing today's prices with a historical baseline
#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Prediction {
    NoData,
    SignificantlyCheaper,
    Cheaper,
    Normal,
    MoreExpensive,
    SignificantlyExpensive,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Prediction::NoData                 => write!(f, "No data"),
            Prediction::SignificantlyCheaper   => write!(f, "Significantly cheaper than average"),
            Prediction::Cheaper                => write!(f, "Cheaper than average"),
            Prediction::Normal                 => write!(f, "Normal price range"),
            Prediction::MoreExpensive          => write!(f, "More expensive than average"),
            Prediction::SignificantlyExpensive => write!(f, "Significantly expensive"),
        }
    }
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Comparison {
    pub today_avg: f64,
    pub historical_avg: f64,
    pub difference: f64,
    pub difference_percent: f64,
}

#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Estimate {
    pub prediction: Prediction,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
}

/// A variable length run of consecutive slots all priced at or below a threshold
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct ConsumptionBlock {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub representative_price: f64,
    pub duration_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_savings: Option<f64>,
}

/// Implementation of the Display Trait for pretty print
impl fmt::Display for ConsumptionBlock {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let outcome = match (self.estimated_savings, self.estimated_cost) {
            (Some(s), _) => format!("savings {:>6.2}", s),
            (None, Some(c)) => format!("cost    {:>6.2}", c),
            (None, None) => String::new(),
        };
        write!(f, "{} - {}: price {:>7.4}, duration {:>5.2}h, {}",
               self.start.format("%d %H:%M"),
               self.end.format("%d %H:%M"),
               self.representative_price,
               self.duration_hours,
               outcome)
    }
}

#[derive(Serialize, Debug)]
pub struct PlannerResult {
    pub threshold: f64,
    pub power_kw: f64,
    pub reference_avg: f64,
    pub blocks: Vec<ConsumptionBlock>,
}

/// Everything derived from one fetched price table, handed over to the presentation layer
#[derive(Serialize, Debug)]
pub struct AnalysisReport {
    pub created: NaiveDateTime,
    pub today: NaiveDate,
    pub today_avg: f64,
    pub tomorrow_avg: Option<f64>,
    pub series: PriceSeries,
    pub statistics: PriceStatistics,
    pub today_levels: LevelCounts,
    pub tomorrow_levels: LevelCounts,
    pub windows_today: WindowSearch,
    pub windows_tomorrow: WindowSearch,
    pub estimate: Estimate,
    pub planner: PlannerResult,
}
