use std::fs;
use chrono::{Local, NaiveDate, NaiveDateTime};
use glob::glob;
use log::{info, warn};
use thiserror::Error;
use crate::config::{AnalysisParameters, Config, PlannerParameters};
use crate::estimator::estimate;
use crate::initialization::Mgr;
use crate::models::{AnalysisReport, DayTag, PlannerResult, RawPriceTable};
use crate::normalizer::normalize;
use crate::planner::plan_blocks;
use crate::statistics::{compute_statistics, daily_average, PriceBands};
use crate::windows::find_windows;

/// Runs one fetch and analysis cycle
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'mgr' - struct with configured managers
/// * 'today' - the date that Today prices refer to
pub fn run(config: &Config, mgr: &Mgr, today: NaiveDate) -> Result<(), WorkerError> {
    let raw = mgr.nordpool.get_price_table()
        .map_err(|e| WorkerError::FetchError(format!("error getting price table: {}", e)))?;

    let created = Local::now().naive_local();
    let report = analyze(&raw, today, created, &config.analysis, &config.planner, &config.price_bands)?;

    log_report(&report);
    save_report(&config.files.report_dir, &report)?;

    Ok(())
}

/// Normalizes a raw price table and derives all analysis results from it.
/// The analyses only read the series, so they are run in parallel.
///
/// # Arguments
///
/// * 'raw' - raw price table
/// * 'today' - the date that Today prices refer to
/// * 'created' - time stamp for the report
/// * 'analysis' - window sizes and historical baseline
/// * 'planner' - consumption block planner parameters
/// * 'bands' - price bands for classifying slots
pub fn analyze(
    raw: &RawPriceTable,
    today: NaiveDate,
    created: NaiveDateTime,
    analysis: &AnalysisParameters,
    planner: &PlannerParameters,
    bands: &PriceBands) -> Result<AnalysisReport, WorkerError>
{
    let series = normalize(raw, today)
        .map_err(|e| WorkerError::NormalizeError(e.to_string()))?;
    info!("Price slots: {} (today {}, tomorrow {})",
        series.len(), series.day_slots(DayTag::Today).len(), series.day_slots(DayTag::Tomorrow).len());

    let today_avg = daily_average(&series, DayTag::Today);
    let reference_avg = planner.reference_avg.unwrap_or(today_avg);
    let sizes = &analysis.window_sizes;

    let ((statistics, blocks), (windows_today, windows_tomorrow)) = rayon::join(
        || rayon::join(
            || compute_statistics(&series),
            || plan_blocks(&series, planner.threshold, planner.power_kw, reference_avg)),
        || rayon::join(
            || find_windows(&series, DayTag::Today, sizes),
            || find_windows(&series, DayTag::Tomorrow, sizes)),
    );

    let tomorrow_avg = statistics.tomorrow.as_ref().map(|s| s.avg);

    Ok(AnalysisReport {
        created,
        today,
        today_avg,
        tomorrow_avg,
        today_levels: bands.level_counts(&series, DayTag::Today),
        tomorrow_levels: bands.level_counts(&series, DayTag::Tomorrow),
        estimate: estimate(&series.day_prices(DayTag::Today), analysis.historical_avg),
        statistics,
        windows_today,
        windows_tomorrow,
        planner: PlannerResult {
            threshold: planner.threshold,
            power_kw: planner.power_kw,
            reference_avg,
            blocks,
        },
        series,
    })
}

/// Logs a summary of the analysis
///
/// # Arguments
///
/// * 'report' - the analysis report
fn log_report(report: &AnalysisReport) {
    info!("Average today: {:.4}", report.today_avg);
    if let Some(avg) = report.tomorrow_avg {
        info!("Average tomorrow: {:.4}, delta {:.4}", avg, avg - report.today_avg);
    }
    info!("Estimate: {} (confidence {:.1})", report.estimate.prediction, report.estimate.confidence);

    for w in report.windows_today.best_windows.iter().chain(report.windows_tomorrow.best_windows.iter()) {
        info!("{}", w);
    }

    if report.planner.blocks.is_empty() {
        warn!("No periods at or below {:.4}", report.planner.threshold);
    }
    for b in report.planner.blocks.iter() {
        info!("{}", b);
    }
}

/// Saves the report as json for the presentation layer and removes older reports
///
/// # Arguments
///
/// * 'path' - path to the report directory
/// * 'report' - report to save
fn save_report(path: &str, report: &AnalysisReport) -> Result<(), WorkerError> {
    let filename = report_filename(path, report.created);

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| WorkerError::SaveReportError(format!("error serializing report: {}", e)))?;

    fs::write(&filename, json)
        .map_err(|e| WorkerError::SaveReportError(format!("error writing report to file: {}", e)))?;

    clean_up_files(&format!("{}*_report.json", path), report.created)?;

    info!("Report saved to {}", filename);

    Ok(())
}

fn report_filename(path: &str, created: NaiveDateTime) -> String {
    format!("{}{}_report.json", path, created.format("%Y%m%d%H%M"))
}

/// Removes any files following the pattern that are older than the newly created file
///
/// # Arguments
///
/// * 'pattern' - file pattern
/// * 'gate_date_time' - the date time representing a newly created file
fn clean_up_files(pattern: &str, gate_date_time: NaiveDateTime) -> Result<(), WorkerError> {
    let gate = gate_date_time.format("%Y%m%d%H%M").to_string();

    for entry in glob(pattern)
        .map_err(|e| WorkerError::CleanUpError(format!("error reading files with pattern {}: {}", pattern, e)))? {
        if let Ok(path) = entry {
            if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
                let stamp = filename.get(0..12).unwrap_or_default();
                if stamp.len() == 12 && stamp < gate.as_str() {
                    fs::remove_file(&path)
                        .map_err(|e| WorkerError::CleanUpError(format!("error removing file: {}", e)))?;
                }
            }
        }
    }

    Ok(())
}

/// Error depicting errors that occur while running an analysis cycle
///
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("error while fetching prices: {0:?}")]
    FetchError(String),
    #[error("error while normalizing price table: {0:?}")]
    NormalizeError(String),
    #[error("error while saving report: {0:?}")]
    SaveReportError(String),
    #[error("error while cleaning up old files: {0:?}")]
    CleanUpError(String),
}

#[cfg(test)]
mod tests {
    use crate::models::{Prediction, RawPriceRow};
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 22).unwrap()
    }

    fn created() -> NaiveDateTime {
        today().and_hms_opt(14, 5, 0).unwrap()
    }

    fn analysis() -> AnalysisParameters {
        AnalysisParameters { window_sizes: vec![1, 3], historical_avg: 0.15 }
    }

    fn planner(reference_avg: Option<f64>) -> PlannerParameters {
        PlannerParameters { threshold: 0.05, power_kw: 10.0, reference_avg }
    }

    /// 24 hour rows, four quarters each, today only; cheap night and an expensive evening
    fn raw_today() -> RawPriceTable {
        let columns = ["00:00", "00:15", "00:30", "00:45"].iter().map(|t| format!("Today {}", t)).collect();
        let rows = (0..24)
            .map(|h| {
                let price = if h < 4 { 0.04 } else if h >= 18 { 0.30 } else { 0.12 };
                RawPriceRow { hour: format!("{:02}-{:02}", h, (h + 1) % 24), cells: vec![Some(price); 4] }
            })
            .collect();

        RawPriceTable { columns, rows }
    }

    #[test]
    fn full_analysis() {
        let report = analyze(&raw_today(), today(), created(), &analysis(), &planner(None), &PriceBands::default()).unwrap();

        assert_eq!(report.series.len(), 96);
        assert!(report.tomorrow_avg.is_none());
        assert!(report.windows_tomorrow.best_windows.is_empty());
        assert_eq!(report.windows_today.best_windows.len(), 10);
        assert!((report.windows_today.best_windows[0].avg_price - 0.04).abs() < 1e-9);
        assert_eq!(report.windows_today.worst_slots[0].price, 0.30);

        let expected_avg = (16.0 * 0.04 + 56.0 * 0.12 + 24.0 * 0.30) / 96.0;
        assert!((report.today_avg - expected_avg).abs() < 1e-9);
        assert_eq!(report.estimate.prediction, Prediction::Normal);

        assert_eq!(report.planner.blocks.len(), 1);
        let block = &report.planner.blocks[0];
        assert_eq!(block.duration_hours, 4.0);
        assert!((block.estimated_savings.unwrap() - (expected_avg - 0.04) * 10.0 * 4.0).abs() < 1e-9);

        assert_eq!(report.today_levels.cheap, 72);
        assert_eq!(report.today_levels.expensive, 24);
    }

    #[test]
    fn configured_reference_average() {
        let report = analyze(&raw_today(), today(), created(), &analysis(), &planner(Some(0.02)), &PriceBands::default()).unwrap();
        let block = &report.planner.blocks[0];

        assert_eq!(report.planner.reference_avg, 0.02);
        assert!(block.estimated_savings.is_none());
        assert!((block.estimated_cost.unwrap() - 0.04 * 10.0 * 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_table_is_not_an_error() {
        let report = analyze(&RawPriceTable::default(), today(), created(), &analysis(), &planner(None), &PriceBands::default()).unwrap();

        assert!(report.series.is_empty());
        assert!(report.statistics.today.is_none());
        assert_eq!(report.estimate.prediction, Prediction::NoData);
        assert!(report.planner.blocks.is_empty());
    }

    #[test]
    fn parse_errors_surface() {
        let mut raw = raw_today();
        raw.rows[3].hour = "3 to 4".into();

        let result = analyze(&raw, today(), created(), &analysis(), &planner(None), &PriceBands::default());
        assert!(matches!(result, Err(WorkerError::NormalizeError(e)) if e.contains("row 3")));
    }

    #[test]
    fn report_is_serialized() {
        let report = analyze(&raw_today(), today(), created(), &analysis(), &planner(None), &PriceBands::default()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["estimate"]["prediction"], "Normal");
        assert_eq!(json["series"]["slots"].as_array().unwrap().len(), 96);
        assert!(json["statistics"]["tomorrow"].is_null());
        assert_eq!(report_filename("/tmp/r/", created()), "/tmp/r/202510221405_report.json");
    }
}
