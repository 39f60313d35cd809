use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use log::debug;
use thiserror::Error;
use crate::models::{DayTag, PriceSeries, PriceSlot, RawPriceTable};

/// Transforms a raw price table into a canonical time ordered price series.
///
/// Each row carries an hour range label ("00-01") whose start is the base hour for all cells
/// in the row, and each column carries a day tag and a time token giving the quarter within
/// that hour. Missing cells are skipped, anything structurally wrong is reported with the
/// offending row or column.
///
/// # Arguments
///
/// * 'raw' - the raw price table
/// * 'today' - the calendar date that the Today columns refer to
pub fn normalize(raw: &RawPriceTable, today: NaiveDate) -> Result<PriceSeries, ParseError> {
    let columns = raw.columns
        .iter()
        .enumerate()
        .map(|(i, label)| parse_column_label(i, label))
        .collect::<Result<Vec<(DayTag, i64)>, ParseError>>()?;

    let mut slots: Vec<PriceSlot> = Vec::new();

    for (r, row) in raw.rows.iter().enumerate() {
        let base_hour = parse_hour_label(r, &row.hour)?;

        if row.cells.len() != columns.len() {
            return Err(ParseError::RowLength { row: r, expected: columns.len(), actual: row.cells.len() });
        }

        for (c, cell) in row.cells.iter().enumerate() {
            let price = match cell {
                Some(p) if p.is_finite() => *p,
                _ => continue,
            };

            let (day, offset) = columns[c];
            let time = NaiveTime::from_hms_opt(base_hour, 0, 0)
                .ok_or_else(|| ParseError::HourLabel { row: r, label: row.hour.clone() })?;
            let timestamp = NaiveDateTime::new(day.date(today), time) + TimeDelta::minutes(offset);

            slots.push(PriceSlot { day, timestamp, price, sequence_index: 0 });
        }
    }

    slots.sort_by_key(|s| (s.day, s.timestamp));

    if let Some(w) = slots.windows(2).find(|w| w[0].day == w[1].day && w[0].timestamp == w[1].timestamp) {
        return Err(ParseError::DuplicateSlot { day: w[1].day, timestamp: w[1].timestamp });
    }

    slots.iter_mut().enumerate().for_each(|(i, s)| s.sequence_index = i);
    debug!("normalized {} rows into {} slots", raw.rows.len(), slots.len());

    Ok(PriceSeries::new(slots))
}

/// Parses an hour range label and returns its start hour
///
/// # Arguments
///
/// * 'row' - row index, used for error reporting
/// * 'label' - the label, e.g. "07-08"
fn parse_hour_label(row: usize, label: &str) -> Result<u32, ParseError> {
    let err = || ParseError::HourLabel { row, label: label.to_string() };

    let (start, end) = label.trim().split_once('-').ok_or_else(err)?;
    let start = start.trim().parse::<u32>().map_err(|_| err())?;
    let _ = end.trim().parse::<u32>().map_err(|_| err())?;

    if start > 23 {
        return Err(err());
    }

    Ok(start)
}

/// Parses a column label into its day tag and minute offset within the hour
///
/// # Arguments
///
/// * 'column' - column index, used for error reporting
/// * 'label' - the label, e.g. "Today 00:15"
fn parse_column_label(column: usize, label: &str) -> Result<(DayTag, i64), ParseError> {
    let (day, token) = label.trim().split_once(' ')
        .ok_or_else(|| ParseError::ColumnLabel { column, label: label.to_string() })?;
    let day = DayTag::parse(day)
        .ok_or_else(|| ParseError::ColumnLabel { column, label: label.to_string() })?;
    let offset = parse_time_token(token.trim())
        .ok_or_else(|| ParseError::TimeToken { column, token: token.to_string() })?;

    Ok((day, offset))
}

/// Parses a time token into a minute offset from the row's base hour.
///
/// With the colon removed the token is 3 or 4 digits. The trailing two are minutes and the
/// leading ones a 15-minute slot multiplier, so "00:15" and "100" both give 15 minutes.
/// The offset must land on a quarter within the hour.
///
/// # Arguments
///
/// * 'token' - the time token
fn parse_time_token(token: &str) -> Option<i64> {
    let digits = token.replace(':', "");
    if !(3..=4).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let value = digits.parse::<i64>().ok()?;
    let offset = (value / 100) * 15 + value % 100;

    if value % 100 >= 60 || offset >= 60 || offset % 15 != 0 {
        return None;
    }

    Some(offset)
}

/// Error depicting structural errors in a raw price table
///
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("HourLabelError: row {row}: '{label}'")]
    HourLabel { row: usize, label: String },
    #[error("ColumnLabelError: column {column}: '{label}'")]
    ColumnLabel { column: usize, label: String },
    #[error("TimeTokenError: column {column}: '{token}'")]
    TimeToken { column: usize, token: String },
    #[error("RowLengthError: row {row}: expected {expected} cells, got {actual}")]
    RowLength { row: usize, expected: usize, actual: usize },
    #[error("DuplicateSlotError: {day} {timestamp}")]
    DuplicateSlot { day: DayTag, timestamp: NaiveDateTime },
}
