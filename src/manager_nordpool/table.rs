use scraper::{ElementRef, Html, Selector};
use crate::manager_nordpool::errors::NordPoolError;
use crate::models::{DayTag, RawPriceRow, RawPriceTable};

const HEADER_ROWS: usize = 2;
const TODAY_MARKER: &str = "šodien";
const TOMORROW_MARKER: &str = "rīt";

/// Scrapes the first table of the page into a raw price table.
///
/// The table has two header rows, the first one with day labels (possibly spanning several
/// columns) and the second one with the quarter times. Only the hour column and columns
/// labelled as today or tomorrow are kept.
///
/// # Arguments
///
/// * 'html' - the page
pub fn parse_price_table(html: &str) -> Result<RawPriceTable, NordPoolError> {
    let document = Html::parse_document(html);
    let table_selector = selector("table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let table = document.select(&table_selector).next().ok_or(NordPoolError::NoTableError)?;
    let rows = table.select(&row_selector).collect::<Vec<ElementRef>>();
    if rows.len() < HEADER_ROWS {
        return Err(NordPoolError::DocumentError(format!("expected {} header rows, found {} rows", HEADER_ROWS, rows.len())));
    }

    let header = header_grid(&rows[..HEADER_ROWS], &cell_selector);

    // (source column index, column label)
    let mut kept: Vec<(usize, String)> = Vec::new();
    for (i, day_label) in header[0].iter().enumerate().skip(1) {
        let day_label = day_label.to_lowercase();
        let day = if day_label.contains(TODAY_MARKER) {
            DayTag::Today
        } else if day_label.contains(TOMORROW_MARKER) {
            DayTag::Tomorrow
        } else {
            continue;
        };
        let time = header[1].get(i).map(|t| t.trim()).unwrap_or_default();
        kept.push((i, format!("{} {}", day, time)));
    }

    let mut result = RawPriceTable {
        columns: kept.iter().map(|(_, label)| label.clone()).collect(),
        rows: Vec::new(),
    };

    for row in &rows[HEADER_ROWS..] {
        let cells = row.select(&cell_selector).map(cell_text).collect::<Vec<String>>();
        let hour = match cells.first() {
            Some(h) if !h.is_empty() => h.clone(),
            _ => continue,
        };

        result.rows.push(RawPriceRow {
            hour,
            cells: kept.iter().map(|(i, _)| cells.get(*i).and_then(|c| parse_price(c))).collect(),
        });
    }

    Ok(result)
}

fn selector(s: &str) -> Result<Selector, NordPoolError> {
    Selector::parse(s).map_err(|e| NordPoolError::DocumentError(format!("selector {}: {}", s, e)))
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Expands header rows into a grid of labels, resolving colspan and rowspan
///
/// # Arguments
///
/// * 'rows' - header rows
/// * 'cell_selector' - selector for header cells
fn header_grid(rows: &[ElementRef], cell_selector: &Selector) -> Vec<Vec<String>> {
    let mut grid: Vec<Vec<Option<String>>> = vec![Vec::new(); rows.len()];

    for (r, row) in rows.iter().enumerate() {
        let mut col = 0;
        for cell in row.select(cell_selector) {
            while grid[r].get(col).is_some_and(|c| c.is_some()) {
                col += 1;
            }

            let text = cell_text(cell);
            let colspan = span(cell, "colspan");
            let rowspan = span(cell, "rowspan");

            for g in grid.iter_mut().skip(r).take(rowspan) {
                if g.len() < col + colspan {
                    g.resize(col + colspan, None);
                }
                g[col..col + colspan].iter_mut().for_each(|c| *c = Some(text.clone()));
            }
            col += colspan;
        }
    }

    grid.into_iter()
        .map(|r| r.into_iter().map(|c| c.unwrap_or_default()).collect())
        .collect()
}

fn span(cell: ElementRef, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

/// Extracts the first number of a price cell, accepting decimal comma.
/// Cells without a number are missing prices. A minus sign right before the number is kept,
/// spot prices go negative.
///
/// # Arguments
///
/// * 'text' - cell text, e.g. "0,1234 €"
fn parse_price(text: &str) -> Option<f64> {
    let text = text.replace(',', ".");
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let negative = text[..start].ends_with('-');

    let rest = &text[start..];
    let mut end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if rest[end..].starts_with('.') {
        let decimals = rest[end + 1..].find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len() - end - 1);
        if decimals > 0 {
            end += 1 + decimals;
        }
    }

    let value = rest[..end].parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}
