pub mod errors;
mod table;

use std::thread;
use std::time::Duration;
use log::info;
use reqwest::blocking::Client;
use crate::config::Source;
use crate::models::RawPriceTable;
use crate::manager_nordpool::errors::NordPoolError;
use crate::manager_nordpool::table::parse_price_table;
use crate::{retry, wrapper};

/// Struct for retrieving the day-ahead price table from the spot price site
pub struct NordPool {
    client: Client,
    url: String,
}

impl NordPool {
    /// Returns a new NordPool struct ready for fetching prices
    ///
    /// # Arguments
    ///
    /// * 'config' - price source configuration
    pub fn new(config: &Source) -> Result<NordPool, NordPoolError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Retrieves today's and, if published, tomorrow's 15-minute prices as a raw table.
    /// A page without any Today or Tomorrow columns gives an empty table, not an error.
    ///
    pub fn get_price_table(&self) -> Result<RawPriceTable, NordPoolError> {
        fetch_table(|| self.get_page())
    }

    /// Downloads the price page
    ///
    fn get_page(&self) -> Result<String, NordPoolError> {
        let response = self.client
            .get(&self.url)
            .send()?;

        if !response.status().is_success() {
            return Err(NordPoolError::StatusError(response.status().as_u16()));
        }

        Ok(response.text()?)
    }
}

/// Fetches the page, retrying on failure, and scrapes it once.
/// Errors in the page content are returned without further attempts.
///
/// # Arguments
///
/// * 'get_page' - function downloading the page
fn fetch_table<F>(get_page: F) -> Result<RawPriceTable, NordPoolError>
where F: Fn() -> Result<String, NordPoolError>
{
    let html = retry!(get_page)?;

    let table = parse_price_table(&html)?;
    info!("Price table fetched: {} rows, {} price columns", table.rows.len(), table.columns.len());

    Ok(table)
}
