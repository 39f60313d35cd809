use rayon::ThreadPoolBuilder;
use anyhow::{anyhow, Result};
use log::error;
use crate::initialization::init;
use crate::worker::run;

mod config;
mod estimator;
mod initialization;
mod logging;
mod macros;
mod manager_nordpool;
pub mod models;
mod normalizer;
mod planner;
mod statistics;
mod windows;
mod worker;

fn main() -> Result<()> {
    ThreadPoolBuilder::new().num_threads(2).build_global()?;

    // Load config and set up logging and the price source. If initialization fails there is
    // no logger to report to.
    let (config, mgr, today) = match init() {
        Ok((c, m, t)) => (c, m, t),
        Err(e) => {
            return Err(anyhow!("Initialization failed: {}", e));
        }
    };

    // Fetch and analyze the current price table
    if let Err(e) = run(&config, &mgr, today) {
        error!("Run failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
