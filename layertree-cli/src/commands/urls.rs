//! Urls command - print the URLs a load session would wait for.

use std::path::PathBuf;

use layertree::manager::planned_urls;

use crate::error::CliError;
use crate::runner::read_config;

/// Run the urls command.
pub fn run(config: PathBuf, region: Option<String>) -> Result<(), CliError> {
    let entries = read_config(&config)?;

    for url in planned_urls(&entries, region.as_deref()) {
        println!("{}", url);
    }
    Ok(())
}
