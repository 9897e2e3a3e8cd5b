//! Validate command - check a layer configuration without loading it.

use std::path::PathBuf;

use layertree::config::{SourceDescriptor, SourceEntry};

use crate::error::CliError;
use crate::runner::read_config;

/// Run the validate command.
pub fn run(config: PathBuf) -> Result<(), CliError> {
    let entries = read_config(&config)?;

    println!("{}: {} source(s)", config.display(), entries.len());
    for (index, entry) in entries.iter().enumerate() {
        println!("  {:>3}. {}", index + 1, describe(entry));
    }
    Ok(())
}

/// One-line summary of a source entry.
fn describe(entry: &SourceEntry) -> String {
    let regions = match entry.available_in_regions() {
        Some(regions) => format!(" [regions: {}]", regions.join(", ")),
        None => String::new(),
    };

    match entry.descriptor() {
        Ok(SourceDescriptor::Catalog(source)) => {
            let services: usize = source.folders.iter().map(|f| f.services.len()).sum();
            format!(
                "agsSource {} \"{}\" ({} folder(s), {} service(s)){}",
                source.url,
                source.folder_title.as_deref().unwrap_or("<untitled>"),
                source.folders.len(),
                services,
                regions
            )
        }
        Ok(SourceDescriptor::MapService(source)) => format!(
            "wmsSource {} \"{}\" ({} layer(s)){}",
            source.url,
            source.folder_title,
            source.layer_ids.len(),
            regions
        ),
        Err(e) => e.to_string(),
    }
}
