//! Load command - fetch every configured source and print the layer tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use layertree::host::TracingHost;
use layertree::loader::HttpLoaderProvider;
use layertree::LayerManager;
use tokio::sync::oneshot;

use crate::error::CliError;
use crate::runner::{read_config, CliRunner};

/// Arguments for the load command.
pub struct LoadArgs {
    pub config: PathBuf,
    pub region: Option<String>,
    pub timeout: Option<u64>,
    pub compact: bool,
}

/// Run the load command.
pub fn run(args: LoadArgs, settings_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::new(settings_path)?;
    runner.log_startup("load");
    let settings = runner.settings();

    let entries = read_config(&args.config)?;
    // Per-request timeouts bound each source; the watchdog bounds the session.
    let timeout_secs = args.timeout.unwrap_or(settings.http.timeout_secs * 2);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let provider = HttpLoaderProvider::from_settings(settings, runtime.handle().clone())?;
    let manager = LayerManager::new(Arc::new(TracingHost), Arc::new(provider)).with_settings(settings);

    let (tx, rx) = oneshot::channel();
    manager.start_session(entries, args.region.as_deref(), move |tree| {
        let _ = tx.send(tree);
    });

    let outcome = runtime.block_on(async {
        tokio::time::timeout(Duration::from_secs(timeout_secs), rx).await
    });

    let tree = match outcome {
        Ok(Ok(tree)) => tree,
        Ok(Err(_)) => return Err(CliError::Incomplete),
        Err(_) => {
            return Err(CliError::Timeout {
                secs: timeout_secs,
                pending: manager.pending_urls(),
            })
        }
    };

    tracing::info!(nodes = tree.len(), "Layer tree loaded");
    let json = if args.compact {
        serde_json::to_string(&tree)?
    } else {
        serde_json::to_string_pretty(&tree)?
    };
    println!("{}", json);
    Ok(())
}
