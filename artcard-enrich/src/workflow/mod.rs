//! Run-level workflows
//!
//! - `discovery`: archive artists → researched cards (+ connections ledger)
//! - `backfill`: add encyclopedia data to existing cards
//! - `instrument_dedup` / `quick_info_fix`: card repair passes

pub mod backfill;
pub mod discovery;
pub mod instrument_dedup;
pub mod quick_info_fix;
pub mod statistics;

pub use backfill::{BackfillOptions, BackfillOutcome, BackfillWorkflow};
pub use discovery::{ArtistOutcome, ArtistState, DiscoveryOptions, DiscoveryPipeline};
pub use instrument_dedup::{dedupe_instruments, dedupe_list, DedupOptions, InstrumentDedup};
pub use quick_info_fix::{
    sync_quick_info_instruments, QuickInfoFix, QuickInfoOptions, QuickInfoOutcome,
};
pub use statistics::{BackfillStats, DedupStats, QuickInfoStats, RunStatistics};

use tokio::signal;
use tracing::{info, warn};

/// Resolves on Ctrl+C (or SIGTERM on unix)
///
/// A handler that cannot be installed is logged and never fires, so a run
/// keeps going rather than stopping at once.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
