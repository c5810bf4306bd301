//! Thin HTTP shell over the core. Wire format and status-code mapping live
//! here; the core only hands back tagged outcomes.

pub(crate) mod handlers;
mod router;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;

use crate::core::pipeline::GenerationPipeline;
use crate::core::scheduler::QuoteScheduler;

pub use router::build_router;

#[derive(Clone)]
pub struct AppState {
    pub(crate) pipeline: Arc<GenerationPipeline>,
    pub(crate) scheduler: Arc<Mutex<QuoteScheduler>>,
    pub(crate) enable_manual_generation: bool,
}

/// Serve the API until ctrl-c.
pub async fn serve(state: AppState, host: &str, port: u16, debug: bool) -> Result<()> {
    let app = router::build_router(state, debug);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server running at http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
