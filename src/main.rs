mod config;
mod core;
mod interfaces;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;
use crate::core::pipeline::GenerationPipeline;
use crate::core::provider::{OpenAiCompatProvider, PromptPool, QuoteProvider};
use crate::core::scheduler::{LogNotifier, QuoteScheduler};
use crate::core::store::QuoteStore;
use crate::interfaces::web::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env();

    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("starting daily quote service v{}", env!("CARGO_PKG_VERSION"));

    let store = QuoteStore::open(&config.database_path)?;
    info!("database ready at {}", config.database_path.display());

    let provider: Option<Arc<dyn QuoteProvider>> = match &config.api_key {
        Some(key) => Some(Arc::new(OpenAiCompatProvider::new(
            config.base_url.clone(),
            key.clone(),
            config.model.clone(),
        ))),
        None => {
            warn!("OPENAI_API_KEY not configured, every generation will use fallback quotes");
            None
        }
    };

    let shutdown = CancellationToken::new();
    let pipeline = Arc::new(GenerationPipeline::new(
        store,
        provider,
        PromptPool::default(),
        config.max_retries,
        Duration::from_secs(1),
        shutdown.clone(),
    ));

    let mut scheduler = QuoteScheduler::new(
        pipeline.clone(),
        Arc::new(LogNotifier),
        config.generation_hour,
        config.generation_minute,
        shutdown,
    );
    scheduler.start().await?;
    let scheduler = Arc::new(Mutex::new(scheduler));

    let state = AppState {
        pipeline,
        scheduler: scheduler.clone(),
        enable_manual_generation: config.enable_manual_generation,
    };
    web::serve(state, &config.app_host, config.app_port, config.debug).await?;

    scheduler.lock().await.stop().await?;
    info!("service stopped");
    Ok(())
}
