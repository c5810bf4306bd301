//! Wall-clock driver for the generation pipeline.
//!
//! Two jobs are registered on start: a recurring daily job that
//! pre-generates tomorrow's quote at the configured local time, and a
//! one-shot startup job that backfills today's quote. Job bodies run on
//! their own tasks so the timer thread is never blocked, and both bodies
//! serialize on a shared async mutex so `stop()` can drain them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, Local};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::StoreError;
use super::pipeline::{GenerationOutcome, GenerationPipeline};

/// Extension point for delivery (webhook, email, chat) around scheduled
/// generation. Default methods only log; surrounding code attaches real
/// delivery by implementing this trait.
#[async_trait]
pub trait GenerationNotifier: Send + Sync {
    async fn generation_succeeded(&self, date: &str, content: &str) {
        info!("quote generated for {date}: {content}");
    }

    async fn generation_failed(&self, date: &str, error: &str) {
        error!("quote generation failed for {date}: {error}");
    }
}

/// Default notifier: log lines only.
pub struct LogNotifier;

impl GenerationNotifier for LogNotifier {}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub label: String,
    pub next_fire_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub jobs: Vec<JobStatus>,
    pub generation_time: String,
}

struct JobInfo {
    id: Uuid,
    label: String,
}

pub struct QuoteScheduler {
    pipeline: Arc<GenerationPipeline>,
    notifier: Arc<dyn GenerationNotifier>,
    generation_hour: u32,
    generation_minute: u32,
    scheduler: Option<JobScheduler>,
    jobs: Vec<JobInfo>,
    daily_lock: Arc<Mutex<()>>,
    shutdown: CancellationToken,
}

impl QuoteScheduler {
    pub fn new(
        pipeline: Arc<GenerationPipeline>,
        notifier: Arc<dyn GenerationNotifier>,
        generation_hour: u32,
        generation_minute: u32,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pipeline,
            notifier,
            generation_hour,
            generation_minute,
            scheduler: None,
            jobs: Vec::new(),
            daily_lock: Arc::new(Mutex::new(())),
            shutdown,
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Start the scheduler. Calling while running is a warning-level no-op.
    pub async fn start(&mut self) -> Result<()> {
        if self.scheduler.is_some() {
            warn!("scheduler is already running");
            return Ok(());
        }

        let mut scheduler = JobScheduler::new().await?;

        let cron = format!("0 {} {} * * *", self.generation_minute, self.generation_hour);
        let pipeline = self.pipeline.clone();
        let notifier = self.notifier.clone();
        let lock = self.daily_lock.clone();
        let cancel = self.shutdown.clone();
        let daily = Job::new_async_tz(cron.as_str(), Local, move |_uuid, mut _l| {
            let pipeline = pipeline.clone();
            let notifier = notifier.clone();
            let lock = lock.clone();
            let cancel = cancel.clone();
            Box::pin(async move {
                let _guard = lock.lock().await;
                if cancel.is_cancelled() {
                    return;
                }
                run_daily_generation(&pipeline, notifier.as_ref()).await;
            })
        })?;
        let daily_id = scheduler.add(daily).await?;
        self.jobs.push(JobInfo {
            id: daily_id,
            label: "每日语录生成任务".to_string(),
        });

        let pipeline = self.pipeline.clone();
        let lock = self.daily_lock.clone();
        let cancel = self.shutdown.clone();
        let backfill =
            Job::new_one_shot_async(Duration::from_secs(0), move |_uuid, mut _l| {
                let pipeline = pipeline.clone();
                let lock = lock.clone();
                let cancel = cancel.clone();
                Box::pin(async move {
                    let _guard = lock.lock().await;
                    if cancel.is_cancelled() {
                        return;
                    }
                    initialize_today_quote(&pipeline).await;
                })
            })?;
        let backfill_id = scheduler.add(backfill).await?;
        self.jobs.push(JobInfo {
            id: backfill_id,
            label: "初始化今日语录".to_string(),
        });

        scheduler.start().await?;
        self.scheduler = Some(scheduler);

        info!(
            "scheduler started, daily generation at {:02}:{:02}",
            self.generation_hour, self.generation_minute
        );
        Ok(())
    }

    /// Stop the scheduler, waiting for any in-flight job body to finish.
    /// No new generation attempt begins after this is called.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut scheduler) = self.scheduler.take() else {
            return Ok(());
        };

        self.shutdown.cancel();
        scheduler.shutdown().await?;
        let _drained = self.daily_lock.lock().await;
        self.jobs.clear();

        info!("scheduler stopped");
        Ok(())
    }

    /// Run the same pipeline call a scheduled job would, synchronously.
    pub async fn manual_trigger(&self, date: &str) -> Result<GenerationOutcome, StoreError> {
        info!("manual generation trigger for {date}");
        self.pipeline.generate_daily_quote(date).await
    }

    pub async fn status(&mut self) -> SchedulerStatus {
        let mut jobs = Vec::new();
        if let Some(scheduler) = &mut self.scheduler {
            for info in &self.jobs {
                let next = scheduler
                    .next_tick_for_job(info.id)
                    .await
                    .ok()
                    .flatten()
                    .map(|t| t.to_rfc3339());
                jobs.push(JobStatus {
                    id: info.id.to_string(),
                    label: info.label.clone(),
                    next_fire_time: next,
                });
            }
        }
        SchedulerStatus {
            is_running: self.scheduler.is_some(),
            jobs,
            generation_time: format!(
                "{:02}:{:02}",
                self.generation_hour, self.generation_minute
            ),
        }
    }
}

/// Daily job body: generate tomorrow's quote and notify the outcome.
async fn run_daily_generation(
    pipeline: &GenerationPipeline,
    notifier: &dyn GenerationNotifier,
) {
    let tomorrow = Local::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .map(|d| d.format("%Y-%m-%d").to_string());
    let Some(tomorrow) = tomorrow else {
        error!("could not compute tomorrow's date");
        return;
    };

    info!("scheduled generation for {tomorrow}");
    match pipeline.generate_daily_quote(&tomorrow).await {
        Ok(outcome) => {
            notifier
                .generation_succeeded(&tomorrow, &outcome.quote.content)
                .await;
        }
        Err(e) => {
            notifier.generation_failed(&tomorrow, &e.to_string()).await;
        }
    }
}

/// Startup job body: make sure today has a quote, skipping entirely when
/// no provider is configured.
async fn initialize_today_quote(pipeline: &GenerationPipeline) {
    if !pipeline.provider_configured() {
        warn!("provider API key not configured, skipping startup quote backfill");
        return;
    }

    match pipeline.get_today_quote().await {
        Ok(quote) => info!("today's quote is in place: {}", quote.content),
        Err(e) => error!("startup quote backfill failed: {e}"),
    }
}
