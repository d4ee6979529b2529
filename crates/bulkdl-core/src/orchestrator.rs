//! End-to-end run: listing page → links → plan → bounded fetches → report.
//!
//! The listing GET is the only fatal network call. Once tasks are launched,
//! each one ends `Done` or `Failed` on its own and the run always completes.

use std::sync::Arc;
use std::time::Instant;

use crate::config::RunSettings;
use crate::error::{FetchError, RunError, TaskError};
use crate::fetcher::{BoundedFetcher, CompletedFile, TaskOutcome};
use crate::links::extract_links;
use crate::plan::{build_plan, DownloadPlan, DownloadTask, SkippedLink};
use crate::progress::{track_all, ProgressStats};
use crate::transport::HttpTransport;
use crate::url_model::FilenameDeriver;

/// Summary of one run. Successes and failures are kept apart.
#[derive(Debug, Default)]
pub struct RunReport {
    pub planned: usize,
    pub succeeded: Vec<(DownloadTask, CompletedFile)>,
    pub failed: Vec<(DownloadTask, TaskError)>,
    pub skipped: Vec<SkippedLink>,
    pub elapsed_secs: f64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn bytes_written(&self) -> u64 {
        self.succeeded.iter().map(|(_, f)| f.bytes).sum()
    }
}

pub struct Orchestrator {
    settings: RunSettings,
    transport: Arc<dyn HttpTransport>,
    deriver: Box<dyn FilenameDeriver>,
}

impl Orchestrator {
    /// Uses the deriver named in `settings`.
    pub fn new(settings: RunSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let deriver = settings.filename_deriver.into_deriver();
        Self::with_deriver(settings, transport, deriver)
    }

    pub fn with_deriver(
        settings: RunSettings,
        transport: Arc<dyn HttpTransport>,
        deriver: Box<dyn FilenameDeriver>,
    ) -> Self {
        Self {
            settings,
            transport,
            deriver,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Fetches the listing page and builds the plan without downloading anything.
    pub async fn plan(&self) -> Result<DownloadPlan, RunError> {
        let url = &self.settings.source_url;
        let html = self.fetch_listing(url).await?;
        let plan = build_plan(extract_links(&html), &self.settings.plan, self.deriver.as_ref())?;
        if plan.is_empty() {
            tracing::warn!(
                url = %url,
                suffix = %self.settings.plan.file_type_suffix,
                filter = ?self.settings.plan.filter_target,
                "listing page yielded no downloadable links"
            );
        } else {
            tracing::info!(url = %url, files = plan.len(), skipped = plan.skipped.len(), "planned downloads");
        }
        Ok(plan)
    }

    /// Runs the whole pipeline. `on_progress` is called once per finished task.
    ///
    /// Returns `Err` only for listing or planning failures; per-task failures
    /// are in [`RunReport::failed`].
    pub async fn run<P>(&self, on_progress: P) -> Result<RunReport, RunError>
    where
        P: FnMut(ProgressStats),
    {
        let started = Instant::now();
        let plan = self.plan().await?;
        let mut report = self.execute(plan, on_progress).await;
        report.elapsed_secs = started.elapsed().as_secs_f64();
        Ok(report)
    }

    /// Fetches every task of an already built plan. Never fails as a whole.
    pub async fn execute<P>(&self, plan: DownloadPlan, on_progress: P) -> RunReport
    where
        P: FnMut(ProgressStats),
    {
        let started = Instant::now();
        let fetcher = BoundedFetcher::new(
            Arc::clone(&self.transport),
            self.settings.max_concurrent_downloads,
            self.settings.destination_dir.clone(),
            self.settings.request_timeout,
        );

        let planned = plan.len();
        let fetcher_ref = &fetcher;
        let operations = plan
            .tasks
            .into_iter()
            .map(|task| fetcher_ref.fetch(task));
        let outcomes = track_all(operations, on_progress).await;

        let mut report = RunReport {
            planned,
            skipped: plan.skipped,
            ..RunReport::default()
        };
        for TaskOutcome { task, result } in outcomes {
            match result {
                Ok(done) => report.succeeded.push((task, done)),
                Err(e) => report.failed.push((task, e)),
            }
        }
        report.elapsed_secs = started.elapsed().as_secs_f64();

        tracing::info!(
            planned,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            bytes = report.bytes_written(),
            "run finished"
        );
        report
    }

    async fn fetch_listing(&self, url: &str) -> Result<String, RunError> {
        let timeout = self.settings.request_timeout;
        let res = match tokio::time::timeout(timeout, self.transport.get_text(url)).await {
            Ok(res) => res,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                after: timeout,
            }),
        };
        res.map_err(|source| {
            tracing::error!(url, error = %source, "listing fetch failed");
            RunError::Listing {
                url: url.to_string(),
                source,
            }
        })
    }
}
