//! `bulkdl fetch`: download every planned file with a progress bar.

use anyhow::Result;
use bulkdl_core::config::RunSettings;
use bulkdl_core::RunReport;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

use super::build_orchestrator;

/// Runs the full pipeline. Returns `Ok(false)` when any file failed.
pub async fn run_fetch(settings: RunSettings) -> Result<bool> {
    let started = Instant::now();
    let orchestrator = build_orchestrator(settings)?;
    let plan = orchestrator.plan().await?;

    let bar = progress_bar(plan.len() as u64);
    let mut report = orchestrator
        .execute(plan, |stats| {
            bar.set_position(stats.completed as u64);
            bar.set_message(format!("{:.1} files/s", stats.per_sec()));
            if stats.is_done() {
                bar.finish_and_clear();
            }
        })
        .await;
    bar.finish_and_clear();
    report.elapsed_secs = started.elapsed().as_secs_f64();

    let settings = orchestrator.settings();
    println!(
        "Downloaded {} of {} file(s) to {} ({} bytes, {} jobs, {:.1}s)",
        report.succeeded.len(),
        report.planned,
        settings.destination_dir.display(),
        report.bytes_written(),
        settings.max_concurrent_downloads,
        report.elapsed_secs
    );
    print_problems(&report);
    Ok(report.is_success())
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{prefix} [{elapsed_precise}] {wide_bar} {pos}/{len} ({eta}) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.set_prefix("Downloading");
    bar
}

fn print_problems(report: &RunReport) {
    if report.planned == 0 {
        println!("No matching links found on the listing page.");
    }
    for (task, err) in &report.failed {
        eprintln!("  failed  {}: {}", task.filename, err);
    }
    for skipped in &report.skipped {
        eprintln!("  skipped {}: {}", skipped.link, skipped.reason);
    }
    if !report.failed.is_empty() {
        eprintln!("{} file(s) failed.", report.failed.len());
    }
}
