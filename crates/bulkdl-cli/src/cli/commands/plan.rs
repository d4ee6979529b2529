//! `bulkdl plan`: fetch the listing and print what would be downloaded.

use anyhow::Result;
use bulkdl_core::config::RunSettings;

use super::build_orchestrator;

pub async fn run_plan(settings: RunSettings) -> Result<()> {
    let orchestrator = build_orchestrator(settings)?;
    let plan = orchestrator.plan().await?;
    let dest = &orchestrator.settings().destination_dir;

    if plan.is_empty() {
        println!("No matching links found on the listing page.");
    } else {
        for task in &plan.tasks {
            println!("{}  {}", task.filename, task.source_url);
        }
        println!("{} file(s) would be written to {}", plan.len(), dest.display());
    }
    for skipped in &plan.skipped {
        eprintln!("  skipped {}: {}", skipped.link, skipped.reason);
    }
    Ok(())
}
