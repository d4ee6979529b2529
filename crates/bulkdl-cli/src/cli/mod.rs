//! CLI for the bulkdl shared-folder downloader.

mod commands;

use anyhow::Result;
use bulkdl_core::config::{self, BulkConfig, Overrides};
use bulkdl_core::plan::{FilterTarget, MalformedLinkPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use commands::{run_fetch, run_plan, run_show_config};

/// Top-level CLI for bulkdl.
#[derive(Debug, Parser)]
#[command(name = "bulkdl")]
#[command(about = "bulkdl: download every file linked from a shared-folder page")]
#[command(long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/bulkdl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download all matching files linked from the listing page.
    Fetch {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the files that would be downloaded, without downloading them.
    Plan {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the config file location and its effective values.
    Config,
}

/// Listing page and per-run overrides shared by `fetch` and `plan`.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Shared-folder listing page URL (overrides source_url in the config).
    pub url: Option<String>,

    /// Directory to write files into (created if missing).
    #[arg(long, short = 'd', value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Maximum number of files downloaded at once.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Case-sensitive marker a link must contain, e.g. ".JPG".
    #[arg(long, value_name = "MARKER")]
    pub suffix: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Match the marker against the raw link or the rewritten download URL.
    #[arg(long, value_enum, value_name = "FIELD")]
    pub filter_on: Option<FilterOn>,

    /// What to do with links whose filename cannot be derived.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_malformed: Option<OnMalformed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterOn {
    RawLink,
    DownloadUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnMalformed {
    Skip,
    Fail,
}

impl From<FilterOn> for FilterTarget {
    fn from(v: FilterOn) -> Self {
        match v {
            FilterOn::RawLink => FilterTarget::RawLink,
            FilterOn::DownloadUrl => FilterTarget::DownloadUrl,
        }
    }
}

impl From<OnMalformed> for MalformedLinkPolicy {
    fn from(v: OnMalformed) -> Self {
        match v {
            OnMalformed::Skip => MalformedLinkPolicy::Skip,
            OnMalformed::Fail => MalformedLinkPolicy::Fail,
        }
    }
}

impl SourceArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            source_url: self.url.clone(),
            destination_dir: self.dest.clone(),
            max_concurrent_downloads: self.jobs,
            file_type_suffix: self.suffix.clone(),
            filter_target: self.filter_on.map(Into::into),
            on_malformed: self.on_malformed.map(Into::into),
            request_timeout_secs: self.timeout,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<(PathBuf, BulkConfig)> {
    match path {
        Some(p) => Ok((p.clone(), config::load_from_path(p)?)),
        None => Ok((config::config_path()?, config::load_or_init()?)),
    }
}

impl CliCommand {
    /// Parses arguments and runs the command. `Ok(false)` means the run finished
    /// but at least one file failed.
    pub async fn run_from_args() -> Result<bool> {
        let cli = Cli::parse();
        let (cfg_path, cfg) = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config from {}: {:?}", cfg_path.display(), cfg);

        match cli.command {
            CliCommand::Fetch { source } => {
                let settings = cfg.resolve(source.overrides())?;
                run_fetch(settings).await
            }
            CliCommand::Plan { source } => {
                let settings = cfg.resolve(source.overrides())?;
                run_plan(settings).await?;
                Ok(true)
            }
            CliCommand::Config => {
                run_show_config(&cfg_path, &cfg)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests;
