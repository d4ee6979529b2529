//! Download planning: raw listing links → deduplicated download tasks.
//!
//! Links are deduplicated on their raw value first, then filtered by the
//! file-type marker, then turned into `(filename, source_url)` pairs.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::PlanError;
use crate::url_model::{direct_download_url, FilenameDeriver, FilenameError};

/// One file to fetch and persist. Created once, consumed once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    pub filename: String,
    pub source_url: String,
}

/// Which field the file-type marker is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTarget {
    /// The link as it appears in the listing page.
    #[default]
    RawLink,
    /// The link after the direct-download rewrite.
    DownloadUrl,
}

/// What to do with a link whose filename cannot be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinkPolicy {
    /// Warn, record it in [`DownloadPlan::skipped`] and keep planning.
    #[default]
    Skip,
    /// Abort planning with [`PlanError::MalformedLink`].
    Fail,
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Case-sensitive substring a link must contain (e.g. `.JPG`).
    pub file_type_suffix: String,
    pub filter_target: FilterTarget,
    pub on_malformed: MalformedLinkPolicy,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            file_type_suffix: ".JPG".to_string(),
            filter_target: FilterTarget::RawLink,
            on_malformed: MalformedLinkPolicy::Skip,
        }
    }
}

/// A link dropped during planning, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    pub link: String,
    pub reason: FilenameError,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadPlan {
    /// Tasks in first-seen order of their raw link.
    pub tasks: Vec<DownloadTask>,
    pub skipped: Vec<SkippedLink>,
}

impl DownloadPlan {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Builds the download plan from raw links.
///
/// Deduplication happens on the raw link before any derivation, so two distinct
/// links that derive the same filename both survive (the later write wins on disk).
pub fn build_plan<'a, I>(
    raw_links: I,
    opts: &PlanOptions,
    deriver: &dyn FilenameDeriver,
) -> Result<DownloadPlan, PlanError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut plan = DownloadPlan::default();

    for link in raw_links {
        if !seen.insert(link) {
            continue;
        }
        let source_url = direct_download_url(link);
        let matched = match opts.filter_target {
            FilterTarget::RawLink => link.contains(&opts.file_type_suffix),
            FilterTarget::DownloadUrl => source_url.contains(&opts.file_type_suffix),
        };
        if !matched {
            continue;
        }

        match deriver.derive_filename(link) {
            Ok(filename) => plan.tasks.push(DownloadTask {
                filename,
                source_url,
            }),
            Err(reason) => match opts.on_malformed {
                MalformedLinkPolicy::Skip => {
                    tracing::warn!(link, %reason, "skipping malformed link");
                    plan.skipped.push(SkippedLink {
                        link: link.to_string(),
                        reason,
                    });
                }
                MalformedLinkPolicy::Fail => {
                    return Err(PlanError::MalformedLink {
                        link: link.to_string(),
                        source: reason,
                    });
                }
            },
        }
    }

    tracing::debug!(
        unique = seen.len(),
        planned = plan.tasks.len(),
        skipped = plan.skipped.len(),
        "download plan built"
    );
    Ok(plan)
}
