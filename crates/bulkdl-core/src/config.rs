use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::plan::{FilterTarget, MalformedLinkPolicy, PlanOptions};
use crate::url_model::DeriverKind;

/// Global configuration loaded from `~/.config/bulkdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    /// Listing page to download from. Usually given on the command line instead.
    pub source_url: Option<String>,
    /// Directory the files are written to (created if missing).
    pub destination_dir: PathBuf,
    /// Maximum number of file bodies being fetched at once.
    pub max_concurrent_downloads: usize,
    /// Case-sensitive marker a link must contain to be downloaded.
    pub file_type_suffix: String,
    /// Whether the marker is matched against the raw link or the rewritten download URL.
    pub filter_target: FilterTarget,
    /// "skip" (warn and continue) or "fail" (abort the run) on links with an unexpected shape.
    pub on_malformed: MalformedLinkPolicy,
    /// How local filenames are derived from links.
    pub filename_deriver: DeriverKind,
    /// Per-request timeout in seconds (listing page and each file).
    pub request_timeout_secs: u64,
    /// Optional User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            destination_dir: PathBuf::from("pics"),
            max_concurrent_downloads: 5,
            file_type_suffix: ".JPG".to_string(),
            filter_target: FilterTarget::RawLink,
            on_malformed: MalformedLinkPolicy::Skip,
            filename_deriver: DeriverKind::SharedFolder,
            request_timeout_secs: 60,
            user_agent: None,
        }
    }
}

/// Invalid or missing settings, reported before any network access.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no source URL given (pass one on the command line or set source_url in the config)")]
    MissingSourceUrl,
    #[error("invalid source URL {url}: {reason}")]
    InvalidSourceUrl { url: String, reason: String },
    #[error("max_concurrent_downloads must be at least 1")]
    ZeroConcurrency,
    #[error("request_timeout_secs must be at least 1")]
    ZeroTimeout,
    #[error("file_type_suffix must not be empty")]
    EmptySuffix,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_url: Option<String>,
    pub destination_dir: Option<PathBuf>,
    pub max_concurrent_downloads: Option<usize>,
    pub file_type_suffix: Option<String>,
    pub filter_target: Option<FilterTarget>,
    pub on_malformed: Option<MalformedLinkPolicy>,
    pub request_timeout_secs: Option<u64>,
}

/// Validated settings for one run, passed explicitly to the orchestrator.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub source_url: String,
    pub destination_dir: PathBuf,
    pub max_concurrent_downloads: usize,
    pub plan: PlanOptions,
    pub filename_deriver: DeriverKind,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
}

impl BulkConfig {
    /// Pretty TOML, as written by [`load_or_init`].
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies `overrides` and validates the result.
    pub fn resolve(&self, overrides: Overrides) -> Result<RunSettings, ConfigError> {
        let source_url = overrides
            .source_url
            .or_else(|| self.source_url.clone())
            .ok_or(ConfigError::MissingSourceUrl)?;
        validate_source_url(&source_url)?;

        let max_concurrent_downloads = overrides
            .max_concurrent_downloads
            .unwrap_or(self.max_concurrent_downloads);
        if max_concurrent_downloads == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        let request_timeout_secs = overrides
            .request_timeout_secs
            .unwrap_or(self.request_timeout_secs);
        if request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let file_type_suffix = overrides
            .file_type_suffix
            .unwrap_or_else(|| self.file_type_suffix.clone());
        if file_type_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix);
        }

        Ok(RunSettings {
            source_url,
            destination_dir: overrides
                .destination_dir
                .unwrap_or_else(|| self.destination_dir.clone()),
            max_concurrent_downloads,
            plan: PlanOptions {
                file_type_suffix,
                filter_target: overrides.filter_target.unwrap_or(self.filter_target),
                on_malformed: overrides.on_malformed.unwrap_or(self.on_malformed),
            },
            filename_deriver: self.filename_deriver,
            request_timeout: Duration::from_secs(request_timeout_secs),
            user_agent: self.user_agent.clone(),
        })
    }
}

fn validate_source_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidSourceUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidSourceUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("bulkdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<BulkConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = BulkConfig::default();
        let toml = default_cfg.to_toml()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file. Missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<BulkConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: BulkConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "https://www.dropbox.com/sh/23j4ldkj3jk32m/AAB3lkjdlk3j2k34?dl=0";

    #[test]
    fn default_config_values() {
        let cfg = BulkConfig::default();
        assert!(cfg.source_url.is_none());
        assert_eq!(cfg.destination_dir, PathBuf::from("pics"));
        assert_eq!(cfg.max_concurrent_downloads, 5);
        assert_eq!(cfg.file_type_suffix, ".JPG");
        assert_eq!(cfg.filter_target, FilterTarget::RawLink);
        assert_eq!(cfg.on_malformed, MalformedLinkPolicy::Skip);
        assert_eq!(cfg.filename_deriver, DeriverKind::SharedFolder);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = BulkConfig::default();
        let toml = cfg.to_toml().unwrap();
        let parsed: BulkConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.destination_dir, cfg.destination_dir);
        assert_eq!(parsed.max_concurrent_downloads, cfg.max_concurrent_downloads);
        assert_eq!(parsed.file_type_suffix, cfg.file_type_suffix);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            source_url = "https://www.dropbox.com/sh/abc/def?dl=0"
            destination_dir = "/tmp/photos"
            max_concurrent_downloads = 2
            file_type_suffix = ".PNG"
            filter_target = "download_url"
            on_malformed = "fail"
            filename_deriver = "last_segment"
        "#;
        let cfg: BulkConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            cfg.source_url.as_deref(),
            Some("https://www.dropbox.com/sh/abc/def?dl=0")
        );
        assert_eq!(cfg.destination_dir, PathBuf::from("/tmp/photos"));
        assert_eq!(cfg.max_concurrent_downloads, 2);
        assert_eq!(cfg.file_type_suffix, ".PNG");
        assert_eq!(cfg.filter_target, FilterTarget::DownloadUrl);
        assert_eq!(cfg.on_malformed, MalformedLinkPolicy::Fail);
        assert_eq!(cfg.filename_deriver, DeriverKind::LastSegment);
        // Unset keys fall back to defaults.
        assert_eq!(cfg.request_timeout_secs, 60);
        assert!(cfg.user_agent.is_none());
    }

    #[test]
    fn resolve_applies_defaults() {
        let cfg = BulkConfig {
            source_url: Some(LISTING.to_string()),
            ..BulkConfig::default()
        };
        let s = cfg.resolve(Overrides::default()).unwrap();
        assert_eq!(s.source_url, LISTING);
        assert_eq!(s.destination_dir, PathBuf::from("pics"));
        assert_eq!(s.max_concurrent_downloads, 5);
        assert_eq!(s.plan.file_type_suffix, ".JPG");
        assert_eq!(s.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn resolve_overrides_win() {
        let cfg = BulkConfig {
            source_url: Some("https://example.com/ignored".to_string()),
            ..BulkConfig::default()
        };
        let s = cfg
            .resolve(Overrides {
                source_url: Some(LISTING.to_string()),
                destination_dir: Some(PathBuf::from("out")),
                max_concurrent_downloads: Some(2),
                file_type_suffix: Some(".PNG".to_string()),
                filter_target: Some(FilterTarget::DownloadUrl),
                on_malformed: Some(MalformedLinkPolicy::Fail),
                request_timeout_secs: Some(5),
            })
            .unwrap();
        assert_eq!(s.source_url, LISTING);
        assert_eq!(s.destination_dir, PathBuf::from("out"));
        assert_eq!(s.max_concurrent_downloads, 2);
        assert_eq!(s.plan.file_type_suffix, ".PNG");
        assert_eq!(s.plan.filter_target, FilterTarget::DownloadUrl);
        assert_eq!(s.plan.on_malformed, MalformedLinkPolicy::Fail);
        assert_eq!(s.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn resolve_rejects_bad_values() {
        let cfg = BulkConfig::default();
        assert!(matches!(
            cfg.resolve(Overrides::default()),
            Err(ConfigError::MissingSourceUrl)
        ));
        let with = |o: Overrides| {
            cfg.resolve(Overrides {
                source_url: o.source_url.or(Some(LISTING.to_string())),
                ..o
            })
        };
        assert!(matches!(
            with(Overrides {
                source_url: Some("not a url".to_string()),
                ..Overrides::default()
            }),
            Err(ConfigError::InvalidSourceUrl { .. })
        ));
        assert!(matches!(
            with(Overrides {
                source_url: Some("ftp://example.com/x".to_string()),
                ..Overrides::default()
            }),
            Err(ConfigError::InvalidSourceUrl { .. })
        ));
        assert!(matches!(
            with(Overrides {
                max_concurrent_downloads: Some(0),
                ..Overrides::default()
            }),
            Err(ConfigError::ZeroConcurrency)
        ));
        assert!(matches!(
            with(Overrides {
                request_timeout_secs: Some(0),
                ..Overrides::default()
            }),
            Err(ConfigError::ZeroTimeout)
        ));
        assert!(matches!(
            with(Overrides {
                file_type_suffix: Some(String::new()),
                ..Overrides::default()
            }),
            Err(ConfigError::EmptySuffix)
        ));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_concurrent_downloads = 3\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.max_concurrent_downloads, 3);
        assert_eq!(cfg.file_type_suffix, ".JPG");
    }
}
