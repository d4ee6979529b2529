use anyhow::Result;
use bulkdl_core::BulkConfig;
use std::path::Path;

/// Prints the config file location followed by the effective values as TOML.
pub fn run_show_config(path: &Path, cfg: &BulkConfig) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", cfg.to_toml()?);
    Ok(())
}
