//! Config loading and `commrecon config validate`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use commrecon_recon::ImportConfig;

use crate::CliError;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Parse and validate an import config without running anything
    #[command(after_help = "\
Examples:
  commrecon config validate commrecon.toml")]
    Validate {
        /// Path to the TOML config file
        file: PathBuf,
    },
}

pub fn cmd_config(cmd: ConfigCommands) -> Result<(), CliError> {
    match cmd {
        ConfigCommands::Validate { file } => cmd_config_validate(&file),
    }
}

fn cmd_config_validate(path: &Path) -> Result<(), CliError> {
    let config = read_config(path)?;
    let carriers = config.insurers.len();
    let codes = if config.codes.is_some() { "present" } else { "absent" };
    eprintln!(
        "config OK: {} ({carriers} insurer mapping(s), [codes] {codes})",
        path.display()
    );
    Ok(())
}

fn read_config(path: &Path) -> Result<ImportConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    ImportConfig::from_toml(&text).map_err(CliError::recon)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("commrecon").join("config.toml"))
}

/// Explicit path (flag or `COMMRECON_CONFIG`) must exist. Without one, the
/// per-user default is used when present, else built-in defaults.
pub fn load_config(explicit: Option<PathBuf>) -> Result<ImportConfig, CliError> {
    if let Some(path) = explicit {
        return read_config(&path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            log::info!("using config {}", path.display());
            read_config(&path)
        }
        _ => Ok(ImportConfig::default()),
    }
}
