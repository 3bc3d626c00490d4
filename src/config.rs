//! Runtime configuration for the `absensid` sidecar.
//!
//! Everything comes from the environment (a `.env` file is loaded by the
//! caller first). Nothing here is required; a sidecar started without any
//! variables waits for `workspace.select` and reports percentages with two
//! decimals.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::recap::PercentPrecision;

pub const WORKSPACE_VAR: &str = "ABSENSI_WORKSPACE";
pub const PERCENT_DECIMALS_VAR: &str = "ABSENSI_PERCENT_DECIMALS";
pub const LOG_LEVEL_VAR: &str = "ABSENSI_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct Config {
    /// Workspace opened at startup, if any.
    pub workspace: Option<PathBuf>,

    /// Decimal places for attendance percentages (1 or 2).
    pub precision: PercentPrecision,
}

/// Load configuration from environment variables.
///
/// Optional:
/// - `ABSENSI_WORKSPACE` – workspace directory to open at startup
/// - `ABSENSI_PERCENT_DECIMALS` – `1` or `2` (default: 2)
///
/// Returns an error if a variable is set but invalid.
pub fn load_from_env() -> Result<Config> {
    let workspace = env::var(WORKSPACE_VAR)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let precision = parse_precision(env::var(PERCENT_DECIMALS_VAR).ok().as_deref())?;
    Ok(Config {
        workspace,
        precision,
    })
}

fn parse_precision(raw: Option<&str>) -> Result<PercentPrecision> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(PercentPrecision::default());
    };
    raw.parse::<u8>()
        .ok()
        .and_then(PercentPrecision::from_decimals)
        .ok_or_else(|| anyhow!("Invalid {}: {:?} (expected 1 or 2)", PERCENT_DECIMALS_VAR, raw))
}

impl Config {
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!(
            "  {} : {}",
            WORKSPACE_VAR,
            self.workspace
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unset>".to_string())
        );
        tracing::info!("  {} : {}", PERCENT_DECIMALS_VAR, self.precision.decimals());
    }
}
