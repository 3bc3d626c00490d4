//! `absensid`: attendance sidecar speaking JSON lines on stdin/stdout.
//!
//! Each input line is one request `{id, method, params}`; each output line is
//! the matching response. Logs go to stderr so stdout stays a clean protocol
//! channel.
//!
//! # Environment Variables
//! - `ABSENSI_WORKSPACE` (optional) – workspace to open at startup
//! - `ABSENSI_PERCENT_DECIMALS` (optional) – 1 or 2 (default: 2)
//! - `ABSENSI_LOG_LEVEL` (optional) – log verbosity when `RUST_LOG` is unset (default: `info`)
mod app;
mod collab;
mod config;
mod dates;
mod db;
mod ipc;
mod ledger;
mod recap;
mod roster;
mod store;

use std::env;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use tracing_subscriber::filter::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let mut state = ipc::AppState::new(cfg.precision);
    if let Some(path) = cfg.workspace.clone() {
        // A bad startup workspace is not fatal; the client can still select one.
        if let Err(e) = state.select_workspace(path.clone()) {
            tracing::warn!(workspace = %path.display(), error = %e, "startup workspace not opened");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request line");
                let _ = writeln!(stdout, "{}", ipc::bad_json(e.to_string()));
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `ABSENSI_LOG_LEVEL` picks the level
/// (default `info`).
fn init_tracing() {
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var(config::LOG_LEVEL_VAR).ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(level)
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(true)
        .with_ansi(false)
        .with_env_filter(env_filter)
        .compact()
        .init();
}
