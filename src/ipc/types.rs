use std::path::PathBuf;

use serde::Deserialize;

use crate::app::AppContext;
use crate::recap::PercentPrecision;
use crate::store::SheetStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub ctx: Option<AppContext>,
    pub precision: PercentPrecision,
}

impl AppState {
    pub fn new(precision: PercentPrecision) -> Self {
        Self {
            workspace: None,
            ctx: None,
            precision,
        }
    }

    /// Open (or create) the workspace at `path` and start a fresh session on
    /// it. The previous session's ledger is dropped.
    pub fn select_workspace(&mut self, path: PathBuf) -> anyhow::Result<usize> {
        let provider = SheetStore::open(&path)?;
        let sink = SheetStore::open(&path)?;
        let mut ctx = AppContext::new(Box::new(provider), Box::new(sink), self.precision);

        // Best-effort: a roster that fails to load leaves the session empty
        // until students.refresh succeeds.
        let students = ctx.refresh_roster().unwrap_or(0);

        tracing::info!(workspace = %path.display(), students, "workspace selected");
        self.workspace = Some(path);
        self.ctx = Some(ctx);
        Ok(students)
    }
}
