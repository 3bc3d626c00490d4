use crate::app::AppContext;
use crate::collab::CollabError;
use crate::dates::{self, SchoolYear};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::WILDCARD_CLASS;
use chrono::NaiveDate;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    /// Map a collaborator error. Storage failures get `failure_code`
    /// (`provider_failed` or `sink_failed`); the rest have fixed codes.
    pub fn collab(e: CollabError, failure_code: &'static str) -> Self {
        let code = match &e {
            CollabError::Db(_) => failure_code,
            CollabError::NotFound(_) => "not_found",
            CollabError::Duplicate(_) => "duplicate",
            CollabError::Invalid(_) => "bad_params",
        };
        Self::new(code, e.to_string())
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// `classLabel` param; absent, null or blank selects every class.
pub fn selected_class(params: &serde_json::Value) -> String {
    params
        .get("classLabel")
        .and_then(crate::roster::label_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| WILDCARD_CLASS.to_string())
}

/// `date` param in `YYYY-MM-DD`; today when absent.
pub fn date_param(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match params.get("date").and_then(|v| v.as_str()) {
        Some(raw) => dates::parse_iso(raw).map_err(|e| HandlerErr::bad_params(e.to_string())),
        None => Ok(dates::today()),
    }
}

/// `schoolYear` param: `"2023/2024"`, `"2023"` or `2023`. Defaults to the
/// school year containing today.
pub fn school_year_param(params: &serde_json::Value) -> Result<SchoolYear, HandlerErr> {
    match params.get("schoolYear") {
        None | Some(serde_json::Value::Null) => Ok(SchoolYear::current()),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(SchoolYear::starting)
            .ok_or_else(|| HandlerErr::bad_params(format!("invalid schoolYear {}", n))),
        Some(serde_json::Value::String(s)) => {
            SchoolYear::parse(s).map_err(|e| HandlerErr::bad_params(e.to_string()))
        }
        Some(_) => Err(HandlerErr::bad_params("schoolYear must be a string or number")),
    }
}

/// Run `f` against the open session, wrapping the outcome in the response
/// envelope.
pub fn with_context<F>(state: &mut AppState, req: &Request, f: F) -> serde_json::Value
where
    F: FnOnce(&mut AppContext, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
{
    let Some(ctx) = state.ctx.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(ctx, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => {
            tracing::debug!(id = %req.id, code = error.code, message = %error.message, "request failed");
            error.response(&req.id)
        }
    }
}
