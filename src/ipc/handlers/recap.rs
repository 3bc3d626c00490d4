use crate::app::AppContext;
use crate::dates::{Month, Semester};
use crate::ipc::helpers::{
    get_required_str, school_year_param, selected_class, with_context, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn month_param(params: &serde_json::Value) -> Result<Month, HandlerErr> {
    let raw = get_required_str(params, "month")?;
    Month::parse(&raw).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

fn recap_monthly(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let month = month_param(params)?;
    let school_year = school_year_param(params)?;
    let class_label = selected_class(params);
    let recap = ctx
        .monthly_recap(&class_label, month, school_year)
        .map_err(|e| HandlerErr::collab(e, "sink_failed"))?;
    Ok(json!({ "recap": recap }))
}

fn recap_export(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let month = month_param(params)?;
    let school_year = school_year_param(params)?;
    let class_label = selected_class(params);
    let table = ctx
        .export_recap(&class_label, month, school_year)
        .map_err(|e| HandlerErr::collab(e, "sink_failed"))?;
    Ok(json!({
        "month": month.name(),
        "schoolYear": school_year.label(),
        "classLabel": class_label,
        "table": table
    }))
}

fn graph_semester(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    // Accept 1 as well as "1".
    let raw = params
        .get("semester")
        .map(|v| match v {
            serde_json::Value::Number(n) => n.to_string(),
            other => other.as_str().unwrap_or_default().to_string(),
        })
        .ok_or_else(|| HandlerErr::bad_params("missing semester"))?;
    let semester = Semester::parse(&raw).map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    let school_year = school_year_param(params)?;
    let class_label = selected_class(params);
    let months = ctx
        .semester_trend(&class_label, semester, school_year)
        .map_err(|e| HandlerErr::collab(e, "sink_failed"))?;
    Ok(json!({
        "semester": semester.label(),
        "schoolYear": school_year.label(),
        "classLabel": class_label,
        "months": months
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "recap.monthly" => Some(with_context(state, req, recap_monthly)),
        "recap.export" => Some(with_context(state, req, recap_export)),
        "graph.semester" => Some(with_context(state, req, graph_semester)),
        _ => None,
    }
}
