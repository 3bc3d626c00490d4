use crate::app::AppContext;
use crate::ipc::helpers::{date_param, get_required_str, selected_class, with_context, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::ledger::AttendanceStatus;
use serde_json::json;

fn attendance_open(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = date_param(params)?;
    let class_label = selected_class(params);
    let view = ctx.open_day(date, &class_label);
    Ok(json!({
        "day": view,
        "classes": ctx.classes()
    }))
}

fn attendance_set_status(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = date_param(params)?;
    let student_id = get_required_str(params, "studentId")?;
    let raw_status = get_required_str(params, "status")?;
    let status: AttendanceStatus = raw_status.parse().map_err(|e| HandlerErr {
        code: "bad_status",
        message: format!("{}", e),
        details: Some(json!({ "allowed": AttendanceStatus::ALL })),
    })?;
    let previous = ctx
        .set_status(date, &student_id, status)
        .map_err(|e| HandlerErr::collab(e, "bad_params"))?;
    Ok(json!({
        "studentId": student_id,
        "status": status,
        "previous": previous,
        "dayInitialized": ctx.ledger().is_initialized(date)
    }))
}

fn attendance_save(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = date_param(params)?;
    let class_label = selected_class(params);
    let saved = ctx
        .save_day(date, &class_label)
        .map_err(|e| HandlerErr::collab(e, "sink_failed"))?;
    Ok(json!({
        "saved": saved,
        "classLabel": class_label
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(with_context(state, req, attendance_open)),
        "attendance.setStatus" => Some(with_context(state, req, attendance_set_status)),
        "attendance.save" => Some(with_context(state, req, attendance_save)),
        _ => None,
    }
}
