use crate::app::AppContext;
use crate::collab::NewStudent;
use crate::ipc::helpers::{get_required_str, with_context, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster::Student;
use serde_json::json;

fn student_json(s: &Student) -> serde_json::Value {
    json!({
        "id": s.id,
        "name": s.name,
        "nationalId": s.national_id,
        "classLabel": s.class_label,
        "classId": s.class_id()
    })
}

fn roster_json(ctx: &AppContext) -> serde_json::Value {
    let students: Vec<serde_json::Value> = ctx.roster().iter().map(student_json).collect();
    json!({
        "students": students,
        "classes": ctx.classes(),
        "rosterStale": ctx.roster_stale()
    })
}

fn new_student(params: &serde_json::Value) -> Result<NewStudent, HandlerErr> {
    let national_id = get_required_str(params, "nationalId")?;
    let name = get_required_str(params, "name")?;
    let class_label = params
        .get("classLabel")
        .and_then(crate::roster::label_text)
        .ok_or_else(|| HandlerErr::bad_params("missing classLabel"))?;
    NewStudent::new(&national_id, &name, &class_label)
        .map_err(|e| HandlerErr::collab(e, "provider_failed"))
}

fn students_refresh(
    ctx: &mut AppContext,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    ctx.refresh_roster()
        .map_err(|e| HandlerErr::collab(e, "provider_failed"))?;
    Ok(roster_json(ctx))
}

fn students_list(
    ctx: &mut AppContext,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(roster_json(ctx))
}

fn students_create(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = new_student(params)?;
    let created = ctx
        .add_student(&student)
        .map_err(|e| HandlerErr::collab(e, "provider_failed"))?;
    Ok(json!({
        "student": student_json(&created),
        "rosterStale": ctx.roster_stale()
    }))
}

fn students_update(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let old_national_id = get_required_str(params, "oldNationalId")?;
    let student = new_student(params)?;
    ctx.update_student(&old_national_id, &student)
        .map_err(|e| HandlerErr::collab(e, "provider_failed"))?;
    Ok(json!({ "ok": true, "rosterStale": ctx.roster_stale() }))
}

fn students_delete(
    ctx: &mut AppContext,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let national_id = get_required_str(params, "nationalId")?;
    ctx.delete_student(&national_id)
        .map_err(|e| HandlerErr::collab(e, "provider_failed"))?;
    Ok(json!({ "ok": true, "rosterStale": ctx.roster_stale() }))
}

fn classes_list(
    ctx: &mut AppContext,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "classes": ctx.classes() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.refresh" => Some(with_context(state, req, students_refresh)),
        "students.list" => Some(with_context(state, req, students_list)),
        "students.create" => Some(with_context(state, req, students_create)),
        "students.update" => Some(with_context(state, req, students_update)),
        "students.delete" => Some(with_context(state, req, students_delete)),
        "classes.list" => Some(with_context(state, req, classes_list)),
        _ => None,
    }
}
