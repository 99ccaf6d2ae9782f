use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return no_workspace(&req.id);
    };
    // Reading re-runs the course check, so stale course references show
    // up as "No Course" here.
    ok(&req.id, json!({ "students": roster.students() }))
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_mut() else {
        return no_workspace(&req.id);
    };
    let id_number = match req.params.get("idNumber").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing idNumber", None),
    };
    match roster.student(&id_number) {
        Some(s) => ok(&req.id, json!({ "student": s })),
        None => err(
            &req.id,
            "not_found",
            "Student not found",
            Some(json!({ "idNumber": id_number })),
        ),
    }
}

fn handle_students_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return no_workspace(&req.id);
    };
    match roster.save_students() {
        Ok(path) => ok(&req.id, json!({ "path": path.to_string_lossy() })),
        Err(e) => {
            tracing::error!(error = %e, "saving students failed");
            err(&req.id, e.code(), e.to_string(), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.save" => Some(handle_students_save(state, req)),
        _ => None,
    }
}
