use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_courses_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, json!({ "courses": roster.courses() }))
}

fn handle_courses_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return no_workspace(&req.id);
    };
    let course_code = match req.params.get("courseCode").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing courseCode", None),
    };
    match roster.course(course_code) {
        Some(c) => ok(&req.id, json!({ "course": c })),
        None => err(
            &req.id,
            "not_found",
            "Course not found",
            Some(json!({ "courseCode": course_code })),
        ),
    }
}

fn handle_courses_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return no_workspace(&req.id);
    };
    match roster.save_courses() {
        Ok(path) => ok(&req.id, json!({ "path": path.to_string_lossy() })),
        Err(e) => {
            tracing::error!(error = %e, "saving courses failed");
            err(&req.id, e.code(), e.to_string(), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.list" => Some(handle_courses_list(state, req)),
        "courses.get" => Some(handle_courses_get(state, req)),
        "courses.save" => Some(handle_courses_save(state, req)),
        _ => None,
    }
}
