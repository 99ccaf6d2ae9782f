use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::Roster;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state
                .roster
                .as_ref()
                .map(|r| r.workspace().to_string_lossy().to_string()),
            "openDialogs": state.dialogs.len(),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match Roster::open(&path) {
        Ok(mut roster) => {
            // Dialogs opened on the previous workspace hold stale copies.
            if !state.dialogs.is_empty() {
                tracing::info!(count = state.dialogs.len(), "discarding open dialogs");
                state.dialogs.clear();
            }
            let student_count = roster.students().len();
            let course_count = roster.courses().len();
            state.roster = Some(roster);
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "studentCount": student_count,
                    "courseCount": course_count,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "workspace open failed");
            err(
                &req.id,
                e.code(),
                e.to_string(),
                Some(json!({ "path": path.to_string_lossy() })),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
