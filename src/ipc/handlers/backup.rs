use crate::backup;
use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::Roster;
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return no_workspace(&req.id);
    };
    let Some(out_path) = req.params.get("outPath").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing outPath", None);
    };

    match backup::export_workspace_bundle(roster.workspace(), &PathBuf::from(out_path)) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "path": out_path,
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "exportedAt": summary.exported_at,
            }),
        ),
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = %message, "bundle export failed");
            err(&req.id, "backup_export_failed", message, None)
        }
    }
}

fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.roster.as_ref().map(|r| r.workspace().to_path_buf()) else {
        return no_workspace(&req.id);
    };
    let Some(in_path) = req.params.get("inPath").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing inPath", None);
    };

    let summary = match backup::import_workspace_bundle(&PathBuf::from(in_path), &workspace) {
        Ok(v) => v,
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = %message, "bundle import failed");
            return err(&req.id, "backup_import_failed", message, None);
        }
    };

    // Reload from the restored files; open dialogs refer to the old tables.
    match Roster::open(&workspace) {
        Ok(mut roster) => {
            state.dialogs.clear();
            let student_count = roster.students().len();
            let course_count = roster.courses().len();
            state.roster = Some(roster);
            ok(
                &req.id,
                json!({
                    "bundleFormatDetected": summary.bundle_format_detected,
                    "filesRestored": summary.files_restored,
                    "studentCount": student_count,
                    "courseCount": course_count,
                }),
            )
        }
        Err(e) => err(
            &req.id,
            e.code(),
            e.to_string(),
            Some(json!({ "path": workspace.to_string_lossy() })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_backup_export_workspace_bundle(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import_workspace_bundle(state, req)),
        _ => None,
    }
}
