use crate::dialog::{
    DatasetUpdate, DialogError, DialogKind, DialogSession, Mode, Outcome, RecordDialog, Submission,
};
use crate::ipc::error::{err, no_workspace, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::Record;
use serde_json::json;
use uuid::Uuid;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    fn dialog(e: DialogError, confirm_enabled: bool) -> Self {
        HandlerErr {
            code: e.code(),
            message: e.to_string(),
            details: Some(json!({ "confirmEnabled": confirm_enabled })),
        }
    }
}

fn dialog_id_param(req: &Request) -> Result<String, HandlerErr> {
    req.params
        .get("dialogId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params("missing dialogId"))
}

fn unknown_dialog(dialog_id: &str) -> HandlerErr {
    HandlerErr {
        code: "dialog_not_found",
        message: format!("no open dialog with id {dialog_id}"),
        details: None,
    }
}

fn parse_submission<T: Record>(
    mode: Mode,
    params: &serde_json::Value,
) -> Result<Submission<T>, HandlerErr> {
    match mode {
        Mode::Add | Mode::Edit => {
            let raw = params
                .get("record")
                .cloned()
                .ok_or_else(|| HandlerErr::bad_params("missing record"))?;
            let record: T = serde_json::from_value(raw)
                .map_err(|e| HandlerErr::bad_params(format!("invalid record: {e}")))?;
            Ok(if mode == Mode::Add {
                Submission::Add(record)
            } else {
                Submission::Edit(record)
            })
        }
        Mode::Delete => {
            let key = params
                .get("key")
                .and_then(|v| v.as_str())
                .ok_or_else(|| HandlerErr::bad_params("missing key"))?
                .to_string();
            let confirmed = params
                .get("confirmed")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            Ok(Submission::Delete { key, confirmed })
        }
    }
}

enum Submitted {
    Completed(DatasetUpdate),
    Cancelled,
}

fn submit_to<T: Record>(
    dialog: &mut RecordDialog<T>,
    params: &serde_json::Value,
    wrap: fn(Vec<T>) -> DatasetUpdate,
) -> Result<Submitted, HandlerErr> {
    let submission = parse_submission::<T>(dialog.kind().mode(), params)?;
    match dialog.submit(submission) {
        Ok(Outcome::Completed(rows)) => Ok(Submitted::Completed(wrap(rows))),
        Ok(Outcome::Cancelled) => Ok(Submitted::Cancelled),
        Err(e) => Err(HandlerErr::dialog(e, dialog.confirm_enabled())),
    }
}

fn lookup_in<T: Record>(
    dialog: &mut RecordDialog<T>,
    key: &str,
) -> Result<serde_json::Value, HandlerErr> {
    match dialog.lookup(key) {
        Ok(record) => Ok(json!(record)),
        Err(e) => Err(HandlerErr::dialog(e, dialog.confirm_enabled())),
    }
}

fn handle_dialog_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return no_workspace(&req.id);
    };
    let kind_str = match req.params.get("kind").and_then(|v| v.as_str()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing kind", None),
    };
    let Some(kind) = DialogKind::parse(kind_str) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown dialog kind: {kind_str}"),
            None,
        );
    };

    let session = roster.open_dialog(kind);
    let course_options = match kind {
        DialogKind::StudentAdd | DialogKind::StudentEdit => Some(roster.course_options()),
        _ => None,
    };
    let dialog_id = Uuid::new_v4().to_string();
    let confirm_enabled = session.confirm_enabled();
    state.dialogs.insert(dialog_id.clone(), session);
    tracing::debug!(dialog_id = %dialog_id, kind = kind.as_str(), "dialog opened");

    let mut result = json!({
        "dialogId": dialog_id,
        "kind": kind.as_str(),
        "confirmEnabled": confirm_enabled,
    });
    if let Some(options) = course_options {
        result["courseOptions"] = json!(options);
    }
    ok(&req.id, result)
}

fn lookup(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let dialog_id = dialog_id_param(req)?;
    let key = req
        .params
        .get("key")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing key"))?;
    let session = state
        .dialogs
        .get_mut(&dialog_id)
        .ok_or_else(|| unknown_dialog(&dialog_id))?;
    let record = match session {
        DialogSession::Students(d) => lookup_in(d, key)?,
        DialogSession::Courses(d) => lookup_in(d, key)?,
    };
    Ok(json!({ "record": record, "confirmEnabled": true }))
}

fn handle_dialog_lookup(state: &mut AppState, req: &Request) -> serde_json::Value {
    match lookup(state, req) {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

fn handle_dialog_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let dialog_id = match dialog_id_param(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let Some(session) = state.dialogs.get_mut(&dialog_id) else {
        return unknown_dialog(&dialog_id).response(&req.id);
    };
    let kind = session.kind();
    let submitted = match session {
        DialogSession::Students(d) => submit_to(d, &req.params, DatasetUpdate::Students),
        DialogSession::Courses(d) => submit_to(d, &req.params, DatasetUpdate::Courses),
    };

    match submitted {
        Ok(Submitted::Completed(update)) => {
            state.dialogs.remove(&dialog_id);
            let Some(roster) = state.roster.as_mut() else {
                return no_workspace(&req.id);
            };
            roster.apply(update);
            tracing::info!(dialog_id = %dialog_id, kind = kind.as_str(), "dialog completed");
            ok(
                &req.id,
                json!({
                    "completed": true,
                    "kind": kind.as_str(),
                    "studentCount": roster.students().len(),
                    "courseCount": roster.courses().len(),
                }),
            )
        }
        Ok(Submitted::Cancelled) => ok(
            &req.id,
            json!({ "completed": false, "kind": kind.as_str() }),
        ),
        Err(e) => {
            tracing::warn!(dialog_id = %dialog_id, code = e.code, "{}", e.message);
            e.response(&req.id)
        }
    }
}

fn handle_dialog_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let dialog_id = match dialog_id_param(req) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match state.dialogs.remove(&dialog_id) {
        Some(session) => ok(
            &req.id,
            json!({ "closed": true, "kind": session.kind().as_str() }),
        ),
        None => unknown_dialog(&dialog_id).response(&req.id),
    }
}

fn handle_dialog_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut dialogs: Vec<serde_json::Value> = state
        .dialogs
        .iter()
        .map(|(id, session)| {
            json!({
                "dialogId": id,
                "kind": session.kind().as_str(),
                "confirmEnabled": session.confirm_enabled(),
            })
        })
        .collect();
    dialogs.sort_by(|a, b| {
        let ka = a.get("dialogId").and_then(|v| v.as_str()).unwrap_or("");
        let kb = b.get("dialogId").and_then(|v| v.as_str()).unwrap_or("");
        ka.cmp(kb)
    });
    ok(&req.id, json!({ "dialogs": dialogs }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dialog.open" => Some(handle_dialog_open(state, req)),
        "dialog.lookup" => Some(handle_dialog_lookup(state, req)),
        "dialog.submit" => Some(handle_dialog_submit(state, req)),
        "dialog.close" => Some(handle_dialog_close(state, req)),
        "dialog.list" => Some(handle_dialog_list(state, req)),
        _ => None,
    }
}
