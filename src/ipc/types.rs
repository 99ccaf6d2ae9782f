use std::collections::HashMap;

use serde::Deserialize;

use crate::dialog::DialogSession;
use crate::roster::Roster;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub roster: Option<Roster>,
    /// Open dialogs keyed by dialog id.
    pub dialogs: HashMap<String, DialogSession>,
}
