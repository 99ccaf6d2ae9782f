//! Server-side state for the add/delete/edit dialogs.
//!
//! A dialog works on its own copy of one table. Nothing reaches the owning
//! [`Roster`](crate::roster::Roster) until the dialog completes and its
//! [`DatasetUpdate`] is applied. Two dialogs opened on the same table do not
//! see each other; whichever completes last replaces the table.

use crate::error::StoreError;
use crate::model::{CourseRecord, Record, StudentRecord};
use crate::store;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    StudentAdd,
    StudentDelete,
    StudentEdit,
    CourseAdd,
    CourseDelete,
    CourseEdit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Add,
    Delete,
    Edit,
}

impl DialogKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student.add" => Some(DialogKind::StudentAdd),
            "student.delete" => Some(DialogKind::StudentDelete),
            "student.edit" => Some(DialogKind::StudentEdit),
            "course.add" => Some(DialogKind::CourseAdd),
            "course.delete" => Some(DialogKind::CourseDelete),
            "course.edit" => Some(DialogKind::CourseEdit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DialogKind::StudentAdd => "student.add",
            DialogKind::StudentDelete => "student.delete",
            DialogKind::StudentEdit => "student.edit",
            DialogKind::CourseAdd => "course.add",
            DialogKind::CourseDelete => "course.delete",
            DialogKind::CourseEdit => "course.edit",
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            DialogKind::StudentAdd | DialogKind::CourseAdd => Mode::Add,
            DialogKind::StudentDelete | DialogKind::CourseDelete => Mode::Delete,
            DialogKind::StudentEdit | DialogKind::CourseEdit => Mode::Edit,
        }
    }

    pub fn is_student(self) -> bool {
        matches!(
            self,
            DialogKind::StudentAdd | DialogKind::StudentDelete | DialogKind::StudentEdit
        )
    }
}

#[derive(Debug, Error)]
pub enum DialogError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{action} is not available in a {kind} dialog")]
    WrongAction {
        kind: &'static str,
        action: &'static str,
    },
    #[error("no edit target: look up a record first")]
    NoEditTarget,
}

impl DialogError {
    pub fn code(&self) -> &'static str {
        match self {
            DialogError::Store(e) => e.code(),
            DialogError::WrongAction { .. } => "bad_dialog_action",
            DialogError::NoEditTarget => "not_found",
        }
    }
}

#[derive(Debug)]
pub enum Submission<T> {
    Add(T),
    Delete { key: String, confirmed: bool },
    Edit(T),
}

#[derive(Debug, PartialEq)]
pub enum Outcome<T> {
    /// The dialog is done; the vector replaces the owner's table.
    Completed(Vec<T>),
    /// The user declined the confirmation. The dialog stays open.
    Cancelled,
}

#[derive(Debug)]
pub struct RecordDialog<T: Record> {
    kind: DialogKind,
    records: Vec<T>,
    edit_target: Option<String>,
}

impl<T: Record> RecordDialog<T> {
    pub fn new(kind: DialogKind, records: Vec<T>) -> Self {
        Self {
            kind,
            records,
            edit_target: None,
        }
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    /// Edit dialogs only. A hit arms the confirm action; a miss disarms it.
    pub fn lookup(&mut self, key: &str) -> Result<&T, DialogError> {
        if self.kind.mode() != Mode::Edit {
            return Err(DialogError::WrongAction {
                kind: self.kind.as_str(),
                action: "lookup",
            });
        }
        match store::find_by_key(&self.records, key) {
            Some(idx) => {
                self.edit_target = Some(key.to_string());
                Ok(&self.records[idx])
            }
            None => {
                self.edit_target = None;
                Err(StoreError::NotFound {
                    field: T::KEY_FIELD,
                    key: key.to_string(),
                }
                .into())
            }
        }
    }

    pub fn confirm_enabled(&self) -> bool {
        match self.kind.mode() {
            Mode::Edit => self.edit_target.is_some(),
            Mode::Add | Mode::Delete => true,
        }
    }

    /// On error the dialog's copy is unchanged and the dialog stays usable.
    pub fn submit(&mut self, submission: Submission<T>) -> Result<Outcome<T>, DialogError> {
        match (self.kind.mode(), submission) {
            (Mode::Add, Submission::Add(record)) => {
                store::insert(&mut self.records, record)?;
            }
            (Mode::Delete, Submission::Delete { key, confirmed }) => {
                if !confirmed {
                    return Ok(Outcome::Cancelled);
                }
                store::delete(&mut self.records, &key)?;
            }
            (Mode::Edit, Submission::Edit(record)) => {
                let Some(key) = self.edit_target.as_deref() else {
                    return Err(DialogError::NoEditTarget);
                };
                store::update(&mut self.records, key, record)?;
            }
            (_, submission) => {
                let action = match submission {
                    Submission::Add(_) => "add",
                    Submission::Delete { .. } => "delete",
                    Submission::Edit(_) => "edit",
                };
                return Err(DialogError::WrongAction {
                    kind: self.kind.as_str(),
                    action,
                });
            }
        }
        Ok(Outcome::Completed(std::mem::take(&mut self.records)))
    }
}

/// Full replacement table handed back by a completed dialog.
#[derive(Debug)]
pub enum DatasetUpdate {
    Students(Vec<StudentRecord>),
    Courses(Vec<CourseRecord>),
}

#[derive(Debug)]
pub enum DialogSession {
    Students(RecordDialog<StudentRecord>),
    Courses(RecordDialog<CourseRecord>),
}

impl DialogSession {
    pub fn kind(&self) -> DialogKind {
        match self {
            DialogSession::Students(d) => d.kind(),
            DialogSession::Courses(d) => d.kind(),
        }
    }

    pub fn confirm_enabled(&self) -> bool {
        match self {
            DialogSession::Students(d) => d.confirm_enabled(),
            DialogSession::Courses(d) => d.confirm_enabled(),
        }
    }
}
