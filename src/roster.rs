use crate::dialog::{DatasetUpdate, DialogKind, DialogSession, RecordDialog};
use crate::error::StoreError;
use crate::model::{CourseRecord, StudentRecord, NO_COURSE};
use crate::reconcile::reconcile;
use crate::store::{self, LineEnding};
use std::path::{Path, PathBuf};

pub const STUDENTS_FILE: &str = "students.csv";
pub const COURSES_FILE: &str = "courses.csv";

/// Owner of both tables for one workspace directory.
#[derive(Debug)]
pub struct Roster {
    workspace: PathBuf,
    students: Vec<StudentRecord>,
    courses: Vec<CourseRecord>,
    students_ending: LineEnding,
    courses_ending: LineEnding,
}

impl Roster {
    pub fn open(workspace: &Path) -> Result<Self, StoreError> {
        let (students, students_ending) =
            store::load_with_line_ending(&workspace.join(STUDENTS_FILE))?;
        let (courses, courses_ending) = store::load_with_line_ending(&workspace.join(COURSES_FILE))?;
        let mut roster = Roster {
            workspace: workspace.to_path_buf(),
            students,
            courses,
            students_ending,
            courses_ending,
        };
        roster.refresh();
        tracing::info!(
            workspace = %workspace.display(),
            students = roster.students.len(),
            courses = roster.courses.len(),
            "workspace opened"
        );
        Ok(roster)
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Re-runs the course consistency pass over the in-memory students.
    fn refresh(&mut self) {
        let reconciled = reconcile(&self.students, &self.courses);
        let changed = self
            .students
            .iter()
            .zip(&reconciled)
            .filter(|(a, b)| a != b)
            .count();
        if changed > 0 {
            tracing::debug!(changed, "students moved to {}", NO_COURSE);
        }
        self.students = reconciled;
    }

    pub fn students(&mut self) -> &[StudentRecord] {
        self.refresh();
        &self.students
    }

    pub fn courses(&self) -> &[CourseRecord] {
        &self.courses
    }

    pub fn student(&mut self, id_number: &str) -> Option<&StudentRecord> {
        self.refresh();
        store::find_by_key(&self.students, id_number).map(|i| &self.students[i])
    }

    pub fn course(&self, course_code: &str) -> Option<&CourseRecord> {
        store::find_by_key(&self.courses, course_code).map(|i| &self.courses[i])
    }

    /// Choices offered by the student add/edit dialogs.
    pub fn course_options(&self) -> Vec<String> {
        self.courses
            .iter()
            .map(|c| c.course_code.clone())
            .chain(std::iter::once(NO_COURSE.to_string()))
            .collect()
    }

    /// Starts a dialog on a copy of the relevant table.
    pub fn open_dialog(&self, kind: DialogKind) -> DialogSession {
        if kind.is_student() {
            DialogSession::Students(RecordDialog::new(kind, self.students.clone()))
        } else {
            DialogSession::Courses(RecordDialog::new(kind, self.courses.clone()))
        }
    }

    pub fn apply(&mut self, update: DatasetUpdate) {
        match update {
            DatasetUpdate::Students(rows) => {
                tracing::info!(rows = rows.len(), "students replaced");
                self.students = rows;
            }
            DatasetUpdate::Courses(rows) => {
                tracing::info!(rows = rows.len(), "courses replaced");
                self.courses = rows;
            }
        }
        self.refresh();
    }

    pub fn save_students(&self) -> Result<PathBuf, StoreError> {
        let path = self.workspace.join(STUDENTS_FILE);
        store::save_with_line_ending(&self.students, &path, self.students_ending)?;
        tracing::info!(path = %path.display(), rows = self.students.len(), "students saved");
        Ok(path)
    }

    pub fn save_courses(&self) -> Result<PathBuf, StoreError> {
        let path = self.workspace.join(COURSES_FILE);
        store::save_with_line_ending(&self.courses, &path, self.courses_ending)?;
        tracing::info!(path = %path.display(), rows = self.courses.len(), "courses saved");
        Ok(path)
    }
}
