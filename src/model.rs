use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Course value for a student with no valid course assignment.
pub const NO_COURSE: &str = "No Course";

/// A row type that the record store can load, save and key.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Canonical column order, written as the CSV header on save.
    const HEADERS: &'static [&'static str];
    /// Name of the key column, used in error messages.
    const KEY_FIELD: &'static str;

    fn key(&self) -> &str;

    /// Applied to every inserted or updated record.
    fn normalize(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Other(String),
}

impl From<String> for Sex {
    fn from(s: String) -> Self {
        match s.as_str() {
            "M" => Sex::Male,
            "F" => Sex::Female,
            _ => Sex::Other(s),
        }
    }
}

impl Sex {
    pub fn as_str(&self) -> &str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other(v) => v,
        }
    }
}

impl Serialize for Sex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Sex::from)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Enrollment {
    Yes,
    #[default]
    No,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub id_number: String,
    pub course: String,
    pub year: u32,
    pub sex: Sex,
    /// Derived from `course`; whatever a caller supplies is overwritten on insert/update.
    #[serde(default)]
    pub status: Enrollment,
}

impl Record for StudentRecord {
    const HEADERS: &'static [&'static str] =
        &["name", "id_number", "course", "year", "sex", "status"];
    const KEY_FIELD: &'static str = "id_number";

    fn key(&self) -> &str {
        &self.id_number
    }

    fn normalize(&mut self) {
        self.status = crate::reconcile::derive_status(&self.course);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub course_code: String,
    pub course_description: String,
}

impl Record for CourseRecord {
    const HEADERS: &'static [&'static str] = &["course_code", "course_description"];
    const KEY_FIELD: &'static str = "course_code";

    fn key(&self) -> &str {
        &self.course_code
    }
}
