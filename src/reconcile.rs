use crate::model::{CourseRecord, Enrollment, StudentRecord, NO_COURSE};
use std::collections::HashSet;

pub fn derive_status(course: &str) -> Enrollment {
    if course == NO_COURSE {
        Enrollment::No
    } else {
        Enrollment::Yes
    }
}

/// Points every student whose course is not a known course code at the
/// sentinel course and marks them unenrolled. Students with a valid course
/// are returned unchanged.
pub fn reconcile(students: &[StudentRecord], courses: &[CourseRecord]) -> Vec<StudentRecord> {
    let known: HashSet<&str> = courses.iter().map(|c| c.course_code.as_str()).collect();
    students
        .iter()
        .map(|s| {
            if known.contains(s.course.as_str()) {
                s.clone()
            } else {
                StudentRecord {
                    course: NO_COURSE.to_string(),
                    status: Enrollment::No,
                    ..s.clone()
                }
            }
        })
        .collect()
}
