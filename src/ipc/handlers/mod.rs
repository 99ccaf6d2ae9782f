pub mod backup;
pub mod core;
pub mod courses;
pub mod dialogs;
pub mod students;
