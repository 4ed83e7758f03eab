mod student;

pub use student::{ProgressError, QuizGrade, ReflectionEntry, StudentRecord, DEFAULT_USERNAME};
