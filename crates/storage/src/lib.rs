#![forbid(unsafe_code)]

pub mod json_file;
pub mod repository;

pub use json_file::{JsonFileStore, DEFAULT_DATA_FILE};
pub use repository::{InMemoryStore, StorageError, StudentRepository};
