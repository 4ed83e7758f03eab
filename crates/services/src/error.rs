//! Shared error types for the services crate.

use thiserror::Error;

use revise_core::model::ProgressError;

/// Input problems surfaced to callers as 4xx-class failures.
///
/// Storage problems never appear here: loads recover locally and save
/// failures are logged and swallowed, so validation is the only error
/// category an operation can return.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("baseline already completed")]
    BaselineAlreadyCompleted,
    #[error("no answers provided")]
    NoAnswersProvided,
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
    #[error("no topics tracked yet; complete the baseline first")]
    NoTopicsTracked,
    #[error("topic cannot be empty")]
    EmptyTopic,
    #[error("reflection cannot be empty")]
    EmptyReflection,
}

impl From<ProgressError> for ValidationError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::BaselineAlreadyCompleted => Self::BaselineAlreadyCompleted,
            ProgressError::NoAnswersProvided => Self::NoAnswersProvided,
            _ => unreachable!("ProgressError variant not handled"),
        }
    }
}
