#![forbid(unsafe_code)]

pub mod connectivity;
pub mod error;
pub mod progress_service;

pub use revise_core::Clock;

pub use connectivity::{ConnectivityProbe, FixedProbe, TcpProbe};
pub use error::ValidationError;
pub use progress_service::{
    BaselineOutcome, DashboardView, Explanation, PlanEntry, ProgressService, QuizFeedback,
    StudentInfo, TopicStatus,
};
