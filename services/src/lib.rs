//! Batch operations over an experiment's submissions: grading every submission
//! and checking weight-file similarity across students.

pub mod error;
pub mod grading;
pub mod plagiarism;

pub use error::ServiceError;

use db::models::submission;
use std::collections::HashSet;
use util::execution_config::ExecutionConfig;

/// Loads the experiment's execution config, falling back to defaults.
pub fn load_config(experiment_id: i64) -> Result<ExecutionConfig, ServiceError> {
    ExecutionConfig::load_or_default(experiment_id)
        .map_err(|reason| ServiceError::Config { experiment_id, reason })
}

/// Keeps the first submission seen per student. With input ordered most recent
/// first, that is each student's latest submission.
pub(crate) fn latest_per_student(submissions: Vec<submission::Model>) -> Vec<submission::Model> {
    let mut seen = HashSet::new();
    submissions
        .into_iter()
        .filter(|s| seen.insert(s.student_id.clone()))
        .collect()
}
