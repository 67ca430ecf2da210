use sea_orm::DbErr;
use std::path::PathBuf;
use thiserror::Error;

/// Request-level failures of a grading or similarity batch.
///
/// Per-student problems never show up here; they are recorded as zero scores
/// or zero similarities and the batch carries on.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no usable label file for experiment {experiment_id}: {path} is missing")]
    LabelsUnavailable { experiment_id: i64, path: PathBuf },

    #[error("invalid configuration for experiment {experiment_id}: {reason}")]
    Config { experiment_id: i64, reason: String },

    #[error("database error: {0}")]
    Db(#[from] DbErr),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
