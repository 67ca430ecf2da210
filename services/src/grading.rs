//! Grades every submission of an experiment.

use db::models::grade::{self, NewGrade};
use db::models::submission;
use marker::report::EvaluationResult;
use marker::Evaluator;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::PathBuf;
use util::execution_config::ExecutionConfig;
use util::paths;

use crate::error::ServiceError;
use crate::latest_per_student;

/// One graded submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionGrade {
    pub submission_id: i64,
    pub student_id: String,
    pub result: EvaluationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradingReport {
    pub experiment_id: i64,
    pub label_file: PathBuf,
    pub graded: Vec<SubmissionGrade>,
    pub mean_score: f64,
    pub scored: usize,
}

impl GradingReport {
    fn new(experiment_id: i64, label_file: PathBuf, graded: Vec<SubmissionGrade>) -> Self {
        let mean_score = if graded.is_empty() {
            0.0
        } else {
            let total: f64 = graded.iter().map(|g| g.result.score).sum();
            (total / graded.len() as f64 * 100.0).round() / 100.0
        };
        let scored = graded.iter().filter(|g| g.result.is_scored()).count();
        Self {
            experiment_id,
            label_file,
            graded,
            mean_score,
            scored,
        }
    }
}

/// The experiment-wide ground-truth file: the configured `label_file`, or
/// `<experiment>/testdata/all_labels.csv`.
pub fn experiment_label_file(experiment_id: i64, config: &ExecutionConfig) -> PathBuf {
    config.evaluation.label_file.clone().unwrap_or_else(|| {
        marker::locate::label_path_under(&paths::experiment_dir(experiment_id), &config.evaluation)
    })
}

/// Evaluates each student's latest submission in turn and records the grade.
///
/// Fails up front with [`ServiceError::LabelsUnavailable`] when the experiment
/// has no label file at all. Individual evaluation failures are graded 0 and do
/// not stop the batch.
pub async fn run_experiment_evaluation(
    db: &DatabaseConnection,
    config: &ExecutionConfig,
    experiment_id: i64,
    grader_id: i64,
) -> Result<GradingReport, ServiceError> {
    let label_file = experiment_label_file(experiment_id, config);
    if !label_file.is_file() {
        tracing::error!(experiment_id, path = %label_file.display(), "label file missing");
        return Err(ServiceError::LabelsUnavailable {
            experiment_id,
            path: label_file,
        });
    }

    let submissions =
        latest_per_student(submission::Model::find_by_experiment(db, experiment_id).await?);
    tracing::info!(experiment_id, count = submissions.len(), "grading experiment");

    let evaluator = Evaluator::new(config.clone()).with_label_file(label_file.clone());
    let mut graded = Vec::with_capacity(submissions.len());

    for sub in submissions {
        let location = paths::resolve_stored_path(&sub.path);
        let result = evaluator
            .evaluate_submission(&location, &sub.student_id)
            .await;

        grade::Model::record_grade(
            db,
            NewGrade {
                submission_id: sub.id,
                experiment_id,
                student_id: &sub.student_id,
                score: result.score,
                status: result.status.as_str(),
                message: &result.message,
                grader_id,
            },
        )
        .await?;

        tracing::info!(
            experiment_id,
            submission_id = sub.id,
            student = %sub.student_id,
            score = result.score,
            status = %result.status,
            "graded submission"
        );

        graded.push(SubmissionGrade {
            submission_id: sub.id,
            student_id: sub.student_id,
            result,
        });
    }

    Ok(GradingReport::new(experiment_id, label_file, graded))
}
