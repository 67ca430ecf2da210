//! Weight-file similarity checks across an experiment's students.

use db::models::similarity_record::{self, NewSimilarityRecord, Risk};
use db::models::submission;
use sea_orm::DatabaseConnection;
use similarity::{RiskLevel, SimilarityRecord, WeightFile, has_extension, select_weight_file};
use std::path::Path;
use util::execution_config::ExecutionConfig;
use util::paths;

use crate::error::ServiceError;
use crate::latest_per_student;

fn stored_risk(level: RiskLevel) -> Risk {
    match level {
        RiskLevel::Low => Risk::Low,
        RiskLevel::Medium => Risk::Medium,
        RiskLevel::High => Risk::High,
        RiskLevel::Critical => Risk::Critical,
    }
}

/// Picks one weight file per student from their latest submission. Students
/// without one, or whose directory cannot be scanned, are skipped.
pub fn collect_weight_files(submissions: &[submission::Model], extension: &str) -> Vec<WeightFile> {
    let mut files = Vec::new();
    for sub in submissions {
        let location = paths::resolve_stored_path(&sub.path);
        // A stored script path means "look in the script's directory".
        let dir = if location.is_file() && !has_extension(&location, extension) {
            location.parent().map(Path::to_path_buf).unwrap_or(location)
        } else {
            location
        };

        match select_weight_file(&dir, extension) {
            Ok(Some(path)) => files.push(WeightFile::new(sub.student_id.clone(), path)),
            Err(e) => {
                tracing::warn!(
                    student = %sub.student_id,
                    dir = %dir.display(),
                    error = %e,
                    "failed to scan submission for weights, skipping"
                );
            }
            Ok(None) => {
                tracing::warn!(
                    student = %sub.student_id,
                    dir = %dir.display(),
                    extension,
                    "no weight file found, skipping"
                );
            }
        }
    }
    files
}

/// Compares all students' weight files, stores the ranking as a new run and
/// returns it.
pub async fn run_similarity_check(
    db: &DatabaseConnection,
    config: &ExecutionConfig,
    experiment_id: i64,
) -> Result<Vec<SimilarityRecord>, ServiceError> {
    let submissions =
        latest_per_student(submission::Model::find_by_experiment(db, experiment_id).await?);
    let files = collect_weight_files(&submissions, &config.similarity.weight_extension);
    tracing::info!(
        experiment_id,
        students = files.len(),
        "running similarity check"
    );

    let options = config.similarity.clone();
    let records = tokio::task::spawn_blocking(move || similarity::check(&files, &options)).await?;

    let rows = records
        .iter()
        .map(|r| NewSimilarityRecord {
            student_id: r.student_id.clone(),
            matched_student_id: r.most_similar_student.clone(),
            similarity: r.similarity,
            risk: stored_risk(r.risk),
        })
        .collect();
    similarity_record::Model::insert_run(db, experiment_id, rows).await?;

    let flagged = records
        .iter()
        .filter(|r| r.risk >= RiskLevel::High)
        .count();
    tracing::info!(experiment_id, flagged, "similarity check finished");

    Ok(records)
}
