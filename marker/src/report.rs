//! # Report Module
//!
//! The [`EvaluationResult`] handed back for every evaluation, successful or not.
//! Failures never surface as errors to the caller; they become a zero score
//! with a human-readable message and a machine-readable [`EvaluationStatus`].

use chrono::Utc;
use code_runner::{RunOutcome, ScriptRun};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::scorer::{Accuracy, LengthMismatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Scored,
    MissingScript,
    MissingPredictions,
    MissingLabels,
    EmptyLabels,
    LengthMismatch,
    ExecutionFailed,
    TimedOut,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Scored => "scored",
            EvaluationStatus::MissingScript => "missing_script",
            EvaluationStatus::MissingPredictions => "missing_predictions",
            EvaluationStatus::MissingLabels => "missing_labels",
            EvaluationStatus::EmptyLabels => "empty_labels",
            EvaluationStatus::LengthMismatch => "length_mismatch",
            EvaluationStatus::ExecutionFailed => "execution_failed",
            EvaluationStatus::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one student script.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub status: EvaluationStatus,
    /// Accuracy percentage in `[0, 100]`; 0 for every failure.
    pub score: f64,
    pub message: String,
    pub correct: Option<usize>,
    pub prediction_count: Option<usize>,
    pub label_count: Option<usize>,
    pub entry_point: Option<String>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed_ms: Option<u128>,
    pub evaluated_at: String,
}

impl EvaluationResult {
    /// A zero-score result.
    pub fn failure(status: EvaluationStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            score: 0.0,
            message: message.into(),
            correct: None,
            prediction_count: None,
            label_count: None,
            entry_point: None,
            stdout: String::new(),
            stderr: String::new(),
            elapsed_ms: None,
            evaluated_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn scored(accuracy: Accuracy) -> Self {
        let mut result = Self::failure(
            EvaluationStatus::Scored,
            format!(
                "accuracy {:.2}% ({}/{} correct)",
                accuracy.percentage, accuracy.correct, accuracy.total
            ),
        );
        result.score = accuracy.percentage;
        result.correct = Some(accuracy.correct);
        result.prediction_count = Some(accuracy.total);
        result.label_count = Some(accuracy.total);
        result
    }

    pub fn missing_script(path: &Path) -> Self {
        Self::failure(
            EvaluationStatus::MissingScript,
            format!("entry script not found: {}", path.display()),
        )
    }

    pub fn missing_predictions(entry_point: Option<&str>, file_name: &str) -> Self {
        let message = match entry_point {
            None => format!("no evaluate_model function and no {file_name} prediction file found"),
            Some(name) => format!("`{name}` ran but no {file_name} prediction file was found"),
        };
        Self::failure(EvaluationStatus::MissingPredictions, message)
    }

    pub fn missing_labels(tried: &[PathBuf]) -> Self {
        let tried = tried
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::failure(
            EvaluationStatus::MissingLabels,
            format!("label file not found (tried: {tried})"),
        )
    }

    pub fn empty_labels(path: &Path) -> Self {
        Self::failure(
            EvaluationStatus::EmptyLabels,
            format!("label file {} contains no labels", path.display()),
        )
    }

    pub fn length_mismatch(mismatch: LengthMismatch) -> Self {
        let mut result = Self::failure(
            EvaluationStatus::LengthMismatch,
            format!(
                "prediction count ({}) does not match label count ({})",
                mismatch.predictions, mismatch.labels
            ),
        );
        result.prediction_count = Some(mismatch.predictions);
        result.label_count = Some(mismatch.labels);
        result
    }

    /// Failure derived from a run that did not complete.
    pub fn from_failed_run(run: &ScriptRun) -> Self {
        let status = match run.outcome {
            RunOutcome::TimedOut(_) => EvaluationStatus::TimedOut,
            _ => EvaluationStatus::ExecutionFailed,
        };
        Self::failure(status, run.outcome.describe()).with_run(run)
    }

    /// Attaches the captured output of `run`.
    pub fn with_run(mut self, run: &ScriptRun) -> Self {
        self.stdout = run.stdout.clone();
        self.stderr = run.stderr.clone();
        self.entry_point = run.entry_point.clone();
        self.elapsed_ms = Some(run.elapsed_ms);
        self
    }

    pub fn is_scored(&self) -> bool {
        self.status == EvaluationStatus::Scored
    }
}
