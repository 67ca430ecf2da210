//! # Marker Library
//!
//! Grades a student's deep-learning submission by running its entry script and
//! comparing the predictions it writes against the experiment's ground-truth
//! labels.
//!
//! ## Key Concepts
//! - **Evaluator**: Runs one script through the sandboxed [`code_runner::ScriptRunner`]
//!   and turns the run into an [`EvaluationResult`].
//! - **Locate**: Finds `all_preds.csv` near the working directory and the label file
//!   near the experiment.
//! - **Scorer**: Index-wise accuracy, rounded half-up to two decimals.
//!
//! Every failure (missing script, no predictions, missing labels, length mismatch,
//! student exception, timeout) is reported as a zero-score result, never as an
//! error.

pub mod error;
pub mod locate;
pub mod parsers;
pub mod report;
pub mod scorer;
pub mod traits;
pub mod types;

use crate::error::MarkerError;
use crate::locate::{
    LabelLocation, clear_stale_prediction, collect_prediction_file, locate_label_file,
};
use crate::report::EvaluationResult;
use crate::scorer::compute_accuracy;
use crate::types::{LabelSet, PredictionSet};

use code_runner::validate_files::resolve_entry_script;
use code_runner::{RunnerError, ScriptRun, ScriptRunner};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use util::execution_config::ExecutionConfig;

pub use crate::report::EvaluationStatus;

/// Evaluates student entry scripts for one experiment.
///
/// # Fields
/// - `config`: Execution limits and evaluation options for the experiment.
/// - `runner`: Sandbox used to execute each script.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: ExecutionConfig,
    runner: ScriptRunner,
}

impl Evaluator {
    /// Create an evaluator whose runner follows `config.execution`.
    pub fn new(config: ExecutionConfig) -> Self {
        let runner = ScriptRunner::new(
            config.execution.clone(),
            config.evaluation.entry_points.clone(),
        );
        Self { config, runner }
    }

    /// Use an explicit ground-truth file instead of searching for one.
    pub fn with_label_file(mut self, path: PathBuf) -> Self {
        self.config.evaluation.label_file = Some(path);
        self
    }

    /// Replace the script runner, e.g. to pin the interpreter.
    pub fn with_runner(mut self, runner: ScriptRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Evaluate the submission stored at `location` for `student_id`.
    ///
    /// `location` may be the entry script itself or the directory holding it.
    pub async fn evaluate_submission(&self, location: &Path, student_id: &str) -> EvaluationResult {
        match resolve_entry_script(location, student_id) {
            Some(script) => self.evaluate(&script).await,
            None => EvaluationResult::missing_script(location),
        }
    }

    /// Run `script` and score its predictions.
    ///
    /// # Steps
    /// 1. Runs the script in its own directory (entry callable, or top-level code only).
    /// 2. Collects `all_preds.csv`, copying it down from a parent directory if needed.
    ///    A prediction file left in the script directory by an earlier run is removed
    ///    first, and parent-directory files older than this run are ignored.
    /// 3. Locates and parses the label file.
    /// 4. Computes accuracy when both sequences have the same length.
    pub async fn evaluate(&self, script: &Path) -> EvaluationResult {
        let started = SystemTime::now();
        if let Some(dir) = script.parent().filter(|_| script.is_file()) {
            if let Err(e) = clear_stale_prediction(dir, &self.config.evaluation.prediction_file) {
                tracing::error!(script = %script.display(), error = %e, "cannot clear old predictions");
                return EvaluationResult::failure(
                    EvaluationStatus::ExecutionFailed,
                    format!("evaluation failed: {e}"),
                );
            }
        }

        let run = match self.runner.run(script).await {
            Ok(run) => run,
            Err(RunnerError::MissingScript(path) | RunnerError::NotAFile(path)) => {
                tracing::warn!(script = %path.display(), "entry script not found");
                return EvaluationResult::missing_script(&path);
            }
            Err(e) => {
                tracing::error!(script = %script.display(), error = %e, "failed to start student script");
                return EvaluationResult::failure(
                    EvaluationStatus::ExecutionFailed,
                    format!("execution failed: {e}"),
                );
            }
        };

        if !run.succeeded() {
            tracing::warn!(
                script = %run.script.display(),
                outcome = %run.outcome.describe(),
                "student script did not complete"
            );
            return EvaluationResult::from_failed_run(&run);
        }

        let result = match self.score_run(&run, started) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(script = %run.script.display(), error = %e, "scoring failed");
                EvaluationResult::failure(
                    EvaluationStatus::ExecutionFailed,
                    format!("evaluation failed: {e}"),
                )
            }
        };

        tracing::info!(
            script = %run.script.display(),
            status = %result.status,
            score = result.score,
            "evaluation finished"
        );
        result.with_run(&run)
    }

    fn score_run(
        &self,
        run: &ScriptRun,
        started: SystemTime,
    ) -> Result<EvaluationResult, MarkerError> {
        let opts = &self.config.evaluation;

        let Some(pred_path) = collect_prediction_file(
            &run.work_dir,
            &opts.prediction_file,
            opts.prediction_search_depth,
            started,
        )?
        else {
            return Ok(EvaluationResult::missing_predictions(
                run.entry_point.as_deref(),
                &opts.prediction_file,
            ));
        };
        let predictions = PredictionSet::load(&pred_path, opts.prediction_header)?;

        let label_path = match locate_label_file(&run.script, opts)? {
            LabelLocation::Found(path) => path,
            LabelLocation::Missing(tried) => return Ok(EvaluationResult::missing_labels(&tried)),
        };
        let labels = LabelSet::load(&label_path, opts.label_header)?;
        if labels.is_empty() {
            return Ok(EvaluationResult::empty_labels(&label_path));
        }

        Ok(match compute_accuracy(&predictions.predictions, &labels.labels) {
            Ok(accuracy) => EvaluationResult::scored(accuracy),
            Err(mismatch) => EvaluationResult::length_mismatch(mismatch),
        })
    }
}
