//! Marker Error Types
//!
//! [`MarkerError`] covers everything that can go wrong between a finished
//! student run and a computed score: unreadable CSV files, malformed label
//! cells and filesystem problems while collecting the prediction file.
//!
//! None of these escape [`crate::Evaluator::evaluate`]; they are folded into a
//! zero-score [`crate::report::EvaluationResult`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkerError {
    /// I/O error (file not found, unreadable, copy failed).
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file.
    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A data cell is not an integer class label.
    #[error("{path}: row {row} has non-integer label {value:?}")]
    InvalidLabel {
        path: PathBuf,
        row: usize,
        value: String,
    },

    /// An experiment-id pattern in the configuration does not compile.
    #[error("invalid experiment directory pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The sandbox could not start the student script.
    #[error(transparent)]
    Runner(#[from] code_runner::RunnerError),
}
