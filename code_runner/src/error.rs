use std::path::PathBuf;
use thiserror::Error;

/// Failures that prevent a student script from being run at all.
///
/// Problems *inside* the student's code (exceptions, non-zero exit, timeouts)
/// are not errors here; they are reported through [`crate::ScriptRun`].
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("entry script not found: {0}")]
    MissingScript(PathBuf),

    #[error("entry script is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("working directory not usable: {0}")]
    InvalidWorkDir(PathBuf),

    #[error("failed to prepare sandbox: {0}")]
    Setup(#[source] std::io::Error),

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for student process: {0}")]
    Wait(#[source] std::io::Error),
}
