//! Python bootstrap used to load a student script.
//!
//! The driver imports the script under a private module name (so the
//! `if __name__ == "__main__"` block does not fire), calls the first available
//! entry callable, and writes a small JSON status file describing what happened.

use serde::Deserialize;
use std::{fs, io, path::Path};

pub const DRIVER_FILE_NAME: &str = "grader_driver.py";
pub const STATUS_FILE_NAME: &str = "status.json";

const DRIVER_SOURCE: &str = r#"import importlib.util
import json
import os
import sys
import traceback


def main():
    script, status_path = sys.argv[1], sys.argv[2]
    entry_points = sys.argv[3:]
    status = {"entry_point": None, "error": None}

    sys.path.insert(0, os.path.dirname(os.path.abspath(script)))
    try:
        spec = importlib.util.spec_from_file_location("submission", script)
        module = importlib.util.module_from_spec(spec)
        spec.loader.exec_module(module)
        for name in entry_points:
            candidate = getattr(module, name, None)
            if callable(candidate):
                status["entry_point"] = name
                candidate()
                break
    except SystemExit as exc:
        if exc.code not in (None, 0):
            status["error"] = "SystemExit: %s" % (exc.code,)
    except BaseException as exc:
        status["error"] = "".join(traceback.format_exception_only(type(exc), exc)).strip()
        traceback.print_exc()

    sys.stdout.flush()
    sys.stderr.flush()
    with open(status_path, "w") as fh:
        json.dump(status, fh)
    sys.exit(1 if status["error"] else 0)


main()
"#;

/// What the driver reported about the run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DriverStatus {
    /// Callable that was invoked, `None` when only top-level code ran.
    pub entry_point: Option<String>,
    /// One-line description of the exception raised by student code.
    pub error: Option<String>,
}

/// Writes the driver into `dir` and returns its path.
pub fn write_driver(dir: &Path) -> io::Result<std::path::PathBuf> {
    let path = dir.join(DRIVER_FILE_NAME);
    fs::write(&path, DRIVER_SOURCE)?;
    Ok(path)
}

/// Reads the status file. A missing or unparsable file means the driver never
/// finished (killed, crashed interpreter), which is reported as `None`.
pub fn read_status(path: &Path) -> Option<DriverStatus> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}
