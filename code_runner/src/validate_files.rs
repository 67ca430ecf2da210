use crate::error::RunnerError;
use std::path::{Path, PathBuf};

/// Validates the student entry script and returns its canonical path together
/// with the directory that acts as its working root.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The script does not exist.
/// - The path exists but is not a regular file.
/// - The script has no parent directory (cannot happen for canonical paths,
///   kept as a guard for odd inputs like `/`).
pub fn validate_entry_script(script: &Path) -> Result<(PathBuf, PathBuf), RunnerError> {
    if !script.exists() {
        return Err(RunnerError::MissingScript(script.to_path_buf()));
    }
    if !script.is_file() {
        return Err(RunnerError::NotAFile(script.to_path_buf()));
    }

    let canonical = script.canonicalize().map_err(RunnerError::Setup)?;
    let work_dir = canonical
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| RunnerError::InvalidWorkDir(canonical.clone()))?;

    Ok((canonical, work_dir))
}

/// Picks the entry script inside a submission directory.
///
/// Preference order: `<student_id>.py`, then the lexicographically smallest
/// `.py` file directly inside the directory. When `location` is already a file
/// it is returned as-is.
///
/// Guessing is a compatibility shim for submissions uploaded without an
/// explicit entry point.
pub fn resolve_entry_script(location: &Path, student_id: &str) -> Option<PathBuf> {
    if location.is_file() {
        return Some(location.to_path_buf());
    }
    if !location.is_dir() {
        return None;
    }

    let named = location.join(format!("{student_id}.py"));
    if named.is_file() {
        return Some(named);
    }

    let mut scripts: Vec<PathBuf> = std::fs::read_dir(location)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("py"))
        .collect();
    scripts.sort();
    scripts.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_script_is_reported() {
        let dir = tempdir().unwrap();
        let err = validate_entry_script(&dir.path().join("nope.py")).unwrap_err();
        assert!(matches!(err, RunnerError::MissingScript(_)));
    }

    #[test]
    fn directory_is_not_a_script() {
        let dir = tempdir().unwrap();
        let err = validate_entry_script(dir.path()).unwrap_err();
        assert!(matches!(err, RunnerError::NotAFile(_)));
    }

    #[test]
    fn work_dir_is_the_script_parent() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("s1.py");
        fs::write(&script, "print('hi')").unwrap();

        let (canonical, work_dir) = validate_entry_script(&script).unwrap();
        assert_eq!(work_dir, dir.path().canonicalize().unwrap());
        assert_eq!(canonical.file_name().unwrap(), "s1.py");
    }

    #[test]
    fn student_named_script_wins() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_helper.py"), "").unwrap();
        fs::write(dir.path().join("2022224110907.py"), "").unwrap();

        let picked = resolve_entry_script(dir.path(), "2022224110907").unwrap();
        assert_eq!(picked.file_name().unwrap(), "2022224110907.py");
    }

    #[test]
    fn falls_back_to_smallest_python_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("zeta.py"), "").unwrap();
        fs::write(dir.path().join("alpha.py"), "").unwrap();
        fs::write(dir.path().join("weights.pth"), "").unwrap();

        let picked = resolve_entry_script(dir.path(), "someone").unwrap();
        assert_eq!(picked.file_name().unwrap(), "alpha.py");
    }

    #[test]
    fn empty_directory_has_no_entry() {
        let dir = tempdir().unwrap();
        assert!(resolve_entry_script(dir.path(), "x").is_none());
        assert!(resolve_entry_script(&dir.path().join("missing"), "x").is_none());
    }
}
