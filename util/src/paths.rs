use crate::config;
use std::path::PathBuf;

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let p = PathBuf::from(config::storage_root());
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

// ─── Experiment layout ──────────────────────────────
//
// {STORAGE_ROOT}/lab{experiment_id}/
//     config/*.json
//     testdata/all_labels.csv
//     testcode/{student_id}/{student_id}.py

/// Directory name of an experiment, e.g. `lab7`.
pub fn experiment_dir_name(experiment_id: i64) -> String {
    format!("lab{experiment_id}")
}

pub fn experiment_dir(experiment_id: i64) -> PathBuf {
    storage_root().join(experiment_dir_name(experiment_id))
}

pub fn config_dir(experiment_id: i64) -> PathBuf {
    experiment_dir(experiment_id).join("config")
}

pub fn testdata_dir(experiment_id: i64) -> PathBuf {
    experiment_dir(experiment_id).join("testdata")
}

pub fn label_file_path(experiment_id: i64) -> PathBuf {
    testdata_dir(experiment_id).join("all_labels.csv")
}

pub fn submissions_dir(experiment_id: i64) -> PathBuf {
    experiment_dir(experiment_id).join("testcode")
}

pub fn student_submission_dir(experiment_id: i64, student_id: &str) -> PathBuf {
    submissions_dir(experiment_id).join(student_id)
}

/// Resolve a stored submission path: absolute paths are kept, relative ones
/// are taken from the storage root.
pub fn resolve_stored_path(stored: &str) -> PathBuf {
    let p = PathBuf::from(stored);
    if p.is_absolute() { p } else { storage_root().join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_test_storage_root;
    use serial_test::serial;

    #[test]
    #[serial]
    fn experiment_layout_matches_lab_convention() {
        let tmp = setup_test_storage_root();
        let root = tmp.path().canonicalize().unwrap();

        assert_eq!(experiment_dir(7), root.join("lab7"));
        assert_eq!(
            label_file_path(7),
            root.join("lab7").join("testdata").join("all_labels.csv")
        );
        assert_eq!(
            student_submission_dir(7, "2022224110907"),
            root.join("lab7").join("testcode").join("2022224110907")
        );
    }

    #[test]
    #[serial]
    fn relative_stored_paths_are_rooted_at_storage() {
        let tmp = setup_test_storage_root();
        let root = tmp.path().canonicalize().unwrap();

        assert_eq!(
            resolve_stored_path("lab8/testcode/s1"),
            root.join("lab8/testcode/s1")
        );
        assert_eq!(resolve_stored_path("/abs/s1"), PathBuf::from("/abs/s1"));
    }
}
