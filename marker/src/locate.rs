//! Finding the prediction and label files for a finished run.
//!
//! Student code is expected to leave `all_preds.csv` in its working directory,
//! but older submissions write it relative to wherever they think they are. The
//! first match in the working directory or its ancestors is copied back into the
//! working directory so the submission folder always holds the file that was
//! graded. Ancestor directories are shared between students, so a file there
//! only counts if it was written after the run started.
//!
//! The label file is looked up next to the experiment, either two directories
//! above the script (`lab3/testcode/<student>/<student>.py`) or under the nearest
//! path segment that looks like an experiment directory.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use util::execution_config::EvaluationOptions;

use crate::error::MarkerError;

/// Result of a label file lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelLocation {
    Found(PathBuf),
    /// Every candidate that was checked, in lookup order.
    Missing(Vec<PathBuf>),
}

/// Removes a prediction file left in `work_dir` by an earlier evaluation.
pub fn clear_stale_prediction(work_dir: &Path, file_name: &str) -> Result<(), MarkerError> {
    let target = work_dir.join(file_name);
    match fs::remove_file(&target) {
        Ok(()) => {
            tracing::debug!(path = %target.display(), "removed stale prediction file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(MarkerError::Io {
            path: target,
            source,
        }),
    }
}

/// Searches `work_dir` and then up to `depth` parent directories for `file_name`.
///
/// A match outside `work_dir` is only accepted when it was modified at or after
/// `since`; it is copied into `work_dir` and the copy's path returned.
pub fn collect_prediction_file(
    work_dir: &Path,
    file_name: &str,
    depth: usize,
    since: SystemTime,
) -> Result<Option<PathBuf>, MarkerError> {
    let target = work_dir.join(file_name);
    if target.is_file() {
        return Ok(Some(target));
    }

    for dir in work_dir.ancestors().skip(1).take(depth) {
        let candidate = dir.join(file_name);
        if !candidate.is_file() {
            continue;
        }
        if !modified_since(&candidate, since) {
            tracing::debug!(path = %candidate.display(), "ignoring prediction file from an earlier run");
            continue;
        }

        fs::copy(&candidate, &target).map_err(|source| MarkerError::Io {
            path: target.clone(),
            source,
        })?;
        tracing::info!(
            from = %candidate.display(),
            to = %target.display(),
            "copied prediction file into working directory"
        );
        return Ok(Some(target));
    }

    Ok(None)
}

fn modified_since(path: &Path, since: SystemTime) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .is_ok_and(|modified| modified >= since)
}

/// Resolves the ground-truth label file for `script`.
///
/// Lookup order: the explicit `label_file` option, the conventional location two
/// directories above the script, then `<experiment root>/testdata/` where the
/// experiment root is the deepest path segment matching one of the configured
/// experiment directory patterns.
pub fn locate_label_file(
    script: &Path,
    options: &EvaluationOptions,
) -> Result<LabelLocation, MarkerError> {
    if let Some(explicit) = &options.label_file {
        return Ok(if explicit.is_file() {
            LabelLocation::Found(explicit.clone())
        } else {
            LabelLocation::Missing(vec![explicit.clone()])
        });
    }

    let mut tried = Vec::new();
    let script_dir = script.parent().unwrap_or(Path::new("."));

    if let Some(base) = script_dir.ancestors().nth(2) {
        let candidate = label_path_under(base, options);
        if candidate.is_file() {
            return Ok(LabelLocation::Found(candidate));
        }
        tried.push(candidate);
    }

    if let Some(root) = experiment_root(script_dir, &options.experiment_dir_patterns)? {
        let candidate = label_path_under(&root, options);
        if candidate.is_file() {
            return Ok(LabelLocation::Found(candidate));
        }
        if !tried.contains(&candidate) {
            tried.push(candidate);
        }
    }

    Ok(LabelLocation::Missing(tried))
}

/// `<base>/<testdata_dir>/<label_file_name>`.
pub fn label_path_under(base: &Path, options: &EvaluationOptions) -> PathBuf {
    base.join(&options.testdata_dir)
        .join(&options.label_file_name)
}

/// Returns the prefix of `path` ending at the deepest segment that matches any
/// of `patterns`.
pub fn experiment_root(path: &Path, patterns: &[String]) -> Result<Option<PathBuf>, MarkerError> {
    let compiled = patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|source| MarkerError::Pattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let root = path.ancestors().find(|dir| {
        dir.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| compiled.iter().any(|re| re.is_match(name)))
    });

    Ok(root.map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::tempdir;

    fn options() -> EvaluationOptions {
        EvaluationOptions::default()
    }

    #[test]
    fn prediction_in_work_dir_is_used_directly() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("all_preds.csv"), "1\n").unwrap();

        let found = collect_prediction_file(dir.path(), "all_preds.csv", 2, UNIX_EPOCH).unwrap();
        assert_eq!(found, Some(dir.path().join("all_preds.csv")));
    }

    #[test]
    fn prediction_two_levels_up_is_copied_down() {
        let root = tempdir().unwrap();
        let work = root.path().join("a").join("b");
        fs::create_dir_all(&work).unwrap();
        fs::write(root.path().join("all_preds.csv"), "label\n3\n").unwrap();

        let found = collect_prediction_file(&work, "all_preds.csv", 2, UNIX_EPOCH).unwrap();
        assert_eq!(found, Some(work.join("all_preds.csv")));
        assert_eq!(fs::read_to_string(work.join("all_preds.csv")).unwrap(), "label\n3\n");
    }

    #[test]
    fn nearest_prediction_wins() {
        let root = tempdir().unwrap();
        let work = root.path().join("a").join("b");
        fs::create_dir_all(&work).unwrap();
        fs::write(root.path().join("all_preds.csv"), "far\n").unwrap();
        fs::write(root.path().join("a").join("all_preds.csv"), "near\n").unwrap();

        collect_prediction_file(&work, "all_preds.csv", 2, UNIX_EPOCH).unwrap();
        assert_eq!(fs::read_to_string(work.join("all_preds.csv")).unwrap(), "near\n");
    }

    #[test]
    fn prediction_beyond_depth_is_ignored() {
        let root = tempdir().unwrap();
        let work = root.path().join("a").join("b").join("c");
        fs::create_dir_all(&work).unwrap();
        fs::write(root.path().join("all_preds.csv"), "1\n").unwrap();

        assert_eq!(
            collect_prediction_file(&work, "all_preds.csv", 2, UNIX_EPOCH).unwrap(),
            None
        );
    }

    #[test]
    fn prediction_older_than_run_is_not_collected() {
        let root = tempdir().unwrap();
        let work = root.path().join("u2");
        fs::create_dir_all(&work).unwrap();
        fs::write(root.path().join("all_preds.csv"), "1\n").unwrap();

        let started = SystemTime::now() + Duration::from_secs(60);
        assert_eq!(
            collect_prediction_file(&work, "all_preds.csv", 2, started).unwrap(),
            None
        );
        assert!(!work.join("all_preds.csv").exists());
    }

    #[test]
    fn clearing_removes_only_the_prediction_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("all_preds.csv"), "1\n").unwrap();
        fs::write(dir.path().join("model.pth"), "w").unwrap();

        clear_stale_prediction(dir.path(), "all_preds.csv").unwrap();
        assert!(!dir.path().join("all_preds.csv").exists());
        assert!(dir.path().join("model.pth").exists());

        clear_stale_prediction(dir.path(), "all_preds.csv").unwrap();
    }

    #[test]
    fn labels_two_levels_above_script() {
        let root = tempdir().unwrap();
        let lab = root.path().join("lab3");
        let student = lab.join("testcode").join("u1");
        fs::create_dir_all(&student).unwrap();
        fs::create_dir_all(lab.join("testdata")).unwrap();
        fs::write(lab.join("testdata/all_labels.csv"), "0\n").unwrap();

        let loc = locate_label_file(&student.join("u1.py"), &options()).unwrap();
        assert_eq!(loc, LabelLocation::Found(lab.join("testdata/all_labels.csv")));
    }

    #[test]
    fn labels_found_through_experiment_segment() {
        let root = tempdir().unwrap();
        let lab = root.path().join("lab12");
        let deep = lab.join("testcode").join("group").join("u1");
        fs::create_dir_all(&deep).unwrap();
        fs::create_dir_all(lab.join("testdata")).unwrap();
        fs::write(lab.join("testdata/all_labels.csv"), "0\n").unwrap();

        let loc = locate_label_file(&deep.join("u1.py"), &options()).unwrap();
        assert_eq!(loc, LabelLocation::Found(lab.join("testdata/all_labels.csv")));
    }

    #[test]
    fn missing_labels_lists_candidates() {
        let root = tempdir().unwrap();
        let student = root.path().join("lab1").join("testcode").join("u1");
        fs::create_dir_all(&student).unwrap();

        match locate_label_file(&student.join("u1.py"), &options()).unwrap() {
            LabelLocation::Missing(tried) => {
                assert_eq!(tried, vec![root.path().join("lab1/testdata/all_labels.csv")]);
            }
            other => panic!("expected Missing, got {other:?}"),
        }
    }

    #[test]
    fn explicit_label_file_short_circuits() {
        let dir = tempdir().unwrap();
        let explicit = dir.path().join("gt.csv");
        let mut opts = options();
        opts.label_file = Some(explicit.clone());

        assert_eq!(
            locate_label_file(&dir.path().join("s.py"), &opts).unwrap(),
            LabelLocation::Missing(vec![explicit.clone()])
        );

        fs::write(&explicit, "1\n").unwrap();
        assert_eq!(
            locate_label_file(&dir.path().join("s.py"), &opts).unwrap(),
            LabelLocation::Found(explicit)
        );
    }

    #[test]
    fn deepest_experiment_segment_is_the_root() {
        let root = experiment_root(
            Path::new("/srv/lab1/archive/experiment_7/testcode/u1"),
            &options().experiment_dir_patterns,
        )
        .unwrap();
        assert_eq!(root, Some(PathBuf::from("/srv/lab1/archive/experiment_7")));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = experiment_root(Path::new("/tmp"), &["(".to_string()]).unwrap_err();
        assert!(matches!(err, MarkerError::Pattern { .. }));
    }
}
