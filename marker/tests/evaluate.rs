use marker::{EvaluationStatus, Evaluator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};
use util::execution_config::ExecutionConfig;

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn evaluator(timeout_secs: u64) -> Evaluator {
    let mut config = ExecutionConfig::default_config();
    config.execution.timeout_secs = timeout_secs;
    let runner = code_runner::ScriptRunner::new(
        config.execution.clone(),
        config.evaluation.entry_points.clone(),
    )
    .with_python("python3");
    Evaluator::new(config).with_runner(runner)
}

/// Builds `lab1/testdata/all_labels.csv` and `lab1/testcode/<student>/<student>.py`.
fn lab(labels: Option<&str>, student: &str, script: &str) -> (TempDir, PathBuf) {
    let root = tempdir().unwrap();
    let lab = root.path().join("lab1");
    let student_dir = lab.join("testcode").join(student);
    fs::create_dir_all(&student_dir).unwrap();
    if let Some(labels) = labels {
        fs::create_dir_all(lab.join("testdata")).unwrap();
        fs::write(lab.join("testdata").join("all_labels.csv"), labels).unwrap();
    }
    let path = student_dir.join(format!("{student}.py"));
    fs::write(&path, script).unwrap();
    (root, path)
}

fn writer_script(rows: &[i64]) -> String {
    let body = rows
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join("\\n");
    format!(
        "def evaluate_model():\n    with open('all_preds.csv', 'w') as fh:\n        fh.write('0\\n{body}\\n')\n"
    )
}

#[tokio::test]
async fn three_of_four_scores_seventy_five() {
    if !python_available() {
        eprintln!("python3 not available, skipping");
        return;
    }
    let (_root, script) = lab(Some("0\n1\n0\n0\n"), "u1", &writer_script(&[0, 1, 1, 0]));

    let result = evaluator(30).evaluate(&script).await;
    assert_eq!(result.status, EvaluationStatus::Scored, "{}", result.message);
    assert_eq!(result.score, 75.00);
    assert_eq!(result.correct, Some(3));
    assert_eq!(result.entry_point.as_deref(), Some("evaluate_model"));
}

#[tokio::test]
async fn length_mismatch_scores_zero_with_both_counts() {
    if !python_available() {
        return;
    }
    let labels = "1\n".repeat(10);
    let (_root, script) = lab(Some(&labels), "u2", &writer_script(&[1; 8]));

    let result = evaluator(30).evaluate(&script).await;
    assert_eq!(result.status, EvaluationStatus::LengthMismatch);
    assert_eq!(result.score, 0.0);
    assert!(result.message.contains('8') && result.message.contains("10"));
}

#[tokio::test]
async fn no_callable_and_no_predictions() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(Some("1\n"), "u3", "x = 1\n");

    let result = evaluator(30).evaluate(&script).await;
    assert_eq!(result.status, EvaluationStatus::MissingPredictions);
    assert_eq!(result.score, 0.0);
    assert!(result.message.contains("evaluate_model"));
    assert!(result.message.contains("all_preds.csv"));
}

#[tokio::test]
async fn missing_labels_after_successful_run() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(None, "u4", &writer_script(&[1, 0]));

    let result = evaluator(30).evaluate(&script).await;
    assert_eq!(result.status, EvaluationStatus::MissingLabels);
    assert_eq!(result.score, 0.0);
    assert!(result.message.contains("all_labels.csv"));
}

#[tokio::test]
async fn exception_scores_zero_and_keeps_grader_cwd() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(
        Some("1\n"),
        "u5",
        "def evaluate_model():\n    raise RuntimeError('cuda out of memory')\n",
    );

    let cwd = std::env::current_dir().unwrap();
    let result = evaluator(30).evaluate(&script).await;
    assert_eq!(std::env::current_dir().unwrap(), cwd);

    assert_eq!(result.status, EvaluationStatus::ExecutionFailed);
    assert_eq!(result.score, 0.0);
    assert!(result.message.contains("cuda out of memory"));
    assert!(result.stderr.contains("RuntimeError"));
}

#[tokio::test]
async fn timeout_scores_zero() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(
        Some("1\n"),
        "u6",
        "import time\ndef evaluate_model():\n    time.sleep(60)\n",
    );

    let result = evaluator(1).evaluate(&script).await;
    assert_eq!(result.status, EvaluationStatus::TimedOut);
    assert_eq!(result.score, 0.0);
}

#[tokio::test]
async fn predictions_written_one_level_up_are_collected() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(
        Some("2\n3\n"),
        "u7",
        "def evaluate_model():\n    open('../all_preds.csv', 'w').write('0\\n2\\n3\\n')\n",
    );

    let result = evaluator(30).evaluate(&script).await;
    assert_eq!(result.status, EvaluationStatus::Scored, "{}", result.message);
    assert_eq!(result.score, 100.0);
    assert!(script.parent().unwrap().join("all_preds.csv").exists());
}

#[tokio::test]
async fn missing_script_is_reported_without_running() {
    let dir = tempdir().unwrap();
    let result = evaluator(5).evaluate(&dir.path().join("nope.py")).await;
    assert_eq!(result.status, EvaluationStatus::MissingScript);
    assert_eq!(result.score, 0.0);
}

#[tokio::test]
async fn explicit_label_file_is_used() {
    if !python_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let script = dir.path().join("solo.py");
    fs::write(&script, writer_script(&[5, 5])).unwrap();
    let labels = dir.path().join("gt.csv");
    fs::write(&labels, "5\n6\n").unwrap();

    let result = evaluator(30)
        .with_label_file(labels)
        .evaluate(Path::new(&script))
        .await;
    assert_eq!(result.status, EvaluationStatus::Scored, "{}", result.message);
    assert_eq!(result.score, 50.0);
}

#[tokio::test]
async fn submission_directory_resolves_student_script() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(Some("1\n"), "u8", &writer_script(&[1]));

    let result = evaluator(30)
        .evaluate_submission(script.parent().unwrap(), "u8")
        .await;
    assert_eq!(result.score, 100.0);
}

#[tokio::test]
async fn parent_predictions_from_another_student_are_not_scored() {
    if !python_available() {
        return;
    }
    let (root, writer) = lab(
        Some("2\n3\n"),
        "a",
        "def evaluate_model():\n    open('../all_preds.csv', 'w').write('0\\n2\\n3\\n')\n",
    );
    let first = evaluator(30).evaluate(&writer).await;
    assert_eq!(first.status, EvaluationStatus::Scored, "{}", first.message);

    let idle_dir = root.path().join("lab1").join("testcode").join("b");
    fs::create_dir_all(&idle_dir).unwrap();
    let idle = idle_dir.join("b.py");
    fs::write(&idle, "x = 1\n").unwrap();

    let second = evaluator(30).evaluate(&idle).await;
    assert_eq!(second.status, EvaluationStatus::MissingPredictions);
    assert_eq!(second.score, 0.0);
    assert!(!idle_dir.join("all_preds.csv").exists());
}

#[tokio::test]
async fn predictions_from_an_earlier_evaluation_are_discarded() {
    if !python_available() {
        return;
    }
    let (_root, script) = lab(Some("1\n0\n"), "u9", &writer_script(&[1, 0]));
    let first = evaluator(30).evaluate(&script).await;
    assert_eq!(first.score, 100.0, "{}", first.message);

    fs::write(&script, "x = 1\n").unwrap();
    let second = evaluator(30).evaluate(&script).await;
    assert_eq!(second.status, EvaluationStatus::MissingPredictions);
    assert_eq!(second.score, 0.0);
    assert!(second.entry_point.is_none());
}
