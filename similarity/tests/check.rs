use similarity::{RiskLevel, WeightFile, check, has_extension, select_weight_file};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use util::execution_config::SimilarityOptions;

/// Deterministic filler that differs block-by-block between seeds.
fn weights(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed.wrapping_mul(101)))
        .collect()
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn copied_weights_are_flagged_critical_and_ranked_first() {
    let dir = tempdir().unwrap();
    let original = weights(32 * 1024, 1);
    let files = vec![
        WeightFile::new("alice", write(dir.path(), "a.pth", &original)),
        WeightFile::new("bob", write(dir.path(), "b.pth", &original)),
        WeightFile::new("carol", write(dir.path(), "c.pth", &weights(32 * 1024, 7))),
    ];

    let records = check(&files, &SimilarityOptions::default());
    assert_eq!(records.len(), 3);

    assert_eq!(records[0].student_id, "alice");
    assert_eq!(records[0].most_similar_student.as_deref(), Some("bob"));
    assert_eq!(records[0].similarity, 100.0);
    assert_eq!(records[0].risk, RiskLevel::Critical);

    assert_eq!(records[1].student_id, "bob");
    assert_eq!(records[1].most_similar_student.as_deref(), Some("alice"));

    assert_eq!(records[2].student_id, "carol");
    assert_eq!(records[2].similarity, 50.0);
    assert_eq!(records[2].risk, RiskLevel::Low);
}

#[test]
fn size_gap_caps_base_score() {
    let dir = tempdir().unwrap();
    let files = vec![
        WeightFile::new("s1", write(dir.path(), "1.pth", &vec![0u8; 10_000])),
        WeightFile::new("s2", write(dir.path(), "2.pth", &vec![1u8; 20_000])),
    ];

    let records = check(&files, &SimilarityOptions::default());
    assert!(records.iter().all(|r| r.similarity == 30.0));
}

#[test]
fn unreadable_file_scores_zero_without_aborting() {
    let dir = tempdir().unwrap();
    let shared = weights(16 * 1024, 3);
    let files = vec![
        WeightFile::new("ok1", write(dir.path(), "1.pth", &shared)),
        WeightFile::new("ok2", write(dir.path(), "2.pth", &shared)),
        WeightFile::new("gone", dir.path().join("missing.pth")),
    ];

    let records = check(&files, &SimilarityOptions::default());
    let gone = records.iter().find(|r| r.student_id == "gone").unwrap();
    assert_eq!(gone.similarity, 0.0);
    assert_eq!(gone.risk, RiskLevel::Low);
    assert_eq!(records[0].similarity, 100.0);
}

#[test]
fn single_student_has_no_match() {
    let dir = tempdir().unwrap();
    let files = vec![WeightFile::new("solo", write(dir.path(), "w.pth", b"abc"))];
    let records = check(&files, &SimilarityOptions::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].most_similar_student, None);
    assert_eq!(records[0].similarity, 0.0);
}

#[test]
fn weight_file_selection_is_lexicographic() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("checkpoints")).unwrap();
    write(dir.path(), "model_final.pth", b"x");
    write(dir.path(), "best.PTH", b"x");
    write(&dir.path().join("checkpoints"), "epoch1.pth", b"x");
    write(dir.path(), "alpha.txt", b"x");

    let picked = select_weight_file(dir.path(), "pth").unwrap();
    assert_eq!(picked, Some(dir.path().join("best.PTH")));
}

#[test]
fn directory_without_weights_selects_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "model.py", b"print()");
    assert_eq!(select_weight_file(dir.path(), "pth").unwrap(), None);
    assert_eq!(
        select_weight_file(&dir.path().join("absent"), "pth").unwrap(),
        None
    );
}

#[test]
fn extension_may_be_configured_with_a_leading_dot() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "model.PTH", b"x");
    assert!(has_extension(&path, "pth"));
    assert!(has_extension(&path, ".pth"));
    assert!(!has_extension(&path, "pt"));
    assert_eq!(select_weight_file(dir.path(), ".pth").unwrap(), Some(path));
}
