//! Pairwise similarity of submitted model-weight files.
//!
//! [`check`] compares every pair of students' weight files for one experiment
//! with [`compare::compare_bytes`] and reports, per student, the single other
//! student they are most similar to, ranked by similarity. Unreadable files
//! never abort a check; every pair involving them scores 0.

pub mod compare;
pub mod error;
pub mod risk;

pub use compare::{PairScore, compare_bytes};
pub use error::SimilarityError;
pub use risk::RiskLevel;

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use util::execution_config::SimilarityOptions;
use walkdir::WalkDir;

/// One student's weight file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightFile {
    pub student_id: String,
    pub path: PathBuf,
}

impl WeightFile {
    pub fn new(student_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            student_id: student_id.into(),
            path: path.into(),
        }
    }
}

/// A student's highest similarity against any other single student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityRecord {
    pub student_id: String,
    /// `None` when the student was the only one with a weight file.
    pub most_similar_student: Option<String>,
    pub similarity: f64,
    pub risk: RiskLevel,
}

/// Ranks every student in `files` by their maximum pairwise similarity.
///
/// Output is sorted by similarity descending, ties by student id. Each file is
/// read once; files sharing a student id are not compared with each other.
pub fn check(files: &[WeightFile], options: &SimilarityOptions) -> Vec<SimilarityRecord> {
    let contents: Vec<Option<Vec<u8>>> = files
        .iter()
        .map(|f| match fs::read(&f.path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(
                    student = %f.student_id,
                    path = %f.path.display(),
                    error = %e,
                    "unreadable weight file, its pairs score 0"
                );
                None
            }
        })
        .collect();

    let mut best: Vec<Option<(usize, f64)>> = vec![None; files.len()];
    for i in 0..files.len() {
        for j in (i + 1)..files.len() {
            if files[i].student_id == files[j].student_id {
                continue;
            }
            let similarity = match (&contents[i], &contents[j]) {
                (Some(a), Some(b)) => compare_bytes(a, b, options).similarity,
                _ => 0.0,
            };
            tracing::debug!(
                a = %files[i].student_id,
                b = %files[j].student_id,
                similarity,
                "compared pair"
            );
            for (me, other) in [(i, j), (j, i)] {
                if best[me].is_none_or(|(_, s)| similarity > s) {
                    best[me] = Some((other, similarity));
                }
            }
        }
    }

    let mut records: Vec<SimilarityRecord> = files
        .iter()
        .zip(best)
        .map(|(file, best)| {
            let (other, similarity) = match best {
                Some((j, s)) => (Some(files[j].student_id.clone()), round2(s)),
                None => (None, 0.0),
            };
            SimilarityRecord {
                student_id: file.student_id.clone(),
                most_similar_student: other,
                similarity,
                risk: RiskLevel::from_similarity(similarity, &options.thresholds),
            }
        })
        .collect();

    records.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    records
}

/// Picks the weight file for one submission.
///
/// `location` may itself be a weight file. Otherwise the directory is walked and
/// the lexicographically smallest path with the configured extension wins, so
/// the choice does not depend on directory iteration order.
pub fn select_weight_file(
    location: &Path,
    extension: &str,
) -> Result<Option<PathBuf>, SimilarityError> {
    if location.is_file() {
        return Ok(has_extension(location, extension).then(|| location.to_path_buf()));
    }
    if !location.is_dir() {
        return Ok(None);
    }

    let mut best: Option<PathBuf> = None;
    for entry in WalkDir::new(location).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        if best.as_deref().is_none_or(|b| entry.path() < b) {
            best = Some(entry.into_path());
        }
    }
    Ok(best)
}

/// Case-insensitive extension match; a leading dot in `extension` is ignored.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension.trim_start_matches('.')))
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
