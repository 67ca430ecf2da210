//! First-column label parser.
//!
//! Both the ground-truth file and the student's prediction file are read the
//! same way: every row contributes its first cell, in file order. Extra columns
//! are ignored. How the first row is treated depends on the [`HeaderMode`];
//! past the header, a non-integer cell is an error.

use std::path::Path;
use util::execution_config::HeaderMode;

use crate::error::MarkerError;
use crate::traits::parser::Parser;

pub struct FirstColumnParser {
    pub header: HeaderMode,
}

impl<'a> Parser<&'a Path, Vec<i64>> for FirstColumnParser {
    fn parse(&self, path: &'a Path) -> Result<Vec<i64>, MarkerError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| MarkerError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        let mut labels = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|source| MarkerError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

            let Some(cell) = record.get(0) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }

            if row == 0 && self.header == HeaderMode::Present {
                continue;
            }

            match parse_label(cell) {
                Some(label) => labels.push(label),
                None if row == 0 && self.header == HeaderMode::Auto => {
                    tracing::trace!(path = %path.display(), header = cell, "skipping header row");
                }
                None => {
                    return Err(MarkerError::InvalidLabel {
                        path: path.to_path_buf(),
                        row: row + 1,
                        value: cell.to_string(),
                    });
                }
            }
        }

        Ok(labels)
    }
}

/// Accepts integers, and floats with no fractional part (`3.0`), which is how
/// some numeric writers emit class indices.
pub fn parse_label(cell: &str) -> Option<i64> {
    if let Ok(v) = cell.parse::<i64>() {
        return Some(v);
    }
    let f = cell.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
