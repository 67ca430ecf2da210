//! # Types Module
//!
//! The two ordered label sequences an evaluation compares. Both are loaded with
//! the first-column parser; ordering is significant and index `i` of the
//! predictions is compared with index `i` of the labels.

use std::path::{Path, PathBuf};
use util::execution_config::HeaderMode;

use crate::error::MarkerError;
use crate::parsers::label_parser::FirstColumnParser;
use crate::traits::parser::Parser;

/// Ground-truth labels for one experiment's test set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    pub source: PathBuf,
    pub labels: Vec<i64>,
}

impl LabelSet {
    pub fn load(path: &Path, header: HeaderMode) -> Result<Self, MarkerError> {
        Ok(Self {
            source: path.to_path_buf(),
            labels: FirstColumnParser { header }.parse(path)?,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Labels predicted by the student's code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionSet {
    pub source: PathBuf,
    pub predictions: Vec<i64>,
}

impl PredictionSet {
    pub fn load(path: &Path, header: HeaderMode) -> Result<Self, MarkerError> {
        Ok(Self {
            source: path.to_path_buf(),
            predictions: FirstColumnParser { header }.parse(path)?,
        })
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}
