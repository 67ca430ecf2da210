//! Parsers for the files a student run is graded against.
//!
//! - [`label_parser`]: first-column integer labels from `all_preds.csv` / `all_labels.csv`.

pub mod label_parser;
