use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimilarityError {
    #[error("failed to scan submission directory: {0}")]
    Walk(#[from] walkdir::Error),
}
