use thiserror::Error;

/// Crate-wide error type. Only corpus loading is fatal.
///
/// Generation backend failures never appear here: they are normalized to an
/// absent result at the [`crate::llm::GenerationBackend`] boundary so the
/// pipeline can fall back to retrieval, and a stale or unreadable vector cache
/// is recomputed rather than surfaced.
#[derive(Error, Debug)]
pub enum QHelperError {
    #[error("Corpus load error: {0}")]
    CorpusLoad(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, QHelperError>;
