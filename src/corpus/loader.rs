use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::core::error::{QHelperError, Result};
use crate::utils::normalize_text;

/// One raw corpus row. The CSV must carry `question` and `answer` columns;
/// anything else is ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    question: String,
    answer: String,
}

/// A normalized question/answer pair. The index is the zero-based row position
/// at load time and stays stable for the process lifetime.
#[derive(Debug, Clone)]
pub struct QaPair {
    pub index: usize,
    pub question: String,
    pub answer: String,
}

/// Load and normalize the question/answer corpus from a CSV file.
///
/// A missing file, unreadable row, or missing column is fatal: without a corpus
/// the system cannot answer at all.
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<QaPair>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        QHelperError::CorpusLoad(format!("cannot open corpus {}: {e}", path.display()))
    })?;

    let mut pairs = Vec::new();
    for (index, row) in reader.deserialize::<RawRecord>().enumerate() {
        let record = row?;
        pairs.push(QaPair {
            index,
            question: normalize_text(&record.question),
            answer: normalize_text(&record.answer),
        });
    }

    info!("Loaded {} Q&A pairs from {}", pairs.len(), path.display());
    Ok(pairs)
}
