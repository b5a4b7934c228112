pub mod index;
pub mod loader;
pub mod vectorizer;

pub use index::{CorpusIndex, CorpusRecord, SimilarityHit};
pub use loader::{QaPair, load_corpus};
pub use vectorizer::{SparseVector, TfidfVectorizer};
