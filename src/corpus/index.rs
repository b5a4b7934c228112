use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::loader::QaPair;
use super::vectorizer::{SparseVector, TfidfVectorizer};
use crate::core::error::Result;
use crate::utils::normalize_text;

/// One indexed corpus entry. Immutable once the index is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub index: usize,
    pub question: String,
    pub answer: String,
    vector: SparseVector,
}

/// One nearest-neighbor result for a query, similarity in [0,1].
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub index: usize,
    pub question: String,
    pub answer: String,
    pub similarity: f32,
}

/// Serialized form of a built index: vectorizer state plus per-record vectors,
/// keyed by a fingerprint of the corpus text. Purely a startup optimization;
/// a stale or unreadable bundle is recomputed with no behavioral difference.
#[derive(Serialize, Deserialize)]
struct VectorBundle {
    fingerprint: String,
    vectorizer: TfidfVectorizer,
    records: Vec<CorpusRecord>,
}

/// Read-only similarity index over the question/answer corpus.
pub struct CorpusIndex {
    vectorizer: TfidfVectorizer,
    records: Vec<CorpusRecord>,
}

impl CorpusIndex {
    /// Build the index in memory: fit the vectorizer on all questions, then
    /// vectorize each question.
    pub fn build(pairs: Vec<QaPair>) -> Self {
        let questions: Vec<String> = pairs.iter().map(|p| p.question.clone()).collect();
        let vectorizer = TfidfVectorizer::fit(&questions);

        let records = pairs
            .into_iter()
            .map(|pair| {
                let vector = vectorizer.transform(&pair.question);
                CorpusRecord {
                    index: pair.index,
                    question: pair.question,
                    answer: pair.answer,
                    vector,
                }
            })
            .collect::<Vec<_>>();

        info!(
            "Corpus index built: {} records, {} features",
            records.len(),
            vectorizer.vocabulary_len()
        );
        Self { vectorizer, records }
    }

    /// Build the index, reusing the on-disk bundle at `cache_path` when it
    /// matches the corpus fingerprint and regeneration is not forced. The
    /// rebuilt bundle is written back after a miss; write failures only warn.
    pub fn build_cached(
        pairs: Vec<QaPair>,
        cache_path: impl AsRef<Path>,
        force_regenerate: bool,
    ) -> Result<Self> {
        let cache_path = cache_path.as_ref();
        let fingerprint = corpus_fingerprint(&pairs);

        if !force_regenerate {
            if let Some(index) = Self::load_bundle(cache_path, &fingerprint) {
                info!("Loaded cached vectors from {}", cache_path.display());
                return Ok(index);
            }
        }

        let index = Self::build(pairs);
        let bundle = VectorBundle {
            fingerprint,
            vectorizer: index.vectorizer.clone(),
            records: index.records.clone(),
        };
        match serde_json::to_vec(&bundle) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(cache_path, bytes) {
                    warn!("Could not write vector cache {}: {}", cache_path.display(), e);
                } else {
                    info!("Vectors cached to {}", cache_path.display());
                }
            }
            Err(e) => warn!("Could not serialize vector cache: {}", e),
        }

        Ok(index)
    }

    fn load_bundle(cache_path: &Path, fingerprint: &str) -> Option<Self> {
        let bytes = std::fs::read(cache_path).ok()?;
        let bundle: VectorBundle = match serde_json::from_slice(&bytes) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Ignoring unreadable vector cache {}: {}", cache_path.display(), e);
                return None;
            }
        };
        if bundle.fingerprint != fingerprint {
            debug!("Vector cache is stale, recomputing");
            return None;
        }
        Some(Self {
            vectorizer: bundle.vectorizer,
            records: bundle.records,
        })
    }

    /// Top-k most similar corpus questions for the query, sorted by descending
    /// similarity; ties break toward the lower record index so results are
    /// fully deterministic. An empty corpus yields an empty result.
    pub fn search(&self, query: &str, k: usize) -> Vec<SimilarityHit> {
        if self.records.is_empty() || k == 0 {
            return Vec::new();
        }

        let query_vector = self.vectorizer.transform(&normalize_text(query));

        let mut hits: Vec<SimilarityHit> = self
            .records
            .iter()
            .map(|record| SimilarityHit {
                index: record.index,
                question: record.question.clone(),
                answer: record.answer.clone(),
                similarity: query_vector.cosine(&record.vector),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.index.cmp(&b.index))
        });
        hits.truncate(k.min(self.records.len()));
        hits
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sha-256 over the normalized corpus rows. Any corpus edit invalidates the
/// cached bundle.
fn corpus_fingerprint(pairs: &[QaPair]) -> String {
    let mut hasher = Sha256::new();
    for pair in pairs {
        hasher.update(pair.question.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(pair.answer.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs() -> Vec<QaPair> {
        [
            ("how do i treat a burn", "cool the burn with running water"),
            ("how do i stop severe bleeding", "apply firm pressure to the wound"),
            ("what to do when someone is choking", "perform abdominal thrusts"),
        ]
        .iter()
        .enumerate()
        .map(|(index, (q, a))| QaPair {
            index,
            question: (*q).to_string(),
            answer: (*a).to_string(),
        })
        .collect()
    }

    #[test]
    fn test_search_ranks_best_match_first() {
        let index = CorpusIndex::build(pairs());
        let hits = index.search("How do I treat a burn?", 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 0);
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[test]
    fn test_search_sorted_non_increasing() {
        let index = CorpusIndex::build(pairs());
        let hits = index.search("bleeding from a cut", 3);
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_ties_break_by_ascending_index() {
        // A query matching nothing scores 0.0 everywhere; ordering must then
        // follow the original record index.
        let index = CorpusIndex::build(pairs());
        let hits = index.search("zzz qqq xxx", 3);
        assert_eq!(
            hits.iter().map(|h| h.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(hits.iter().all(|h| h.similarity == 0.0));
    }

    #[test]
    fn test_empty_corpus_returns_empty() {
        let index = CorpusIndex::build(Vec::new());
        assert!(index.search("anything", 3).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_k_clamped_to_corpus_size() {
        let index = CorpusIndex::build(pairs());
        assert_eq!(index.search("burn", 10).len(), 3);
    }

    #[test]
    fn test_cache_round_trip_preserves_results() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("vectors.json");

        let fresh = CorpusIndex::build_cached(pairs(), &cache, false).unwrap();
        assert!(cache.exists());
        let cached = CorpusIndex::build_cached(pairs(), &cache, false).unwrap();

        let a = fresh.search("treat a burn", 3);
        let b = cached.search("treat a burn", 3);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.index, y.index);
            assert!((x.similarity - y.similarity).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stale_cache_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("vectors.json");
        CorpusIndex::build_cached(pairs(), &cache, false).unwrap();

        let mut changed = pairs();
        changed[0].question = "how do i treat a chemical burn".to_string();
        let index = CorpusIndex::build_cached(changed, &cache, false).unwrap();
        let hits = index.search("chemical burn", 1);
        assert_eq!(hits[0].index, 0);
        assert!(hits[0].similarity > 0.0);
    }

    #[test]
    fn test_corrupt_cache_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("vectors.json");
        std::fs::write(&cache, b"not json").unwrap();
        let index = CorpusIndex::build_cached(pairs(), &cache, false).unwrap();
        assert_eq!(index.len(), 3);
    }
}
