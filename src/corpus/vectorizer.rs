use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Vocabulary cap. Terms beyond this are dropped by corpus frequency.
pub const MAX_FEATURES: usize = 5000;

lazy_static! {
    /// English stop words excluded from the term space.
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing",
        "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
        "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in",
        "into", "is", "it", "its", "itself", "just", "me", "more", "most", "my", "myself",
        "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
        "our", "ours", "out", "over", "own", "same", "she", "should", "so", "some",
        "such", "than", "that", "the", "their", "theirs", "them", "then", "there",
        "these", "they", "this", "those", "through", "to", "too", "under", "until",
        "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
        "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    ]
    .into_iter()
    .collect();
}

/// L2-normalized sparse vector: `(term id, weight)` pairs sorted by term id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector(pub Vec<(u32, f32)>);

impl SparseVector {
    /// Dot product of two sorted sparse vectors. Since both sides are
    /// l2-normalized this is their cosine similarity.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        let mut dot = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.0.len() && j < other.0.len() {
            let (id_a, w_a) = self.0[i];
            let (id_b, w_b) = other.0[j];
            match id_a.cmp(&id_b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += w_a * w_b;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// TF-IDF vectorizer over unigrams and bigrams.
///
/// Fitting is fully deterministic: feature selection orders terms by descending
/// corpus count with alphabetical tie-breaking, and term ids follow alphabetical
/// vocabulary order. Idf uses the smoothed form `ln((1+n)/(1+df)) + 1`; document
/// vectors are l2-normalized so cosine similarity reduces to a dot product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Split already-normalized text into kept tokens: alphanumeric runs of at
    /// least two characters that are not stop words.
    fn tokenize(text: &str) -> Vec<&str> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() >= 2 && !STOP_WORDS.contains(t))
            .collect()
    }

    /// Unigrams plus bigrams of consecutive kept tokens.
    fn terms(text: &str) -> Vec<String> {
        let tokens = Self::tokenize(text);
        let mut terms: Vec<String> = tokens.iter().map(|t| (*t).to_string()).collect();
        for pair in tokens.windows(2) {
            terms.push(format!("{} {}", pair[0], pair[1]));
        }
        terms
    }

    /// Fit the vocabulary and idf weights on the corpus documents.
    pub fn fit(documents: &[String]) -> Self {
        let n_docs = documents.len();
        let mut corpus_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = Self::terms(doc);
            let mut seen: HashSet<&String> = HashSet::new();
            for term in &terms {
                *corpus_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        // Cap the feature space: most frequent terms first, alphabetical on ties.
        let mut ranked: Vec<(&String, &usize)> = corpus_counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(MAX_FEATURES);

        let mut selected: Vec<String> = ranked.into_iter().map(|(t, _)| t.clone()).collect();
        selected.sort();

        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Vec::with_capacity(selected.len());
        for (id, term) in selected.into_iter().enumerate() {
            let df = doc_freq.get(&term).copied().unwrap_or(0);
            idf.push((((1 + n_docs) as f32) / ((1 + df) as f32)).ln() + 1.0);
            vocabulary.insert(term, id as u32);
        }

        Self { vocabulary, idf }
    }

    /// Vectorize one document with the fitted vocabulary. Terms outside the
    /// vocabulary are ignored; a document with no known terms yields an empty
    /// vector (cosine 0 against everything).
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for term in Self::terms(text) {
            if let Some(&id) = self.vocabulary.get(&term) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(u32, f32)> = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id as usize]))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        SparseVector(entries)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}
