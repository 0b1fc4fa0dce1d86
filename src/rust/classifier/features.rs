use std::collections::{BTreeMap, HashMap, HashSet};

use ndarray::Array1;
use rayon::prelude::*;

/// Splits normalized text into tokens on whitespace.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Token → index mapping built from the training partition.
///
/// Indices are assigned in first-seen order and the mapping is never extended
/// after [`Vocabulary::fit`]. Lookups of unseen tokens simply return `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds a vocabulary from normalized training texts.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut vocabulary = Self::default();
        for text in texts {
            for token in tokenize(text.as_ref()) {
                if !vocabulary.index.contains_key(token) {
                    vocabulary.index.insert(token.to_string(), vocabulary.tokens.len());
                    vocabulary.tokens.push(token.to_string());
                }
            }
        }
        vocabulary
    }

    /// Rebuilds a vocabulary from tokens listed in index order.
    ///
    /// Returns `None` if a token appears twice.
    pub(crate) fn from_tokens(tokens: Vec<String>) -> Option<Self> {
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return None;
            }
        }
        Some(Self { tokens, index })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of `token`, if it was seen at fit time
    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Tokens in index order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Sparse TF-IDF vector: `(index, weight)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Weight at `index`, zero when absent
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product with a dense weight vector
    pub fn dot(&self, weights: &Array1<f64>) -> f64 {
        self.entries.iter().map(|&(i, w)| weights[i] * w).sum()
    }

    /// Squared L2 norm
    pub fn squared_norm(&self) -> f64 {
        self.entries.iter().map(|&(_, w)| w * w).sum()
    }
}

/// Smoothed inverse document frequency over the training texts:
/// `ln((N + 1) / (df + 1)) + 1`.
pub fn fit_idf<S: AsRef<str>>(texts: &[S], vocabulary: &Vocabulary) -> Array1<f64> {
    let mut document_frequency = vec![0usize; vocabulary.len()];
    for text in texts {
        let unique: HashSet<usize> = tokenize(text.as_ref())
            .filter_map(|token| vocabulary.get(token))
            .collect();
        for idx in unique {
            document_frequency[idx] += 1;
        }
    }

    let n = texts.len() as f64;
    document_frequency
        .into_iter()
        .map(|df| ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0)
        .collect()
}

/// Frozen TF-IDF feature space.
///
/// Implemented by the training-time [`Vectorizer`] and by the persisted
/// `TrainedModel`, so both sides of the train/inference boundary share one
/// `transform`.
pub trait TextFeatures {
    /// The frozen vocabulary
    fn vocabulary(&self) -> &Vocabulary;

    /// IDF weight per vocabulary index
    fn idf_weights(&self) -> &Array1<f64>;

    /// Converts normalized text into a TF-IDF vector.
    ///
    /// Term frequency is the raw in-document count; out-of-vocabulary tokens
    /// contribute nothing.
    fn transform(&self, normalized: &str) -> FeatureVector {
        let vocabulary = self.vocabulary();
        let idf = self.idf_weights();

        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(normalized) {
            if let Some(idx) = vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        FeatureVector {
            entries: counts.into_iter().map(|(idx, tf)| (idx, tf * idf[idx])).collect(),
        }
    }

    /// Transforms many normalized texts in parallel, preserving order.
    fn transform_all<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<FeatureVector>
    where
        Self: Sync,
    {
        texts.par_iter().map(|t| self.transform(t.as_ref())).collect()
    }
}

/// Vocabulary plus IDF weights fitted on one training partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Vectorizer {
    vocabulary: Vocabulary,
    idf_weights: Array1<f64>,
}

impl Vectorizer {
    /// Fits vocabulary and IDF weights on normalized training texts.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> Self {
        let vocabulary = Vocabulary::fit(texts);
        let idf_weights = fit_idf(texts, &vocabulary);
        Self {
            vocabulary,
            idf_weights,
        }
    }

    pub(crate) fn into_parts(self) -> (Vocabulary, Array1<f64>) {
        (self.vocabulary, self.idf_weights)
    }
}

impl TextFeatures for Vectorizer {
    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn idf_weights(&self) -> &Array1<f64> {
        &self.idf_weights
    }
}
