//! Bag-of-words TF-IDF vector space and cosine similarity.
//!
//! IDF is smoothed (`ln((1 + n) / (1 + df)) + 1`), term frequencies are raw
//! counts and every document vector is L2-normalized, so the cosine between two
//! rows is their dot product.

use std::collections::{HashMap, HashSet};

use tracing::warn;

pub type SparseVector = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPattern {
    /// Runs of two or more alphanumeric or `_` characters.
    Word,
    /// Runs of two or more alphabetic characters.
    Letters,
}

#[derive(Debug, Clone)]
pub struct Vectorizer {
    pattern: TokenPattern,
    ngram_range: (usize, usize),
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Vectorizer {
    pub fn new() -> Self {
        Self {
            pattern: TokenPattern::Word,
            ngram_range: (1, 1),
        }
    }

    pub fn with_pattern(mut self, pattern: TokenPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    fn tokens(&self, document: &str) -> Vec<String> {
        let keep = |ch: char| match self.pattern {
            TokenPattern::Word => ch.is_alphanumeric() || ch == '_',
            TokenPattern::Letters => ch.is_alphabetic(),
        };

        document
            .to_lowercase()
            .split(|ch: char| !keep(ch))
            .filter(|token| token.chars().count() >= 2)
            .map(str::to_string)
            .collect()
    }

    /// Unigrams through `max_n`-grams, in document order.
    pub fn terms(&self, document: &str) -> Vec<String> {
        let tokens = self.tokens(document);
        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();

        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }

        terms
    }

    /// Fit the vocabulary on `documents` and return one normalized vector per
    /// document. `None` when no document yields a single term.
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> Option<Vec<SparseVector>> {
        let term_lists: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.terms(doc.as_ref()))
            .collect();

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &term_lists {
            let unique: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return None;
        }

        let n_docs = documents.len() as f64;
        let idf: HashMap<&str, f64> = doc_freq
            .iter()
            .map(|(term, df)| (*term, ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0))
            .collect();

        let vectors = term_lists
            .iter()
            .map(|terms| {
                let mut counts: HashMap<&str, f64> = HashMap::new();
                for term in terms {
                    *counts.entry(term.as_str()).or_insert(0.0) += 1.0;
                }

                let mut vector: SparseVector = counts
                    .into_iter()
                    .map(|(term, tf)| (term.to_string(), tf * idf[term]))
                    .collect();

                let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for weight in vector.values_mut() {
                        *weight /= norm;
                    }
                }
                vector
            })
            .collect();

        Some(vectors)
    }
}

/// Cosine similarity between two sparse vectors, clamped to `[0, 1]`.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|other| w * other))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        0.0
    } else {
        (dot / denominator).clamp(0.0, 1.0)
    }
}

/// Similarity of `target` against each candidate over a vocabulary fitted on
/// all of them. A degenerate corpus yields zeros rather than an error.
pub fn similarities<S: AsRef<str>>(target: &str, candidates: &[S]) -> Vec<f64> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut documents: Vec<&str> = Vec::with_capacity(candidates.len() + 1);
    documents.push(target);
    documents.extend(candidates.iter().map(|c| c.as_ref()));

    match Vectorizer::new().fit_transform(&documents) {
        Some(vectors) => {
            let (target_vec, rest) = vectors.split_at(1);
            rest.iter().map(|v| cosine(&target_vec[0], v)).collect()
        }
        None => {
            warn!(
                candidates = candidates.len(),
                "empty vocabulary, similarity signal unavailable"
            );
            vec![0.0; candidates.len()]
        }
    }
}

/// Per-term weights of one presentation document, using letter-only unigrams
/// and bigrams.
pub fn term_weights(document: &str) -> SparseVector {
    Vectorizer::new()
        .with_pattern(TokenPattern::Letters)
        .with_ngram_range(1, 2)
        .fit_transform(&[document])
        .and_then(|mut vectors| vectors.pop())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_documents_score_one() {
        let sims = similarities("python sql databases", &["python sql databases"]);
        assert_eq!(sims.len(), 1);
        assert!((sims[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_documents_score_zero() {
        let sims = similarities("python sql", &["pottery sculpture"]);
        assert_eq!(sims, vec![0.0]);
    }

    #[test]
    fn partial_overlap_ranks_between() {
        let sims = similarities(
            "python sql statistics",
            &["python sql statistics", "python painting", "pottery"],
        );
        assert!(sims[0] > sims[1]);
        assert!(sims[1] > sims[2]);
        assert!(sims.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn degenerate_corpus_yields_zeros() {
        assert_eq!(similarities("", &["", "  ", "a"]), vec![0.0, 0.0, 0.0]);
        assert!(similarities("python", &[] as &[&str]).is_empty());
    }

    #[test]
    fn tokens_need_two_characters() {
        let terms = Vectorizer::new().terms("C R sql, Data_Mining");
        assert_eq!(terms, vec!["sql".to_string(), "data_mining".to_string()]);
    }

    #[test]
    fn letter_bigrams_for_term_weights() {
        let terms = Vectorizer::new()
            .with_pattern(TokenPattern::Letters)
            .with_ngram_range(1, 2)
            .terms("Machine Learning 101");
        assert_eq!(
            terms,
            vec![
                "machine".to_string(),
                "learning".to_string(),
                "machine learning".to_string()
            ]
        );

        let weights = term_weights("machine learning machine vision");
        assert!(weights["machine"] > weights["vision"]);
        assert!(weights.contains_key("machine learning"));
    }
}
