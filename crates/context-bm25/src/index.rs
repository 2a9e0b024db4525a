use std::collections::HashMap;

use crate::tokenizer::tokenize;

#[derive(Debug, Clone)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Classic Okapi BM25 over a fixed corpus of (id, text) documents.
pub struct Bm25Index {
    config: Bm25Config,
    doc_ids: Vec<String>,
    doc_lengths: Vec<u32>,
    avg_doc_length: f32,
    term_frequencies: Vec<HashMap<String, u32>>,
    document_frequency: HashMap<String, u32>,
}

impl Bm25Index {
    pub fn build(documents: &[(String, String)], config: Bm25Config) -> Self {
        let mut doc_ids = Vec::with_capacity(documents.len());
        let mut doc_lengths = Vec::with_capacity(documents.len());
        let mut term_frequencies = Vec::with_capacity(documents.len());
        let mut document_frequency: HashMap<String, u32> = HashMap::new();

        for (id, text) in documents {
            let tokens = tokenize(text);
            doc_lengths.push(tokens.len() as u32);
            doc_ids.push(id.clone());

            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            term_frequencies.push(tf);
        }

        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            doc_lengths.iter().map(|&l| l as f32).sum::<f32>() / doc_lengths.len() as f32
        };

        Self {
            config,
            doc_ids,
            doc_lengths,
            avg_doc_length,
            term_frequencies,
            document_frequency,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.doc_ids.len() as f32;
        let df = *self.document_frequency.get(term).unwrap_or(&0) as f32;
        // BM25's standard IDF with a +1 inside the log keeps the score
        // non-negative even when a term appears in every document.
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Scores every document against `query` and returns the top `k`,
    /// highest score first. Documents with a zero score are omitted.
    pub fn search(&self, query: &str, k: usize) -> Vec<(String, f32)> {
        if self.is_empty() {
            return Vec::new();
        }
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut scores: Vec<(usize, f32)> = (0..self.doc_ids.len())
            .map(|doc_idx| (doc_idx, self.score_document(doc_idx, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);
        scores
            .into_iter()
            .map(|(idx, score)| (self.doc_ids[idx].clone(), score))
            .collect()
    }

    fn score_document(&self, doc_idx: usize, query_terms: &[String]) -> f32 {
        let tf_map = &self.term_frequencies[doc_idx];
        let doc_len = self.doc_lengths[doc_idx] as f32;
        let mut score = 0.0;

        for term in query_terms {
            let tf = *tf_map.get(term).unwrap_or(&0) as f32;
            if tf == 0.0 {
                continue;
            }
            let idf = self.idf(term);
            let numerator = tf * (self.config.k1 + 1.0);
            let denominator = tf
                + self.config.k1
                    * (1.0 - self.config.b + self.config.b * doc_len / self.avg_doc_length.max(1.0));
            score += idf * numerator / denominator;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corpus() -> Vec<(String, String)> {
        vec![
            ("a".to_string(), "fn connect_to_database pool".to_string()),
            ("b".to_string(), "fn render_widget on screen".to_string()),
            ("c".to_string(), "database connection pool retry logic".to_string()),
        ]
    }

    #[test]
    fn ranks_documents_sharing_query_terms_higher() {
        let index = Bm25Index::build(&corpus(), Bm25Config::default());
        let results = index.search("database pool", 3);
        assert_eq!(results[0].0, "a");
        assert!(results.iter().any(|(id, _)| id == "c"));
        assert!(!results.iter().any(|(id, _)| id == "b"));
    }

    #[test]
    fn empty_query_returns_nothing() {
        let index = Bm25Index::build(&corpus(), Bm25Config::default());
        assert_eq!(index.search("", 3), Vec::new());
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        let index = Bm25Index::build(&[], Bm25Config::default());
        assert_eq!(index.search("database", 3), Vec::new());
    }
}
