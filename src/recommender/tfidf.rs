use super::tokenizer;
use crate::error::Result;
use ndarray::Array1;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Non-zero `(column, weight)` entries of one document, sorted by column.
pub type SparseRow = Vec<(usize, f64)>;

/// TF-IDF weights for one catalog snapshot.
///
/// Rows follow the document order passed to [`TfidfVectorizer::fit_transform`],
/// columns follow the lexicographically sorted vocabulary. Only non-zero weights
/// are stored. Weights are only comparable within the same fit.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    vocabulary: BTreeMap<String, usize>,
    idf: Array1<f64>,
    rows: Vec<SparseRow>,
}

impl TfidfMatrix {
    pub fn n_documents(&self) -> usize {
        self.rows.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&column| self.idf[column])
    }

    pub fn row(&self, document: usize) -> &[(usize, f64)] {
        &self.rows[document]
    }

    /// Number of stored weights across all rows.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Weight of `term` in `document`, 0 when the term is absent.
    pub fn weight(&self, document: usize, term: &str) -> f64 {
        let Some(&column) = self.vocabulary.get(term) else {
            return 0.0;
        };
        let row = &self.rows[document];
        row.binary_search_by_key(&column, |&(c, _)| c)
            .map(|position| row[position].1)
            .unwrap_or(0.0)
    }
}

/// Fits a vocabulary with smoothed inverse document frequencies and produces
/// L2-normalised sparse TF-IDF rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfidfVectorizer;

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self
    }

    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<TfidfMatrix> {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenizer::tokenize(doc.as_ref()))
            .collect();

        let vocabulary: BTreeMap<String, usize> = tokenized
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(column, term)| (term.to_string(), column))
            .collect();

        let n_docs = documents.len();

        // raw term counts per document
        let mut doc_freq = vec![0_usize; vocabulary.len()];
        let counts: Vec<HashMap<usize, f64>> = tokenized
            .iter()
            .map(|tokens| {
                let mut counts: HashMap<usize, f64> = HashMap::with_capacity(tokens.len());
                for token in tokens {
                    *counts.entry(vocabulary[token.as_str()]).or_insert(0.0) += 1.0;
                }
                for &column in counts.keys() {
                    doc_freq[column] += 1;
                }
                counts
            })
            .collect();

        let idf: Array1<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|counts| {
                let mut row: SparseRow = counts
                    .into_iter()
                    .map(|(column, count)| (column, count * idf[column]))
                    .collect();
                row.sort_unstable_by_key(|&(column, _)| column);

                let norm = row.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for entry in row.iter_mut() {
                        entry.1 /= norm;
                    }
                }
                row
            })
            .collect();

        Ok(TfidfMatrix {
            vocabulary,
            idf,
            rows,
        })
    }
}
