use super::tfidf::TfidfMatrix;
use ndarray::{Array1, Array2, ArrayView1};
use std::cmp::Ordering;

/// Dot product of two sparse rows sorted by column.
pub fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

fn norm(row: &[(usize, f64)]) -> f64 {
    row.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt()
}

/// Cosine of the angle between `a` and `b`; 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    sparse_dot(a, b) / (norm_a * norm_b)
}

/// Similarity of one document against every document of the same fit, itself included.
pub fn scores_against(matrix: &TfidfMatrix, target: usize) -> Array1<f64> {
    let target_row = matrix.row(target);
    let target_norm = norm(target_row);
    if target_norm == 0.0 {
        return Array1::zeros(matrix.n_documents());
    }

    (0..matrix.n_documents())
        .map(|document| {
            let row = matrix.row(document);
            let row_norm = norm(row);
            if row_norm == 0.0 {
                0.0
            } else {
                sparse_dot(target_row, row) / (target_norm * row_norm)
            }
        })
        .collect()
}

/// `(index, score)` pairs by descending score. The sort is stable, so equal
/// scores keep their snapshot order.
pub fn rank_by_score(scores: ArrayView1<f64>) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

/// Pairwise cosine similarities for a whole snapshot.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    scores: Array2<f64>,
}

impl SimilarityMatrix {
    pub fn compute(matrix: &TfidfMatrix) -> Self {
        Self::compute_with_progress(matrix, |_| {})
    }

    /// Same as [`SimilarityMatrix::compute`], calling `on_row` after each finished row.
    pub fn compute_with_progress<F>(matrix: &TfidfMatrix, mut on_row: F) -> Self
    where
        F: FnMut(usize),
    {
        let n = matrix.n_documents();
        let mut scores = Array2::zeros((n, n));
        for (target, mut row) in scores.rows_mut().into_iter().enumerate() {
            row.assign(&scores_against(matrix, target));
            on_row(target);
        }
        Self { scores }
    }

    pub fn len(&self) -> usize {
        self.scores.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.scores.row(index)
    }

    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.scores[[a, b]]
    }
}
