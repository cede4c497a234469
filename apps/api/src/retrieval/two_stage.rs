//! Two-stage retriever over Matryoshka embeddings.
//!
//! Stage 1 ranks the whole corpus on re-normalized `prefilter_dims`-prefixes and
//! keeps the top `k1`. Stage 2 re-scores only those survivors on the full
//! vectors and returns the top `k2`. Corpora no larger than `k2` skip staging.
//! Equal scores keep corpus order.

use tracing::debug;

use crate::retrieval::similarity::{cosine_similarity, truncate_normalized};
use crate::retrieval::PREFILTER_DIMS;

#[derive(Debug, Clone, Copy)]
pub struct TwoStageRetriever {
    prefilter_dims: usize,
}

impl Default for TwoStageRetriever {
    fn default() -> Self {
        Self {
            prefilter_dims: PREFILTER_DIMS,
        }
    }
}

impl TwoStageRetriever {
    #[cfg(test)]
    pub fn with_prefilter_dims(prefilter_dims: usize) -> Self {
        Self { prefilter_dims }
    }

    /// `(corpus index, full-dimension cosine)` pairs, best first, at most `k2` long.
    fn search_indices<V: AsRef<[f32]>>(
        &self,
        query: &[f32],
        corpus: &[V],
        k1: usize,
        k2: usize,
    ) -> Vec<(usize, f64)> {
        if corpus.is_empty() || k2 == 0 {
            return Vec::new();
        }

        if corpus.len() <= k2 {
            debug!("Corpus of {} ≤ k2={k2}: ranking on full dimensions", corpus.len());
            return rank_full(query, corpus, 0..corpus.len());
        }

        // Stage 1: prefix prefilter
        let query_prefix = truncate_normalized(query, self.prefilter_dims);
        let mut coarse: Vec<(usize, f64)> = corpus
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let prefix = truncate_normalized(v.as_ref(), self.prefilter_dims);
                (i, cosine_similarity(&prefix, &query_prefix))
            })
            .collect();
        sort_descending(&mut coarse);
        coarse.truncate(k1);

        // Stage 2: full-dimension rerank of the survivors, in corpus order for stable ties
        let mut survivors: Vec<usize> = coarse.into_iter().map(|(i, _)| i).collect();
        survivors.sort_unstable();
        debug!(
            "Stage 1 kept {} of {} ({}-dim); reranking on full dimensions",
            survivors.len(),
            corpus.len(),
            self.prefilter_dims
        );

        let mut ranked = rank_full(query, corpus, survivors);
        ranked.truncate(k2);
        ranked
    }

    /// Returns `(id, full-dimension cosine)` pairs, best first, at most `k2` long.
    pub fn search<'a, V: AsRef<[f32]>>(
        &self,
        query: &[f32],
        corpus: &'a [(String, V)],
        k1: usize,
        k2: usize,
    ) -> Vec<(&'a str, f64)> {
        let vectors: Vec<&[f32]> = corpus.iter().map(|(_, v)| v.as_ref()).collect();
        self.search_indices(query, &vectors, k1, k2)
            .into_iter()
            .map(|(i, score)| (corpus[i].0.as_str(), score))
            .collect()
    }
}

fn rank_full<V: AsRef<[f32]>>(
    query: &[f32],
    corpus: &[V],
    indices: impl IntoIterator<Item = usize>,
) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64)> = indices
        .into_iter()
        .map(|i| (i, cosine_similarity(corpus[i].as_ref(), query)))
        .collect();
    sort_descending(&mut scored);
    scored
}

/// Stable: equal scores keep their incoming order.
fn sort_descending(scored: &mut [(usize, f64)]) {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis(dims: usize, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dims];
        v[axis] = 1.0;
        v
    }

    fn corpus(vectors: Vec<Vec<f32>>) -> Vec<(String, Vec<f32>)> {
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("resume_{i}.pdf"), v))
            .collect()
    }

    #[test]
    fn test_empty_corpus_returns_empty() {
        let retriever = TwoStageRetriever::default();
        let empty: Vec<(String, Vec<f32>)> = Vec::new();
        assert!(retriever.search(&basis(8, 0), &empty, 7, 4).is_empty());
    }

    #[test]
    fn test_small_corpus_ranks_all_on_full_dims() {
        let retriever = TwoStageRetriever::with_prefilter_dims(2);
        // Prefixes all point the same way; only the full vectors separate them.
        let docs = corpus(vec![
            vec![1.0, 0.0, 0.0, 1.0],
            vec![1.0, 0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ]);
        let query = vec![1.0, 0.0, 1.0, 0.0];

        let hits = retriever.search(&query, &docs, 7, 4);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0, "resume_1.pdf");
        assert!((hits[0].1 - 1.0).abs() < 1e-9);
        assert_eq!(hits[1].0, "resume_2.pdf");
        assert_eq!(hits[2].0, "resume_0.pdf");
    }

    #[test]
    fn test_result_length_bounded_by_k2() {
        let retriever = TwoStageRetriever::with_prefilter_dims(4);
        let docs = corpus((0..10).map(|i| basis(10, i)).collect());
        let hits = retriever.search(&basis(10, 3), &docs, 7, 4);
        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].0, "resume_3.pdf");
    }

    #[test]
    fn test_prefilter_keeps_true_top1_when_corpus_equals_k1() {
        let retriever = TwoStageRetriever::with_prefilter_dims(4);
        // Orthogonal vectors; the best match differs from the query only beyond the prefix.
        let docs = corpus((0..7).map(|i| basis(16, i + 8)).collect());
        let mut query = basis(16, 12);
        query[0] = 0.1;

        let hits = retriever.search(&query, &docs, 7, 4);
        assert_eq!(hits[0].0, "resume_4.pdf");
    }

    #[test]
    fn test_stage1_excludes_prefix_mismatches() {
        let retriever = TwoStageRetriever::with_prefilter_dims(2);
        // resume_0 matches the query best on full dims but its prefix points away.
        let docs = corpus(vec![
            vec![0.0, 0.1, 1.0, 1.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![1.0, 0.1, 0.0, 0.0],
            vec![0.9, 0.2, 0.0, 0.0],
        ]);
        let query = vec![1.0, 0.0, 1.0, 1.0];

        let hits = retriever.search(&query, &docs, 2, 1);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "resume_1.pdf");
    }

    #[test]
    fn test_ties_preserve_corpus_order() {
        let retriever = TwoStageRetriever::with_prefilter_dims(2);
        let same = vec![1.0, 0.0, 0.0];
        let docs = corpus(vec![
            vec![0.0, 1.0, 0.0],
            same.clone(),
            same.clone(),
            same.clone(),
        ]);
        let hits = retriever.search(&same, &docs, 3, 2);
        assert_eq!(hits[0].0, "resume_1.pdf");
        assert_eq!(hits[1].0, "resume_2.pdf");
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let retriever = TwoStageRetriever::with_prefilter_dims(2);
        let docs = corpus(vec![vec![0.0; 4], basis(4, 0)]);
        let hits = retriever.search(&basis(4, 0), &docs, 7, 4);
        assert_eq!(hits[0].0, "resume_1.pdf");
        assert_eq!(hits[1].1, 0.0);
    }

    #[test]
    fn test_k2_zero_returns_nothing() {
        let retriever = TwoStageRetriever::default();
        let docs = corpus(vec![basis(4, 0)]);
        assert!(retriever.search(&basis(4, 0), &docs, 7, 0).is_empty());
    }
}
