//! Vector math shared by retrieval and scoring.
//!
//! Every function guards zero norms: a degenerate vector has similarity 0 with
//! anything and is left untouched by normalization.

/// Cosine similarity in [-1, 1], computed in f64.
///
/// Returns 0.0 if either vector has zero norm. Vectors of different length are
/// compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Scales `v` to unit length in place. Zero vectors are left as-is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// The first `dims` components of `v`, re-normalized to unit length.
///
/// Matryoshka-trained embeddings keep their meaning under prefix truncation.
/// Vectors shorter than `dims` are used whole.
pub fn truncate_normalized(v: &[f32], dims: usize) -> Vec<f32> {
    let mut prefix = v[..dims.min(v.len())].to_vec();
    l2_normalize(&mut prefix);
    prefix
}
