/// Cosine similarity of two vectors
///
/// `None` when the lengths differ, either vector is empty or has zero norm,
/// or the result is not finite. Accumulates in `f64`.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot = x.mul_add(y, dot);
        norm_a = x.mul_add(x, norm_a);
        norm_b = y.mul_add(y, norm_b);
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return None;
    }

    let similarity = (dot / denominator).clamp(-1.0, 1.0) as f32;

    similarity.is_finite().then_some(similarity)
}
