//! Logit post-processing.

/// Numerically stable softmax.
///
/// Returns an empty vector for empty input.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let Some(max) = logits.iter().copied().reduce(f32::max) else {
        return Vec::new();
    };

    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest probability.
///
/// Ties resolve to the lowest index, matching arg-max semantics.
pub fn top_class(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (index, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((index, p)),
        })
}
