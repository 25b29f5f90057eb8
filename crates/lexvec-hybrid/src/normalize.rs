use lexvec_core::types::ScoredResult;

/// Min-max rescales one method's scores into `[0, 1]`, filling in
/// `normalized_score`.
///
/// - a sole result is treated as maximally relevant (1.0)
/// - a list whose scores are all equal maps every item to 1.0
/// - otherwise the best item maps to 1.0 and the worst to 0.0
pub fn normalize(results: &mut [ScoredResult]) {
    if results.is_empty() {
        return;
    }
    let (min, max) = results
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), r| (lo.min(r.score), hi.max(r.score)));
    let spread = max - min;
    for r in results.iter_mut() {
        let normalized = if spread > 0.0 { (r.score - min) / spread } else { 1.0 };
        r.normalized_score = Some(normalized.clamp(0.0, 1.0));
    }
}
