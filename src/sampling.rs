use rand::{seq::SliceRandom, Rng};

/// Draw one of `candidates` with probability proportional to its weight.
///
/// A value `r` is drawn uniformly in `[0, total)` and the candidates are scanned
/// in the given order, accumulating weights, until the running sum reaches `r`.
/// Candidates with zero weight are never selected unless every weight is zero,
/// in which case `r = 0` and the first candidate wins.
///
/// Infinite weights win outright, uniformly among themselves. Finite weights
/// whose sum overflows are scaled by the largest weight first.
///
/// Returns [None] only if there are no candidates.
pub fn weighted_choice<T: Copy, R: Rng + ?Sized>(
    candidates: &[T],
    weights: &[f64],
    rng: &mut R,
) -> Option<T> {
    debug_assert_eq!(candidates.len(), weights.len());
    let first = *candidates.first()?;

    let infinite = candidates
        .iter()
        .zip(weights)
        .filter(|(_, weight)| **weight == f64::INFINITY)
        .map(|(candidate, _)| *candidate)
        .collect::<Vec<_>>();
    if !infinite.is_empty() {
        return infinite.choose(rng).copied();
    }

    let positive = |weight: &f64| *weight > 0.;
    let mut scale = 1.;
    let mut total = weights.iter().copied().filter(positive).sum::<f64>();
    if total == f64::INFINITY {
        scale = weights.iter().copied().filter(positive).fold(0., f64::max);
        total = weights
            .iter()
            .copied()
            .filter(positive)
            .map(|weight| weight / scale)
            .sum::<f64>();
    }
    if !(total > 0.) {
        return Some(first);
    }
    let r = rng.gen_range(0.0..total);

    let mut cumulative = 0.;
    let mut last_positive = first;
    for (candidate, weight) in candidates.iter().zip(weights) {
        if !positive(weight) {
            continue;
        }
        cumulative += weight / scale;
        last_positive = *candidate;
        if cumulative >= r {
            return Some(*candidate);
        }
    }
    // Rounding can leave the scan a hair short of r
    Some(last_positive)
}
