//! L2 normalization of raw model output

use eventmatch_core::Vector;

/// Euclidean norm, accumulated in f64
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter()
        .map(|x| f64::from(*x) * f64::from(*x))
        .sum::<f64>()
        .sqrt()
}

/// Scale `v` to unit length
///
/// Returns `None` for vectors that cannot be normalized: zero norm, or any
/// non-finite component.
pub fn normalize(mut v: Vector) -> Option<Vector> {
    if v.iter().any(|x| !x.is_finite()) {
        return None;
    }

    let norm = l2_norm(&v);
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }

    for x in &mut v {
        *x = (f64::from(*x) / norm) as f32;
    }
    Some(v)
}
