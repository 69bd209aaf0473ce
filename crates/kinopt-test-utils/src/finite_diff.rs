//! Numerical derivatives for checking analytic ones.

/// Central-difference gradient of `f` at `x`.
///
/// Step `cbrt(ε) · max(1, |x_i|)` balances truncation against round-off.
pub fn central_difference<F>(f: F, x: &[f64]) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut perturbed = x.to_vec();
    (0..x.len())
        .map(|i| {
            let h = f64::EPSILON.cbrt() * x[i].abs().max(1.0);
            perturbed[i] = x[i] + h;
            let forward = f(&perturbed);
            perturbed[i] = x[i] - h;
            let backward = f(&perturbed);
            perturbed[i] = x[i];
            (forward - backward) / (2.0 * h)
        })
        .collect()
}
