//! Distances between discrete distributions, used to compare sampled
//! channel frequencies against a signature.

/// Vector dot product over the common prefix of xs and ys.
pub fn dot_product(xs: &[f64], ys: &[f64]) -> f64 {
    xs.iter().zip(ys.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity
/// bounded in [-1, 1]; NaN when either vector is all zero
pub fn cosine_similarity(xs: &[f64], ys: &[f64]) -> f64 {
    dot_product(xs, ys) / (dot_product(xs, xs) * dot_product(ys, ys)).sqrt()
}

/// Rescale xs so that it sums to 1.
pub fn scale(xs: &[f64]) -> Vec<f64> {
    let s: f64 = xs.iter().sum();
    if s == 1.0 || s == 0.0 {
        xs.to_owned()
    } else {
        xs.iter().map(|x| x / s).collect()
    }
}

/// Kullback-Leibler divergence using log2
pub fn kl_divergence(p: &[f64], q: &[f64]) -> f64 {
    p.iter().zip(q.iter())
        .filter(|(&x, _)| x != 0.0)
        .map(|(&x, &y)| x * (x.log2() - y.log2()))
        .sum()
}

/// Jensen-Shannon divergence using log2
/// bounded in [0, 1]
pub fn js_divergence(p: &[f64], q: &[f64]) -> f64 {
    let p = scale(p);
    let q = scale(q);

    let m: Vec<f64> = p.iter().zip(q.iter()).map(|(&x, &y)| 0.5 * (x + y)).collect();

    0.5 * (kl_divergence(&p, &m) + kl_divergence(&q, &m))
}
