//! Entropy accounting
//!
//! Pure functions behind every planner. Total frontier entropy decomposes by
//! the chain/grouping identity: refining one piece of mass `s` into parts
//! `p_1..p_m` raises the total by `(s/W) * H(p_1/s, ..., p_m/s)`, so planners
//! only ever add up independent split gains and never re-scan a frontier.
//! Zero masses follow the `0 * ln(0) := 0` convention and can never produce
//! a NaN.

/// Shannon entropy term `-(mass/total) * ln(mass/total)` in nats.
///
/// Returns 0 for zero or empty masses, so degenerate splits are harmless.
#[inline]
pub fn entropy_term(mass: f64, total: f64) -> f64 {
    if mass <= 0.0 || total <= 0.0 {
        return 0.0;
    }
    let p = mass / total;
    -p * p.ln()
}

/// Globally scaled contribution of one piece of a split.
///
/// A piece of mass `mass` produced by splitting a parent of mass
/// `local_total` contributes `-(mass/w_total) * ln(mass/local_total)` to the
/// total frontier entropy. Summed over the parts of a split this equals
/// `(local_total/w_total) * H_local`, the marginal gain of performing it.
#[inline]
pub fn piece_term(mass: f64, local_total: f64, w_total: f64) -> f64 {
    if mass <= 0.0 || local_total <= 0.0 || w_total <= 0.0 {
        return 0.0;
    }
    -(mass / w_total) * (mass / local_total).ln()
}

/// Local entropy of splitting mass `local_total` into `parts`.
///
/// `parts` need not sum exactly to `local_total`; callers pass whichever
/// decomposition (own weight, exposed children, other pool) they chose.
pub fn local_split_entropy<I>(local_total: f64, parts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    parts
        .into_iter()
        .map(|p| entropy_term(p, local_total))
        .sum()
}

/// Global marginal gain of a split: `(local_total/W) * H_local`.
pub fn split_gain<I>(local_total: f64, w_total: f64, parts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    parts
        .into_iter()
        .map(|p| piece_term(p, local_total, w_total))
        .sum()
}

/// Entropy of a fully materialized weight distribution.
///
/// Reporting helper for finished summary trees only; planners work with
/// incremental gains.
pub fn distribution_entropy<I>(total: f64, weights: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    weights.into_iter().map(|w| entropy_term(w, total)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn zero_mass_contributes_zero() {
        assert_eq!(entropy_term(0.0, 10.0), 0.0);
        assert_eq!(entropy_term(5.0, 0.0), 0.0);
        assert!(!distribution_entropy(0.0, [0.0, 0.0]).is_nan());
    }

    #[test]
    fn uniform_split_reaches_ln_m() {
        let h = local_split_entropy(4.0, [1.0, 1.0, 1.0, 1.0]);
        assert!((h - 4.0f64.ln()).abs() < TOL);
    }

    #[test]
    fn scaled_gain_matches_local_form() {
        let local = 6.0;
        let total = 24.0;
        let parts = [1.0, 2.0, 3.0];
        let via_local = (local / total) * local_split_entropy(local, parts);
        let via_terms = split_gain(local, total, parts);
        assert!((via_local - via_terms).abs() < TOL);
    }

    #[test]
    fn chain_rule_adds_up() {
        // Split {6} -> {2, 4}, then {4} -> {1, 3}; gains must sum to the
        // entropy of the final partition {2, 1, 3}.
        let w = 6.0;
        let g1 = split_gain(6.0, w, [2.0, 4.0]);
        let g2 = split_gain(4.0, w, [1.0, 3.0]);
        let direct = distribution_entropy(w, [2.0, 1.0, 3.0]);
        assert!((g1 + g2 - direct).abs() < TOL);
    }

    #[test]
    fn gains_are_non_negative() {
        assert!(split_gain(5.0, 20.0, [5.0]).abs() < TOL);
        assert!(split_gain(5.0, 20.0, [2.5, 2.5]) > 0.0);
    }
}
