//! Single-window EDGE estimator.
//!
//! Estimates the bid-ask spread from open, high, low, and close prices using
//! the efficient estimator of Ardia, Guidotti and Kroencke. Two spread-squared
//! estimators are built from the decomposed log-returns of [`Components`] and
//! combined with inverse-variance weights.
//!
//! # Computation
//!
//! Over periods `2..N` of the window:
//! 1. `pt = mean(τ)`, `po = mean(φ1) + mean(φ2)`, `pc = mean(φ3) + mean(φ4)`
//! 2. Demean: `d1 = r1 - τ·mean(r1)/pt`, same for `d3`, `d5`
//! 3. `x1 = -4/po·d1·r2 - 4/pc·d3·r4`, `x2 = -4/po·d1·r5 - 4/pc·d5·r4`
//! 4. `s² = (v2·e1 + v1·e2) / (v1 + v2)` from the means `e` and variances `v`
//!    of `x1`, `x2`
//! 5. `s = sqrt(|s²|)`
//!
//! # References
//!
//! - Ardia, D., E. Guidotti, and T. A. Kroencke (2024). "Efficient estimation of
//!   bid-ask spreads from open, high, low, and close prices," Journal of
//!   Financial Economics 161, 103916.

use crate::{
    Result,
    components::{Components, Row},
    kernel::{EdgeMoments, Probabilities, mean},
    price::PriceValue,
};
use tracing::debug;

/// Fewest observations for which an estimate can exist.
pub const MIN_OBSERVATIONS: usize = 3;

/// Estimates the spread over the whole price series.
///
/// Returns `Ok(None)` when the window is too short or degenerate (fewer than
/// two periods with price movement, or opens/closes always at the extremes).
/// Missing prices are skipped. The result is a fraction of price (0.01 = 1%),
/// negative only when `sign` is set and `s² < 0`.
///
/// # Errors
///
/// [`EdgeError::LengthMismatch`](crate::EdgeError::LengthMismatch) when the
/// price vectors differ in length.
///
/// # Example
///
/// ```
/// let open = [100.0, 101.0, 102.5, 101.0, 103.0];
/// let high = [101.5, 103.0, 103.0, 102.5, 104.5];
/// let low = [99.0, 100.5, 101.0, 100.0, 102.0];
/// let close = [101.0, 102.5, 101.5, 102.0, 102.5];
///
/// let spread = edge_spread::edge(&open, &high, &low, &close, false).unwrap();
/// assert!(spread.is_some_and(|s| s >= 0.0));
/// ```
pub fn edge<P: PriceValue>(
    open: &[P],
    high: &[P],
    low: &[P],
    close: &[P],
    sign: bool,
) -> Result<Option<f64>> {
    let spread = edge_moments(open, high, low, close)?.map(|m| m.spread(sign));
    if spread.is_none() {
        debug!(observations = open.len(), "no spread estimate for window");
    }
    Ok(spread)
}

/// Intermediate quantities of [`edge`] for the whole price series.
///
/// Exposes `pt`, `po`, `pc`, `e1`, `e2`, `v1`, `v2` and, through
/// [`EdgeMoments::squared_spread`], `s²`.
pub fn edge_moments<P: PriceValue>(
    open: &[P],
    high: &[P],
    low: &[P],
    close: &[P],
) -> Result<Option<EdgeMoments>> {
    let comp = Components::derive(open, high, low, close)?;
    if comp.len() < MIN_OBSERVATIONS {
        return Ok(None);
    }
    Ok(window_moments(&comp))
}

/// Direct evaluation over every period after the first.
pub(crate) fn window_moments(comp: &Components) -> Option<EdgeMoments> {
    let rows: Vec<Row> = comp.rows().skip(1).collect();

    let nt = rows.iter().filter(|r| r.tau == Some(1.0)).count() as f64;
    let pt = mean(rows.iter().map(|r| r.tau));
    let phi = std::array::from_fn(|k| mean(rows.iter().map(|r| r.phi[k])));
    let probs = Probabilities::new(nt, pt, phi)?;

    let k1 = mean(rows.iter().map(|r| r.r1))? / probs.pt;
    let k3 = mean(rows.iter().map(|r| r.r3))? / probs.pt;
    let k5 = mean(rows.iter().map(|r| r.r5))? / probs.pt;
    let (a, b) = (probs.open_weight(), probs.close_weight());

    let x1: Vec<f64> = rows
        .iter()
        .filter_map(|r| {
            let tau = r.tau?;
            let d1 = r.r1? - tau * k1;
            let d3 = r.r3? - tau * k3;
            Some(a * d1 * r.r2? + b * d3 * r.r4?)
        })
        .collect();
    let x2: Vec<f64> = rows
        .iter()
        .filter_map(|r| {
            let tau = r.tau?;
            let d1 = r.r1? - tau * k1;
            let d5 = r.r5? - tau * k5;
            Some(a * d1 * r.r5? + b * d5 * r.r4?)
        })
        .collect();

    EdgeMoments::new(probs, raw_moments(&x1), raw_moments(&x2))
}

/// `(E[x], E[x²])`, undefined for an empty sample.
fn raw_moments(x: &[f64]) -> Option<(f64, f64)> {
    if x.is_empty() {
        return None;
    }
    let n = x.len() as f64;
    let first = x.iter().sum::<f64>() / n;
    let second = x.iter().map(|v| v * v).sum::<f64>() / n;
    Some((first, second))
}
