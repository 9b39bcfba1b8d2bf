//! Rolling and expanding EDGE estimators.
//!
//! Rather than re-running the single-window estimator at every position, the
//! per-period quantities are computed once and every window mean is read off
//! prefix sums. The demeaned estimators expand into fixed per-period terms:
//!
//! ```text
//! x1 = a·r1·r2 - a·k1·τ·r2 + b·r3·r4 - b·k3·τ·r4
//! x2 = a·r1·r5 - a·k1·τ·r5 + b·r4·r5 - b·k5·τ·r4
//! ```
//!
//! with window constants `a = -4/po`, `b = -4/pc`, `kj = mean(rj)/pt`. So
//! `E[x]` needs the window means of the four terms and `E[x²]` the means of
//! their pairwise products.

use crate::{
    Result,
    components::{Components, Row},
    kernel::{EdgeMoments, Probabilities},
    price::PriceValue,
    window::{RollingSum, Window, resolve_value_rows},
};
use std::ops::Range;
use tracing::debug;

const TERMS: usize = 4;

/// Estimates the spread over a window ending at every position.
///
/// Returns one value per input period. Positions whose window is degenerate or
/// too short are `None`. With `na_rm` missing periods inside a window are
/// skipped; without it any missing period makes that window's estimate `None`.
///
/// # Errors
///
/// [`EdgeError::LengthMismatch`](crate::EdgeError::LengthMismatch) for unequal
/// price vectors and [`EdgeError::InvalidWindow`](crate::EdgeError::InvalidWindow)
/// for a malformed window.
///
/// # Example
///
/// ```
/// use edge_spread::{Window, edge_rolling};
///
/// let open = [100.0, 101.0, 102.5, 101.0, 103.0, 102.0];
/// let high = [101.5, 103.0, 103.0, 102.5, 104.5, 103.5];
/// let low = [99.0, 100.5, 101.0, 100.0, 102.0, 101.0];
/// let close = [101.0, 102.5, 101.5, 102.0, 102.5, 103.0];
///
/// let spreads = edge_rolling(&open, &high, &low, &close, &Window::Fixed(4), false, true).unwrap();
/// assert_eq!(spreads.len(), open.len());
/// assert_eq!(spreads[0], None);
/// ```
pub fn edge_rolling<P: PriceValue>(
    open: &[P],
    high: &[P],
    low: &[P],
    close: &[P],
    window: &Window,
    sign: bool,
    na_rm: bool,
) -> Result<Vec<Option<f64>>> {
    Ok(rolling_moments(open, high, low, close, window, na_rm)?
        .into_iter()
        .map(|m| m.map(|m| m.spread(sign)))
        .collect())
}

/// Estimates the spread over all periods up to every position.
///
/// Same as [`edge_rolling`] with [`Window::Expanding`].
pub fn edge_expanding<P: PriceValue>(
    open: &[P],
    high: &[P],
    low: &[P],
    close: &[P],
    sign: bool,
    na_rm: bool,
) -> Result<Vec<Option<f64>>> {
    edge_rolling(open, high, low, close, &Window::Expanding, sign, na_rm)
}

/// Intermediate quantities of [`edge_rolling`] at every position.
pub fn rolling_moments<P: PriceValue>(
    open: &[P],
    high: &[P],
    low: &[P],
    close: &[P],
    window: &Window,
    na_rm: bool,
) -> Result<Vec<Option<EdgeMoments>>> {
    let comp = Components::derive(open, high, low, close)?;
    let bounds = resolve_value_rows(window, comp.len())?;
    let sums = WindowSums::new(&comp);

    let moments: Vec<Option<EdgeMoments>> = bounds
        .into_iter()
        .map(|rows| rows.and_then(|rows| sums.moments(rows, na_rm)))
        .collect();

    debug!(
        observations = comp.len(),
        %window,
        na_rm,
        estimated = moments.iter().filter(|m| m.is_some()).count(),
        "rolling spread estimates"
    );
    Ok(moments)
}

/// Prefix sums of every per-period quantity the estimator needs.
#[derive(Debug)]
struct WindowSums {
    r1: RollingSum,
    r3: RollingSum,
    r5: RollingSum,
    tau: RollingSum,
    phi: [RollingSum; 4],
    x1: Expansion,
    x2: Expansion,
}

impl WindowSums {
    fn new(comp: &Components) -> Self {
        let rows: Vec<Row> = comp.rows().collect();
        let column = |f: fn(&Row) -> Option<f64>| RollingSum::new(rows.iter().map(f));

        Self {
            r1: column(|r| r.r1),
            r3: column(|r| r.r3),
            r5: column(|r| r.r5),
            tau: column(|r| r.tau),
            phi: std::array::from_fn(|k| RollingSum::new(rows.iter().map(|r| r.phi[k]))),
            x1: Expansion::new(rows.iter().map(|r| {
                let tau = r.tau?;
                let (r1, r2, r3, r4) = (r.r1?, r.r2?, r.r3?, r.r4?);
                Some([r1 * r2, tau * r2, r3 * r4, tau * r4])
            })),
            x2: Expansion::new(rows.iter().map(|r| {
                let tau = r.tau?;
                let (r1, r4, r5) = (r.r1?, r.r4?, r.r5?);
                Some([r1 * r5, tau * r5, r4 * r5, tau * r4])
            })),
        }
    }

    fn moments(&self, rows: Range<usize>, na_rm: bool) -> Option<EdgeMoments> {
        let nt = self.tau.sum(rows.clone(), na_rm)?;
        let pt = self.tau.mean(rows.clone(), na_rm);
        let phi = std::array::from_fn(|k| self.phi[k].mean(rows.clone(), na_rm));
        let probs = Probabilities::new(nt, pt, phi)?;

        let k1 = self.r1.mean(rows.clone(), na_rm)? / probs.pt;
        let k3 = self.r3.mean(rows.clone(), na_rm)? / probs.pt;
        let k5 = self.r5.mean(rows.clone(), na_rm)? / probs.pt;
        let (a, b) = (probs.open_weight(), probs.close_weight());

        let first = self.x1.moments(rows.clone(), [a, -a * k1, b, -b * k3], na_rm);
        let second = self.x2.moments(rows, [a, -a * k1, b, -b * k5], na_rm);
        EdgeMoments::new(probs, first, second)
    }
}

/// Prefix sums of the terms of one estimator and of their pairwise products.
///
/// A row is present only when every term is, so all sums share one count.
#[derive(Debug)]
struct Expansion {
    terms: [RollingSum; TERMS],
    /// Upper triangle, indexed by [`pair`].
    products: Vec<RollingSum>,
}

const fn pair(j: usize, k: usize) -> usize {
    j * TERMS - j * (j + 1) / 2 + k
}

impl Expansion {
    fn new<I>(rows: I) -> Self
    where
        I: Iterator<Item = Option<[f64; TERMS]>>,
    {
        let rows: Vec<Option<[f64; TERMS]>> = rows.collect();
        let terms = std::array::from_fn(|j| RollingSum::new(rows.iter().map(|t| t.map(|t| t[j]))));

        let mut products = Vec::with_capacity(TERMS * (TERMS + 1) / 2);
        for j in 0..TERMS {
            for k in j..TERMS {
                debug_assert_eq!(pair(j, k), products.len());
                products.push(RollingSum::new(rows.iter().map(|t| t.map(|t| t[j] * t[k]))));
            }
        }

        Self { terms, products }
    }

    /// `(E[x], E[x²])` of `x = Σ coef[j]·term[j]` over `rows`.
    fn moments(&self, rows: Range<usize>, coef: [f64; TERMS], na_rm: bool) -> Option<(f64, f64)> {
        let mut first = 0.0;
        for (sums, c) in self.terms.iter().zip(coef) {
            first += c * sums.mean(rows.clone(), na_rm)?;
        }

        let mut second = 0.0;
        for j in 0..TERMS {
            for k in j..TERMS {
                let weight = if j == k { 1.0 } else { 2.0 };
                second += weight * coef[j] * coef[k] * self.products[pair(j, k)].mean(rows.clone(), na_rm)?;
            }
        }

        Some((first, second))
    }
}
