//! Moment combination shared by the single-window and rolling estimators.
//!
//! Both estimators reduce a window to the same handful of numbers: the
//! movement probabilities `pt`, `po`, `pc` and the first two moments of the
//! two spread-squared estimators `x1`, `x2`. This module turns those numbers
//! into a spread.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Minimum number of periods with `τ = true` for a defined estimate.
pub const MIN_MOVEMENTS: f64 = 2.0;

/// Movement probabilities of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    /// Share of periods with price movement, `mean(τ)`.
    pub pt: f64,
    /// `mean(φ1) + mean(φ2)`: open away from the bar extremes.
    pub po: f64,
    /// `mean(φ3) + mean(φ4)`: previous close away from the previous extremes.
    pub pc: f64,
}

impl Probabilities {
    /// Applies the degeneracy rule to window-level means.
    ///
    /// `nt` is the number of periods with `τ = true`; `pt` and `phi` are the
    /// means of `τ` and `φ1..φ4` over their non-missing values. Returns `None`
    /// when fewer than two periods move, when `po` or `pc` is zero, or when any
    /// mean is undefined.
    pub fn new(nt: f64, pt: Option<f64>, phi: [Option<f64>; 4]) -> Option<Self> {
        let po = phi[0].zip(phi[1]).map(|(a, b)| a + b);
        let pc = phi[2].zip(phi[3]).map(|(a, b)| a + b);

        if is_degenerate(nt, po, pc) {
            trace!(nt, ?po, ?pc, "degenerate window");
            return None;
        }

        Some(Self {
            pt: pt?,
            po: po?,
            pc: pc?,
        })
    }

    /// Weight of the open-based term, `-4 / po`.
    pub fn open_weight(&self) -> f64 {
        -4.0 / self.po
    }

    /// Weight of the close-based term, `-4 / pc`.
    pub fn close_weight(&self) -> f64 {
        -4.0 / self.pc
    }
}

/// Whether a window has too little movement for an estimate.
///
/// True when fewer than [`MIN_MOVEMENTS`] periods move, or when opens (`po`) or
/// previous closes (`pc`) always sit at the bar extremes. Undefined
/// probabilities are not degenerate by themselves.
pub fn is_degenerate(nt: f64, po: Option<f64>, pc: Option<f64>) -> bool {
    nt < MIN_MOVEMENTS || po == Some(0.0) || pc == Some(0.0)
}

/// Intermediate quantities of a spread estimate.
///
/// `e1`/`e2` are the means of the two spread-squared estimators and `v1`/`v2`
/// their (population) variances within the window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeMoments {
    /// Share of periods with price movement.
    pub pt: f64,
    /// Open-side probability.
    pub po: f64,
    /// Close-side probability.
    pub pc: f64,
    /// Mean of `x1`.
    pub e1: f64,
    /// Mean of `x2`.
    pub e2: f64,
    /// Variance of `x1`.
    pub v1: f64,
    /// Variance of `x2`.
    pub v2: f64,
}

impl EdgeMoments {
    /// Assembles moments from the probabilities and the raw moments of `x1`, `x2`.
    ///
    /// `first` and `second` hold `(E[x], E[x²])` for each estimator. Either being
    /// undefined (no complete period in the window) leaves the spread undefined.
    pub fn new(
        probs: Probabilities,
        first: Option<(f64, f64)>,
        second: Option<(f64, f64)>,
    ) -> Option<Self> {
        let (e1, sq1) = first?;
        let (e2, sq2) = second?;
        Some(Self {
            pt: probs.pt,
            po: probs.po,
            pc: probs.pc,
            e1,
            e2,
            v1: sq1 - e1 * e1,
            v2: sq2 - e2 * e2,
        })
    }

    /// Squared spread `s²`.
    ///
    /// Inverse-variance weighted average of `e1` and `e2`, falling back to the
    /// equally weighted average when `v1 + v2` is not positive.
    pub fn squared_spread(&self) -> f64 {
        let vt = self.v1 + self.v2;
        if vt > 0.0 {
            (self.v2 * self.e1 + self.v1 * self.e2) / vt
        } else {
            (self.e1 + self.e2) / 2.0
        }
    }

    /// Spread estimate, signed with `s²` when `sign` is set.
    pub fn spread(&self, sign: bool) -> f64 {
        signed_root(self.squared_spread(), sign)
    }
}

/// `sqrt(|s2|)`, carrying the sign of `s2` when requested.
///
/// A zero `s2` stays zero either way.
pub fn signed_root(s2: f64, sign: bool) -> f64 {
    let s = s2.abs().sqrt();
    if sign && s2 < 0.0 { -s } else { s }
}

/// Mean of the present values, `None` if there are none.
pub(crate) fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
