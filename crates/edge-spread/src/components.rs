//! Per-period log-return components and movement indicators.
//!
//! Every period `t >= 1` is paired with its predecessor `t - 1` to form
//!
//! - `r1 = m - o`, `r2 = o - m₋₁`, `r3 = m - c₋₁`, `r4 = c₋₁ - m₋₁`, `r5 = o - c₋₁`
//! - `τ = h ≠ l ∨ l ≠ c₋₁`
//! - `φ1 = τ ∧ o ≠ h`, `φ2 = τ ∧ o ≠ l`, `φ3 = τ ∧ c₋₁ ≠ h₋₁`, `φ4 = τ ∧ c₋₁ ≠ l₋₁`
//!
//! where lower-case letters are log-prices and `m = (h + l) / 2`. Period 0 has
//! no predecessor, so every column is missing there.

use crate::{
    Result,
    price::{PriceValue, check_lengths, log_prices},
};

/// Return components and indicator flags for a price series.
///
/// All columns have the length of the input series and are aligned with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Components {
    /// `m - o`
    pub r1: Vec<Option<f64>>,
    /// `o - m₋₁`
    pub r2: Vec<Option<f64>>,
    /// `m - c₋₁`
    pub r3: Vec<Option<f64>>,
    /// `c₋₁ - m₋₁`
    pub r4: Vec<Option<f64>>,
    /// `o - c₋₁`
    pub r5: Vec<Option<f64>>,
    /// Price movement between the previous close and this bar.
    pub tau: Vec<Option<bool>>,
    /// Open differs from the high.
    pub phi1: Vec<Option<bool>>,
    /// Open differs from the low.
    pub phi2: Vec<Option<bool>>,
    /// Previous close differs from the previous high.
    pub phi3: Vec<Option<bool>>,
    /// Previous close differs from the previous low.
    pub phi4: Vec<Option<bool>>,
}

/// Row `t` of [`Components`] with indicators as 0/1 values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Row {
    pub(crate) r1: Option<f64>,
    pub(crate) r2: Option<f64>,
    pub(crate) r3: Option<f64>,
    pub(crate) r4: Option<f64>,
    pub(crate) r5: Option<f64>,
    pub(crate) tau: Option<f64>,
    pub(crate) phi: [Option<f64>; 4],
}

impl Row {
    /// Whether any component of the row is missing.
    #[cfg(test)]
    pub(crate) fn has_missing(&self) -> bool {
        [self.r1, self.r2, self.r3, self.r4, self.r5, self.tau]
            .iter()
            .chain(self.phi.iter())
            .any(Option::is_none)
    }
}

fn diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

fn differs(a: Option<f64>, b: Option<f64>) -> Option<bool> {
    Some(a? != b?)
}

fn indicator(flag: Option<bool>) -> Option<f64> {
    flag.map(|f| if f { 1.0 } else { 0.0 })
}

impl Components {
    /// Derives components from raw prices.
    ///
    /// Fails only when the price vectors have different lengths.
    pub fn derive<P: PriceValue>(open: &[P], high: &[P], low: &[P], close: &[P]) -> Result<Self> {
        let n = check_lengths(open, high, low, close)?;

        let o = log_prices(open);
        let h = log_prices(high);
        let l = log_prices(low);
        let c = log_prices(close);
        let m: Vec<Option<f64>> = h
            .iter()
            .zip(&l)
            .map(|(h, l)| Some(((*h)? + (*l)?) / 2.0))
            .collect();

        let mut out = Self::missing(n);
        for t in 1..n {
            let (ot, ht, lt, mt) = (o[t], h[t], l[t], m[t]);
            let (h1, l1, c1, m1) = (h[t - 1], l[t - 1], c[t - 1], m[t - 1]);

            out.r1[t] = diff(mt, ot);
            out.r2[t] = diff(ot, m1);
            out.r3[t] = diff(mt, c1);
            out.r4[t] = diff(c1, m1);
            out.r5[t] = diff(ot, c1);

            let tau = match (ht, lt, c1) {
                (Some(h), Some(l), Some(c1)) => Some(h != l || l != c1),
                _ => None,
            };
            // Missing when either operand is, even if tau is false.
            let phi = |a: Option<f64>, b: Option<f64>| -> Option<bool> {
                let moved = differs(a, b)?;
                Some(tau? && moved)
            };

            out.tau[t] = tau;
            out.phi1[t] = phi(ot, ht);
            out.phi2[t] = phi(ot, lt);
            out.phi3[t] = phi(c1, h1);
            out.phi4[t] = phi(c1, l1);
        }

        Ok(out)
    }

    fn missing(n: usize) -> Self {
        Self {
            r1: vec![None; n],
            r2: vec![None; n],
            r3: vec![None; n],
            r4: vec![None; n],
            r5: vec![None; n],
            tau: vec![None; n],
            phi1: vec![None; n],
            phi2: vec![None; n],
            phi3: vec![None; n],
            phi4: vec![None; n],
        }
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.tau.len()
    }

    /// Whether there are no periods.
    pub fn is_empty(&self) -> bool {
        self.tau.is_empty()
    }

    /// Number of periods with `τ = true`.
    pub fn movement_count(&self) -> usize {
        self.tau.iter().filter(|t| **t == Some(true)).count()
    }

    pub(crate) fn row(&self, t: usize) -> Row {
        Row {
            r1: self.r1[t],
            r2: self.r2[t],
            r3: self.r3[t],
            r4: self.r4[t],
            r5: self.r5[t],
            tau: indicator(self.tau[t]),
            phi: [
                indicator(self.phi1[t]),
                indicator(self.phi2[t]),
                indicator(self.phi3[t]),
                indicator(self.phi4[t]),
            ],
        }
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.len()).map(|t| self.row(t))
    }
}
