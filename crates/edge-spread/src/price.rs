//! Price cells and the log transform.
//!
//! Prices enter the estimator as slices of any [`PriceValue`]. Absent prices are
//! carried as `None` from here on; nothing downstream relies on NaN propagation.

use crate::{EdgeError, Result};

/// A single price observation that may be absent.
pub trait PriceValue: Copy {
    /// The price, or `None` when the observation is missing.
    fn price(self) -> Option<f64>;
}

/// Non-finite floats (NaN, ±inf) mark a missing observation.
impl PriceValue for f64 {
    fn price(self) -> Option<f64> {
        self.is_finite().then_some(self)
    }
}

impl PriceValue for Option<f64> {
    fn price(self) -> Option<f64> {
        self.and_then(|p| p.price())
    }
}

impl<P: PriceValue> PriceValue for &P {
    fn price(self) -> Option<f64> {
        (*self).price()
    }
}

/// Natural log of a strictly positive price.
///
/// Missing and non-positive prices both map to `None`.
pub fn log_price<P: PriceValue>(p: P) -> Option<f64> {
    p.price().filter(|v| *v > 0.0).map(f64::ln)
}

/// Log-transforms a whole price vector.
pub(crate) fn log_prices<P: PriceValue>(prices: &[P]) -> Vec<Option<f64>> {
    prices.iter().map(log_price).collect()
}

/// Validates that the four price vectors are aligned and returns their length.
pub fn check_lengths<P: PriceValue>(open: &[P], high: &[P], low: &[P], close: &[P]) -> Result<usize> {
    let n = open.len();
    if high.len() != n || low.len() != n || close.len() != n {
        return Err(EdgeError::LengthMismatch {
            open: n,
            high: high.len(),
            low: low.len(),
            close: close.len(),
        });
    }
    Ok(n)
}
