//! Window specifications and the rolling aggregation primitive.
//!
//! Every window shape is resolved upfront into one half-open range of price
//! rows per output position. A single prefix-sum reduction then serves all
//! shapes.
//!
//! Per-period quantities (returns, indicators) need the previous row, so the
//! first row of each window only serves as a lag source: the rolling sums and
//! means below aggregate rows `start + 1 .. end` of a window `start..end`.

use crate::{EdgeError, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Window over which each output position is estimated.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Window {
    /// Trailing window of a fixed number of periods, clipped at the start.
    #[display("fixed({_0})")]
    Fixed(usize),
    /// Trailing window with its own width at every position.
    #[display("widths")]
    Widths(Vec<usize>),
    /// Segment boundaries, in the convention of `xts::endpoints`.
    ///
    /// `[0, 21, 42]` defines the segments `0..21` and `21..42`. Every position
    /// of a segment is estimated over the whole segment. Positions before the
    /// first boundary or at/after the last one have no window.
    #[display("endpoints")]
    Endpoints(Vec<usize>),
    /// All periods up to and including the position.
    #[display("expanding")]
    Expanding,
}

impl Window {
    /// Resolves the window into price-row ranges for a series of length `n`.
    ///
    /// # Errors
    ///
    /// [`EdgeError::InvalidWindow`] for a zero width, a width vector whose length
    /// differs from `n`, or endpoints that are empty, not strictly increasing, or
    /// beyond `n`.
    pub fn resolve(&self, n: usize) -> Result<Vec<Option<Range<usize>>>> {
        match self {
            Self::Fixed(0) => Err(EdgeError::InvalidWindow("width must be positive".into())),
            Self::Fixed(width) => Ok((0..n).map(|i| Some(trailing(i, *width))).collect()),
            Self::Widths(widths) => {
                if widths.len() != n {
                    return Err(EdgeError::InvalidWindow(format!(
                        "{} widths for {n} observations",
                        widths.len()
                    )));
                }
                if let Some(i) = widths.iter().position(|w| *w == 0) {
                    return Err(EdgeError::InvalidWindow(format!(
                        "width at position {i} must be positive"
                    )));
                }
                Ok(widths
                    .iter()
                    .enumerate()
                    .map(|(i, w)| Some(trailing(i, *w)))
                    .collect())
            }
            Self::Endpoints(ends) => resolve_endpoints(ends, n),
            Self::Expanding => Ok((0..n).map(|i| Some(0..i + 1)).collect()),
        }
    }
}

/// Window of `width` rows ending at row `i`, clipped at row 0.
fn trailing(i: usize, width: usize) -> Range<usize> {
    (i + 1).saturating_sub(width)..i + 1
}

fn resolve_endpoints(ends: &[usize], n: usize) -> Result<Vec<Option<Range<usize>>>> {
    if ends.is_empty() {
        return Err(EdgeError::InvalidWindow("endpoints must not be empty".into()));
    }
    if let Some(pair) = ends.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(EdgeError::InvalidWindow(format!(
            "endpoints must be strictly increasing, got {} before {}",
            pair[0], pair[1]
        )));
    }
    if let Some(last) = ends.last().filter(|last| **last > n) {
        return Err(EdgeError::InvalidWindow(format!(
            "endpoint {last} beyond {n} observations"
        )));
    }

    let mut bounds = vec![None; n];
    for pair in ends.windows(2) {
        let segment = pair[0]..pair[1];
        for slot in &mut bounds[segment.clone()] {
            *slot = Some(segment.clone());
        }
    }
    Ok(bounds)
}

/// Rows of a window that carry per-period values.
fn value_rows(window: &Range<usize>) -> Range<usize> {
    (window.start + 1).min(window.end)..window.end
}

/// Prefix sums over a per-period series with missing values.
///
/// Answers sum, mean and count queries for any row range in constant time.
/// Each prefix is kept as an unevaluated pair `hi + lo` with the rounding error
/// of every addition carried in `lo`, so a window far from the start of a long
/// series sums as accurately as a direct loop over it.
#[derive(Debug, Clone)]
pub struct RollingSum {
    hi: Vec<f64>,
    lo: Vec<f64>,
    present: Vec<usize>,
}

/// `a + b` and its exact rounding error.
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    (s, (a - (s - bb)) + (b - bb))
}

impl RollingSum {
    /// Builds the prefix sums of `values`.
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let values = values.into_iter();
        let capacity = values.size_hint().0 + 1;
        let mut hi = Vec::with_capacity(capacity);
        let mut lo = Vec::with_capacity(capacity);
        let mut present = Vec::with_capacity(capacity);
        hi.push(0.0);
        lo.push(0.0);
        present.push(0);

        let (mut sum, mut err, mut count) = (0.0, 0.0, 0);
        for value in values {
            if let Some(v) = value {
                let (s, e) = two_sum(sum, v);
                sum = s;
                err += e;
                count += 1;
            }
            hi.push(sum);
            lo.push(err);
            present.push(count);
        }

        Self { hi, lo, present }
    }

    /// Number of rows in the series.
    pub fn len(&self) -> usize {
        self.hi.len() - 1
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of present values in `rows`.
    pub fn count(&self, rows: Range<usize>) -> usize {
        self.present[rows.end] - self.present[rows.start]
    }

    /// Number of missing values in `rows`.
    pub fn missing(&self, rows: Range<usize>) -> usize {
        rows.len() - self.count(rows)
    }

    /// Sum of `rows`.
    ///
    /// With `na_rm` missing values are skipped, otherwise any missing value makes
    /// the sum missing. A range without present values has no sum.
    pub fn sum(&self, rows: Range<usize>, na_rm: bool) -> Option<f64> {
        let count = self.count(rows.clone());
        if count == 0 || (!na_rm && self.missing(rows.clone()) > 0) {
            return None;
        }
        let (a, b) = (rows.start, rows.end);
        Some((self.hi[b] - self.hi[a]) + (self.lo[b] - self.lo[a]))
    }

    /// Mean of `rows`, with the missing-value policy of [`sum`](Self::sum).
    pub fn mean(&self, rows: Range<usize>, na_rm: bool) -> Option<f64> {
        let count = self.count(rows.clone());
        self.sum(rows, na_rm).map(|s| s / count as f64)
    }
}

/// Rolling sum of a per-period series.
///
/// Position `i` holds the sum over the window ending at `i`, excluding the
/// window's first row.
pub fn rolling_sum(values: &[Option<f64>], window: &Window, na_rm: bool) -> Result<Vec<Option<f64>>> {
    rolling(values, window, |sums, rows| sums.sum(rows, na_rm))
}

/// Rolling mean of a per-period series.
///
/// Position `i` holds the mean over the window ending at `i`, excluding the
/// window's first row.
pub fn rolling_mean(values: &[Option<f64>], window: &Window, na_rm: bool) -> Result<Vec<Option<f64>>> {
    rolling(values, window, |sums, rows| sums.mean(rows, na_rm))
}

fn rolling<F>(values: &[Option<f64>], window: &Window, reduce: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(&RollingSum, Range<usize>) -> Option<f64>,
{
    let sums = RollingSum::new(values.iter().copied());
    let bounds = window.resolve(values.len())?;
    Ok(bounds
        .iter()
        .map(|b| b.as_ref().and_then(|w| reduce(&sums, value_rows(w))))
        .collect())
}

/// Value rows of every resolved window.
pub(crate) fn resolve_value_rows(window: &Window, n: usize) -> Result<Vec<Option<Range<usize>>>> {
    Ok(window
        .resolve(n)?
        .into_iter()
        .map(|b| b.map(|w| value_rows(&w)))
        .collect())
}
