//! Factor interface for cross-sectional spread exposures.
//!
//! A factor turns a panel of `symbol`/`date` price rows into one value per
//! symbol as of a date. [`EdgeSpread`] computes the trailing EDGE estimate of
//! every symbol.

use super::{EDGE_COLUMN, ohlc_columns, series_frames};
use crate::{Result, estimator::edge};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A factor that can be computed from market data.
pub trait Factor: Send + Sync + std::fmt::Debug {
    /// Unique snake_case identifier, also the name of the output column.
    fn name(&self) -> &str;

    /// Human-readable description of what this factor measures.
    fn description(&self) -> &str;

    /// Columns required in the input frame.
    fn required_columns(&self) -> &[&str];

    /// Number of trailing periods the computation looks at.
    fn lookback(&self) -> usize;

    /// Raw factor values before standardization.
    ///
    /// Returns a frame with columns `symbol`, `date`, and the factor name.
    fn compute_raw(&self, data: &LazyFrame, date: NaiveDate) -> Result<DataFrame>;

    /// Standardized factor scores (z-scores across symbols per date).
    fn compute(&self, data: &LazyFrame, date: NaiveDate) -> Result<DataFrame> {
        let raw = self.compute_raw(data, date)?;
        cross_sectional_standardize(&raw, self.name())
    }
}

/// Marker trait for factor configuration types.
pub trait FactorConfig: Default + Clone + Send + Sync + std::fmt::Debug {}

impl<T: Default + Clone + Send + Sync + std::fmt::Debug> FactorConfig for T {}

/// A factor that supports runtime configuration.
pub trait ConfigurableFactor: Factor {
    /// Configuration type for this factor.
    type Config: FactorConfig;

    /// Creates the factor with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Returns the current configuration.
    fn config(&self) -> &Self::Config;
}

/// Cross-sectional z-score standardization.
///
/// Replaces `value_column` by `(x - mean(x)) / std(x)` within each date. Missing
/// values stay missing and do not enter the mean or standard deviation.
pub fn cross_sectional_standardize(df: &DataFrame, value_column: &str) -> Result<DataFrame> {
    let result = df
        .clone()
        .lazy()
        .with_column(
            ((col(value_column) - col(value_column).mean()) / col(value_column).std(1))
                .over([col("date")])
                .alias(value_column),
        )
        .collect()?;

    Ok(result)
}

/// Configuration for [`EdgeSpread`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpreadConfig {
    /// Trailing periods per estimate.
    pub lookback: usize,
    /// Keep the sign of `s²` in the estimate.
    pub sign: bool,
    /// Skip missing prices inside the window.
    pub na_rm: bool,
}

impl EdgeSpreadConfig {
    /// 21-day lookback, unsigned, skipping missing prices.
    pub const DEFAULT: Self = Self {
        lookback: 21,
        sign: false,
        na_rm: true,
    };
}

impl Default for EdgeSpreadConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Trailing EDGE bid-ask spread.
///
/// # Interpretation
///
/// - **Higher values**: Wider effective spread, less liquid
/// - **Lower values**: Narrower effective spread, more liquid
///
/// # Required Columns
///
/// - `symbol`: Security identifier
/// - `date`: Trading date, as sortable text
/// - `open`, `high`, `low`, `close`: Daily prices
///
/// # References
///
/// - Ardia, D., E. Guidotti, and T. A. Kroencke (2024). "Efficient estimation of
///   bid-ask spreads from open, high, low, and close prices," Journal of
///   Financial Economics 161, 103916.
#[derive(Debug, Clone)]
pub struct EdgeSpread {
    config: EdgeSpreadConfig,
}

impl EdgeSpread {
    /// Creates the factor with a 21-day lookback.
    pub const fn new() -> Self {
        Self {
            config: EdgeSpreadConfig::DEFAULT,
        }
    }

    /// Creates the factor with a custom lookback.
    pub const fn with_lookback(lookback: usize) -> Self {
        Self {
            config: EdgeSpreadConfig {
                lookback,
                ..EdgeSpreadConfig::DEFAULT
            },
        }
    }
}

impl Default for EdgeSpread {
    fn default() -> Self {
        Self::new()
    }
}

impl Factor for EdgeSpread {
    fn name(&self) -> &str {
        EDGE_COLUMN
    }

    fn description(&self) -> &str {
        "Efficient bid-ask spread estimate from open, high, low and close prices"
    }

    fn required_columns(&self) -> &[&str] {
        &["symbol", "date", "open", "high", "low", "close"]
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn compute_raw(&self, data: &LazyFrame, date: NaiveDate) -> Result<DataFrame> {
        let as_of = date.to_string();
        let history = data
            .clone()
            .filter(col("date").lt_eq(lit(as_of.clone())))
            .collect()?;

        let mut symbols = Vec::new();
        let mut spreads = Vec::new();
        for (symbol, rows) in series_frames(&history)? {
            let Some(symbol) = symbol else {
                debug!(rows = rows.height(), "skipping rows without a symbol");
                continue;
            };
            let last = rows.column("date")?.str()?.get(rows.height().saturating_sub(1));
            if last != Some(as_of.as_str()) {
                continue;
            }

            let window = rows.tail(Some(self.config.lookback));
            let prices = ohlc_columns(&window)?;
            let complete = [&prices.open, &prices.high, &prices.low, &prices.close]
                .iter()
                .all(|column| column.iter().all(Option::is_some));
            let spread = if self.config.na_rm || complete {
                edge(&prices.open, &prices.high, &prices.low, &prices.close, self.config.sign)?
            } else {
                None
            };

            symbols.push(symbol);
            spreads.push(spread);
        }
        debug!(date = %as_of, symbols = symbols.len(), "computed edge spread exposures");

        let dates = vec![as_of; symbols.len()];
        let result = DataFrame::new(vec![
            Column::new("symbol".into(), symbols),
            Column::new("date".into(), dates),
            Column::new(EDGE_COLUMN.into(), spreads),
        ])?;
        Ok(result)
    }
}

impl ConfigurableFactor for EdgeSpread {
    type Config = EdgeSpreadConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const OPEN: [f64; 8] = [100.0, 101.0, 102.5, 101.0, 103.0, 102.0, 104.0, 103.5];
    const HIGH: [f64; 8] = [101.5, 103.0, 103.0, 102.5, 104.5, 103.5, 105.0, 104.5];
    const LOW: [f64; 8] = [99.0, 100.5, 101.0, 100.0, 102.0, 101.0, 103.0, 102.5];
    const CLOSE: [f64; 8] = [101.0, 102.5, 101.5, 102.0, 102.5, 103.0, 104.5, 103.0];

    /// Two symbols: `A` with the sample bars, `B` with prices scaled by 2.
    fn panel() -> LazyFrame {
        let dates: Vec<String> = (1..=8).map(|d| format!("2024-01-0{d}")).collect();
        let scaled = |p: [f64; 8], k: f64| p.iter().map(|v| v * k).collect::<Vec<_>>();
        let both = |p: [f64; 8]| [scaled(p, 1.0), scaled(p, 2.0)].concat();

        df![
            "symbol" => [vec!["A"; 8], vec!["B"; 8]].concat(),
            "date" => [dates.clone(), dates].concat(),
            "open" => both(OPEN),
            "high" => both(HIGH),
            "low" => both(LOW),
            "close" => both(CLOSE)
        ]
        .unwrap()
        .lazy()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_edge_spread_metadata() {
        let factor = EdgeSpread::new();
        assert_eq!(factor.name(), "edge_spread");
        assert_eq!(factor.lookback(), 21);
        assert!(factor.required_columns().contains(&"open"));
        assert!(factor.required_columns().contains(&"close"));
    }

    #[test]
    fn test_edge_spread_with_config() {
        let factor = EdgeSpread::with_config(EdgeSpreadConfig {
            lookback: 5,
            sign: true,
            na_rm: false,
        });
        assert_eq!(factor.lookback(), 5);
        assert!(factor.config().sign);
        assert_eq!(EdgeSpread::with_lookback(30).lookback(), 30);
    }

    #[test]
    fn test_compute_raw_uses_trailing_window() {
        let factor = EdgeSpread::with_lookback(4);
        let raw = factor.compute_raw(&panel(), date(8)).unwrap();
        assert_eq!(raw.height(), 2);

        let values: Vec<Option<f64>> = raw.column(EDGE_COLUMN).unwrap().f64().unwrap().into_iter().collect();
        // Log returns are scale free, so both symbols match the last 4-bar window.
        assert_relative_eq!(values[0].unwrap(), 0.005056892147101896, max_relative = 1e-8);
        assert_relative_eq!(values[1].unwrap(), values[0].unwrap(), max_relative = 1e-10);
    }

    #[test]
    fn test_compute_standardizes_across_symbols() {
        let with_reversed = |p: [f64; 8]| {
            let mut r = p;
            r.reverse();
            [p.to_vec(), r.to_vec()].concat()
        };
        let dates: Vec<String> = (1..=8).map(|d| format!("2024-01-0{d}")).collect();
        let data = df![
            "symbol" => [vec!["A"; 8], vec!["B"; 8]].concat(),
            "date" => [dates.clone(), dates].concat(),
            "open" => with_reversed(OPEN),
            "high" => with_reversed(HIGH),
            "low" => with_reversed(LOW),
            "close" => with_reversed(CLOSE)
        ]
        .unwrap()
        .lazy();

        let factor = EdgeSpread::new();
        let raw = factor.compute_raw(&data, date(8)).unwrap();
        let raw: Vec<f64> = raw.column(EDGE_COLUMN).unwrap().f64().unwrap().into_no_null_iter().collect();
        assert_ne!(raw[0], raw[1]);

        let scores = factor.compute(&data, date(8)).unwrap();
        assert_eq!(scores.height(), 2);
        let z: Vec<f64> = scores.column(EDGE_COLUMN).unwrap().f64().unwrap().into_no_null_iter().collect();
        // Two symbols sit one half range from the mean, i.e. 1/sqrt(2) sample deviations.
        assert_relative_eq!(z[0].abs(), std::f64::consts::FRAC_1_SQRT_2, max_relative = 1e-10);
        assert_relative_eq!(z[0], -z[1], max_relative = 1e-10);
        assert_eq!(z[0] > 0.0, raw[0] > raw[1]);
    }

    #[test]
    fn test_default_config_is_shared() {
        assert_eq!(EdgeSpread::new().config(), &EdgeSpreadConfig::default());
        let custom = EdgeSpread::with_lookback(10);
        assert_eq!(custom.config().lookback, 10);
        assert_eq!(custom.config().na_rm, EdgeSpreadConfig::DEFAULT.na_rm);
    }

    #[test]
    fn test_compute_raw_requires_observation_on_date() {
        let factor = EdgeSpread::new();
        let raw = factor.compute_raw(&panel(), date(9)).unwrap();
        assert_eq!(raw.height(), 0);
    }

    #[test]
    fn test_cross_sectional_standardize() {
        let df = df![
            "symbol" => ["A", "B", "C", "A", "B", "C"],
            "date" => ["2024-01-01", "2024-01-01", "2024-01-01", "2024-01-02", "2024-01-02", "2024-01-02"],
            "value" => [Some(1.0), Some(2.0), Some(3.0), Some(4.0), None, Some(6.0)]
        ]
        .unwrap();

        let result = cross_sectional_standardize(&df, "value").unwrap();
        let values = result.column("value").unwrap().f64().unwrap();

        assert_relative_eq!(values.get(0).unwrap(), -1.0);
        assert_relative_eq!(values.get(1).unwrap(), 0.0);
        assert_relative_eq!(values.get(2).unwrap(), 1.0);
        assert_eq!(values.get(4), None);
        assert_relative_eq!(values.get(3).unwrap(), -std::f64::consts::FRAC_1_SQRT_2);
    }
}
