//! Synthetic OHLC prices with a known spread.
//!
//! The efficient log-price follows a Gaussian random walk sampled at a fixed
//! number of trades per period. Each trade executes at the ask or the bid with
//! equal probability and is observed with probability `prob`. Bars are built
//! from the observed trades only, so sparse observation produces the missing
//! and flat bars real data has.

use crate::{EdgeError, Result};
use chrono::{NaiveDateTime, TimeDelta};
use derive_more::Display;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Price level of the efficient price before the first trade.
pub const INITIAL_PRICE: f64 = 100.0;

/// Spacing of simulated periods.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    /// One second
    #[display("s")]
    Second,
    /// One minute
    #[display("m")]
    Minute,
    /// One hour
    #[display("h")]
    Hour,
    /// One day
    #[display("d")]
    Day,
    /// One week
    #[display("w")]
    Week,
}

impl TimeUnit {
    /// Length of one period.
    pub fn step(self) -> TimeDelta {
        match self {
            Self::Second => TimeDelta::seconds(1),
            Self::Minute => TimeDelta::minutes(1),
            Self::Hour => TimeDelta::hours(1),
            Self::Day => TimeDelta::days(1),
            Self::Week => TimeDelta::weeks(1),
        }
    }

    /// Timestamp format that shows the resolution of the unit.
    pub const fn format(self) -> &'static str {
        match self {
            Self::Day | Self::Week => "%Y-%m-%d",
            Self::Second | Self::Minute | Self::Hour => "%Y-%m-%d %H:%M:%S",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => Ok(Self::Second),
            "m" | "min" | "minute" | "minutes" => Ok(Self::Minute),
            "h" | "hour" | "hours" => Ok(Self::Hour),
            "d" | "day" | "days" => Ok(Self::Day),
            "w" | "week" | "weeks" => Ok(Self::Week),
            _ => Err(EdgeError::UnsupportedTimeUnit(s.to_string())),
        }
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of bars.
    pub periods: usize,
    /// Trades per bar.
    pub trades: usize,
    /// Probability of observing a trade.
    pub prob: f64,
    /// Relative bid-ask spread.
    pub spread: f64,
    /// Standard deviation of the efficient log-return over one bar.
    pub volatility: f64,
    /// Standard deviation of the jump between consecutive bars.
    pub overnight: f64,
    /// Expected efficient log-return over one bar.
    pub drift: f64,
    /// Spacing of bar timestamps.
    pub units: TimeUnit,
    /// Record the side of each bar's closing trade.
    pub sign: bool,
    /// Timestamp of the first bar.
    pub start: NaiveDateTime,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            periods: 10_000,
            trades: 390,
            prob: 1.0,
            spread: 0.01,
            volatility: 0.03,
            overnight: 0.0,
            drift: 0.0,
            units: TimeUnit::Day,
            sign: false,
            start: NaiveDateTime::default(),
        }
    }
}

impl SimConfig {
    /// Checks every parameter range.
    ///
    /// # Errors
    ///
    /// [`EdgeError::InvalidParameter`] naming the first offending parameter.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EdgeError::InvalidParameter(msg));

        if self.periods == 0 {
            return invalid("periods must be positive".into());
        }
        if self.trades == 0 {
            return invalid("trades must be positive".into());
        }
        if !(self.prob > 0.0 && self.prob <= 1.0) {
            return invalid(format!("prob must be in (0, 1], got {}", self.prob));
        }
        if !(0.0..2.0).contains(&self.spread) {
            return invalid(format!("spread must be in [0, 2), got {}", self.spread));
        }
        if !(self.volatility >= 0.0 && self.volatility.is_finite()) {
            return invalid(format!("volatility must be non-negative, got {}", self.volatility));
        }
        if !(self.overnight >= 0.0 && self.overnight.is_finite()) {
            return invalid(format!("overnight must be non-negative, got {}", self.overnight));
        }
        if !self.drift.is_finite() {
            return invalid(format!("drift must be finite, got {}", self.drift));
        }
        Ok(())
    }
}

/// Simulated bars, aligned by position.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedBars {
    /// Bar timestamps.
    pub timestamp: Vec<NaiveDateTime>,
    /// First observed trade price.
    pub open: Vec<Option<f64>>,
    /// Highest observed trade price.
    pub high: Vec<Option<f64>>,
    /// Lowest observed trade price.
    pub low: Vec<Option<f64>>,
    /// Last observed trade price.
    pub close: Vec<Option<f64>>,
    /// Side of the closing trade, +1 buy and -1 sell, when requested.
    pub side: Option<Vec<Option<f64>>>,
    /// Spacing of the timestamps.
    pub units: TimeUnit,
}

impl SimulatedBars {
    /// Number of bars.
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    /// Whether there are no bars.
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    /// Number of bars without any observed trade.
    pub fn missing_count(&self) -> usize {
        self.close.iter().filter(|c| c.is_none()).count()
    }
}

/// Running OHLC of one bar.
#[derive(Debug, Default)]
struct Bar {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    side: Option<f64>,
}

impl Bar {
    fn observe(&mut self, price: f64, side: f64) {
        self.open.get_or_insert(price);
        self.high = Some(self.high.map_or(price, |h| h.max(price)));
        self.low = Some(self.low.map_or(price, |l| l.min(price)));
        self.close = Some(price);
        self.side = Some(side);
    }
}

/// Simulates `config.periods` bars using `rng`.
///
/// # Errors
///
/// [`EdgeError::InvalidParameter`] when [`SimConfig::validate`] fails or the
/// timestamps overflow.
///
/// # Example
///
/// ```
/// use edge_spread::{SimConfig, simulate};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let config = SimConfig { periods: 50, ..Default::default() };
/// let bars = simulate(&config, &mut StdRng::seed_from_u64(7)).unwrap();
/// assert_eq!(bars.len(), 50);
/// ```
pub fn simulate<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<SimulatedBars> {
    config.validate()?;

    let trades = config.trades as f64;
    let step = Normal::new(config.drift / trades, config.volatility / trades.sqrt())
        .map_err(|e| EdgeError::InvalidParameter(e.to_string()))?;
    let jump = Normal::new(0.0, config.overnight).map_err(|e| EdgeError::InvalidParameter(e.to_string()))?;
    let half = config.spread / 2.0;

    let n = config.periods;
    let mut bars = SimulatedBars {
        timestamp: Vec::with_capacity(n),
        open: Vec::with_capacity(n),
        high: Vec::with_capacity(n),
        low: Vec::with_capacity(n),
        close: Vec::with_capacity(n),
        side: config.sign.then(|| Vec::with_capacity(n)),
        units: config.units,
    };

    let mut log_price = INITIAL_PRICE.ln();
    let mut timestamp = config.start;
    for t in 0..n {
        if t > 0 {
            log_price += jump.sample(rng);
            timestamp = timestamp
                .checked_add_signed(config.units.step())
                .ok_or_else(|| EdgeError::InvalidParameter("timestamps overflow".into()))?;
        }

        let mut bar = Bar::default();
        for _ in 0..config.trades {
            log_price += step.sample(rng);
            let buy = rng.gen_bool(0.5);
            if rng.gen_bool(config.prob) {
                let efficient = log_price.exp();
                let (price, side) = if buy {
                    (efficient * (1.0 + half), 1.0)
                } else {
                    (efficient * (1.0 - half), -1.0)
                };
                bar.observe(price, side);
            }
        }

        bars.timestamp.push(timestamp);
        bars.open.push(bar.open);
        bars.high.push(bar.high);
        bars.low.push(bar.low);
        bars.close.push(bar.close);
        if let Some(side) = bars.side.as_mut() {
            side.push(bar.side);
        }
    }

    debug!(
        periods = n,
        trades = config.trades,
        missing = bars.missing_count(),
        "simulated bars"
    );
    Ok(bars)
}
