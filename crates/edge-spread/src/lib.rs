#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/edge-spread/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod components;
pub mod error;
pub mod estimator;
pub mod frame;
pub mod kernel;
pub mod price;
pub mod rolling;
pub mod simulate;
pub mod window;

// Re-export core types
pub use components::Components;
pub use error::{EdgeError, Result};
pub use estimator::{edge, edge_moments};
pub use frame::{
    ConfigurableFactor, EdgeSpread, EdgeSpreadConfig, Factor, FactorConfig, bars_frame, edge_by_symbol,
    ohlc_columns, read_ohlc_csv, write_csv,
};
pub use kernel::{EdgeMoments, Probabilities};
pub use price::PriceValue;
pub use rolling::{edge_expanding, edge_rolling, rolling_moments};
pub use simulate::{SimConfig, SimulatedBars, TimeUnit, simulate};
pub use window::{RollingSum, Window, rolling_mean, rolling_sum};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
