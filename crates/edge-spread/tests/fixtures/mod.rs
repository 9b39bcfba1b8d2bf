#![allow(dead_code)]

use edge_spread::{frame::OhlcColumns, ohlc_columns, read_ohlc_csv};
use polars::prelude::*;

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/data");

fn path(name: &str) -> String {
    format!("{DATA_DIR}/{name}")
}

/// 300 simulated daily bars with gaps, a flat run and partially missing bars.
pub fn load_ohlc() -> OhlcColumns {
    let df = read_ohlc_csv(path("ohlc.csv")).expect("readable OHLC fixture");
    ohlc_columns(&df).expect("OHLC columns")
}

/// Expected single-window intermediates over the whole OHLC fixture.
pub fn load_edge_ref() -> DataFrame {
    read_ohlc_csv(path("edge.csv")).expect("readable edge reference")
}

/// Expected rolling estimates, one column per window setup.
pub fn load_rolling_ref() -> DataFrame {
    read_ohlc_csv(path("rolling.csv")).expect("readable rolling reference")
}

/// Float column of a reference frame, nulls as `None`.
pub fn ref_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .and_then(|c| c.cast(&DataType::Float64))
        .expect("reference column")
        .f64()
        .expect("float column")
        .into_iter()
        .collect()
}

/// Scalar of a single-row reference frame.
pub fn ref_scalar(df: &DataFrame, name: &str) -> f64 {
    ref_column(df, name)[0].expect("reference value")
}

/// Assert two f64 values agree to a relative tolerance.
pub fn assert_near(actual: f64, expected: f64, context: &str) {
    let tolerance = 1e-9 * expected.abs().max(1e-3);
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected}, got {actual} (diff {diff:.3e})"
    );
}

/// Assert two series agree position by position, including missing values.
pub fn assert_series_near(actual: &[Option<f64>], expected: &[Option<f64>], context: &str) {
    assert_eq!(actual.len(), expected.len(), "{context}: length");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        match (a, e) {
            (Some(a), Some(e)) => assert_near(*a, *e, &format!("{context}[{i}]")),
            (None, None) => {}
            _ => panic!("{context}[{i}]: expected {e:?}, got {a:?}"),
        }
    }
}
