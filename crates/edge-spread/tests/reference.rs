mod fixtures;

use edge_spread::{Window, edge, edge_expanding, edge_moments, edge_rolling};
use fixtures::{
    assert_near, assert_series_near, load_edge_ref, load_ohlc, load_rolling_ref, ref_column, ref_scalar,
};

#[test]
fn test_single_window_intermediates() {
    let bars = load_ohlc();
    let expected = load_edge_ref();
    let m = edge_moments(&bars.open, &bars.high, &bars.low, &bars.close)
        .unwrap()
        .unwrap();

    assert_near(m.pt, ref_scalar(&expected, "pt"), "pt");
    assert_near(m.po, ref_scalar(&expected, "po"), "po");
    assert_near(m.pc, ref_scalar(&expected, "pc"), "pc");
    assert_near(m.e1, ref_scalar(&expected, "e1"), "e1");
    assert_near(m.e2, ref_scalar(&expected, "e2"), "e2");
    // Variances are differences of close moments and lose a few digits.
    assert!((m.v1 / ref_scalar(&expected, "v1") - 1.0).abs() < 1e-6, "v1");
    assert!((m.v2 / ref_scalar(&expected, "v2") - 1.0).abs() < 1e-6, "v2");
    assert_near(m.squared_spread(), ref_scalar(&expected, "s2"), "s2");
}

#[test]
fn test_single_window_spread() {
    let bars = load_ohlc();
    let expected = load_edge_ref();

    let spread = edge(&bars.open, &bars.high, &bars.low, &bars.close, false).unwrap().unwrap();
    let signed = edge(&bars.open, &bars.high, &bars.low, &bars.close, true).unwrap().unwrap();
    assert_near(spread, ref_scalar(&expected, "spread"), "spread");
    assert_near(signed, ref_scalar(&expected, "signed"), "signed");
}

#[test]
fn test_rolling_21() {
    let bars = load_ohlc();
    let expected = load_rolling_ref();
    let window = Window::Fixed(21);

    let lenient = edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &window, false, true).unwrap();
    assert_series_near(&lenient, &ref_column(&expected, "rolling_21"), "rolling_21");

    let strict = edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &window, false, false).unwrap();
    assert_series_near(&strict, &ref_column(&expected, "rolling_21_strict"), "rolling_21_strict");
    assert!(strict.iter().filter(|s| s.is_none()).count() > lenient.iter().filter(|s| s.is_none()).count());

    let signed = edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &window, true, true).unwrap();
    assert_series_near(&signed, &ref_column(&expected, "rolling_21_signed"), "rolling_21_signed");
    assert!(signed.iter().flatten().any(|s| *s < 0.0));
}

#[test]
fn test_expanding() {
    let bars = load_ohlc();
    let expected = load_rolling_ref();

    let expanding = edge_expanding(&bars.open, &bars.high, &bars.low, &bars.close, false, true).unwrap();
    assert_series_near(&expanding, &ref_column(&expected, "expanding"), "expanding");

    // The last expanding window is the whole sample.
    let full = edge(&bars.open, &bars.high, &bars.low, &bars.close, false).unwrap().unwrap();
    assert_near(expanding[bars.len() - 1].unwrap(), full, "expanding end");
}

#[test]
fn test_endpoints() {
    let bars = load_ohlc();
    let expected = load_rolling_ref();
    let window = Window::Endpoints(vec![0, 50, 100, 150, 200, 250, 300]);

    let segments = edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &window, false, true).unwrap();
    assert_series_near(&segments, &ref_column(&expected, "monthly"), "monthly");
}

#[test]
fn test_widths_match_fixed_window() {
    let bars = load_ohlc();
    let fixed = edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &Window::Fixed(21), false, true).unwrap();
    let widths = Window::Widths(vec![21; bars.len()]);
    let varying = edge_rolling(&bars.open, &bars.high, &bars.low, &bars.close, &widths, false, true).unwrap();
    assert_eq!(fixed, varying);
}
