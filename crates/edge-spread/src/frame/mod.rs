//! DataFrame adapters.
//!
//! Price tables are polars frames with `open`, `high`, `low`, `close` columns,
//! optionally keyed by `symbol` and ordered by `date`. Nulls are missing prices.

mod factor;

pub use factor::{
    ConfigurableFactor, EdgeSpread, EdgeSpreadConfig, Factor, FactorConfig, cross_sectional_standardize,
};

use crate::{
    EdgeError, Result, price::check_lengths, rolling::edge_rolling, simulate::SimulatedBars, window::Window,
};
use polars::prelude::*;
use std::{io::Write, path::Path};
use tracing::debug;

/// Column holding the estimates appended by [`edge_by_symbol`].
pub const EDGE_COLUMN: &str = "edge_spread";

/// Price columns of a frame, as read by [`ohlc_columns`].
pub const OHLC_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];

/// Open, high, low and close prices extracted from a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcColumns {
    /// Opening prices.
    pub open: Vec<Option<f64>>,
    /// High prices.
    pub high: Vec<Option<f64>>,
    /// Low prices.
    pub low: Vec<Option<f64>>,
    /// Closing prices.
    pub close: Vec<Option<f64>>,
}

impl OhlcColumns {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| EdgeError::MissingColumn(name.to_string()))?
        .cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// Extracts the four price columns as floats.
///
/// Integer columns are cast; nulls become `None`.
///
/// # Errors
///
/// [`EdgeError::MissingColumn`] when a price column is absent, or a polars error
/// when a column cannot be cast to float.
pub fn ohlc_columns(df: &DataFrame) -> Result<OhlcColumns> {
    let prices = OhlcColumns {
        open: float_column(df, "open")?,
        high: float_column(df, "high")?,
        low: float_column(df, "low")?,
        close: float_column(df, "close")?,
    };
    check_lengths(&prices.open, &prices.high, &prices.low, &prices.close)?;
    Ok(prices)
}

/// Distinct symbols in order of first appearance.
///
/// Symbols of any type are compared by their text form. Rows without a symbol
/// form their own series, listed as `None`.
pub fn symbols(df: &DataFrame) -> Result<Vec<Option<String>>> {
    Ok(df
        .column("symbol")?
        .cast(&DataType::String)?
        .unique_stable()?
        .str()?
        .into_iter()
        .map(|symbol| symbol.map(str::to_owned))
        .collect())
}

/// Rows of one symbol, or of the rows without a symbol, sorted by date when
/// the frame has a `date` column.
pub fn symbol_frame(df: &DataFrame, symbol: Option<&str>) -> Result<DataFrame> {
    let key = col("symbol").cast(DataType::String);
    let predicate = match symbol {
        Some(symbol) => key.eq(lit(symbol)),
        None => key.is_null(),
    };
    let rows = df.clone().lazy().filter(predicate);
    Ok(sort_by_date(df, rows).collect()?)
}

fn sort_by_date(df: &DataFrame, rows: LazyFrame) -> LazyFrame {
    if df.get_column_names().iter().any(|c| c.as_str() == "date") {
        rows.sort(["date"], SortMultipleOptions::default().with_maintain_order(true))
    } else {
        rows
    }
}

/// Splits a frame into per-series frames keyed by symbol.
///
/// Every input row lands in exactly one series. A frame without a `symbol`
/// column is one unnamed series, and so are the rows with a null symbol.
pub fn series_frames(df: &DataFrame) -> Result<Vec<(Option<String>, DataFrame)>> {
    if df.column("symbol").is_err() {
        let sorted = sort_by_date(df, df.clone().lazy()).collect()?;
        return Ok(vec![(None, sorted)]);
    }
    symbols(df)?
        .into_iter()
        .map(|symbol| {
            let rows = symbol_frame(df, symbol.as_deref())?;
            Ok((symbol, rows))
        })
        .collect()
}

/// Appends an [`EDGE_COLUMN`] with the rolling estimate of every series.
///
/// Rows are regrouped by symbol in order of first appearance and sorted by date
/// within each symbol. Every input row is kept, with its columns unchanged.
///
/// # Errors
///
/// Missing price columns, an invalid window, or polars failures.
pub fn edge_by_symbol(df: &DataFrame, window: &Window, sign: bool, na_rm: bool) -> Result<DataFrame> {
    let mut out: Option<DataFrame> = None;
    for (symbol, mut rows) in series_frames(df)? {
        let prices = ohlc_columns(&rows)?;
        let spreads = edge_rolling(&prices.open, &prices.high, &prices.low, &prices.close, window, sign, na_rm)?;
        debug!(symbol = symbol.as_deref().unwrap_or("-"), rows = rows.height(), "estimated series");

        rows.with_column(Column::new(EDGE_COLUMN.into(), spreads))?;
        match out.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&rows)?;
            }
            None => out = Some(rows),
        }
    }

    match out {
        Some(df) => Ok(df),
        None => {
            let mut empty = df.clear();
            empty.with_column(Column::new(EDGE_COLUMN.into(), Vec::<Option<f64>>::new()))?;
            Ok(empty)
        }
    }
}

/// Reads a CSV price table with a header row.
pub fn read_ohlc_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Writes a frame as CSV with a header row. Missing values are empty cells.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    CsvWriter::new(writer).include_header(true).finish(df)?;
    Ok(())
}

/// Converts simulator output into a frame.
///
/// Columns: `date` (formatted for the simulated time unit), `open`, `high`,
/// `low`, `close`, and `side` when sides were recorded.
pub fn bars_frame(bars: &SimulatedBars) -> Result<DataFrame> {
    let format = bars.units.format();
    let dates: Vec<String> = bars.timestamp.iter().map(|t| t.format(format).to_string()).collect();

    let mut columns = vec![
        Column::new("date".into(), dates),
        Column::new("open".into(), bars.open.as_slice()),
        Column::new("high".into(), bars.high.as_slice()),
        Column::new("low".into(), bars.low.as_slice()),
        Column::new("close".into(), bars.close.as_slice()),
    ];
    if let Some(side) = &bars.side {
        columns.push(Column::new("side".into(), side.as_slice()));
    }
    Ok(DataFrame::new(columns)?)
}
