//! CLI for the edge-spread estimator.
//!
//! Estimates bid-ask spreads from CSV price tables and simulates OHLC bars with
//! a known spread. Logging goes to stderr and is controlled by `RUST_LOG`.

use clap::{Args, Parser, Subcommand};
use edge_spread::{
    SimConfig, TimeUnit, Window, bars_frame, edge_by_symbol, edge_moments, frame::series_frames, ohlc_columns,
    read_ohlc_csv, simulate, write_csv,
};
use polars::prelude::DataFrame;
use rand::{SeedableRng, rngs::StdRng};
use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "edge-spread")]
#[command(about = "Efficient bid-ask spread estimation from OHLC prices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate one spread per series over all rows
    Estimate {
        /// CSV file with open, high, low, close (and optionally symbol, date)
        file: PathBuf,
        /// Keep the sign of the squared spread
        #[arg(long)]
        sign: bool,
        /// Print estimates and intermediates as JSON
        #[arg(long)]
        json: bool,
    },
    /// Append a rolling spread estimate to every row
    Rolling {
        /// CSV file with open, high, low, close (and optionally symbol, date)
        file: PathBuf,
        /// Trailing window width
        #[arg(long, conflicts_with = "expanding", required_unless_present = "expanding")]
        width: Option<usize>,
        /// Use all rows up to each position
        #[arg(long)]
        expanding: bool,
        /// Keep the sign of the squared spread
        #[arg(long)]
        sign: bool,
        /// Skip missing prices inside windows
        #[arg(long)]
        na_rm: bool,
        /// Output CSV file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Simulate OHLC bars with a known spread
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Number of bars
    #[arg(long, default_value_t = 10_000)]
    periods: usize,
    /// Trades per bar
    #[arg(long, default_value_t = 390)]
    trades: usize,
    /// Probability of observing a trade
    #[arg(long, default_value_t = 1.0)]
    prob: f64,
    /// Relative bid-ask spread
    #[arg(long, default_value_t = 0.01)]
    spread: f64,
    /// Volatility of the efficient price per bar
    #[arg(long, default_value_t = 0.03)]
    volatility: f64,
    /// Volatility of the jump between bars
    #[arg(long, default_value_t = 0.0)]
    overnight: f64,
    /// Expected efficient return per bar
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    drift: f64,
    /// Bar spacing: s, m, h, d or w
    #[arg(long, default_value = "d")]
    units: TimeUnit,
    /// Record the side of each bar's closing trade
    #[arg(long)]
    sign: bool,
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    /// Output CSV file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl SimulateArgs {
    fn config(&self) -> SimConfig {
        SimConfig {
            periods: self.periods,
            trades: self.trades,
            prob: self.prob,
            spread: self.spread,
            volatility: self.volatility,
            overnight: self.overnight,
            drift: self.drift,
            units: self.units,
            sign: self.sign,
            ..Default::default()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Estimate { file, sign, json } => {
            let stdout = std::io::stdout();
            estimate(&file, sign, json, &mut stdout.lock())
        }
        Commands::Rolling {
            file,
            width,
            expanding,
            sign,
            na_rm,
            output,
        } => {
            let window = match width {
                Some(width) if !expanding => Window::Fixed(width),
                _ => Window::Expanding,
            };
            let mut df = edge_by_symbol(&read_ohlc_csv(&file)?, &window, sign, na_rm)?;
            info!(rows = df.height(), %window, "rolling estimates");
            emit(&mut df, output.as_deref())
        }
        Commands::Simulate(args) => {
            let config = args.config();
            let mut rng = args.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
            let bars = simulate(&config, &mut rng)?;
            info!(periods = bars.len(), missing = bars.missing_count(), "simulated bars");
            emit(&mut bars_frame(&bars)?, args.output.as_deref())
        }
    }
}

/// One estimate per series, as text lines or a JSON array.
fn estimate<W: Write>(file: &Path, sign: bool, json: bool, out: &mut W) -> CliResult<()> {
    let df = read_ohlc_csv(file)?;
    let keyed = df.column("symbol").is_ok();

    let mut records = Vec::new();
    for (symbol, rows) in series_frames(&df)? {
        let prices = ohlc_columns(&rows)?;
        let moments = edge_moments(&prices.open, &prices.high, &prices.low, &prices.close)?;
        let spread = moments.map(|m| m.spread(sign));

        if json {
            records.push(serde_json::json!({
                "symbol": symbol,
                "observations": rows.height(),
                "spread": spread,
                "moments": moments,
            }));
        } else {
            let value = spread.map_or_else(|| "NA".to_string(), |s| s.to_string());
            match symbol {
                Some(symbol) => writeln!(out, "{symbol}\t{value}")?,
                None if keyed => writeln!(out, "NA\t{value}")?,
                None => writeln!(out, "{value}")?,
            }
        }
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Writes a frame as CSV to `path`, or to stdout.
fn emit(df: &mut DataFrame, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(path) => {
            write_csv(df, BufWriter::new(File::create(path)?))?;
            info!(path = %path.display(), "wrote csv");
        }
        None => write_csv(df, std::io::stdout().lock())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("edge-spread-cli-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_parse_rolling() {
        let cli = Cli::try_parse_from(["edge-spread", "rolling", "prices.csv", "--width", "21", "--na-rm"]).unwrap();
        match cli.command {
            Commands::Rolling {
                width, expanding, na_rm, ..
            } => {
                assert_eq!(width, Some(21));
                assert!(!expanding);
                assert!(na_rm);
            }
            _ => panic!("expected rolling"),
        }
    }

    #[test]
    fn test_rolling_requires_window() {
        assert!(Cli::try_parse_from(["edge-spread", "rolling", "prices.csv"]).is_err());
        assert!(
            Cli::try_parse_from(["edge-spread", "rolling", "prices.csv", "--width", "5", "--expanding"]).is_err()
        );
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from(["edge-spread", "simulate", "--units", "h", "--seed", "3"]).unwrap();
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let config = args.config();
        assert_eq!(config.units, TimeUnit::Hour);
        assert_eq!(config.periods, SimConfig::default().periods);
        assert_eq!(args.seed, Some(3));
    }

    #[test]
    fn test_unsupported_units_rejected() {
        assert!(Cli::try_parse_from(["edge-spread", "simulate", "--units", "y"]).is_err());
    }

    #[test]
    fn test_simulate_then_estimate() {
        let path = temp_path("bars.csv");
        let config = SimConfig {
            periods: 500,
            ..Default::default()
        };
        let bars = simulate(&config, &mut StdRng::seed_from_u64(17)).unwrap();
        emit(&mut bars_frame(&bars).unwrap(), Some(&path)).unwrap();

        let mut out = Vec::new();
        estimate(&path, false, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let spread: f64 = text.trim().parse().unwrap();
        assert!(spread > 0.0 && spread < 0.05, "spread {spread}");

        let mut out = Vec::new();
        estimate(&path, true, true, &mut out).unwrap();
        let records: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(records[0]["observations"], 500);
        assert!(records[0]["moments"]["pt"].as_f64().is_some());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_estimate_numeric_and_null_symbols() {
        let path = temp_path("permno.csv");
        let rows = [
            "symbol,date,open,high,low,close",
            "10107,2024-01-01,100.0,101.5,99.0,101.0",
            "10107,2024-01-02,101.0,103.0,100.5,102.5",
            ",2024-01-02,50.0,52.0,49.0,51.0",
            "10107,2024-01-03,102.5,103.0,101.0,101.5",
            "10107,2024-01-04,101.0,102.5,100.0,102.0",
        ];
        std::fs::write(&path, rows.join("\n") + "\n").unwrap();

        let mut out = Vec::new();
        estimate(&path, false, false, &mut out).unwrap();
        std::fs::remove_file(&path).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("10107\t"));
        assert_eq!(lines[1], "NA\tNA");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut out = Vec::new();
        assert!(estimate(&temp_path("absent.csv"), false, false, &mut out).is_err());
    }
}
