//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::cached_provider::CachedProvider;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::fallback_provider::FallbackProvider;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::synthetic_adapter::{self, SyntheticAdapter};
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    read_date, read_number, source_list, validate_config_file, validate_params,
};
use crate::domain::error::BacktestError;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::sweep::{run_sweep, ParamGrid};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceSeriesProvider;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "macross", about = "Moving-average crossover backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }

    fn default_output(self) -> PathBuf {
        match self {
            ReportFormat::Json => PathBuf::from("backtest_report.json"),
            ReportFormat::Csv => PathBuf::from("backtest_report.csv"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest and write a report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
        /// Override [strategy] short_window
        #[arg(long)]
        short: Option<usize>,
        /// Override [strategy] long_window
        #[arg(long)]
        long: Option<usize>,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a grid of window pairs and rank them
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_delimiter = ',', required = true)]
        short: Vec<usize>,
        #[arg(long, value_delimiter = ',', required = true)]
        long: Vec<usize>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Show the price series the configured sources resolve to
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            format,
            short,
            long,
        } => run_backtest_command(&config, output, format, short, long),
        Command::Validate { config } => run_validate(&config),
        Command::Sweep {
            config,
            short,
            long,
            top,
        } => run_sweep_command(&config, ParamGrid::new(short, long), top),
        Command::Info { config } => run_info(&config),
    }
}

fn fail(err: &BacktestError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = FileConfigAdapter::from_file(path).map_err(|e| fail(&e))?;
    validate_config_file(&adapter).map_err(|e| fail(&e))?;
    Ok(adapter)
}

/// Assemble `BacktestConfig` from `[backtest]` and `[strategy]`, with the
/// documented defaults for missing keys.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BacktestError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        short_window: read_number(config, "strategy", "short_window", defaults.short_window)?,
        long_window: read_number(config, "strategy", "long_window", defaults.long_window)?,
        initial_capital: read_number(
            config,
            "backtest",
            "initial_capital",
            defaults.initial_capital,
        )?,
        fee_rate: read_number(config, "backtest", "fee_rate", defaults.fee_rate)?,
        slippage_rate: read_number(config, "backtest", "slippage_rate", defaults.slippage_rate)?,
        stop_loss_pct: read_number(config, "strategy", "stop_loss_pct", defaults.stop_loss_pct)?,
        take_profit_pct: read_number(
            config,
            "strategy",
            "take_profit_pct",
            defaults.take_profit_pct,
        )?,
        trailing_stop_pct: read_number(
            config,
            "strategy",
            "trailing_stop_pct",
            defaults.trailing_stop_pct,
        )?,
        position_size_pct: read_number(
            config,
            "strategy",
            "position_size_pct",
            defaults.position_size_pct,
        )?,
    })
}

/// Provider chain for `[data] sources`, in fallback order, optionally
/// wrapped in a cache.
pub fn build_provider(
    config: &dyn ConfigPort,
) -> Result<Box<dyn PriceSeriesProvider>, BacktestError> {
    let mut providers: Vec<Box<dyn PriceSeriesProvider>> = Vec::new();

    for source in source_list(config) {
        match source.as_str() {
            "csv" => {
                let path = config.get_string("data", "csv_path").ok_or_else(|| {
                    BacktestError::ConfigMissing {
                        section: "data".into(),
                        key: "csv_path".into(),
                    }
                })?;
                let start = read_date(config, "data", "start_date")?;
                let end = read_date(config, "data", "end_date")?;
                providers.push(Box::new(CsvAdapter::new(path).with_date_range(start, end)));
            }
            "synthetic" => {
                let start = read_date(config, "data", "synthetic_start")?
                    .unwrap_or_else(SyntheticAdapter::default_start_date);
                providers.push(Box::new(SyntheticAdapter::new(
                    read_number(config, "data", "synthetic_seed", synthetic_adapter::DEFAULT_SEED)?,
                    read_number(config, "data", "synthetic_bars", synthetic_adapter::DEFAULT_BARS)?,
                    start,
                    read_number(
                        config,
                        "data",
                        "synthetic_start_price",
                        synthetic_adapter::DEFAULT_START_PRICE,
                    )?,
                )));
            }
            other => {
                return Err(BacktestError::invalid(
                    "data",
                    "sources",
                    format!("unknown source '{other}'"),
                ));
            }
        }
    }

    let chain = FallbackProvider::new(providers);
    if config.get_bool("data", "cache", true) {
        Ok(Box::new(CachedProvider::new(chain)))
    } else {
        Ok(Box::new(chain))
    }
}

fn load_series(config: &dyn ConfigPort) -> Result<PriceSeries, BacktestError> {
    build_provider(config)?.fetch()
}

fn resolve_format(
    config: &dyn ConfigPort,
    format: Option<ReportFormat>,
    output: Option<&Path>,
) -> ReportFormat {
    format
        .or_else(|| {
            config
                .get_string("report", "format")
                .and_then(|f| ReportFormat::parse(&f))
        })
        .or_else(|| {
            output
                .and_then(|p| p.extension())
                .and_then(|ext| ReportFormat::parse(&ext.to_string_lossy()))
        })
        .unwrap_or(ReportFormat::Json)
}

fn run_backtest_command(
    config_path: &Path,
    output: Option<PathBuf>,
    format: Option<ReportFormat>,
    short: Option<usize>,
    long: Option<usize>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if let Some(short) = short {
        bt_config.short_window = short;
    }
    if let Some(long) = long {
        bt_config.long_window = long;
    }
    if let Err(e) = validate_params(&bt_config) {
        return fail(&e);
    }

    let series = match load_series(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    eprintln!(
        "Loaded {} bars ({} to {})",
        series.len(),
        series.first_date(),
        series.last_date()
    );

    let result = match run_backtest(&series, &bt_config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    print_summary(&result);

    let output = output.or_else(|| adapter.get_string("report", "output").map(PathBuf::from));
    let format = resolve_format(&adapter, format, output.as_deref());
    let output = output.unwrap_or_else(|| format.default_output());

    let written = match format {
        ReportFormat::Json => JsonReportAdapter::new().write(&result, &output),
        ReportFormat::Csv => CsvReportAdapter::new().write(&result, &output),
    };
    match written {
        Ok(paths) => {
            for path in paths {
                eprintln!("Report written to: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.summary;
    let optional = |v: Option<f64>, scale: f64| match v {
        Some(v) => format!("{:.2}", v * scale),
        None => "n/a".to_string(),
    };

    eprintln!(
        "\n=== SMA({}) / SMA({}) ===",
        result.params.short_window, result.params.long_window
    );
    eprintln!("Total Return:     {:.2}%", m.total_return * 100.0);
    eprintln!("CAGR:             {:.2}%", m.cagr * 100.0);
    eprintln!("Volatility:       {:.2}%", m.annualized_volatility * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!(
        "Sortino Ratio:    {}",
        m.sortino_ratio
            .map_or_else(|| "unbounded".to_string(), |s| format!("{s:.2}"))
    );
    eprintln!("Calmar Ratio:     {:.2}", m.calmar_ratio);
    eprintln!("Max Drawdown:     {:.1}%", m.max_drawdown * 100.0);
    eprintln!("Max DD Duration:  {} bars", m.max_drawdown_duration);
    eprintln!("Total Trades:     {}", m.num_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {}", optional(m.profit_factor, 1.0));
    eprintln!("Avg Win:          {}%", optional(m.avg_win_pct, 100.0));
    eprintln!("Avg Loss:         {}%", optional(m.avg_loss_pct, 100.0));
    eprintln!("Avg Hold:         {} days", optional(m.avg_hold_days, 1.0));
    eprintln!("Exposure:         {:.1}%", m.exposure * 100.0);
    eprintln!("Final Equity:     ${:.2}", m.final_equity);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let bt_config = match build_backtest_config(&adapter).and_then(|c| {
        validate_params(&c)?;
        Ok(c)
    }) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    eprintln!("\nSources:          {}", source_list(&adapter).join(" -> "));
    eprintln!(
        "Strategy:         SMA({}) / SMA({})",
        bt_config.short_window, bt_config.long_window
    );
    eprintln!("Initial Capital:  ${:.2}", bt_config.initial_capital);
    eprintln!(
        "Costs:            fee {} + slippage {}",
        bt_config.fee_rate, bt_config.slippage_rate
    );
    eprintln!(
        "Risk Exits:       stop {}% / take {}% / trail {}%",
        bt_config.stop_loss_pct, bt_config.take_profit_pct, bt_config.trailing_stop_pct
    );
    eprintln!("Position Size:    {}", bt_config.position_size_pct);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_sweep_command(config_path: &Path, grid: ParamGrid, top: usize) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let base = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    if grid.pairs().is_empty() {
        let err = BacktestError::invalid(
            "strategy",
            "short_window",
            "no window pair with short < long in the sweep grid",
        );
        return fail(&err);
    }

    let series = match load_series(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let outcomes = match run_sweep(&series, &base, &grid) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    println!(
        "{:>6} {:>6} {:>10} {:>8} {:>9} {:>7}",
        "short", "long", "return%", "sharpe", "maxdd%", "trades"
    );
    for outcome in outcomes.iter().take(top) {
        let m = &outcome.summary;
        println!(
            "{:>6} {:>6} {:>10.2} {:>8.2} {:>9.2} {:>7}",
            outcome.short_window,
            outcome.long_window,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.num_trades,
        );
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let series = match load_series(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let closes = series.closes();
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    println!("Sources:  {}", source_list(&adapter).join(" -> "));
    println!("Bars:     {}", series.len());
    println!("Range:    {} to {}", series.first_date(), series.last_date());
    println!(
        "Close:    first {:.2}, last {:.2}, min {:.2}, max {:.2}",
        closes[0],
        closes[closes.len() - 1],
        min,
        max
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn build_config_uses_defaults() {
        let c = build_backtest_config(&config("[backtest]\n")).unwrap();
        assert_eq!(c, BacktestConfig::default());
    }

    #[test]
    fn build_config_reads_sections() {
        let c = build_backtest_config(&config(
            "[backtest]\ninitial_capital = 5000\nfee_rate = 0\n\
             [strategy]\nshort_window = 5\nlong_window = 30\nstop_loss_pct = 2.5\n",
        ))
        .unwrap();
        assert_eq!(c.short_window, 5);
        assert_eq!(c.long_window, 30);
        assert_eq!(c.initial_capital, 5000.0);
        assert_eq!(c.fee_rate, 0.0);
        assert_eq!(c.stop_loss_pct, 2.5);
    }

    #[test]
    fn build_config_rejects_unparseable_number() {
        let err = build_backtest_config(&config("[strategy]\nlong_window = fifty\n")).unwrap_err();
        assert!(matches!(err, BacktestError::ConfigInvalid { key, .. } if key == "long_window"));
    }

    #[test]
    fn provider_defaults_to_cached_synthetic() {
        let provider = build_provider(&config("[data]\nsynthetic_bars = 120\n")).unwrap();
        assert_eq!(provider.name(), "fallback");
        assert_eq!(provider.fetch().unwrap().len(), 120);
    }

    #[test]
    fn provider_falls_back_to_synthetic() {
        let provider = build_provider(&config(
            "[data]\nsources = csv,synthetic\ncsv_path = /nonexistent.csv\nsynthetic_bars = 80\ncache = false\n",
        ))
        .unwrap();
        assert_eq!(provider.fetch().unwrap().len(), 80);
    }

    #[test]
    fn resolve_format_precedence() {
        let c = config("[report]\nformat = csv\n");
        assert_eq!(resolve_format(&c, Some(ReportFormat::Json), None), ReportFormat::Json);
        assert_eq!(resolve_format(&c, None, None), ReportFormat::Csv);

        let empty = config("[report]\n");
        assert_eq!(
            resolve_format(&empty, None, Some(Path::new("out/run.csv"))),
            ReportFormat::Csv
        );
        assert_eq!(resolve_format(&empty, None, None), ReportFormat::Json);
    }

    #[test]
    fn cli_parses_sweep_lists() {
        let cli = Cli::try_parse_from([
            "macross", "sweep", "-c", "run.ini", "--short", "5,10", "--long", "50,100", "--top",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Sweep {
                short, long, top, ..
            } => {
                assert_eq!(short, vec![5, 10]);
                assert_eq!(long, vec![50, 100]);
                assert_eq!(top, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
