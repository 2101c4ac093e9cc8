use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use configuration::{AnalysisOptions, Config, LogFormat};
use core_types::{AnalysisResult, ExchangeRates, MarketData, SignalSet};
use engine::{DifferentialEngine, EngineError};
use oracles::{
    FixedRateOracle, FixedSignal, HttpRateOracle, HttpSignalClient, MarketSignal, RateOracle,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod report;

use report::AnalysisReport;

/// The main entry point for the diffmark CLI.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; credentials may come from the real environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "diffmark failed.");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Ranks assets by their expected profit margin across currencies.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults to ./config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log filter (e.g. "debug" or "engine=trace,info").
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Overrides the configured log output style.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a differential analysis and print the ranked recommendations.
    Analyze(AnalyzeArgs),
    /// Check a market data file without calling any oracle.
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// The market data snapshot (JSON).
    #[arg(long)]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// How many times to repeat the analysis after a retryable failure.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Overrides `analysis.timeout_ms`.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Fail instead of degrading when the market signal is unavailable.
    #[arg(long)]
    strict_signal: bool,

    /// Answer rate requests from this JSON snapshot instead of the HTTP oracle.
    #[arg(long)]
    rates_file: Option<PathBuf>,

    /// Answer signal requests from this JSON snapshot instead of the HTTP oracle.
    #[arg(long)]
    signals_file: Option<PathBuf>,

    /// Exit with status 2 when any asset failed or ran without a signal.
    #[arg(long)]
    fail_on_partial: bool,
}

#[derive(Parser)]
struct ValidateArgs {
    /// The market data snapshot (JSON).
    #[arg(long)]
    input: PathBuf,
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = configuration::load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    // Held until exit so the non-blocking file writer flushes.
    let _guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config).await,
        Commands::Validate(args) => handle_validate(args),
    }
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

async fn handle_analyze(args: AnalyzeArgs, config: Config) -> anyhow::Result<ExitCode> {
    let data: MarketData = read_json(&args.input)?;
    let options = analysis_options(&args, &config)?;
    let engine = build_engine(&args, &config)?;

    tracing::info!(
        input = %args.input.display(),
        assets = data.assets.len(),
        timeout_ms = options.timeout.as_millis() as u64,
        "Starting differential analysis."
    );

    let result = analyze_with_retries(&engine, &data, &options, args.retries).await?;
    let report = AnalysisReport::new(&result, &options);

    match args.format {
        OutputFormat::Table => println!("{}", report.to_table()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if args.fail_on_partial && result.is_partial() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

/// Applies the command-line overrides on top of the configured options.
fn analysis_options(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<AnalysisOptions> {
    let mut options = config.analysis.clone();
    if let Some(ms) = args.timeout_ms {
        anyhow::ensure!(ms > 0, "--timeout-ms must be greater than zero");
        options = options.with_timeout(Duration::from_millis(ms));
    }
    if args.strict_signal {
        options = options.with_degraded_signal(false);
    }
    Ok(options)
}

/// Wires the oracles: snapshot files when given, the configured HTTP endpoints otherwise.
fn build_engine(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<DifferentialEngine> {
    let rate_oracle: Arc<dyn RateOracle> = match &args.rates_file {
        Some(path) => {
            let rates: ExchangeRates = read_json(path)?;
            Arc::new(FixedRateOracle::new(rates))
        }
        None => Arc::new(HttpRateOracle::new(&config.oracles.rates)?),
    };

    let market_signal: Arc<dyn MarketSignal> = match &args.signals_file {
        Some(path) => {
            let signals: SignalSet = read_json(path)?;
            Arc::new(FixedSignal::new(signals))
        }
        None => Arc::new(HttpSignalClient::new(&config.oracles.signal)?),
    };

    Ok(DifferentialEngine::new(rate_oracle, market_signal))
}

/// Runs the analysis, repeating it with exponential backoff while the failure is retryable.
async fn analyze_with_retries(
    engine: &DifferentialEngine,
    data: &MarketData,
    options: &AnalysisOptions,
    retries: u32,
) -> Result<AnalysisResult, EngineError> {
    let mut attempt = 0;
    loop {
        match engine.perform_differential_analysis(data, options).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    attempt,
                    retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Analysis failed; retrying."
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// 250ms doubled per attempt, capped at 8s.
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(5);
    Duration::from_millis(250 * factor)
}

// ==============================================================================
// Validate Command Logic
// ==============================================================================

fn handle_validate(args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let data: MarketData = read_json(&args.input)?;
    data.validate()
        .with_context(|| format!("{} is not valid market data", args.input.display()))?;

    println!(
        "{}: {} assets across {} currencies, valid.",
        args.input.display(),
        data.assets.len(),
        data.currencies.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn analyze_args(extra: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["diffmark", "analyze", "--input", "market.json"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Analyze(args) => args,
            Commands::Validate(_) => panic!("expected the analyze command"),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(250));
        assert_eq!(backoff_delay(2), Duration::from_millis(500));
        assert_eq!(backoff_delay(4), Duration::from_millis(2000));
        assert_eq!(backoff_delay(6), Duration::from_millis(8000));
        assert_eq!(backoff_delay(30), Duration::from_millis(8000));
    }

    #[test]
    fn command_line_overrides_configured_options() {
        let args = analyze_args(&["--timeout-ms", "750", "--strict-signal"]);
        let options = analysis_options(&args, &Config::default()).unwrap();

        assert_eq!(options.timeout, Duration::from_millis(750));
        assert!(!options.allow_degraded_signal);
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = analyze_args(&["--timeout-ms", "0"]);
        assert!(analysis_options(&args, &Config::default()).is_err());
    }

    #[test]
    fn market_data_file_is_read_and_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "assets": ["EURUSD"],
                "currencies": ["EUR", "USD"],
                "trade_volumes": {{"EURUSD": "250000"}},
                "financing_rates": {{"EURUSD": "0.004"}},
                "base_currencies": {{"EURUSD": "EUR"}}
            }}"#
        )
        .unwrap();

        let data: MarketData = read_json(file.path()).unwrap();

        assert_eq!(data.trade_volume("EURUSD"), Some(dec!(250000)));
        assert!(data.validate().is_ok());
    }

    #[tokio::test]
    async fn snapshot_oracles_produce_a_report() {
        let dir = tempfile::tempdir().unwrap();
        let rates = dir.path().join("rates.json");
        let signals = dir.path().join("signals.json");
        std::fs::write(&rates, r#"{"reference":"USD","rates":{"EUR":"1.08"}}"#).unwrap();
        std::fs::write(
            &signals,
            r#"{"signals":{"EURUSD":{"movement_score":"0.4","confidence":"0.5"}}}"#,
        )
        .unwrap();
        let args = analyze_args(&[
            "--rates-file",
            rates.to_str().unwrap(),
            "--signals-file",
            signals.to_str().unwrap(),
        ]);
        let data = MarketData::new().with_asset("EURUSD", "EUR", dec!(1000), dec!(0.01));

        let engine = build_engine(&args, &Config::default()).unwrap();
        let result = analyze_with_retries(&engine, &data, &AnalysisOptions::default(), 0)
            .await
            .unwrap();

        assert_eq!(result.margin("EURUSD"), Some(dec!(0.19)));
        assert_eq!(result.margins["EURUSD"].volume_ref, dec!(1080));
    }
}
