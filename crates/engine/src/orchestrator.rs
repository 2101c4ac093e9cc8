use crate::error::EngineError;
use configuration::AnalysisOptions;
use core_types::{Adapter, AnalysisResult, ExchangeRates, MarketData, SignalSet};
use margin::MarginCalculator;
use oracles::{MarketSignal, RateOracle};
use ranker::Ranker;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};

/// Roughly thirty years, the same horizon tokio uses for an unbounded sleep.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// The central orchestrator for a differential analysis.
///
/// Holds no state between calls: every call borrows its input and returns a fresh
/// `AnalysisResult`, so a single engine can serve concurrent callers.
#[derive(Clone)]
pub struct DifferentialEngine {
    rate_oracle: Arc<dyn RateOracle>,
    market_signal: Arc<dyn MarketSignal>,
    calculator: MarginCalculator,
}

impl DifferentialEngine {
    pub fn new(rate_oracle: Arc<dyn RateOracle>, market_signal: Arc<dyn MarketSignal>) -> Self {
        Self {
            rate_oracle,
            market_signal,
            calculator: MarginCalculator::new(),
        }
    }

    /// Computes a profit margin per asset and ranks the assets into recommendations.
    ///
    /// 1. Validates `data` and the ranking thresholds before any oracle is called.
    /// 2. Fetches rates and signals concurrently under one shared deadline.
    /// 3. Computes margins, collecting per-asset failures instead of aborting.
    /// 4. Ranks the computed margins.
    #[tracing::instrument(
        name = "differential_analysis",
        skip_all,
        fields(assets = data.assets.len(), currencies = data.currencies.len())
    )]
    pub async fn perform_differential_analysis(
        &self,
        data: &MarketData,
        opts: &AnalysisOptions,
    ) -> Result<AnalysisResult, EngineError> {
        data.validate()?;
        let ranker = Ranker::new(opts.ranking_thresholds)?;

        let started = Instant::now();
        let (rates, signals) = self.fetch_inputs(data, opts).await?;
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            signals = signals.len(),
            "Oracle inputs received."
        );

        let missing = rates.missing(&data.currencies);
        if !missing.is_empty() {
            tracing::warn!(currencies = ?missing, "Rate oracle omitted requested currencies.");
        }

        let batch = self.calculator.calculate(data, &signals, &rates);
        let recommendations = ranker.rank(&batch.margins, &batch.applied_signals);

        let result = AnalysisResult {
            margins: batch.margins,
            recommendations,
            errors: batch.errors,
            degraded_assets: batch.degraded,
        };

        tracing::info!(
            computed = result.margins.len(),
            failed = result.errors.len(),
            degraded = result.degraded_assets.len(),
            "Differential analysis complete."
        );
        Ok(result)
    }

    /// Issues both oracle calls at once and waits for both, bounded by `opts.timeout`.
    ///
    /// A rate failure ends the call immediately and drops the pending signal request.
    /// A signal failure is absorbed as an empty signal set when degraded signals are
    /// allowed.
    async fn fetch_inputs(
        &self,
        data: &MarketData,
        opts: &AnalysisOptions,
    ) -> Result<(ExchangeRates, SignalSet), EngineError> {
        let now = Instant::now();
        // An unrepresentable deadline means "no deadline"; cap it far in the future.
        let deadline = now
            .checked_add(opts.timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);

        let rates_call = async {
            match timeout_at(deadline, self.rate_oracle.get_exchange_rates(&data.currencies)).await
            {
                Ok(Ok(rates)) => Ok(rates),
                Ok(Err(e)) => Err(EngineError::RateUnavailable(e)),
                Err(_) => Err(EngineError::AdapterTimeout {
                    adapter: Adapter::RateOracle,
                    timeout: opts.timeout,
                }),
            }
        };

        let signal_call = async {
            let failure = match timeout_at(
                deadline,
                self.market_signal.analyze_market(&data.assets, data),
            )
            .await
            {
                Ok(Ok(signals)) => return Ok(signals),
                Ok(Err(e)) => EngineError::SignalUnavailable(e),
                Err(_) => EngineError::AdapterTimeout {
                    adapter: Adapter::MarketSignal,
                    timeout: opts.timeout,
                },
            };

            if opts.allow_degraded_signal {
                tracing::warn!(
                    error = %failure,
                    "Market signal failed; continuing without predictive signals."
                );
                Ok(SignalSet::empty())
            } else {
                Err(failure)
            }
        };

        tokio::try_join!(rates_call, signal_call)
    }
}
