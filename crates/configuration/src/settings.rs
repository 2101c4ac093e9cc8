use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its `Default`, so an empty file is a valid config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisOptions,
    pub oracles: OracleSettings,
    pub logging: LoggingConfig,
}

/// Per-call options for a differential analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// A single deadline shared by both oracle calls.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// When true, a failed or late market signal downgrades the result instead of failing it.
    pub allow_degraded_signal: bool,
    pub ranking_thresholds: RankingThresholds,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            allow_degraded_signal: true,
            ranking_thresholds: RankingThresholds::default(),
        }
    }
}

impl AnalysisOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_degraded_signal(mut self, allow: bool) -> Self {
        self.allow_degraded_signal = allow;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RankingThresholds) -> Self {
        self.ranking_thresholds = thresholds;
        self
    }
}

/// Margin cut-offs between recommendation bands.
///
/// A margin strictly above `strong_buy` is a Strong Buy, strictly above `buy` a Buy,
/// at or above `avoid` a Hold, at or above `strong_avoid` an Avoid, and anything
/// lower a Strong Avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingThresholds {
    pub strong_buy: Decimal,
    pub buy: Decimal,
    pub avoid: Decimal,
    pub strong_avoid: Decimal,
}

impl Default for RankingThresholds {
    fn default() -> Self {
        Self {
            strong_buy: dec!(0.05),
            buy: dec!(0.01),
            avoid: dec!(-0.01),
            strong_avoid: dec!(-0.05),
        }
    }
}

impl RankingThresholds {
    /// The bands must not overlap: `strong_buy >= buy >= avoid >= strong_avoid`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strong_buy < self.buy {
            return Err(ConfigError::ValidationError(format!(
                "strong_buy threshold ({}) must not be below buy threshold ({})",
                self.strong_buy, self.buy
            )));
        }
        if self.buy < self.avoid {
            return Err(ConfigError::ValidationError(format!(
                "buy threshold ({}) must not be below avoid threshold ({})",
                self.buy, self.avoid
            )));
        }
        if self.avoid < self.strong_avoid {
            return Err(ConfigError::ValidationError(format!(
                "avoid threshold ({}) must not be below strong_avoid threshold ({})",
                self.avoid, self.strong_avoid
            )));
        }
        Ok(())
    }
}

/// Connection settings for the two external oracles.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OracleSettings {
    #[serde(default = "EndpointConfig::default_rates")]
    pub rates: EndpointConfig,
    #[serde(default = "EndpointConfig::default_signal")]
    pub signal: EndpointConfig,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            rates: EndpointConfig::default_rates(),
            signal: EndpointConfig::default_signal(),
        }
    }
}

/// How to reach one oracle over HTTP.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    /// Sent as the `X-API-KEY` header when present.
    #[serde(default)]
    pub api_key: Option<String>,
    /// When present, every request is signed with HMAC-SHA256.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Transport-level timeout for a single HTTP request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl EndpointConfig {
    pub fn default_rates() -> Self {
        Self::local("http://127.0.0.1:8081")
    }

    pub fn default_signal() -> Self {
        Self::local("http://127.0.0.1:8082")
    }

    fn local(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            api_secret: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// The output style of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Contains parameters for structured logging.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as "info" or "engine=debug,info". `RUST_LOG` wins over it.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs go to a daily rolling file in this directory instead of stderr.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
            file_prefix: "diffmark.log".to_string(),
        }
    }
}

/// Serializes a `Duration` as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
