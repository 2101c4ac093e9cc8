use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalysisOptions, Config, EndpointConfig, LogFormat, LoggingConfig, OracleSettings,
    RankingThresholds,
};

/// The file read when no explicit path is given. Absent is fine: defaults apply.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads the application configuration.
///
/// Sources are layered in order: built-in defaults, the TOML file, then environment
/// variables prefixed `DIFFMARK` with `__` between nested keys (for example
/// `DIFFMARK__ANALYSIS__TIMEOUT_MS=2500`). An explicitly given file must exist; the
/// default `config.toml` is optional.
///
/// The ranking thresholds are validated before the config is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("DIFFMARK")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.analysis.ranking_thresholds.validate()?;

    tracing::debug!(analysis = ?config.analysis, "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use std::time::Duration;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = load_config(Some(file.path())).expect("defaults should load");

        assert_eq!(config.analysis.timeout, Duration::from_secs(5));
        assert!(config.analysis.allow_degraded_signal);
        assert_eq!(config.analysis.ranking_thresholds, RankingThresholds::default());
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
            [analysis]
            timeout_ms = 1500
            allow_degraded_signal = false

            [analysis.ranking_thresholds]
            strong_buy = 0.10
            buy = 0.02
            avoid = -0.02
            strong_avoid = -0.10

            [oracles.rates]
            base_url = "https://rates.internal"
            api_key = "key"
            api_secret = "secret"

            [logging]
            level = "debug"
            format = "json"
            "#,
        );
        let config = load_config(Some(file.path())).expect("config should load");

        assert_eq!(config.analysis.timeout, Duration::from_millis(1500));
        assert!(!config.analysis.allow_degraded_signal);
        assert_eq!(config.analysis.ranking_thresholds.strong_buy, dec!(0.10));
        assert_eq!(config.analysis.ranking_thresholds.strong_avoid, dec!(-0.10));
        assert_eq!(config.oracles.rates.base_url, "https://rates.internal");
        assert_eq!(config.oracles.rates.api_secret.as_deref(), Some("secret"));
        // The untouched signal section keeps its defaults.
        assert_eq!(config.oracles.signal, EndpointConfig::default_signal());
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let file = write_config(
            r#"
            [analysis.ranking_thresholds]
            strong_buy = 0.01
            buy = 0.05
            avoid = -0.01
            strong_avoid = -0.05
            "#,
        );
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)), "{err}");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)), "{err}");
    }
}
