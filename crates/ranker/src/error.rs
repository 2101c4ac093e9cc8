use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankerError {
    #[error("Ranking thresholds are invalid: {0}")]
    InvalidThresholds(#[from] configuration::error::ConfigError),
}
