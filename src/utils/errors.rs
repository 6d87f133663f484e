use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    InvalidConfig(String),

    #[error("Trim solution not found: cost {cost:.3e} after {iterations} iterations")]
    TrimNotFound { cost: f64, iterations: u64 },

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),
}
