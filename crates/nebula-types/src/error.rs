use thiserror::Error;

#[derive(Error, Debug)]
pub enum NebulaError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown ion diagnostic: {0}")]
    UnknownIon(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Atomic data error: {0}")]
    AtomicData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type NebulaResult<T> = Result<T, NebulaError>;

/// Check that two array shapes agree.
pub fn ensure_shape(expected: &[usize], actual: &[usize]) -> NebulaResult<()> {
    if expected != actual {
        return Err(NebulaError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}
