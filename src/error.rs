use thiserror::Error;

/// Configuration errors. Raised at construction/load time only; the step
/// loop never returns errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dt: {0} (must be finite and > 1e-6)")]
    InvalidDt(f32),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid torque curve {name}: {message}")]
    InvalidCurve { name: String, message: String },

    #[error("Missing wheel mount: {0}")]
    MissingMount(String),
}
