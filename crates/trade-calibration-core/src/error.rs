use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CalibrationError {
    fn from(e: serde_json::Error) -> Self {
        CalibrationError::SerializationError(e.to_string())
    }
}
