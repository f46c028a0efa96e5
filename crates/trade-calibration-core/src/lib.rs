pub mod error;
pub mod history;
pub mod types;

pub use error::CalibrationError;
pub use types::*;

/// Standard result type for all trade-calibration operations
pub type CalibrationResult<T> = Result<T, CalibrationError>;
