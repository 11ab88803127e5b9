use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid clock time: {0}")]
    InvalidClockTime(String),

    #[error("invalid time range: {start} is not before {end}")]
    InvalidTimeRange { start: String, end: String },
}
