use thiserror::Error;

/// Values that parse but cannot be turned into builder settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid trim_history '{value}': {source}")]
    InvalidTrimHistory {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("trim_history '{0}' is too large")]
    TrimHistoryOutOfRange(String),

    #[error("utc_offset_minutes {0} is outside -1439..=1439")]
    InvalidUtcOffset(i32),

    #[error("loop_detection_threshold must be at least 2")]
    LoopThresholdTooSmall,
}
