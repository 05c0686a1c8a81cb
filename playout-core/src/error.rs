use chrono::{DateTime, FixedOffset};
use playout_model::{CollectionKey, ValidationErrors};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Collection {0} has no valid items")]
    EmptyCollection(CollectionKey),

    #[error("No enumerator registered for {0}")]
    MissingEnumerator(CollectionKey),

    #[error("Scheduling loop encountered at {0}")]
    SchedulingLoop(DateTime<FixedOffset>),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
