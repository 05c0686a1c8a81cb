use std::fmt::{self, Display};

/// A single problem found while validating a model value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulates every validation failure instead of stopping at the first
/// one, so callers can report the complete list back to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Folds `other` into `self`, prefixing each field with `prefix`.
    pub fn merge(&mut self, prefix: &str, other: ValidationErrors) {
        for error in other.errors {
            self.errors.push(FieldError {
                field: format!("{prefix}.{}", error.field),
                message: error.message,
            });
        }
    }

    /// Runs `check` and merges any errors it reports under `prefix`.
    pub fn collect(
        &mut self,
        prefix: &str,
        check: std::result::Result<(), ValidationErrors>,
    ) {
        if let Err(errors) = check {
            self.merge(prefix, errors);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors produced by model constructors and validation routines.
#[derive(Debug)]
pub enum ModelError {
    InvalidMedia(String),
    InvalidSchedule(String),
    Validation(ValidationErrors),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidMedia(msg) => write!(f, "invalid media: {msg}"),
            ModelError::InvalidSchedule(msg) => {
                write!(f, "invalid schedule: {msg}")
            }
            ModelError::Validation(errors) => {
                write!(f, "validation failed: {errors}")
            }
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Validation(errors) => Some(errors),
            ModelError::InvalidMedia(_) | ModelError::InvalidSchedule(_) => {
                None
            }
        }
    }
}

impl From<ValidationErrors> for ModelError {
    fn from(errors: ValidationErrors) -> Self {
        ModelError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefixes_fields() {
        let mut inner = ValidationErrors::new();
        inner.push("count", "is required");
        inner.push("duration", "must be positive");

        let mut outer = ValidationErrors::new();
        outer.merge("fillers.post_roll", inner);

        let fields: Vec<_> = outer.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["fillers.post_roll.count", "fillers.post_roll.duration"]
        );
        assert!(outer.clone().into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
