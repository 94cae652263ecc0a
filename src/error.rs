//! Error types and handling for `GeoAssist`

use crate::models::TimeWindow;
use std::fmt;
use thiserror::Error;

/// What was wrong with an action payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// `action_type` missing or not one of the supported actions
    UnknownActionType,
    /// A required field is absent
    MissingField,
    /// A field is present but has the wrong type or shape
    InvalidField,
    /// Region-scoped action without a `region`
    MissingRegion,
    /// Both `forecast_date` and `forecast_timestamp` were given
    ConflictingTime,
    /// `forecast_timestamp` is not a canonical forecast hour
    InvalidTimestamp,
    /// `forecast_date` is not `YYYY-MM-DD`
    InvalidDate,
    /// `dataset_name` is not a known local dataset
    UnknownDataset,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationKind::UnknownActionType => "unknown action type",
            ValidationKind::MissingField => "missing field",
            ValidationKind::InvalidField => "invalid field",
            ValidationKind::MissingRegion => "missing region",
            ValidationKind::ConflictingTime => "conflicting time selection",
            ValidationKind::InvalidTimestamp => "invalid forecast timestamp",
            ValidationKind::InvalidDate => "invalid forecast date",
            ValidationKind::UnknownDataset => "unknown dataset",
        };
        f.write_str(s)
    }
}

/// Why a region string could not be turned into a boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLookupFailure {
    NotFound,
    /// County name exists in several states and no state was given
    Ambiguous,
}

/// Main error type for the `GeoAssist` core
#[derive(Error, Debug)]
pub enum GeoAssistError {
    /// Malformed or incomplete action payload
    #[error("Invalid action ({kind}): {message}")]
    Validation {
        kind: ValidationKind,
        message: String,
    },

    /// Region text did not resolve to exactly one state or county
    #[error("Region not found: {query}")]
    RegionNotFound {
        query: String,
        kind: RegionLookupFailure,
        candidates: Vec<String>,
    },

    /// A dataset collaborator failed
    #[error("Dataset access failed during {operation} ({context}): {message}")]
    DatasetAccess {
        operation: String,
        context: String,
        message: String,
    },

    /// No handler registered for a normalized action
    #[error("No handler registered for action type {action_type}")]
    Dispatch { action_type: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GeoAssistError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(kind: ValidationKind, message: S) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    /// Create a not-found region error
    pub fn region_not_found<S: Into<String>>(query: S) -> Self {
        Self::RegionNotFound {
            query: query.into(),
            kind: RegionLookupFailure::NotFound,
            candidates: Vec::new(),
        }
    }

    /// Create an ambiguous region error listing the matching candidates
    pub fn region_ambiguous<S: Into<String>>(query: S, candidates: Vec<String>) -> Self {
        Self::RegionNotFound {
            query: query.into(),
            kind: RegionLookupFailure::Ambiguous,
            candidates,
        }
    }

    /// Create a dataset access error
    pub fn dataset<O, C, M>(operation: O, context: C, message: M) -> Self
    where
        O: Into<String>,
        C: Into<String>,
        M: Into<String>,
    {
        Self::DatasetAccess {
            operation: operation.into(),
            context: context.into(),
            message: message.into(),
        }
    }

    /// Name the failing fetch, its region and its time window on a dataset error
    ///
    /// The collaborator's message is kept, and whatever it put in `operation`
    /// and `context` stays alongside. Other variants pass through untouched.
    #[must_use]
    pub fn with_fetch_context(
        self,
        fetch: &str,
        scope: &str,
        window: Option<&TimeWindow>,
    ) -> Self {
        match self {
            Self::DatasetAccess {
                operation,
                context,
                message,
            } => {
                let operation = if operation.is_empty() || operation == fetch {
                    fetch.to_string()
                } else {
                    format!("{fetch}: {operation}")
                };
                let mut parts = vec![scope.to_string()];
                if let Some(window) = window {
                    parts.push(window.to_string());
                }
                if !context.is_empty() && context != scope {
                    parts.push(context);
                }
                Self::DatasetAccess {
                    operation,
                    context: parts.join(", "),
                    message,
                }
            }
            other => other,
        }
    }

    /// Create a dispatch error
    pub fn dispatch<S: Into<String>>(action_type: S) -> Self {
        Self::Dispatch {
            action_type: action_type.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Validation kind, if this is a validation error
    #[must_use]
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            GeoAssistError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for errors the operator can fix by rephrasing the request
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            GeoAssistError::Validation { .. } | GeoAssistError::RegionNotFound { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GeoAssistError::Validation { message, .. } => {
                format!("The map request could not be understood: {message}")
            }
            GeoAssistError::RegionNotFound {
                query,
                kind: RegionLookupFailure::NotFound,
                ..
            } => format!(
                "Could not find region '{query}'. Please specify a valid state or county name."
            ),
            GeoAssistError::RegionNotFound {
                query,
                kind: RegionLookupFailure::Ambiguous,
                candidates,
            } => format!(
                "'{query}' matches several counties: {}. Please add the state.",
                candidates.join("; ")
            ),
            GeoAssistError::DatasetAccess {
                operation, context, ..
            } if !context.is_empty() => format!(
                "Unable to load data for {operation} ({context}). Please try again later."
            ),
            GeoAssistError::DatasetAccess { operation, .. } => {
                format!("Unable to load data for {operation}. Please try again later.")
            }
            GeoAssistError::Dispatch { .. } => {
                "Internal error: this map action is not supported.".to_string()
            }
            GeoAssistError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            GeoAssistError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = GeoAssistError::validation(ValidationKind::MissingRegion, "region is required");
        assert_eq!(err.validation_kind(), Some(ValidationKind::MissingRegion));
        assert!(err.is_user_recoverable());

        let err = GeoAssistError::dataset("fetch_forecast", "Illinois", "timeout");
        assert!(matches!(err, GeoAssistError::DatasetAccess { .. }));
        assert!(!err.is_user_recoverable());
    }

    #[test]
    fn test_user_messages() {
        let err = GeoAssistError::region_ambiguous(
            "Crawford County",
            vec!["Crawford County, OH".into(), "Crawford County, PA".into()],
        );
        let msg = err.user_message();
        assert!(msg.contains("Crawford County, OH"));
        assert!(msg.contains("add the state"));

        let err = GeoAssistError::region_not_found("Atlantis");
        assert!(err.user_message().contains("Atlantis"));
    }

    #[test]
    fn test_dataset_error_keeps_context() {
        let err = GeoAssistError::dataset("fetch_asset_features", "power_lines in Ohio", "disk full");
        let text = err.to_string();
        assert!(text.contains("fetch_asset_features"));
        assert!(text.contains("power_lines in Ohio"));
    }

    #[test]
    fn test_fetch_context_fills_blank_fields() {
        let day = chrono::NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let window = TimeWindow::days(day, 3);
        let err = GeoAssistError::dataset("bq", "", "timeout").with_fetch_context(
            "fetch_forecast",
            "North Dakota",
            Some(&window),
        );
        let text = err.to_string();
        assert!(text.contains("fetch_forecast: bq"));
        assert!(text.contains("North Dakota, 2025-01-10T00:00Z .. 2025-01-13T00:00Z"));
        assert!(text.ends_with("timeout"));
        assert!(err.user_message().contains("North Dakota"));

        let err = GeoAssistError::dataset("fetch_asset_features", "oil_wells", "disk full")
            .with_fetch_context("fetch_asset_features", "Texas", None);
        match err {
            GeoAssistError::DatasetAccess {
                operation, context, ..
            } => {
                assert_eq!(operation, "fetch_asset_features");
                assert_eq!(context, "Texas, oil_wells");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = GeoAssistError::config("bad").with_fetch_context("fetch_forecast", "Ohio", None);
        assert!(matches!(err, GeoAssistError::Config { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GeoAssistError = io_err.into();
        assert!(matches!(err, GeoAssistError::Io { .. }));
    }
}
