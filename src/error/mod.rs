use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Assessment error: {0}")]
    Assessment(#[from] AssessmentError),

    #[error("Decision tree error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Quota exceeded writing {key}: {requested} bytes requested, limit {limit}")]
    QuotaExceeded {
        key: String,
        requested: usize,
        limit: usize,
    },

    #[error("All storage tiers exhausted for {key}")]
    TiersExhausted { key: String },

    #[error("Unsupported schema version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl StorageError {
    /// Whether this error is the storage-full condition that triggers cleanup
    /// and tier fallback.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

/// Questionnaire and session errors
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Unknown question: {question_id}")]
    UnknownQuestion { question_id: String },

    #[error("Session already completed: {session_id}")]
    SessionCompleted { session_id: String },

    #[error("Assessment incomplete, unanswered: {}", missing.join(", "))]
    Incomplete { missing: Vec<String> },
}

impl AssessmentError {
    /// Shorthand for a field validation failure.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AssessmentError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Decision tree transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Node {node_id} is a result node, no further decisions")]
    TerminalNode { node_id: String },

    #[error("Node {node_id} has no '{choice}' branch")]
    MissingBranch { node_id: String, choice: String },

    #[error("Node not found: {node_id}")]
    UnknownNode { node_id: String },

    #[error("Nothing to undo")]
    NothingToUndo,
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for questionnaire and session operations
pub type EngineResult<T> = Result<T, AssessmentError>;

/// Result type alias for decision tree transitions
pub type TransitionResult<T> = Result<T, TransitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "bad locale".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: bad locale");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::QuotaExceeded {
            key: "medicalCareGuide:assessmentHistory".to_string(),
            requested: 600,
            limit: 512,
        };
        assert_eq!(
            err.to_string(),
            "Quota exceeded writing medicalCareGuide:assessmentHistory: 600 bytes requested, limit 512"
        );

        let err = StorageError::TiersExhausted {
            key: "periodhub_pain_impact_anonymous".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "All storage tiers exhausted for periodhub_pain_impact_anonymous"
        );

        let err = StorageError::UnsupportedVersion { version: 9 };
        assert_eq!(err.to_string(), "Unsupported schema version: 9");
    }

    #[test]
    fn test_quota_detection() {
        let quota = StorageError::QuotaExceeded {
            key: "k".to_string(),
            requested: 2,
            limit: 1,
        };
        assert!(quota.is_quota_exceeded());

        let other = StorageError::Query {
            message: "locked".to_string(),
        };
        assert!(!other.is_quota_exceeded());
    }

    #[test]
    fn test_assessment_error_display() {
        let err = AssessmentError::validation("pain_intensity", "must be between 1 and 10");
        assert_eq!(
            err.to_string(),
            "Validation failed: pain_intensity - must be between 1 and 10"
        );

        let err = AssessmentError::Incomplete {
            missing: vec!["pain_intensity".to_string(), "work_impact".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Assessment incomplete, unanswered: pain_intensity, work_impact"
        );
    }

    #[test]
    fn test_transition_error_display() {
        let err = TransitionError::MissingBranch {
            node_id: "start".to_string(),
            choice: "no".to_string(),
        };
        assert_eq!(err.to_string(), "Node start has no 'no' branch");
        assert_eq!(TransitionError::NothingToUndo.to_string(), "Nothing to undo");
    }

    #[test]
    fn test_conversions_to_app_error() {
        let app_err: AppError = StorageError::TiersExhausted {
            key: "k".to_string(),
        }
        .into();
        assert!(matches!(app_err, AppError::Storage(_)));

        let app_err: AppError = AssessmentError::UnknownQuestion {
            question_id: "q".to_string(),
        }
        .into();
        assert!(matches!(app_err, AppError::Assessment(_)));

        let app_err: AppError = TransitionError::NothingToUndo.into();
        assert!(matches!(app_err, AppError::Transition(_)));
    }
}
