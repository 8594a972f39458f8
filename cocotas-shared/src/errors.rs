use serde::{Deserialize, Serialize};

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Data access errors
/// - E2xxx: Catalog errors
/// - E3xxx: Deck errors
/// - E4xxx: Like counter errors
/// - E5xxx: Chat errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    SerializationError,
    ConfigError,

    // Data access (E1xxx)
    QueryFailed,
    InsertFailed,
    UpsertFailed,
    DeleteFailed,
    RowNotFound,
    AmbiguousRow,
    SubscriptionClosed,
    TransportError,

    // Catalog (E2xxx)
    CatalogUnavailable,

    // Deck (E3xxx)
    DecisionNotRecorded,
    MatchLookupFailed,

    // Likes (E4xxx)
    CountUnavailable,

    // Chat (E5xxx)
    ThreadNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::SerializationError => "E0003",
            Self::ConfigError => "E0004",

            // Data access
            Self::QueryFailed => "E1001",
            Self::InsertFailed => "E1002",
            Self::UpsertFailed => "E1003",
            Self::DeleteFailed => "E1004",
            Self::RowNotFound => "E1005",
            Self::AmbiguousRow => "E1006",
            Self::SubscriptionClosed => "E1007",
            Self::TransportError => "E1008",

            // Catalog
            Self::CatalogUnavailable => "E2001",

            // Deck
            Self::DecisionNotRecorded => "E3001",
            Self::MatchLookupFailed => "E3002",

            // Likes
            Self::CountUnavailable => "E4001",

            // Chat
            Self::ThreadNotFound => "E5001",
        }
    }

    /// Whether the caller may usefully retry the failed operation.
    ///
    /// Reads degrade to an empty result and can be retried manually. Writes
    /// are recorded in the log and surfaced as events; they are never retried
    /// and never rolled back.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::QueryFailed
                | Self::TransportError
                | Self::CatalogUnavailable
                | Self::CountUnavailable
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal error")]
    Internal(#[from] anyhow::Error),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn row_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RowNotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Known { code, .. } => *code,
            Self::Internal(_) => ErrorCode::InternalError,
            Self::Transport(_) => ErrorCode::TransportError,
            Self::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strings_are_stable() {
        assert_eq!(ErrorCode::InternalError.code(), "E0001");
        assert_eq!(ErrorCode::QueryFailed.code(), "E1001");
        assert_eq!(ErrorCode::RowNotFound.code(), "E1005");
        assert_eq!(ErrorCode::DecisionNotRecorded.code(), "E3001");
        assert_eq!(ErrorCode::ThreadNotFound.code(), "E5001");
    }

    #[test]
    fn reads_retry_writes_do_not() {
        assert!(ErrorCode::QueryFailed.is_retryable());
        assert!(ErrorCode::CatalogUnavailable.is_retryable());
        assert!(!ErrorCode::InsertFailed.is_retryable());
        assert!(!ErrorCode::UpsertFailed.is_retryable());
        assert!(!ErrorCode::DecisionNotRecorded.is_retryable());
    }

    #[test]
    fn error_code_extraction() {
        let err = AppError::new(ErrorCode::AmbiguousRow, "2 rows matched");
        assert_eq!(err.code(), ErrorCode::AmbiguousRow);

        let err = AppError::Internal(anyhow::anyhow!("boom"));
        assert_eq!(err.code(), ErrorCode::InternalError);

        let bad_json = serde_json::from_str::<serde_json::Value>("{");
        let err: AppError = bad_json.unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::SerializationError);
    }
}
