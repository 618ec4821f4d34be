use thiserror::Error;

use crate::indicators::IndicatorError;

/// Every failure the service layer reports to its callers.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("user id {0} already exists")]
    DuplicateId(i64),

    #[error("username {0:?} already exists")]
    DuplicateUsername(String),

    #[error("invalid date {0:?}, expected DD-MM-YYYY")]
    InvalidDateFormat(String),

    #[error("unknown indicator {0:?}")]
    UnknownIndicator(String),

    #[error("no indicator selected")]
    MissingIndicator,

    #[error("not logged in")]
    NotAuthenticated,

    #[error("indicator provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("user {0} does not exist")]
    ForeignKeyViolation(i64),

    #[error("storage error: {0}")]
    Store(String),

    #[error("password hashing failed")]
    PasswordHashing,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Text safe to show an end user. Never contains lower-level fault details.
    pub fn user_message(&self) -> &'static str {
        match self {
            ServiceError::InvalidInput(_) => "All fields are required and the ID must be a positive number.",
            ServiceError::DuplicateId(_) => "That user ID is already registered.",
            ServiceError::DuplicateUsername(_) => "That username is already taken.",
            ServiceError::InvalidDateFormat(_) => "Invalid date format (DD-MM-YYYY).",
            ServiceError::UnknownIndicator(_) => "Unknown indicator. Choose one of: dolar, euro, uf, ipc, utm.",
            ServiceError::MissingIndicator => "Select an indicator.",
            ServiceError::NotAuthenticated => "Please log in first.",
            ServiceError::ProviderUnavailable(_) => "Could not reach the indicator service, try again later.",
            ServiceError::ForeignKeyViolation(_)
            | ServiceError::Store(_)
            | ServiceError::PasswordHashing
            | ServiceError::Internal(_) => "An unexpected error occurred.",
        }
    }

    /// Errors the caller can fix by re-entering data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidInput(_)
                | ServiceError::DuplicateId(_)
                | ServiceError::DuplicateUsername(_)
                | ServiceError::InvalidDateFormat(_)
                | ServiceError::UnknownIndicator(_)
                | ServiceError::MissingIndicator
                | ServiceError::NotAuthenticated
                | ServiceError::ProviderUnavailable(_)
        )
    }
}

impl From<IndicatorError> for ServiceError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::UnknownIndicator(name) => ServiceError::UnknownIndicator(name),
            IndicatorError::InvalidDateFormat(text) => ServiceError::InvalidDateFormat(text),
            IndicatorError::ProviderUnavailable(reason) => ServiceError::ProviderUnavailable(reason),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "store operation failed");
        ServiceError::Store(err.to_string())
    }
}

pub type ServiceResult<T = ()> = Result<T, ServiceError>;
