use thiserror::Error;

use crate::model::CategoryKind;

/// Why a candidate invoice was refused. Nothing is written when this occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0} must be a YYYY-MM-DD date")]
    InvalidDate(&'static str),

    #[error("amount must be greater than 0")]
    InvalidAmount,

    #[error("issue date cannot be after the due date")]
    DateOrderViolation,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{}", crate::store::sqlite::sqlite_error_string(.0))]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored record could not be (de)serialized: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0} mutex poisoned")]
    Poisoned(&'static str),

    #[error("store task failed: {0}")]
    Join(String),

    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} \"{name}\" is used by one or more invoices")]
    CategoryInUse { kind: CategoryKind, name: String },

    #[error("{kind} \"{name}\" already exists")]
    DuplicateCategory { kind: CategoryKind, name: String },

    #[error("{0} name cannot be empty")]
    InvalidCategoryName(CategoryKind),

    #[error("{kind} \"{name}\" does not exist")]
    UnknownCategory { kind: CategoryKind, name: String },

    #[error("invoice {0} not found")]
    InvoiceNotFound(String),

    #[error("no invoice selected in the current view")]
    NothingSelected,

    #[error("import rejected: {0}")]
    ImportFormat(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the best-effort native reminder channel. Callers log these
/// and carry on; they never abort the in-app reminder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notifications are not configured: {0}")]
    NotConfigured(String),

    #[error("notification permission not granted")]
    PermissionDenied,

    #[error("failed to build notification: {0}")]
    Message(String),

    #[error("failed to deliver notification: {0}")]
    Delivery(String),
}
