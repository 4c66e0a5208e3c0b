use thiserror::Error;

/// All errors surfaced by the vault core and its adapters.
#[derive(Debug, Error)]
pub enum ZvaultError {
    // --- Store errors ---
    #[error("record '{0}' not found")]
    NotFound(String),

    #[error("incorrect password or corrupted vault")]
    Authentication,

    #[error("vault storage error: {0}")]
    Storage(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    // --- Validation errors ---
    #[error("invalid date format: {0} (use YYYY-MM-DD, today, tomorrow, +3d, +2w, next week)")]
    InvalidDate(String),

    #[error("invalid totp secret: {0}")]
    InvalidTotpSecret(String),

    // --- Collaborator errors ---
    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for zvault results.
pub type Result<T> = std::result::Result<T, ZvaultError>;
