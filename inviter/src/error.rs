//! Inviter error types

use shared::SharedError;
use thiserror::Error;

/// Result type for inviter operations
pub type InviterResult<T> = Result<T, InviterError>;

/// Result type for directory (VK API) calls
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Inviter error types
#[derive(Error, Debug)]
pub enum InviterError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Ledger storage error: {operation} on {path}: {message}")]
    LedgerError {
        operation: String,
        path: String,
        message: String,
    },

    #[error("Directory request failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// How the dispatcher and filter should react to a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Flood control or captcha: cool down, retry in a later cycle
    RateLimited,
    /// The account does not accept invitations
    PermissionDenied,
    Other,
}

/// Classified failure of a VK API call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("rate limited ({code}): {message}")]
    RateLimited { code: i64, message: String },

    #[error("permission denied ({code}): {message}")]
    PermissionDenied { code: i64, message: String },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl DirectoryError {
    const CAPTCHA_NEEDED: i64 = 14;
    const RATE_LIMIT_CODES: &'static [i64] = &[6, 9, 29, Self::CAPTCHA_NEEDED];
    /// Only "access denied" for the invited user; 7 and 203 concern the
    /// token or the community and stay `Api`
    const PERMISSION_CODES: &'static [i64] = &[15];
    const PERMISSION_PHRASES: &'static [&'static str] = &[
        "permission to add",
        "can't add this user",
        "user disabled invites",
        "access denied",
    ];

    /// Classify an `{"error": {...}}` payload returned by the API
    pub fn from_api(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        if Self::RATE_LIMIT_CODES.contains(&code) || lowered.contains("captcha") {
            DirectoryError::RateLimited { code, message }
        } else if Self::PERMISSION_CODES.contains(&code)
            || Self::PERMISSION_PHRASES.iter().any(|p| lowered.contains(p))
        {
            DirectoryError::PermissionDenied { code, message }
        } else {
            DirectoryError::Api { code, message }
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            DirectoryError::RateLimited { .. } => FailureKind::RateLimited,
            DirectoryError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            _ => FailureKind::Other,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == FailureKind::RateLimited
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            DirectoryError::Malformed(error.to_string())
        } else {
            DirectoryError::Network(error.to_string())
        }
    }
}
