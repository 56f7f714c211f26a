//! Error types shared across the session layer.
//!
//! ERROR HANDLING
//! ==============
//! A `401` on the session check is not an error and never reaches this type;
//! the client maps it to "no session". Everything else the Account Service
//! does wrong lands in [`ApiError`], which the store catches at its boundary.

/// Failures talking to the Account Service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("account service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("account service unreachable: {0}")]
    Network(String),

    /// A success response whose body does not match the contract.
    #[error("account service response invalid: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the service responded at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) | Self::ClientBuild(_) => None,
        }
    }

    /// Human-readable message suitable for showing next to a login form.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Upstream { message, .. } => message,
            Self::Network(message) | Self::Decode(message) | Self::ClientBuild(message) => message,
        }
    }
}

/// Malformed configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
