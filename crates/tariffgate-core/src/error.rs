//! Shared error type across tariffgate crates.

use std::net::IpAddr;

use thiserror::Error;

use crate::flow::FlowId;

/// Stable error codes exposed to the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed rule input.
    InvalidRule,
    /// Flow registered twice.
    DuplicateFlow,
    /// Geolocation could not name a country.
    Unresolved,
    /// Malformed config or request.
    BadRequest,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal failure.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidRule => "INVALID_RULE",
            ErrorCode::DuplicateFlow => "DUPLICATE_FLOW",
            ErrorCode::Unresolved => "UNRESOLVED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TariffError>;

/// Unified error type used by core and engine.
#[derive(Debug, Error)]
pub enum TariffError {
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error("flow already registered: {0}")]
    DuplicateFlow(FlowId),
    #[error("address not found: {0}")]
    AddressNotFound(IpAddr),
    #[error("geo resolution failed: {0}")]
    Resolution(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl TariffError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            TariffError::InvalidRule(_) => ErrorCode::InvalidRule,
            TariffError::DuplicateFlow(_) => ErrorCode::DuplicateFlow,
            TariffError::AddressNotFound(_) | TariffError::Resolution(_) => ErrorCode::Unresolved,
            TariffError::BadRequest(_) => ErrorCode::BadRequest,
            TariffError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            TariffError::Internal(_) => ErrorCode::Internal,
        }
    }
}
