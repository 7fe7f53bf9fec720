//! Unified error codes for the dispatch platform
//!
//! This module defines all error codes used across the server and clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Product errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order is no longer available for claim (lost to a concurrent winner)
    OrderUnavailable = 4002,
    /// Requested status is not reachable from the current status
    InvalidTransition = 4003,
    /// Actor is not the assigned delivery partner of the order
    NotAssigned = 4004,
    /// Order has no items
    OrderEmpty = 4005,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product has invalid price or quantity
    ProductInvalidPrice = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Underlying store or collaborator unreachable
    ServiceUnavailable = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::NotAuthenticated => "Authentication required",
            Self::PermissionDenied => "Permission denied",
            Self::RoleRequired => "Required role is missing",
            Self::OrderNotFound => "Order not found",
            Self::OrderUnavailable => "Order is no longer available",
            Self::InvalidTransition => "Invalid status transition",
            Self::NotAssigned => "You are not assigned to this order",
            Self::OrderEmpty => "Order has no items",
            Self::ProductNotFound => "Product not found",
            Self::ProductInvalidPrice => "Invalid product price or quantity",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ServiceUnavailable => "Service unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),
            1001 => Ok(Self::NotAuthenticated),
            2001 => Ok(Self::PermissionDenied),
            2002 => Ok(Self::RoleRequired),
            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::OrderUnavailable),
            4003 => Ok(Self::InvalidTransition),
            4004 => Ok(Self::NotAssigned),
            4005 => Ok(Self::OrderEmpty),
            6001 => Ok(Self::ProductNotFound),
            6002 => Ok(Self::ProductInvalidPrice),
            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::ServiceUnavailable),
            other => Err(InvalidErrorCode(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::NotFound,
            ErrorCode::OrderUnavailable,
            ErrorCode::InvalidTransition,
            ErrorCode::ServiceUnavailable,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::OrderUnavailable).unwrap();
        assert_eq!(json, "4002");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::OrderUnavailable);
    }
}
