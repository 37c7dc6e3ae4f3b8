//! Unified error types for the transfer engine
//!
//! Classification and argument-building errors are raised synchronously and
//! indicate bad configuration. Connection and query errors surface from async
//! calls and are left to the caller to retry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all transfer operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl TransferError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn chain_not_found(chain_id: &str) -> Self {
        Self::new(ErrorCode::ChainNotFound, format!("Chain '{}' not found", chain_id))
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConnectionError, msg)
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, msg)
    }

    pub fn missing_location(symbol: &str) -> Self {
        Self::new(
            ErrorCode::MissingLocation,
            format!("Token {} has no XCM location configured", symbol),
        )
    }

    pub fn missing_asset_id(symbol: &str, chain_id: &str) -> Self {
        Self::new(
            ErrorCode::MissingAssetId,
            format!("Token {} has no asset id on {}", symbol, chain_id),
        )
    }

    pub fn unsupported_token_kind(symbol: &str, kind: impl fmt::Debug) -> Self {
        Self::new(
            ErrorCode::UnsupportedTokenKind,
            format!("Token {} of kind {:?} is not supported here", symbol, kind),
        )
    }

    pub fn direction_undecidable(origin: &str, destination: &str) -> Self {
        Self::new(
            ErrorCode::DirectionUndecidable,
            format!("Cannot establish transfer direction {} → {}", origin, destination),
        )
    }

    pub fn unsupported_extrinsic(name: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedExtrinsic,
            format!("Unsupported extrinsic '{}'", name),
        )
    }

    pub fn assets_module_missing(chain_id: &str, pallet: &str) -> Self {
        Self::new(
            ErrorCode::AssetsModuleMissing,
            format!("Chain {} has no {} pallet", chain_id, pallet),
        )
    }

    pub fn query_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryFailed, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn insufficient_balance(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientBalance, msg)
    }

    pub fn below_existential_deposit(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::BelowExistentialDeposit, msg)
    }

    pub fn fee_quote_unavailable(fee_symbol: &str, chain_id: &str) -> Self {
        Self::new(
            ErrorCode::FeeQuoteUnavailable,
            format!("No liquidity to quote fees in {} on {}", fee_symbol, chain_id),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// True for errors caused by chain or token configuration rather than
    /// by the network or the user.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::ConfigurationError
                | ErrorCode::MissingLocation
                | ErrorCode::MissingAssetId
                | ErrorCode::UnsupportedTokenKind
        )
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for TransferError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Lookup errors
    ChainNotFound,

    // Network errors
    ConnectionError,
    QueryFailed,
    Timeout,

    // Configuration errors
    ConfigurationError,
    MissingLocation,
    MissingAssetId,
    UnsupportedTokenKind,

    // Transfer construction errors
    DirectionUndecidable,
    UnsupportedExtrinsic,
    AssetsModuleMissing,

    // Input errors
    InvalidAddress,
    InvalidInput,
    InsufficientBalance,
    BelowExistentialDeposit,
    FeeQuoteUnavailable,

    // Parse errors
    JsonError,
    HexError,

    // Internal
    Internal,
}

/// Result type alias for transfer operations
pub type TransferResult<T> = Result<T, TransferError>;

// Conversions from common error types

impl From<serde_json::Error> for TransferError {
    fn from(e: serde_json::Error) -> Self {
        TransferError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for TransferError {
    fn from(e: hex::FromHexError) -> Self {
        TransferError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<reqwest::Error> for TransferError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransferError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            TransferError::new(ErrorCode::ConnectionError, "Connection failed")
        } else {
            TransferError::new(ErrorCode::QueryFailed, e.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for TransferError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        TransferError::new(ErrorCode::Timeout, "Operation timed out")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = TransferError::assets_module_missing("polkadot", "Assets")
            .with_details("token USDT");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("assets_module_missing"));
        assert!(json.contains("polkadot"));
    }

    #[test]
    fn test_configuration_family() {
        assert!(TransferError::missing_location("DOT").is_configuration());
        assert!(TransferError::missing_asset_id("USDT", "hydration").is_configuration());
        assert!(TransferError::configuration("bad chain").is_configuration());
        assert!(!TransferError::connection("dial failed").is_configuration());
        assert!(!TransferError::direction_undecidable("a", "b").is_configuration());
    }

    #[test]
    fn test_display_includes_details() {
        let err = TransferError::unsupported_extrinsic("Foo.bar").with_details("token DOT");
        let rendered = err.to_string();
        assert!(rendered.starts_with("[UnsupportedExtrinsic]"));
        assert!(rendered.ends_with("(token DOT)"));
    }
}
