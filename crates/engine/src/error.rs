//! The module contains the errors the engine can return to its callers.
//!
//! Business-rule errors are precise and pass through unchanged so callers can
//! render specific messages:
//!
//! - [`InvalidAmount`] when an amount or price is not a positive integer.
//! - [`AccountNotFound`] / [`ItemNotFound`] when a lookup fails.
//! - [`InsufficientFunds`] when a debit would take a balance below zero.
//!
//! Storage failures never reach callers as such: the engine logs them and
//! returns [`OperationFailed`] labelled with the operation that failed.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`AccountNotFound`]: EngineError::AccountNotFound
//!  [`ItemNotFound`]: EngineError::ItemNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`OperationFailed`]: EngineError::OperationFailed
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" already exists!")]
    AccountAlreadyExists(String),
    #[error("Item \"{0}\" already exists!")]
    ItemAlreadyExists(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("{0} timed out")]
    Timeout(String),
    #[error("{0} failed")]
    OperationFailed(String),
}

impl EngineError {
    /// Whether the error was produced by a business rule rather than by the
    /// infrastructure.
    pub fn is_business(&self) -> bool {
        !matches!(self, Self::Timeout(_) | Self::OperationFailed(_))
    }
}
