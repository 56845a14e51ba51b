//! Ledger error types.
//!
//! Every error belongs to one [`LedgerErrorKind`]. Only conflicts are
//! retryable; everything else is reported to the caller as-is.

use chrono::{DateTime, Utc};
use tally_shared::AppError;
use tally_shared::types::{LedgerEntryId, ParentId, UserId};
use thiserror::Error;

/// Coarse classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// Malformed input.
    Validation,
    /// A debit (or reversal) would overdraw the parent.
    InsufficientBalance,
    /// Parent or entry is absent, deleted, or not visible.
    NotFound,
    /// Principal does not own the parent.
    AccessDenied,
    /// Another writer changed the parent concurrently.
    Conflict,
    /// Storage or unexpected failure.
    Internal,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry amount must be strictly positive.
    #[error("Entry amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Memo exceeds the maximum length.
    #[error("Memo is {len} characters, maximum is {max}")]
    MemoTooLong {
        /// Actual length in characters.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Date range filter is inverted.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Lower bound.
        from: DateTime<Utc>,
        /// Upper bound.
        to: DateTime<Utc>,
    },

    /// Amount range filter is inverted.
    #[error("Invalid amount range: {min} is greater than {max}")]
    InvalidAmountRange {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },

    /// Applying the entry would overflow the balance.
    #[error("Balance of parent {0} would overflow")]
    BalanceOverflow(ParentId),

    // ========== Balance Errors ==========
    /// Parent balance does not cover the requested decrease.
    #[error("Insufficient balance on parent {parent_id}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// The parent.
        parent_id: ParentId,
        /// Balance at check time.
        balance: i64,
        /// Amount the operation would subtract.
        requested: i64,
    },

    // ========== Lookup Errors ==========
    /// Parent not found or deleted.
    #[error("Parent not found: {0}")]
    ParentNotFound(ParentId),

    /// Entry not found.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(LedgerEntryId),

    // ========== Authorization Errors ==========
    /// Principal does not own the parent.
    #[error("Principal {principal_id} does not own parent {parent_id}")]
    AccessDenied {
        /// The parent.
        parent_id: ParentId,
        /// The caller.
        principal_id: UserId,
    },

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected for parent {0}, please retry")]
    ConcurrentModification(ParentId),

    // ========== Internal Errors ==========
    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::MemoTooLong { .. }
            | Self::InvalidDateRange { .. }
            | Self::InvalidAmountRange { .. }
            | Self::BalanceOverflow(_) => LedgerErrorKind::Validation,
            Self::InsufficientBalance { .. } => LedgerErrorKind::InsufficientBalance,
            Self::ParentNotFound(_) | Self::EntryNotFound(_) => LedgerErrorKind::NotFound,
            Self::AccessDenied { .. } => LedgerErrorKind::AccessDenied,
            Self::ConcurrentModification(_) => LedgerErrorKind::Conflict,
            Self::Internal(_) => LedgerErrorKind::Internal,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MemoTooLong { .. } => "MEMO_TOO_LONG",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::InvalidAmountRange { .. } => "INVALID_AMOUNT_RANGE",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::ParentNotFound(_) => "PARENT_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AccessDenied { .. } => "ACCESS_DENIED",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            LedgerErrorKind::Validation => Self::Validation(message),
            LedgerErrorKind::InsufficientBalance => Self::BusinessRule(message),
            LedgerErrorKind::NotFound => Self::NotFound(message),
            LedgerErrorKind::AccessDenied => Self::Forbidden(message),
            LedgerErrorKind::Conflict => Self::Conflict(message),
            LedgerErrorKind::Internal => Self::Internal(message),
        }
    }
}
