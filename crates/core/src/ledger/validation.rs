//! Input validation for ledger operations.

use chrono::{DateTime, SubsecRound, Utc};

use super::entry::NewEntry;
use super::error::LedgerError;

/// Maximum memo length in characters.
pub const MAX_MEMO_LEN: usize = 255;

/// Validates that an entry amount is strictly positive.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for zero or negative amounts.
pub fn validate_amount(amount: i64) -> Result<(), LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

/// Validates memo length.
///
/// # Errors
///
/// Returns `LedgerError::MemoTooLong` when the memo exceeds [`MAX_MEMO_LEN`].
pub fn validate_memo(memo: &str) -> Result<(), LedgerError> {
    let len = memo.trim().chars().count();
    if len > MAX_MEMO_LEN {
        return Err(LedgerError::MemoTooLong {
            len,
            max: MAX_MEMO_LEN,
        });
    }
    Ok(())
}

/// Validates a new entry before any storage access.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), LedgerError> {
    validate_amount(entry.amount)?;
    validate_memo(&entry.memo)
}

/// Truncates a timestamp to microseconds, the precision the store keeps.
#[must_use]
pub fn normalize_timestamp(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}
