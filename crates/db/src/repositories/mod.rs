//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod ledger;
pub mod parent;

pub use ledger::{LedgerRepository, LedgerStoreError};
pub use parent::{CreateParentInput, ParentError, ParentRepository};
