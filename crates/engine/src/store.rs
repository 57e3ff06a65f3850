//! Store contracts.
//!
//! Every read and write the engine performs goes through a unit of work: a
//! value that implements all four stores and either commits every enclosed
//! mutation or none of them. Dropping a unit without committing rolls it back.
//!
//! Two backends are provided:
//!
//! - [`SqlStorage`]: a sea-orm connection; a unit is a database transaction.
//! - [`MemoryStorage`]: process-local state; a unit works on a private copy
//!   and holds the state lock until it finishes.

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use crate::{
    Account, AccountId, CatalogItem, InventoryRecord, ItemId, LedgerEntry, NewAccount,
    NewCatalogItem, NewLedgerEntry,
};

pub use memory::{MemorySnapshot, MemoryStorage, MemoryUnit};
pub use sql::{SqlStorage, SqlUnit};

mod memory;
mod sql;

pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure failures. These stay behind the engine boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

#[async_trait]
pub trait AccountStore: Send {
    async fn account(&mut self, id: AccountId) -> StoreResult<Option<Account>>;

    async fn account_by_name(&mut self, username: &str) -> StoreResult<Option<Account>>;

    /// Reads the account and holds an exclusive lock on it until the unit
    /// finishes.
    async fn lock_account(&mut self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Fails with [`StoreError::Conflict`] when the username is taken.
    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account>;

    /// Subtracts `amount` only if the balance covers it. Returns whether the
    /// debit was applied.
    async fn debit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool>;

    /// Returns false when the account does not exist.
    async fn credit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait CatalogStore: Send {
    async fn item(&mut self, id: ItemId) -> StoreResult<Option<CatalogItem>>;

    async fn item_by_name(&mut self, name: &str) -> StoreResult<Option<CatalogItem>>;

    /// All items ordered by id.
    async fn items(&mut self) -> StoreResult<Vec<CatalogItem>>;

    /// Fails with [`StoreError::Conflict`] when the name is taken.
    async fn insert_item(&mut self, item: NewCatalogItem) -> StoreResult<CatalogItem>;
}

#[async_trait]
pub trait InventoryStore: Send {
    async fn holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>>;

    /// All records of an account ordered by id.
    async fn holdings(&mut self, account: AccountId) -> StoreResult<Vec<InventoryRecord>>;

    /// Returns false when there is no record to increment.
    async fn increment_holding(&mut self, account: AccountId, item: ItemId) -> StoreResult<bool>;

    /// Creates the record with quantity 1. Returns `None`, leaving the unit
    /// usable, when a record for the pair already exists.
    async fn insert_holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>>;
}

#[async_trait]
pub trait LedgerStore: Send {
    async fn append(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry>;

    /// Entries where the account is source or destination, newest first with
    /// ties in append order.
    async fn entries_for(&mut self, account: AccountId) -> StoreResult<Vec<LedgerEntry>>;
}

#[async_trait]
pub trait UnitOfWork: AccountStore + CatalogStore + InventoryStore + LedgerStore + Sized {
    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}

#[async_trait]
pub trait Storage: Send + Sync + 'static {
    type Unit: UnitOfWork + 'static;

    async fn begin(&self) -> StoreResult<Self::Unit>;
}
