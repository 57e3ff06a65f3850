//! Coin ledger engine.
//!
//! Accounts hold an integer coin balance. Coins move between accounts through
//! transfers and are spent on catalog items through purchases; every movement
//! is recorded as an immutable ledger entry. Each operation runs inside one
//! unit of work (see [`store`]) and either fully applies or changes nothing.

pub use accounts::{Account, AccountId, INITIAL_BALANCE, NewAccount};
pub use catalog::{CatalogItem, ItemId, NewCatalogItem};
pub use commands::{PurchaseCmd, TransferCmd};
pub use error::EngineError;
pub use history::{History, HistoryEntry};
pub use inventory::{InventoryRecord, OwnedItem};
pub use ledger::{EntryId, EntryKind, LedgerEntry, NewLedgerEntry};
pub use ops::{AccountInfo, Engine, EngineBuilder};
pub use store::{MemoryStorage, SqlStorage, Storage};

pub mod credentials;
pub mod store;

mod accounts;
mod catalog;
mod commands;
mod error;
mod history;
mod inventory;
mod ledger;
mod ops;

type ResultEngine<T> = Result<T, EngineError>;
