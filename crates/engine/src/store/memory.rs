//! Process-local backend.
//!
//! `begin` takes the state lock and clones the state into the unit. Reads and
//! writes touch only that copy; `commit` swaps it in and releases the lock.
//! Units are therefore fully serialized, and a dropped unit leaves the shared
//! state exactly as it found it.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Account, AccountId, CatalogItem, InventoryRecord, ItemId, LedgerEntry, NewAccount,
    NewCatalogItem, NewLedgerEntry, ledger::sort_newest_first,
};

use super::{
    AccountStore, CatalogStore, InventoryStore, LedgerStore, Storage, StoreError, StoreResult,
    UnitOfWork,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Sequences {
    account: i64,
    item: i64,
    holding: i64,
    entry: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// The whole committed state of a [`MemoryStorage`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub accounts: BTreeMap<AccountId, Account>,
    pub items: BTreeMap<ItemId, CatalogItem>,
    pub holdings: BTreeMap<(AccountId, ItemId), InventoryRecord>,
    /// Append order.
    pub ledger: Vec<LedgerEntry>,
    sequences: Sequences,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemorySnapshot>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the running unit, if any, and copies the committed state.
    pub async fn snapshot(&self) -> MemorySnapshot {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Unit = MemoryUnit;

    async fn begin(&self) -> StoreResult<MemoryUnit> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnit { guard, working })
    }
}

pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemorySnapshot>,
    working: MemorySnapshot,
}

#[async_trait]
impl AccountStore for MemoryUnit {
    async fn account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.working.accounts.get(&id).cloned())
    }

    async fn account_by_name(&mut self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .working
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn lock_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        // The unit already owns the whole state.
        self.account(id).await
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        let state = &mut self.working;
        if state
            .accounts
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Err(StoreError::Conflict(format!("users: {}", account.username)));
        }
        let stored = Account {
            id: next(&mut state.sequences.account),
            username: account.username,
            password_hash: account.password_hash,
            coins: account.coins,
            created_at: Utc::now(),
        };
        state.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn debit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool> {
        match self.working.accounts.get_mut(&id) {
            Some(account) if account.coins >= amount => {
                account.coins -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn credit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool> {
        let Some(account) = self.working.accounts.get_mut(&id) else {
            return Ok(false);
        };
        account.coins = account
            .coins
            .checked_add(amount)
            .ok_or_else(|| StoreError::Corrupted(format!("balance overflow on account {id}")))?;
        Ok(true)
    }
}

#[async_trait]
impl CatalogStore for MemoryUnit {
    async fn item(&mut self, id: ItemId) -> StoreResult<Option<CatalogItem>> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn item_by_name(&mut self, name: &str) -> StoreResult<Option<CatalogItem>> {
        Ok(self
            .working
            .items
            .values()
            .find(|item| item.name == name)
            .cloned())
    }

    async fn items(&mut self) -> StoreResult<Vec<CatalogItem>> {
        Ok(self.working.items.values().cloned().collect())
    }

    async fn insert_item(&mut self, item: NewCatalogItem) -> StoreResult<CatalogItem> {
        let state = &mut self.working;
        if state.items.values().any(|existing| existing.name == item.name) {
            return Err(StoreError::Conflict(format!("merch_items: {}", item.name)));
        }
        let stored = CatalogItem {
            id: next(&mut state.sequences.item),
            name: item.name,
            price: item.price,
            created_at: Utc::now(),
        };
        state.items.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl InventoryStore for MemoryUnit {
    async fn holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        Ok(self.working.holdings.get(&(account, item)).cloned())
    }

    async fn holdings(&mut self, account: AccountId) -> StoreResult<Vec<InventoryRecord>> {
        let mut records: Vec<_> = self
            .working
            .holdings
            .values()
            .filter(|record| record.account_id == account)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn increment_holding(&mut self, account: AccountId, item: ItemId) -> StoreResult<bool> {
        match self.working.holdings.get_mut(&(account, item)) {
            Some(record) => {
                record.quantity += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        let state = &mut self.working;
        if state.holdings.contains_key(&(account, item)) {
            return Ok(None);
        }
        let record = InventoryRecord {
            id: next(&mut state.sequences.holding),
            account_id: account,
            item_id: item,
            quantity: 1,
            acquired_at: Utc::now(),
        };
        state.holdings.insert((account, item), record.clone());
        Ok(Some(record))
    }
}

#[async_trait]
impl LedgerStore for MemoryUnit {
    async fn append(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        let state = &mut self.working;
        let entry = entry.into_entry(next(&mut state.sequences.entry), Utc::now());
        state.ledger.push(entry.clone());
        Ok(entry)
    }

    async fn entries_for(&mut self, account: AccountId) -> StoreResult<Vec<LedgerEntry>> {
        let mut entries: Vec<_> = self
            .working
            .ledger
            .iter()
            .filter(|entry| entry.involves(account))
            .cloned()
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn commit(self) -> StoreResult<()> {
        let Self { mut guard, working } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INITIAL_BALANCE;

    fn new_account(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            password_hash: "salt$hash".to_string(),
            coins: INITIAL_BALANCE,
        }
    }

    #[tokio::test]
    async fn dropped_unit_leaves_state_untouched() {
        let storage = MemoryStorage::new();
        let before = storage.snapshot().await;

        let mut unit = storage.begin().await.unwrap();
        unit.insert_account(new_account("alice")).await.unwrap();
        drop(unit);

        assert_eq!(storage.snapshot().await, before);
    }

    #[tokio::test]
    async fn committed_unit_is_visible() {
        let storage = MemoryStorage::new();
        let mut unit = storage.begin().await.unwrap();
        let alice = unit.insert_account(new_account("alice")).await.unwrap();
        unit.commit().await.unwrap();

        let snapshot = storage.snapshot().await;
        assert_eq!(snapshot.accounts.get(&alice.id), Some(&alice));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let storage = MemoryStorage::new();
        let mut unit = storage.begin().await.unwrap();
        unit.insert_account(new_account("alice")).await.unwrap();
        let err = unit.insert_account(new_account("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn debit_is_guarded() {
        let storage = MemoryStorage::new();
        let mut unit = storage.begin().await.unwrap();
        let alice = unit.insert_account(new_account("alice")).await.unwrap();

        assert!(!unit.debit(alice.id, INITIAL_BALANCE + 1).await.unwrap());
        assert!(unit.debit(alice.id, INITIAL_BALANCE).await.unwrap());
        assert!(!unit.debit(alice.id, 1).await.unwrap());
        assert_eq!(unit.account(alice.id).await.unwrap().unwrap().coins, 0);
    }

    #[tokio::test]
    async fn second_insert_of_holding_is_refused() {
        let storage = MemoryStorage::new();
        let mut unit = storage.begin().await.unwrap();
        assert!(unit.insert_holding(1, 2).await.unwrap().is_some());
        assert!(unit.insert_holding(1, 2).await.unwrap().is_none());
        assert!(unit.increment_holding(1, 2).await.unwrap());
        assert_eq!(unit.holding(1, 2).await.unwrap().unwrap().quantity, 2);
    }
}
