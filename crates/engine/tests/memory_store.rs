use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use engine::{
    Account, AccountId, CatalogItem, Engine, EngineError, InventoryRecord, ItemId, LedgerEntry,
    MemoryStorage, NewAccount, NewCatalogItem, NewLedgerEntry, PurchaseCmd, Storage, TransferCmd,
    store::{
        AccountStore, CatalogStore, InventoryStore, LedgerStore, MemoryUnit, StoreResult,
        UnitOfWork,
    },
};
use tokio::task::JoinSet;

mod common;

use common::{memory_engine, register, sql_engine};

#[tokio::test]
async fn transfer_and_purchase_apply_atomically() {
    let engine = memory_engine().await;
    engine.add_catalog_item("sticker", 100).await.unwrap();
    let alice = register(&engine, "alice").await;
    let bob = register(&engine, "bob").await;

    engine
        .transfer(TransferCmd::new(alice.id, "bob", 250))
        .await
        .unwrap();
    engine
        .purchase(PurchaseCmd::new(bob.id, "sticker"))
        .await
        .unwrap();
    engine
        .purchase(PurchaseCmd::new(bob.id, "sticker"))
        .await
        .unwrap();

    let snapshot = engine.storage().snapshot().await;
    assert_eq!(snapshot.accounts[&alice.id].coins, 750);
    assert_eq!(snapshot.accounts[&bob.id].coins, 1050);
    assert_eq!(snapshot.holdings.len(), 1);
    assert_eq!(snapshot.holdings.values().next().unwrap().quantity, 2);
    assert_eq!(snapshot.ledger.len(), 3);
}

#[tokio::test]
async fn failed_operations_leave_the_snapshot_unchanged() {
    let engine = memory_engine().await;
    engine.add_catalog_item("yacht", 5000).await.unwrap();
    let alice = register(&engine, "alice").await;
    register(&engine, "bob").await;
    let before = engine.storage().snapshot().await;

    let failures = [
        engine
            .transfer(TransferCmd::new(alice.id, "bob", 1001))
            .await
            .unwrap_err(),
        engine
            .transfer(TransferCmd::new(alice.id, "nobody", 1))
            .await
            .unwrap_err(),
        engine
            .transfer(TransferCmd::new(alice.id, "alice", 1))
            .await
            .unwrap_err(),
        engine
            .purchase(PurchaseCmd::new(alice.id, "yacht"))
            .await
            .unwrap_err(),
        engine
            .purchase(PurchaseCmd::new(alice.id, "boat"))
            .await
            .unwrap_err(),
    ];

    assert!(failures.iter().all(EngineError::is_business));
    assert_eq!(engine.storage().snapshot().await, before);
}

#[tokio::test]
async fn concurrent_transfers_succeed_at_most_balance_over_amount_times() {
    let engine = memory_engine().await;
    let alice = register(&engine, "alice").await;
    register(&engine, "bob").await;
    let engine = Arc::new(engine);

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { engine.transfer(TransferCmd::new(alice.id, "bob", 400)).await });
    }
    let mut succeeded = 0;
    while let Some(joined) = tasks.join_next().await {
        if joined.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 2);
    let snapshot = engine.storage().snapshot().await;
    assert_eq!(snapshot.accounts[&alice.id].coins, 200);
    assert!(snapshot.accounts.values().all(|account| account.coins >= 0));
}

#[tokio::test]
async fn expired_deadline_times_out_without_effect() {
    let engine = memory_engine().await;
    let alice = register(&engine, "alice").await;
    register(&engine, "bob").await;
    let before = engine.storage().snapshot().await;

    // Holding a unit keeps every other unit waiting.
    let blocker = engine.storage().begin().await.unwrap();
    let err = engine
        .transfer(TransferCmd::new(alice.id, "bob", 10).deadline(Duration::from_millis(50)))
        .await
        .unwrap_err();
    drop(blocker);

    assert_eq!(err, EngineError::Timeout("transfer".to_string()));
    assert!(!err.is_business());
    assert_eq!(engine.storage().snapshot().await, before);
}

#[tokio::test]
async fn engine_timeout_applies_to_sql_units() {
    let sql = sql_engine().await;
    let alice = register(&sql, "alice").await;
    let engine = engine::Engine::builder(sql.storage().clone())
        .operation_timeout(Duration::from_millis(50))
        .build()
        .await
        .unwrap();

    let blocker = engine.storage().begin().await.unwrap();
    let err = engine
        .purchase(PurchaseCmd::new(alice.id, "cup"))
        .await
        .unwrap_err();
    drop(blocker);

    assert_eq!(err, EngineError::Timeout("purchase".to_string()));
    assert_eq!(engine.account(alice.id).await.unwrap().coins, 1000);
}

/// Memory storage whose commits apply immediately but are acknowledged late.
struct SlowCommit {
    inner: MemoryStorage,
    delay: Duration,
}

struct SlowCommitUnit {
    inner: MemoryUnit,
    delay: Duration,
}

#[async_trait]
impl Storage for SlowCommit {
    type Unit = SlowCommitUnit;

    async fn begin(&self) -> StoreResult<SlowCommitUnit> {
        Ok(SlowCommitUnit {
            inner: self.inner.begin().await?,
            delay: self.delay,
        })
    }
}

#[async_trait]
impl AccountStore for SlowCommitUnit {
    async fn account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        self.inner.account(id).await
    }

    async fn account_by_name(&mut self, username: &str) -> StoreResult<Option<Account>> {
        self.inner.account_by_name(username).await
    }

    async fn lock_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        self.inner.lock_account(id).await
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        self.inner.insert_account(account).await
    }

    async fn debit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool> {
        self.inner.debit(id, amount).await
    }

    async fn credit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool> {
        self.inner.credit(id, amount).await
    }
}

#[async_trait]
impl CatalogStore for SlowCommitUnit {
    async fn item(&mut self, id: ItemId) -> StoreResult<Option<CatalogItem>> {
        self.inner.item(id).await
    }

    async fn item_by_name(&mut self, name: &str) -> StoreResult<Option<CatalogItem>> {
        self.inner.item_by_name(name).await
    }

    async fn items(&mut self) -> StoreResult<Vec<CatalogItem>> {
        self.inner.items().await
    }

    async fn insert_item(&mut self, item: NewCatalogItem) -> StoreResult<CatalogItem> {
        self.inner.insert_item(item).await
    }
}

#[async_trait]
impl InventoryStore for SlowCommitUnit {
    async fn holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        self.inner.holding(account, item).await
    }

    async fn holdings(&mut self, account: AccountId) -> StoreResult<Vec<InventoryRecord>> {
        self.inner.holdings(account).await
    }

    async fn increment_holding(&mut self, account: AccountId, item: ItemId) -> StoreResult<bool> {
        self.inner.increment_holding(account, item).await
    }

    async fn insert_holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        self.inner.insert_holding(account, item).await
    }
}

#[async_trait]
impl LedgerStore for SlowCommitUnit {
    async fn append(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        self.inner.append(entry).await
    }

    async fn entries_for(&mut self, account: AccountId) -> StoreResult<Vec<LedgerEntry>> {
        self.inner.entries_for(account).await
    }
}

#[async_trait]
impl UnitOfWork for SlowCommitUnit {
    async fn commit(self) -> StoreResult<()> {
        self.inner.commit().await?;
        tokio::time::sleep(self.delay).await;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn commit_in_flight_outlives_the_deadline() {
    let engine = Engine::builder(SlowCommit {
        inner: MemoryStorage::new(),
        delay: Duration::from_millis(200),
    })
    .build()
    .await
    .unwrap();
    let alice = register(&engine, "alice").await;
    register(&engine, "bob").await;

    let entry = engine
        .transfer(TransferCmd::new(alice.id, "bob", 100).deadline(Duration::from_millis(50)))
        .await
        .unwrap();

    let snapshot = engine.storage().inner.snapshot().await;
    assert_eq!(snapshot.accounts[&alice.id].coins, 900);
    assert_eq!(snapshot.ledger.len(), 1);
    assert_eq!(snapshot.ledger[0].id, entry.id);
}
