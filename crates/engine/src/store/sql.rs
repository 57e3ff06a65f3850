//! sea-orm backend. A unit of work is a `DatabaseTransaction`.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
    sea_query::Expr,
};

use crate::{
    Account, AccountId, CatalogItem, InventoryRecord, ItemId, LedgerEntry, NewAccount,
    NewCatalogItem, NewLedgerEntry, accounts, catalog, inventory, ledger,
};

use super::{
    AccountStore, CatalogStore, InventoryStore, LedgerStore, Storage, StoreError, StoreResult,
    UnitOfWork,
};

#[derive(Clone, Debug)]
pub struct SqlStorage {
    database: DatabaseConnection,
}

impl SqlStorage {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

#[async_trait]
impl Storage for SqlStorage {
    type Unit = SqlUnit;

    async fn begin(&self) -> StoreResult<SqlUnit> {
        Ok(SqlUnit {
            tx: self.database.begin().await?,
        })
    }
}

pub struct SqlUnit {
    tx: DatabaseTransaction,
}

/// Turns a unique-constraint violation into [`StoreError::Conflict`].
fn conflict_or_database(err: DbErr, what: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            StoreError::Conflict(format!("{what}: {detail}"))
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl AccountStore for SqlUnit {
    async fn account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        let model = accounts::Entity::find_by_id(id).one(&self.tx).await?;
        Ok(model.map(Account::from))
    }

    async fn account_by_name(&mut self, username: &str) -> StoreResult<Option<Account>> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.tx)
            .await?;
        Ok(model.map(Account::from))
    }

    async fn lock_account(&mut self, id: AccountId) -> StoreResult<Option<Account>> {
        // `FOR UPDATE` is dropped by backends without row locks (SQLite), where
        // the single pooled connection already serializes units.
        let model = accounts::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&self.tx)
            .await?;
        Ok(model.map(Account::from))
    }

    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        let username = account.username.clone();
        account
            .into_active_model(Utc::now())
            .insert(&self.tx)
            .await
            .map(Account::from)
            .map_err(|err| conflict_or_database(err, &username))
    }

    async fn debit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Coins,
                Expr::col(accounts::Column::Coins).sub(amount),
            )
            .filter(accounts::Column::Id.eq(id))
            .filter(accounts::Column::Coins.gte(amount))
            .exec(&self.tx)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn credit(&mut self, id: AccountId, amount: i64) -> StoreResult<bool> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Coins,
                Expr::col(accounts::Column::Coins).add(amount),
            )
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.tx)
            .await?;
        Ok(result.rows_affected == 1)
    }
}

#[async_trait]
impl CatalogStore for SqlUnit {
    async fn item(&mut self, id: ItemId) -> StoreResult<Option<CatalogItem>> {
        let model = catalog::Entity::find_by_id(id).one(&self.tx).await?;
        Ok(model.map(CatalogItem::from))
    }

    async fn item_by_name(&mut self, name: &str) -> StoreResult<Option<CatalogItem>> {
        let model = catalog::Entity::find()
            .filter(catalog::Column::Name.eq(name))
            .one(&self.tx)
            .await?;
        Ok(model.map(CatalogItem::from))
    }

    async fn items(&mut self) -> StoreResult<Vec<CatalogItem>> {
        let models = catalog::Entity::find()
            .order_by_asc(catalog::Column::Id)
            .all(&self.tx)
            .await?;
        Ok(models.into_iter().map(CatalogItem::from).collect())
    }

    async fn insert_item(&mut self, item: NewCatalogItem) -> StoreResult<CatalogItem> {
        let name = item.name.clone();
        item.into_active_model(Utc::now())
            .insert(&self.tx)
            .await
            .map(CatalogItem::from)
            .map_err(|err| conflict_or_database(err, &name))
    }
}

#[async_trait]
impl InventoryStore for SqlUnit {
    async fn holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        let model = inventory::Entity::find()
            .filter(inventory::Column::UserId.eq(account))
            .filter(inventory::Column::ItemId.eq(item))
            .one(&self.tx)
            .await?;
        Ok(model.map(InventoryRecord::from))
    }

    async fn holdings(&mut self, account: AccountId) -> StoreResult<Vec<InventoryRecord>> {
        let models = inventory::Entity::find()
            .filter(inventory::Column::UserId.eq(account))
            .order_by_asc(inventory::Column::Id)
            .all(&self.tx)
            .await?;
        Ok(models.into_iter().map(InventoryRecord::from).collect())
    }

    async fn increment_holding(&mut self, account: AccountId, item: ItemId) -> StoreResult<bool> {
        let result = inventory::Entity::update_many()
            .col_expr(
                inventory::Column::Quantity,
                Expr::col(inventory::Column::Quantity).add(1),
            )
            .filter(inventory::Column::UserId.eq(account))
            .filter(inventory::Column::ItemId.eq(item))
            .exec(&self.tx)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn insert_holding(
        &mut self,
        account: AccountId,
        item: ItemId,
    ) -> StoreResult<Option<InventoryRecord>> {
        // A failed insert poisons the whole transaction on some backends, so
        // it runs inside a savepoint that can be discarded on its own.
        let savepoint = self.tx.begin().await?;
        let inserted = inventory::first_acquisition(account, item, Utc::now())
            .insert(&savepoint)
            .await;
        match inserted {
            Ok(model) => {
                savepoint.commit().await?;
                Ok(Some(InventoryRecord::from(model)))
            }
            Err(err) => match conflict_or_database(err, "user_inventory") {
                StoreError::Conflict(_) => {
                    savepoint.rollback().await?;
                    Ok(None)
                }
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl LedgerStore for SqlUnit {
    async fn append(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        let model = entry.into_active_model(Utc::now()).insert(&self.tx).await?;
        LedgerEntry::try_from(model).map_err(|err| StoreError::Corrupted(err.to_string()))
    }

    async fn entries_for(&mut self, account: AccountId) -> StoreResult<Vec<LedgerEntry>> {
        let models = ledger::Entity::find()
            .filter(
                Condition::any()
                    .add(ledger::Column::FromUserId.eq(account))
                    .add(ledger::Column::ToUserId.eq(account)),
            )
            .order_by_desc(ledger::Column::CreatedAt)
            .order_by_asc(ledger::Column::Id)
            .all(&self.tx)
            .await?;
        models
            .into_iter()
            .map(|model| {
                LedgerEntry::try_from(model).map_err(|err| StoreError::Corrupted(err.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl UnitOfWork for SqlUnit {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
