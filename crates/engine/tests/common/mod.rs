#![allow(dead_code)]

use engine::{Account, AccountId, Engine, MemoryStorage, SqlStorage, Storage};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, Statement};

pub const PASSWORD: &str = "password";

/// Engine over a migrated in-memory SQLite database. The catalog holds the
/// seeded merch.
pub async fn sql_engine() -> Engine {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder(SqlStorage::new(db)).build().await.unwrap()
}

/// Engine over an empty in-memory store.
pub async fn memory_engine() -> Engine<MemoryStorage> {
    Engine::builder(MemoryStorage::new()).build().await.unwrap()
}

pub async fn register<S: Storage>(engine: &Engine<S>, username: &str) -> Account {
    engine.register(username, PASSWORD).await.unwrap()
}

pub async fn set_coins(engine: &Engine, id: AccountId, coins: i64) {
    let db = engine.storage().database();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE users SET coins = ? WHERE id = ?",
        vec![coins.into(), id.into()],
    ))
    .await
    .unwrap();
}

/// Balances, inventory and ledger, read straight from the tables.
#[derive(Debug, PartialEq, Eq)]
pub struct DbState {
    pub coins: Vec<(i64, i64)>,
    pub inventory: Vec<(i64, i64, i64)>,
    pub ledger: Vec<(i64, i64, i64, i64)>,
}

pub async fn db_state(engine: &Engine) -> DbState {
    let db = engine.storage().database();
    let backend = db.get_database_backend();
    let query = |sql: &str| Statement::from_string(backend, sql.to_string());

    let coins = db
        .query_all(query("SELECT id, coins FROM users ORDER BY id"))
        .await
        .unwrap()
        .iter()
        .map(|row| {
            (
                row.try_get::<i64>("", "id").unwrap(),
                row.try_get::<i64>("", "coins").unwrap(),
            )
        })
        .collect();
    let inventory = db
        .query_all(query(
            "SELECT user_id, item_id, quantity FROM user_inventory ORDER BY id",
        ))
        .await
        .unwrap()
        .iter()
        .map(|row| {
            (
                row.try_get::<i64>("", "user_id").unwrap(),
                row.try_get::<i64>("", "item_id").unwrap(),
                row.try_get::<i64>("", "quantity").unwrap(),
            )
        })
        .collect();
    let ledger = db
        .query_all(query(
            "SELECT id, from_user_id, to_user_id, amount FROM transactions ORDER BY id",
        ))
        .await
        .unwrap()
        .iter()
        .map(|row| {
            (
                row.try_get::<i64>("", "id").unwrap(),
                row.try_get::<i64>("", "from_user_id").unwrap(),
                row.try_get::<i64>("", "to_user_id").unwrap(),
                row.try_get::<i64>("", "amount").unwrap(),
            )
        })
        .collect();

    DbState {
        coins,
        inventory,
        ledger,
    }
}
