//! The module contains `Account` and the `users` table it is stored in.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

/// Store-assigned account identifier.
pub type AccountId = i64;

/// Coins a freshly registered account starts with.
pub const INITIAL_BALANCE: i64 = 1000;

/// A coin account.
///
/// `username` is unique and never changes after creation. `coins` is never
/// negative: every debit is guarded at the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub coins: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn can_afford(&self, amount: i64) -> bool {
        self.coins >= amount
    }
}

/// An account that has not been stored yet.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub coins: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub coins: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            password_hash: model.password_hash,
            coins: model.coins,
            created_at: model.created_at,
        }
    }
}

impl NewAccount {
    pub(crate) fn into_active_model(self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(self.username),
            password_hash: ActiveValue::Set(self.password_hash),
            coins: ActiveValue::Set(self.coins),
            created_at: ActiveValue::Set(created_at),
        }
    }
}
