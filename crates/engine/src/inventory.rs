//! Inventory: how many of each catalog item an account owns.
//!
//! There is at most one record per (account, item); repeat purchases bump
//! `quantity` instead of adding rows.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

use crate::{AccountId, ItemId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InventoryRecord {
    pub id: i64,
    pub account_id: AccountId,
    pub item_id: ItemId,
    pub quantity: i64,
    /// When the item was first acquired.
    pub acquired_at: DateTime<Utc>,
}

/// An inventory line with the item name resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OwnedItem {
    pub item: String,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    pub purchased_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for InventoryRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.user_id,
            item_id: model.item_id,
            quantity: model.quantity,
            acquired_at: model.purchased_at,
        }
    }
}

pub(crate) fn first_acquisition(
    account_id: AccountId,
    item_id: ItemId,
    acquired_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::NotSet,
        user_id: ActiveValue::Set(account_id),
        item_id: ActiveValue::Set(item_id),
        quantity: ActiveValue::Set(1),
        purchased_at: ActiveValue::Set(acquired_at),
    }
}
