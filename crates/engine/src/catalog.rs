//! Catalog items: the merch that coins can buy.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;

use crate::{EngineError, ResultEngine};

pub type ItemId = i64;

/// A purchasable item. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewCatalogItem {
    pub name: String,
    pub price: i64,
}

impl NewCatalogItem {
    pub fn new(name: &str, price: i64) -> ResultEngine<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidInput(
                "item name must not be empty".to_string(),
            ));
        }
        if price <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "price of \"{name}\" must be > 0"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            price,
        })
    }

    pub(crate) fn into_active_model(self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(self.name),
            price: ActiveValue::Set(self.price),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "merch_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub price: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CatalogItem {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            created_at: model.created_at,
        }
    }
}
