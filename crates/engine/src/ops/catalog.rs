use crate::{
    CatalogItem, EngineError, NewCatalogItem, ResultEngine,
    store::{CatalogStore, Storage, StoreError},
};

use super::{Engine, with_unit};

impl<S: Storage> Engine<S> {
    /// Every catalog item ordered by id.
    pub async fn catalog(&self) -> ResultEngine<Vec<CatalogItem>> {
        with_unit!(self, "catalog", None, |unit| { unit.items().await? })
    }

    pub async fn add_catalog_item(&self, name: &str, price: i64) -> ResultEngine<CatalogItem> {
        let item = NewCatalogItem::new(name, price)?;
        let name = item.name.clone();

        let item = with_unit!(self, "add catalog item", None, |unit| {
            if unit.item_by_name(&name).await?.is_some() {
                return Err(EngineError::ItemAlreadyExists(name.clone()).into());
            }
            match unit.insert_item(item).await {
                Ok(item) => item,
                Err(StoreError::Conflict(_)) => {
                    return Err(EngineError::ItemAlreadyExists(name.clone()).into());
                }
                Err(err) => return Err(err.into()),
            }
        })?;

        tracing::info!(item = item.id, name = %item.name, price = item.price, "catalog item added");
        Ok(item)
    }
}
