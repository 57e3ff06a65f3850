use crate::{
    AccountId, EngineError, ItemId, LedgerEntry, NewLedgerEntry, PurchaseCmd, ResultEngine,
    store::{AccountStore, CatalogStore, InventoryStore, LedgerStore, Storage, StoreError},
};

use super::{Engine, Failure, with_unit};

impl<S: Storage> Engine<S> {
    /// Debits the item price from the buyer, adds one unit of the item to the
    /// buyer's inventory and records a `purchase` ledger entry.
    pub async fn purchase(&self, cmd: PurchaseCmd) -> ResultEngine<LedgerEntry> {
        let PurchaseCmd {
            buyer_id,
            item: item_name,
            deadline,
        } = cmd;

        let entry = with_unit!(self, "purchase", deadline, |unit| {
            let item = unit
                .item_by_name(&item_name)
                .await?
                .ok_or_else(|| EngineError::ItemNotFound(item_name.clone()))?;
            let buyer = unit
                .lock_account(buyer_id)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(format!("id {buyer_id}")))?;
            let new_entry = NewLedgerEntry::purchase(buyer.id, item.price, item.id)?;

            let insufficient = || {
                EngineError::InsufficientFunds(format!(
                    "{} has {} coins, {} costs {}",
                    buyer.username, buyer.coins, item.name, item.price
                ))
            };
            if !buyer.can_afford(item.price) {
                return Err(insufficient().into());
            }
            if !unit.debit(buyer.id, item.price).await? {
                return Err(insufficient().into());
            }
            add_to_inventory(&mut unit, buyer.id, item.id).await?;
            unit.append(new_entry).await?
        })?;

        tracing::debug!(
            entry = entry.id,
            buyer = entry.from_account,
            item = ?entry.item_id,
            amount = entry.amount,
            "purchase committed"
        );
        Ok(entry)
    }
}

/// Increments the (account, item) record, creating it on first acquisition.
///
/// A concurrent first purchase may create the record between the lookup and
/// the insert; the refused insert then falls back to an increment.
async fn add_to_inventory<U: InventoryStore>(
    unit: &mut U,
    account: AccountId,
    item: ItemId,
) -> Result<(), Failure> {
    if unit.holding(account, item).await?.is_some() {
        if unit.increment_holding(account, item).await? {
            return Ok(());
        }
    } else if unit.insert_holding(account, item).await?.is_some()
        || unit.increment_holding(account, item).await?
    {
        return Ok(());
    }
    Err(StoreError::Conflict(format!(
        "inventory record ({account}, {item}) could not be written"
    ))
    .into())
}
