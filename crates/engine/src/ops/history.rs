use std::collections::{HashMap, HashSet};

use crate::{
    Account, AccountId, EngineError, History, ResultEngine, history,
    store::{AccountStore, Storage, UnitOfWork},
};

use super::{Engine, Failure, with_unit};

impl<S: Storage> Engine<S> {
    /// Received and sent coins of an account, newest first.
    pub async fn history(&self, account_id: AccountId) -> ResultEngine<History> {
        with_unit!(self, "history", None, |unit| {
            let owner = unit
                .account(account_id)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(format!("id {account_id}")))?;
            load_history(&mut unit, &owner).await?
        })
    }
}

/// Reads the ledger of `owner` and resolves every counterparty and item it
/// mentions, each at most once.
pub(super) async fn load_history<U: UnitOfWork>(
    unit: &mut U,
    owner: &Account,
) -> Result<History, Failure> {
    let entries = unit.entries_for(owner.id).await?;

    let mut looked_up = HashSet::from([owner.id]);
    let mut names = HashMap::new();
    let mut items = HashMap::new();
    for entry in &entries {
        for id in [entry.from_account, entry.to_account] {
            if looked_up.insert(id)
                && let Some(account) = unit.account(id).await?
            {
                names.insert(id, account.username);
            }
        }
        if let Some(item_id) = entry.item_id
            && !items.contains_key(&item_id)
            && let Some(item) = unit.item(item_id).await?
        {
            items.insert(item_id, item.name);
        }
    }

    Ok(history::project(owner, entries, &names, &items))
}
