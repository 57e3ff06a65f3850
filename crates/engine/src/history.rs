//! Coin history: an account's ledger entries split into what it received and
//! what it sent.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    Account, AccountId, EntryId, EntryKind, ItemId, LedgerEntry, ledger::sort_newest_first,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct History {
    pub received: Vec<HistoryEntry>,
    pub sent: Vec<HistoryEntry>,
}

/// One ledger entry seen from the owner's side.
///
/// `counterparty` is the sender for received entries and the recipient for
/// sent ones. Purchases are sent entries whose counterparty is the owner and
/// whose `item` names what was bought.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub counterparty: String,
    pub amount: i64,
    pub kind: EntryKind,
    pub item: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Builds the history of `owner`.
///
/// `names` and `items` resolve account and item ids. Transfers whose
/// counterparty is missing from `names` are skipped; a purchase whose item is
/// missing keeps `item: None`.
pub(crate) fn project(
    owner: &Account,
    mut entries: Vec<LedgerEntry>,
    names: &HashMap<AccountId, String>,
    items: &HashMap<ItemId, String>,
) -> History {
    sort_newest_first(&mut entries);
    let mut history = History::default();
    for entry in entries {
        let (counterparty, sent) = match entry.kind {
            EntryKind::Purchase if entry.from_account == owner.id => (owner.id, true),
            EntryKind::Transfer if entry.from_account == owner.id => (entry.to_account, true),
            EntryKind::Transfer if entry.to_account == owner.id => (entry.from_account, false),
            _ => continue,
        };
        let counterparty = if counterparty == owner.id {
            owner.username.clone()
        } else {
            match names.get(&counterparty) {
                Some(name) => name.clone(),
                None => continue,
            }
        };
        let line = HistoryEntry {
            id: entry.id,
            counterparty,
            amount: entry.amount,
            kind: entry.kind,
            item: entry.item_id.and_then(|id| items.get(&id).cloned()),
            created_at: entry.created_at,
        };
        if sent {
            history.sent.push(line);
        } else {
            history.received.push(line);
        }
    }
    history
}
