//! Ledger primitives.
//!
//! A `LedgerEntry` is the immutable record of one balance-affecting event.
//! Entries are only ever appended, never updated or deleted.
//!
//! Purchases reuse the transfer shape: source and destination are both the
//! buyer's account and `item_id` names what was bought.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{AccountId, EngineError, ItemId, ResultEngine};

pub type EntryId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Transfer,
    Purchase,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Purchase => "purchase",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "purchase" => Ok(Self::Purchase),
            other => Err(EngineError::InvalidInput(format!(
                "invalid ledger entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub amount: i64,
    pub kind: EntryKind,
    pub item_id: Option<ItemId>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn involves(&self, account: AccountId) -> bool {
        self.from_account == account || self.to_account == account
    }
}

/// An entry waiting to be appended. The store assigns id and timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLedgerEntry {
    from_account: AccountId,
    to_account: AccountId,
    amount: i64,
    kind: EntryKind,
    item_id: Option<ItemId>,
}

impl NewLedgerEntry {
    /// A peer-to-peer transfer between two distinct accounts.
    pub fn transfer(from: AccountId, to: AccountId, amount: i64) -> ResultEngine<Self> {
        ensure_positive(amount)?;
        if from == to {
            return Err(EngineError::InvalidRecipient(
                "cannot transfer coins to the same account".to_string(),
            ));
        }
        Ok(Self {
            from_account: from,
            to_account: to,
            amount,
            kind: EntryKind::Transfer,
            item_id: None,
        })
    }

    /// A spend: `account` paid `amount` for `item`.
    pub fn purchase(account: AccountId, amount: i64, item: ItemId) -> ResultEngine<Self> {
        ensure_positive(amount)?;
        Ok(Self {
            from_account: account,
            to_account: account,
            amount,
            kind: EntryKind::Purchase,
            item_id: Some(item),
        })
    }

    pub fn from_account(&self) -> AccountId {
        self.from_account
    }

    pub fn to_account(&self) -> AccountId {
        self.to_account
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn item_id(&self) -> Option<ItemId> {
        self.item_id
    }

    pub(crate) fn into_entry(self, id: EntryId, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id,
            from_account: self.from_account,
            to_account: self.to_account,
            amount: self.amount,
            kind: self.kind,
            item_id: self.item_id,
            created_at,
        }
    }

    pub(crate) fn into_active_model(self, created_at: DateTime<Utc>) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::NotSet,
            from_user_id: ActiveValue::Set(self.from_account),
            to_user_id: ActiveValue::Set(self.to_account),
            amount: ActiveValue::Set(self.amount),
            kind: ActiveValue::Set(self.kind.as_str().to_string()),
            item_id: ActiveValue::Set(self.item_id),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

fn ensure_positive(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}

/// Newest first; ties keep append order.
pub(crate) fn sort_newest_first(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub amount: i64,
    pub kind: String,
    pub item_id: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            from_account: model.from_user_id,
            to_account: model.to_user_id,
            amount: model.amount,
            kind: EntryKind::try_from(model.kind.as_str())?,
            item_id: model.item_id,
            created_at: model.created_at,
        })
    }
}
