//! Command structs for engine operations.
//!
//! These types group the parameters of the write operations
//! (transfer/purchase), keeping call sites readable and leaving room for an
//! optional deadline.

use std::time::Duration;

use crate::AccountId;

/// Move coins from an account to another, named, account.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub sender_id: AccountId,
    pub recipient: String,
    pub amount: i64,
    pub deadline: Option<Duration>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(sender_id: AccountId, recipient: impl Into<String>, amount: i64) -> Self {
        Self {
            sender_id,
            recipient: recipient.into(),
            amount,
            deadline: None,
        }
    }

    /// Overrides the engine's default operation timeout.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Spend coins on one catalog item.
#[derive(Clone, Debug)]
pub struct PurchaseCmd {
    pub buyer_id: AccountId,
    pub item: String,
    pub deadline: Option<Duration>,
}

impl PurchaseCmd {
    #[must_use]
    pub fn new(buyer_id: AccountId, item: impl Into<String>) -> Self {
        Self {
            buyer_id,
            item: item.into(),
            deadline: None,
        }
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
