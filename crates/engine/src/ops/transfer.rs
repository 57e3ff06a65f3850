use crate::{
    Account, AccountId, EngineError, LedgerEntry, NewLedgerEntry, ResultEngine, TransferCmd,
    credentials,
    store::{AccountStore, LedgerStore, Storage},
};

use super::{Engine, Failure, with_unit};

impl<S: Storage> Engine<S> {
    /// Moves `amount` coins from the sender to the account named `recipient`
    /// and records a `transfer` ledger entry.
    ///
    /// Both parties are locked in ascending id order before the balance check,
    /// so opposite-direction transfers between the same pair cannot deadlock.
    /// Sending to oneself is rejected with [`EngineError::InvalidRecipient`].
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<LedgerEntry> {
        let TransferCmd {
            sender_id,
            recipient,
            amount,
            deadline,
        } = cmd;
        if amount <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be > 0, got {amount}"
            )));
        }
        let recipient = credentials::canonical_username(&recipient);

        let entry = with_unit!(self, "transfer", deadline, |unit| {
            let sender_id = unit
                .account(sender_id)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(format!("id {sender_id}")))?
                .id;
            let recipient_id = unit
                .account_by_name(&recipient)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(recipient.clone()))?
                .id;
            let new_entry = NewLedgerEntry::transfer(sender_id, recipient_id, amount)?;

            let (sender, recipient) = lock_pair(&mut unit, sender_id, recipient_id).await?;
            if !sender.can_afford(amount) {
                return Err(insufficient(&sender, amount).into());
            }
            if recipient.coins.checked_add(amount).is_none() {
                return Err(EngineError::InvalidAmount(format!(
                    "balance of {} cannot hold {amount} more coins",
                    recipient.username
                ))
                .into());
            }
            if !unit.debit(sender.id, amount).await? {
                return Err(insufficient(&sender, amount).into());
            }
            if !unit.credit(recipient.id, amount).await? {
                return Err(EngineError::AccountNotFound(recipient.username).into());
            }
            unit.append(new_entry).await?
        })?;

        tracing::debug!(
            entry = entry.id,
            from = entry.from_account,
            to = entry.to_account,
            amount = entry.amount,
            "transfer committed"
        );
        Ok(entry)
    }
}

/// Locks both accounts, lower id first, and returns them as `(a, b)`.
async fn lock_pair<U: AccountStore>(
    unit: &mut U,
    a: AccountId,
    b: AccountId,
) -> Result<(Account, Account), Failure> {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let low = lock(unit, low).await?;
    let high = lock(unit, high).await?;
    Ok(if low.id == a { (low, high) } else { (high, low) })
}

async fn lock<U: AccountStore>(unit: &mut U, id: AccountId) -> Result<Account, Failure> {
    let account = unit
        .lock_account(id)
        .await?
        .ok_or_else(|| EngineError::AccountNotFound(format!("id {id}")))?;
    Ok(account)
}

fn insufficient(account: &Account, amount: i64) -> EngineError {
    EngineError::InsufficientFunds(format!(
        "{} has {} coins, {amount} needed",
        account.username, account.coins
    ))
}
