use serde::Serialize;

use crate::{
    Account, AccountId, EngineError, History, NewAccount, OwnedItem, ResultEngine, credentials,
    store::{AccountStore, Storage, StoreError, UnitOfWork},
};

use super::{Engine, Failure, history::load_history, with_unit};

/// Everything shown to an account holder, read in one unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountInfo {
    pub account: Account,
    pub inventory: Vec<OwnedItem>,
    pub history: History,
}

impl<S: Storage> Engine<S> {
    /// Creates an account holding the configured initial balance.
    pub async fn register(&self, username: &str, password: &str) -> ResultEngine<Account> {
        let username = credentials::normalize_username(username)?;
        credentials::validate_password(password)?;
        let new_account = NewAccount {
            username: username.clone(),
            password_hash: credentials::hash_password(password)?,
            coins: self.initial_balance,
        };

        let account = with_unit!(self, "register", None, |unit| {
            if unit.account_by_name(&username).await?.is_some() {
                return Err(EngineError::AccountAlreadyExists(username.clone()).into());
            }
            match unit.insert_account(new_account).await {
                Ok(account) => account,
                Err(StoreError::Conflict(_)) => {
                    return Err(EngineError::AccountAlreadyExists(username.clone()).into());
                }
                Err(err) => return Err(err.into()),
            }
        })?;

        tracing::info!(account = account.id, username = %account.username, "account registered");
        Ok(account)
    }

    /// Unknown usernames and wrong passwords both yield
    /// [`EngineError::InvalidCredentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<Account> {
        let username = credentials::canonical_username(username);
        let account = with_unit!(self, "authenticate", None, |unit| {
            unit.account_by_name(&username).await?
        })?;
        match account {
            Some(account) if credentials::verify_password(password, &account.password_hash) => {
                Ok(account)
            }
            _ => Err(EngineError::InvalidCredentials),
        }
    }

    /// Authenticates an existing account or registers a new one.
    pub async fn sign_in(&self, username: &str, password: &str) -> ResultEngine<Account> {
        match self.authenticate(username, password).await {
            Err(EngineError::InvalidCredentials) => {}
            other => return other,
        }
        match self
            .account_by_name(&credentials::canonical_username(username))
            .await
        {
            Ok(_) => return Err(EngineError::InvalidCredentials),
            Err(EngineError::AccountNotFound(_)) => {}
            Err(err) => return Err(err),
        }
        match self.register(username, password).await {
            // Somebody registered the name in between.
            Err(EngineError::AccountAlreadyExists(_)) => {
                self.authenticate(username, password).await
            }
            other => other,
        }
    }

    pub async fn account(&self, id: AccountId) -> ResultEngine<Account> {
        with_unit!(self, "account", None, |unit| {
            unit.account(id)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(format!("id {id}")))?
        })
    }

    pub async fn account_by_name(&self, username: &str) -> ResultEngine<Account> {
        let username = credentials::canonical_username(username);
        with_unit!(self, "account", None, |unit| {
            unit.account_by_name(&username)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(username.clone()))?
        })
    }

    /// Owned items with their names resolved.
    pub async fn inventory(&self, id: AccountId) -> ResultEngine<Vec<OwnedItem>> {
        with_unit!(self, "inventory", None, |unit| {
            if unit.account(id).await?.is_none() {
                return Err(EngineError::AccountNotFound(format!("id {id}")).into());
            }
            load_inventory(&mut unit, id).await?
        })
    }

    /// Balance, inventory and history from a single consistent read.
    pub async fn account_info(&self, id: AccountId) -> ResultEngine<AccountInfo> {
        with_unit!(self, "account info", None, |unit| {
            let account = unit
                .account(id)
                .await?
                .ok_or_else(|| EngineError::AccountNotFound(format!("id {id}")))?;
            let inventory = load_inventory(&mut unit, id).await?;
            let history = load_history(&mut unit, &account).await?;
            AccountInfo {
                account,
                inventory,
                history,
            }
        })
    }
}

/// Records whose item cannot be resolved are skipped.
async fn load_inventory<U: UnitOfWork>(
    unit: &mut U,
    account: AccountId,
) -> Result<Vec<OwnedItem>, Failure> {
    let mut owned = Vec::new();
    for record in unit.holdings(account).await? {
        if let Some(item) = unit.item(record.item_id).await? {
            owned.push(OwnedItem {
                item: item.name,
                quantity: record.quantity,
            });
        }
    }
    Ok(owned)
}
