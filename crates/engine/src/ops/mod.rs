use std::{future::Future, time::Duration};

use crate::{
    EngineError, INITIAL_BALANCE, ResultEngine,
    store::{SqlStorage, Storage, StoreError, UnitOfWork},
};

mod accounts;
mod catalog;
mod history;
mod purchase;
mod transfer;

pub use accounts::AccountInfo;

/// Why a unit of work did not commit.
pub(crate) enum Failure {
    Engine(EngineError),
    Store(StoreError),
}

impl From<EngineError> for Failure {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Run a block inside a unit of work, committing on success and rolling back
/// on error. The block evaluates to the value of the operation and may use `?`
/// on both engine and store errors.
///
/// The deadline covers opening the unit and running the block. A commit that
/// has started is always awaited to completion.
macro_rules! with_unit {
    ($engine:expr, $op:literal, $deadline:expr, |$unit:ident| $body:expr) => {{
        let work = async {
            #[allow(unused_mut)]
            let mut $unit = match $crate::store::Storage::begin(&$engine.storage).await {
                Ok(unit) => unit,
                Err(err) => return Err($crate::ops::Failure::from(err)),
            };
            let result = async {
                let value = $body;
                Ok::<_, $crate::ops::Failure>(value)
            }
            .await;
            match result {
                Ok(value) => Ok(($unit, value)),
                Err(err) => {
                    if let Err(rollback) = $crate::store::UnitOfWork::rollback($unit).await {
                        tracing::warn!(op = $op, "rollback failed: {rollback}");
                    }
                    Err(err)
                }
            }
        };
        $engine.settle($op, $deadline, work).await
    }};
}

pub(crate) use with_unit;

#[derive(Debug)]
pub struct Engine<S = SqlStorage> {
    storage: S,
    initial_balance: i64,
    operation_timeout: Option<Duration>,
}

impl<S: Storage> Engine<S> {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder(storage: S) -> EngineBuilder<S> {
        EngineBuilder {
            storage,
            initial_balance: INITIAL_BALANCE,
            operation_timeout: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn initial_balance(&self) -> i64 {
        self.initial_balance
    }

    /// Runs a unit of work under its deadline, commits it and turns its
    /// failure into the error callers see.
    ///
    /// Expiry before the commit drops the unit, which rolls it back. Store
    /// failures are logged here and leave as [`EngineError::OperationFailed`].
    async fn settle<T, U, F>(
        &self,
        op: &'static str,
        deadline: Option<Duration>,
        work: F,
    ) -> ResultEngine<T>
    where
        U: UnitOfWork,
        F: Future<Output = Result<(U, T), Failure>>,
    {
        let prepared = match deadline.or(self.operation_timeout) {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(prepared) => prepared,
                Err(_) => {
                    tracing::warn!(op, ?limit, "deadline exceeded, unit of work abandoned");
                    return Err(EngineError::Timeout(op.to_string()));
                }
            },
            None => work.await,
        };
        let outcome = match prepared {
            Ok((unit, value)) => unit.commit().await.map(|()| value).map_err(Failure::from),
            Err(failure) => Err(failure),
        };
        outcome.map_err(|failure| match failure {
            Failure::Engine(err) => err,
            Failure::Store(err) => {
                tracing::error!(op, "storage failure: {err}");
                EngineError::OperationFailed(op.to_string())
            }
        })
    }
}

/// The builder for `Engine`
pub struct EngineBuilder<S> {
    storage: S,
    initial_balance: i64,
    operation_timeout: Option<Duration>,
}

impl<S: Storage> EngineBuilder<S> {
    /// Coins granted to every newly registered account.
    pub fn initial_balance(mut self, coins: i64) -> EngineBuilder<S> {
        self.initial_balance = coins;
        self
    }

    /// Default deadline of every unit of work. Commands may override it.
    pub fn operation_timeout(mut self, timeout: Duration) -> EngineBuilder<S> {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine<S>> {
        if self.initial_balance < 0 {
            return Err(EngineError::InvalidAmount(format!(
                "initial balance must be >= 0, got {}",
                self.initial_balance
            )));
        }
        if self.operation_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(EngineError::InvalidInput(
                "operation timeout must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            storage: self.storage,
            initial_balance: self.initial_balance,
            operation_timeout: self.operation_timeout,
        })
    }
}
