use std::{future::Future, pin::Pin, time::Duration};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{EngineError, ResultEngine};

mod advance_returns;
mod balances;
mod invoices;
mod ledger;
mod parties;
mod projections;
mod receipts;
mod reports;
mod sequence;
mod transfers;
mod vendor_payments;

pub(crate) type TxFuture<'a, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'a>>;

/// How often a transaction that lost a write race is replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(10),
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    retry: RetryPolicy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Run `op` inside a DB transaction, committing on success and rolling
    /// back on error.
    ///
    /// `op` may run more than once: a `ConcurrentModification` (optimistic
    /// version mismatch or SQLite busy) rolls back and replays it up to
    /// `retry.max_retries` times.
    pub(crate) async fn with_tx<T, F>(&self, op: F) -> ResultEngine<T>
    where
        T: Send,
        F: for<'a> Fn(&'a Engine, &'a DatabaseTransaction) -> TxFuture<'a, T> + Send + Sync,
    {
        let mut attempt: u32 = 0;
        loop {
            let outcome = match self.database.begin().await {
                Ok(db_tx) => match op(self, &db_tx).await {
                    Ok(value) => db_tx.commit().await.map(|()| value).map_err(EngineError::from),
                    Err(err) => {
                        if let Err(rollback_err) = db_tx.rollback().await {
                            tracing::error!("rollback failed: {rollback_err}");
                        }
                        Err(err)
                    }
                },
                Err(err) => Err(EngineError::from(err)),
            };

            match outcome {
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(attempt, ?delay, "retrying after conflict: {err}");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    retry: RetryPolicy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the conflict retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> EngineBuilder {
        self.retry = retry;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            retry: self.retry,
        })
    }
}
