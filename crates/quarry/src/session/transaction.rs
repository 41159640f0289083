use super::{ConnectionType, Session, TxOptions};

use quarry_core::{
    driver::{Operation, Transaction as TransactionOp},
    Context, Error, Result,
};

use futures::FutureExt;
use std::{
    ops::{Deref, DerefMut},
    panic::AssertUnwindSafe,
};

/// An active database transaction.
///
/// Derefs to a [`Session`] running every statement on the connection pinned
/// when the transaction started.
///
/// If dropped without calling [`commit`](Self::commit) or
/// [`rollback`](Self::rollback), the transaction is rolled back in a
/// spawned task.
#[derive(Debug)]
pub struct Transaction {
    session: Session,

    /// Whether commit or rollback has been called.
    done: bool,
}

impl Session {
    /// Starts a transaction on a connection taken from the pool.
    pub async fn begin(&self) -> Result<Transaction> {
        self.begin_with_ctx(&Context::background(), TxOptions::default())
            .await
    }

    pub async fn begin_with(&self, opts: TxOptions) -> Result<Transaction> {
        self.begin_with_ctx(&Context::background(), opts).await
    }

    #[tracing::instrument(level = "debug", skip(self, cx), fields(alias = %self.alias.name))]
    pub async fn begin_with_ctx(&self, cx: &Context, opts: TxOptions) -> Result<Transaction> {
        if self.is_transaction() {
            return Err(Error::unsupported_feature("nested transactions"));
        }

        let connection = cx.run(self.alias.pool.get()).await?;

        let mut session = Session {
            registry: self.registry.clone(),
            alias: self.alias.clone(),
            config: self.config.clone(),
            connection: ConnectionType::Transaction(Some(connection)),
        };

        session
            .exec_op(
                cx,
                Operation::Transaction(TransactionOp::Start {
                    isolation: opts.isolation,
                    read_only: opts.read_only,
                }),
            )
            .await?;

        Ok(Transaction {
            session,
            done: false,
        })
    }

    /// Runs `work` in a transaction.
    ///
    /// Commits when `work` returns `Ok` and it did not finish the
    /// transaction itself. Rolls back when it returns `Err` or panics; the
    /// panic resumes once the rollback completed.
    pub async fn run_in_transaction<T>(
        &self,
        work: impl AsyncFnOnce(&mut Transaction) -> Result<T>,
    ) -> Result<T> {
        self.run_in_transaction_with(&Context::background(), TxOptions::default(), work)
            .await
    }

    pub async fn run_in_transaction_with<T>(
        &self,
        cx: &Context,
        opts: TxOptions,
        work: impl AsyncFnOnce(&mut Transaction) -> Result<T>,
    ) -> Result<T> {
        let mut tx = self.begin_with_ctx(cx, opts).await?;

        let res = AssertUnwindSafe(work(&mut tx)).catch_unwind().await;

        match res {
            Ok(Ok(value)) => {
                if !tx.is_done() {
                    tx.commit_with_ctx(cx).await?;
                }
                Ok(value)
            }
            Ok(Err(err)) => {
                tx.rollback_after_failure().await;
                Err(err)
            }
            Err(panic) => {
                tx.rollback_after_failure().await;
                std::panic::resume_unwind(panic)
            }
        }
    }
}

impl Transaction {
    /// Commit the transaction.
    ///
    /// A failed commit is followed by a rollback attempt. Either way the
    /// transaction is finished afterwards.
    pub async fn commit(&mut self) -> Result<()> {
        self.commit_with_ctx(&Context::background()).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(alias = %self.session.alias.name))]
    pub async fn commit_with_ctx(&mut self, cx: &Context) -> Result<()> {
        self.finish(cx, TransactionOp::Commit).await
    }

    /// Roll back the transaction.
    pub async fn rollback(&mut self) -> Result<()> {
        self.rollback_with_ctx(&Context::background()).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(alias = %self.session.alias.name))]
    pub async fn rollback_with_ctx(&mut self, cx: &Context) -> Result<()> {
        self.finish(cx, TransactionOp::Rollback).await
    }

    /// Returns `true` once the transaction was committed or rolled back.
    pub fn is_done(&self) -> bool {
        self.done
    }

    async fn finish(&mut self, cx: &Context, op: TransactionOp) -> Result<()> {
        if self.done {
            return Err(Error::transaction_already_done());
        }
        self.done = true;

        let res = self
            .session
            .exec_op(cx, Operation::Transaction(op))
            .await
            .map(|_| ());

        let connection = match std::mem::replace(
            &mut self.session.connection,
            ConnectionType::Transaction(None),
        ) {
            ConnectionType::Transaction(connection) => connection,
            ConnectionType::Pool => None,
        };

        let Some(mut connection) = connection else {
            return res;
        };

        if let Err(err) = &res {
            // The connection may still be inside the transaction.
            let recovered = op == TransactionOp::Commit
                && connection
                    .exec(Operation::Transaction(TransactionOp::Rollback))
                    .await
                    .is_ok();

            if !recovered {
                tracing::error!(error = %err, "transaction left unfinished; discarding connection");
                connection.detach();
            }
        }

        res
    }

    /// Rolls back after `work` failed. The rollback error, if any, is logged
    /// so the original failure is the one reported.
    async fn rollback_after_failure(&mut self) {
        if self.done {
            return;
        }

        if let Err(err) = self.rollback_with_ctx(&Context::background()).await {
            tracing::error!(error = %err, "failed to roll back transaction");
        }
    }
}

impl Deref for Transaction {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        let ConnectionType::Transaction(Some(mut connection)) = std::mem::replace(
            &mut self.session.connection,
            ConnectionType::Transaction(None),
        ) else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let res = connection
                        .exec(Operation::Transaction(TransactionOp::Rollback))
                        .await;

                    if let Err(err) = res {
                        tracing::error!(error = %err, "failed to roll back dropped transaction");
                        connection.detach();
                    }
                });
            }
            Err(_) => connection.detach(),
        }
    }
}
