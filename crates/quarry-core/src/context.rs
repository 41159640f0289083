use crate::{Error, Result};

use std::{future::Future, time::Duration};
use tokio::{sync::watch, time::Instant};

/// Deadline and cancellation signal carried by an operation.
///
/// Contexts are cheap to clone. Derived contexts keep the earlier of the
/// two deadlines and observe every cancellation handle of their parents.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels every [`Context`] derived from the one that created it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Context {
    /// A context with no deadline that is never cancelled.
    pub fn background() -> Context {
        Context::default()
    }

    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };

        Context {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut cancel = self.cancel.clone();
        cancel.push(rx);

        (
            Context {
                deadline: self.deadline,
                cancel,
            },
            CancelHandle { tx },
        )
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the error the context would fail with right now, if any.
    pub fn err(&self) -> Option<Error> {
        if self.cancel.iter().any(|rx| *rx.borrow()) {
            return Some(Error::cancelled());
        }

        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(Error::deadline_exceeded()),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<()> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Runs `fut` until it completes, the deadline passes or the context is
    /// cancelled, whichever happens first.
    pub async fn run<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        self.check()?;

        if self.deadline.is_none() && self.cancel.is_empty() {
            return fut.await;
        }

        let cancelled = async {
            let waits = self.cancel.iter().cloned().map(|mut rx| {
                Box::pin(async move {
                    // A dropped handle can no longer cancel.
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                })
            });

            if self.cancel.is_empty() {
                std::future::pending::<()>().await;
            } else {
                futures::future::select_all(waits).await;
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            res = fut => res,
            _ = cancelled => Err(Error::cancelled()),
            _ = expired => Err(Error::deadline_exceeded()),
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}
