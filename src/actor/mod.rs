//! The actor handle, worker loop, and lifecycle.

use crate::{
    mailbox::{Entry, Mailbox, Receiver},
    registry::Registry,
    Arg, Error, Event, EventHandler,
};
use futures::{channel::oneshot, future::Shared, select_biased, FutureExt, StreamExt};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, trace};

#[cfg(test)]
mod tests;

/// How long the drain helper sleeps between observations of the mailbox.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a sequential event processor.
///
/// Cloning is cheap and every clone addresses the same actor; all operations
/// take `&self` and may be called from any number of concurrent tasks. See
/// the crate docs for the processing and shutdown contract.
pub struct Actor<E: Event> {
    inner: Arc<Inner<E>>,
}

impl<E: Event> Clone for Actor<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Event> std::fmt::Debug for Actor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor").finish_non_exhaustive()
    }
}

struct Inner<E: Event> {
    registry: Registry<E>,
    mailbox: Mailbox<E>,
    /// Resolves once the worker task has fully exited, however it exited.
    done: Shared<oneshot::Receiver<()>>,
}

impl<E: Event> Actor<E> {
    /// Create an actor with its worker already running.
    ///
    /// Must be called from within a tokio runtime: the worker runs as a
    /// spawned task for the life of the actor.
    pub fn new() -> Self {
        let (mailbox, receiver, shutdown) = Mailbox::new();
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(run(receiver, shutdown, done_tx));
        Self {
            inner: Arc::new(Inner {
                registry: Registry::new(),
                mailbox,
                done: done_rx.shared(),
            }),
        }
    }

    /// Bind `handler` to `event`.
    ///
    /// Fails with [`Error::AlreadyRegistered`] if the event is already bound;
    /// the existing handler remains in place. Safe to call concurrently with
    /// casts and other registrations, at any point before the corresponding
    /// cast.
    pub async fn register<F>(&self, event: E, handler: F) -> Result<(), Error<E>>
    where
        F: Fn(Vec<Arg>) + Send + Sync + 'static,
    {
        self.register_handler(event, Some(Arc::new(handler))).await
    }

    /// Bind a pre-built handler to `event`.
    ///
    /// For callers that source handlers from a fallible lookup: `None` is
    /// rejected with [`Error::InvalidHandler`] and leaves the event unbound.
    pub async fn register_handler(
        &self,
        event: E,
        handler: Option<EventHandler>,
    ) -> Result<(), Error<E>> {
        self.inner.registry.install(event, handler).await
    }

    /// Submit one occurrence of `event` with `args` for ordered processing.
    ///
    /// The registry is checked synchronously before any enqueue: an unbound
    /// event fails with [`Error::NotRegistered`] and the mailbox is left
    /// untouched. On success the call resolves once the mailbox has accepted
    /// the entry. Acceptance is a rendezvous with the worker, which is the
    /// only backpressure offered: a cast issued while the worker is busy
    /// waits until the worker comes back for more work.
    ///
    /// Acceptance says nothing about the handler's outcome. Callers needing a
    /// result must arrange it themselves, e.g. by passing an output slot or a
    /// signalling channel as an argument.
    pub async fn cast(&self, event: E, args: Vec<Arg>) -> Result<(), Error<E>> {
        let handler = self.inner.registry.lookup(&event).await?;
        self.inner
            .mailbox
            .deliver(Entry {
                event,
                handler,
                args,
            })
            .await
    }

    /// Close the actor, waiting until the worker has fully stopped.
    ///
    /// Idempotent: the shutdown signal is sent exactly once no matter how
    /// many callers race here, and none of them return before the worker has
    /// actually stopped. Every entry accepted before close runs; entries
    /// whose handoff had not completed are rejected with [`Error::Closed`].
    /// Once any call to close returns, no handler will ever run again.
    pub async fn close(&self) {
        if let Some(signal) = self.inner.mailbox.seal().await {
            debug!("closing");
            let _ = signal.send(());
        }
        let _ = self.inner.done.clone().await;
    }

    /// Wait until the mailbox is momentarily empty, or `timeout` elapses.
    ///
    /// Best-effort, intended for test synchronization only: an empty mailbox
    /// does not mean the worker has finished invoking the handler for the
    /// last-accepted entry. Do not rely on this for correctness.
    pub async fn drain(&self, timeout: Duration) -> Result<(), Error<E>> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.inner.mailbox.is_empty() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::DrainTimeout(timeout));
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }
}

impl<E: Event> Default for Actor<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Worker loop: applies accepted entries one at a time, in acceptance order.
///
/// Exits when the shutdown signal fires (running out entries that were
/// already accepted first) or when every caller endpoint is gone. Dispatch is
/// not wrapped in recovery: a panicking handler unwinds the task and `done`
/// is dropped rather than sent.
async fn run<E: Event>(
    mut receiver: Receiver<E>,
    mut shutdown: oneshot::Receiver<()>,
    done: oneshot::Sender<()>,
) {
    loop {
        select_biased! {
            _ = shutdown => {
                // The mailbox is sealed before the signal is sent, so the
                // channel already holds every accepted entry.
                while let Some(entry) = receiver.try_recv() {
                    dispatch(entry);
                }
                debug!("shutdown");
                break;
            }
            entry = receiver.next() => match entry {
                Some(entry) => dispatch(entry),
                None => {
                    debug!("all handles dropped");
                    break;
                }
            },
        }
    }
    let _ = done.send(());
}

fn dispatch<E: Event>(entry: Entry<E>) {
    trace!(event = ?entry.event, args = entry.args.len(), "dispatch");
    (entry.handler)(entry.args);
}
