//! Ordered handoff point between casters and the worker.

use crate::{Arg, Error, Event, EventHandler};
use async_lock::{Mutex, RwLock};
use futures::{
    channel::{mpsc, oneshot},
    stream::{FusedStream, Stream},
    SinkExt, StreamExt,
};
use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

/// A single accepted unit of work: the event, the handler snapshotted from
/// the registry at cast time, and the arguments to invoke it with. Consumed
/// exactly once by the worker.
pub(crate) struct Entry<E: Event> {
    pub event: E,
    pub handler: EventHandler,
    pub args: Vec<Arg>,
}

/// Caller-side endpoint of the mailbox.
///
/// The channel carries no buffer, so delivery is a rendezvous: concurrent
/// casters serialize at the sender lock, and the one in flight resolves only
/// once the worker comes back to the channel for more work. A caster never
/// runs ahead of the worker beyond the handoff itself; in particular, a
/// delivery issued while the worker is inside a handler waits out that
/// handler.
pub(crate) struct Mailbox<E: Event> {
    tx: Mutex<mpsc::Sender<Entry<E>>>,
    /// Entries committed to a handoff but not yet dequeued by the worker.
    pending: Arc<AtomicUsize>,
    /// Acceptance gate. Every delivery holds shared access across its entire
    /// handoff; sealing takes exclusive access, so once the gate is sealed no
    /// handoff is mid-flight and every accepted entry is already in the
    /// channel. The first seal yields the worker's shutdown signal.
    gate: RwLock<Option<oneshot::Sender<()>>>,
}

impl<E: Event> Mailbox<E> {
    /// Create a mailbox along with the worker-side [`Receiver`] and the
    /// shutdown signal the worker selects on.
    pub(crate) fn new() -> (Self, Receiver<E>, oneshot::Receiver<()>) {
        let (tx, rx) = mpsc::channel(0);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let pending = Arc::new(AtomicUsize::new(0));
        (
            Self {
                tx: Mutex::new(tx),
                pending: pending.clone(),
                gate: RwLock::new(Some(shutdown_tx)),
            },
            Receiver { rx, pending },
            shutdown_rx,
        )
    }

    /// Hand `entry` to the worker, waiting until the rendezvous completes.
    ///
    /// Fails with [`Error::Closed`] if the mailbox has been sealed or the
    /// worker is gone.
    pub(crate) async fn deliver(&self, entry: Entry<E>) -> Result<(), Error<E>> {
        let gate = self.gate.read().await;
        if gate.is_none() {
            return Err(Error::Closed);
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        let mut tx = self.tx.lock().await;
        if tx.send(entry).await.is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Stop accepting entries.
    ///
    /// Waits out any handoff in flight before sealing. Returns the shutdown
    /// signal on the first seal and `None` thereafter.
    pub(crate) async fn seal(&self) -> Option<oneshot::Sender<()>> {
        self.gate.write().await.take()
    }

    /// Whether the mailbox holds no pending entries at this instant.
    ///
    /// Advisory: says nothing about whether the worker has finished invoking
    /// the handler for the last dequeued entry.
    pub(crate) fn is_empty(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }
}

/// Worker-side endpoint of the mailbox.
pub(crate) struct Receiver<E: Event> {
    rx: mpsc::Receiver<Entry<E>>,
    pending: Arc<AtomicUsize>,
}

impl<E: Event> Receiver<E> {
    /// Take an entry whose handoff already completed, without waiting.
    ///
    /// Used to run out accepted entries once the shutdown signal has been
    /// observed.
    pub(crate) fn try_recv(&mut self) -> Option<Entry<E>> {
        match self.rx.try_recv() {
            Ok(entry) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                Some(entry)
            }
            Err(_) => None,
        }
    }
}

impl<E: Event> Stream for Receiver<E> {
    type Item = Entry<E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = this.rx.poll_next_unpin(cx);
        if let Poll::Ready(Some(_)) = &polled {
            this.pending.fetch_sub(1, Ordering::SeqCst);
        }
        polled
    }
}

impl<E: Event> FusedStream for Receiver<E> {
    fn is_terminated(&self) -> bool {
        self.rx.is_terminated()
    }
}
