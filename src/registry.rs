//! Mapping from event identifier to handler.

use crate::{Error, Event, EventHandler};
use async_lock::RwLock;
use std::collections::HashMap;

/// The handler registry of one actor instance.
///
/// Writes take exclusive access; dispatch-time lookups take shared access, so
/// casts of already-registered events never block each other, only concurrent
/// registrations. A lookup observes either no handler or a fully-installed
/// one, never a partial registration.
pub(crate) struct Registry<E: Event> {
    handlers: RwLock<HashMap<E, EventHandler>>,
}

impl<E: Event> Registry<E> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Install a handler for `event`.
    ///
    /// Fails with [`Error::InvalidHandler`] if no handler is given and with
    /// [`Error::AlreadyRegistered`] if the event is already bound; the
    /// existing mapping is left untouched on failure.
    pub(crate) async fn install(
        &self,
        event: E,
        handler: Option<EventHandler>,
    ) -> Result<(), Error<E>> {
        let Some(handler) = handler else {
            return Err(Error::InvalidHandler);
        };
        let mut handlers = self.handlers.write().await;
        if handlers.contains_key(&event) {
            return Err(Error::AlreadyRegistered(event));
        }
        handlers.insert(event, handler);
        Ok(())
    }

    /// Snapshot the handler bound to `event` at call time.
    pub(crate) async fn lookup(&self, event: &E) -> Result<EventHandler, Error<E>> {
        self.handlers
            .read()
            .await
            .get(event)
            .cloned()
            .ok_or_else(|| Error::NotRegistered(event.clone()))
    }
}
