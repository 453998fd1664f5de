//! Sequential event processing over private state.
//!
//! # Overview
//!
//! An [`Actor`] owns a handler registry and a mailbox, and runs a single
//! dedicated worker task that applies submitted events one at a time, in
//! submission order. Callers register a handler per event identifier, then
//! cast events with an opaque argument list. Because the worker is the only
//! execution context that ever invokes handlers, callers never need their own
//! locking to serialize work against each other.
//!
//! Submission is a synchronous handoff, not a fire-and-forget enqueue: a cast
//! resolves only once the worker is ready to take the entry, so a caller never
//! runs ahead of the worker. Closing the actor is idempotent, stops
//! acceptance of new work, runs every entry that was already accepted, and
//! returns only once the worker has fully stopped.
//!
//! # Handler Faults
//!
//! Handler invocation is deliberately not wrapped in a recovery boundary. If a
//! handler panics (e.g., on a failed argument downcast), the worker task
//! unwinds and no handler ever runs again for that actor: subsequent casts
//! fail with [`Error::Closed`]. Argument types and arity are entirely the
//! registering caller's responsibility.
//!
//! # Example
//!
//! ```
//! use simple_actor::{args, Actor};
//! use std::{
//!     sync::{Arc, Mutex},
//!     time::Duration,
//! };
//!
//! #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
//! enum Op {
//!     Add,
//!     Multiply,
//! }
//!
//! let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
//! runtime.block_on(async move {
//!     let actor = Actor::new();
//!     let state = Arc::new(Mutex::new(0i64));
//!
//!     let x = state.clone();
//!     actor
//!         .register(Op::Add, move |mut args| {
//!             let n = args.remove(0).downcast::<i64>().expect("i64 argument");
//!             *x.lock().unwrap() += *n;
//!         })
//!         .await
//!         .unwrap();
//!     let x = state.clone();
//!     actor
//!         .register(Op::Multiply, move |mut args| {
//!             let n = args.remove(0).downcast::<i64>().expect("i64 argument");
//!             *x.lock().unwrap() *= *n;
//!         })
//!         .await
//!         .unwrap();
//!
//!     actor.cast(Op::Add, args![1i64]).await.unwrap();
//!     actor.cast(Op::Multiply, args![3i64]).await.unwrap();
//!
//!     // Close runs everything already accepted, then stops the worker.
//!     actor.close().await;
//!     assert_eq!(*state.lock().unwrap(), 3);
//! });
//! ```

use std::{any::Any, fmt::Debug, hash::Hash, sync::Arc, time::Duration};
use thiserror::Error;

mod actor;
pub use actor::Actor;
mod mailbox;
mod registry;

/// An opaque, comparable value identifying a class of work.
///
/// Automatically implemented for any type with the required bounds (integers,
/// fieldless enums deriving the usual traits, strings, etc.). At most one
/// handler may be bound to a given event per actor instance.
pub trait Event: Clone + Eq + Hash + Debug + Send + Sync + 'static {}
impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> Event for T {}

/// A single untyped argument, passed opaquely from caster to handler.
///
/// The actor never interprets arguments; handlers downcast them to the types
/// they expect.
pub type Arg = Box<dyn Any + Send>;

/// A handler bound to an event, invoked by the worker with the arguments of
/// each cast of that event.
pub type EventHandler = Arc<dyn Fn(Vec<Arg>) + Send + Sync>;

/// An error that can occur when operating on an [`Actor`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error<E: Event> {
    /// No handler was provided at registration.
    #[error("handler is required")]
    InvalidHandler,
    /// The event already has a handler; the existing one remains bound.
    #[error("event {0:?} has already been registered")]
    AlreadyRegistered(E),
    /// The event has no handler, so the cast was not accepted.
    #[error("event {0:?} has not been registered yet")]
    NotRegistered(E),
    /// The actor has been closed (or its worker has died) and accepts no
    /// further entries.
    #[error("actor is closed")]
    Closed,
    /// The mailbox still held pending entries when the drain timeout elapsed.
    #[error("mailbox did not drain within {0:?}")]
    DrainTimeout(Duration),
}

/// Build the argument list for a cast, boxing each value as an [`Arg`].
///
/// ```
/// use simple_actor::{args, Arg};
///
/// let list: Vec<Arg> = args![1u64, "label", vec![0u8; 4]];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        vec![$(Box::new($arg) as $crate::Arg),+]
    };
}
