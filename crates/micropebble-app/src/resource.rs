//! Scope-bound resource control.
//!
//! A [`ResourceSlot`] is the single observable holder a long-running task
//! publishes [`Outcome`] values into. Launching a new task on a slot cancels
//! the previous one first, so a slot never has two concurrent emitters.

use std::future::Future;
use std::sync::Mutex;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use micropebble_core::prelude::*;

/// Publishes outcomes into a slot. Cheap to clone into child tasks.
pub struct SlotEmitter<T> {
    tx: watch::Sender<Option<Outcome<T>>>,
}

impl<T> Clone for SlotEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> SlotEmitter<T> {
    /// Publish the latest outcome. The slot keeps the value even while
    /// nobody observes it, so a late subscriber sees the last emission.
    pub fn emit(&self, outcome: Outcome<T>) {
        self.tx.send_replace(Some(outcome));
    }
}

/// One observable slot plus its at-most-one publishing task.
pub struct ResourceSlot<T> {
    tx: watch::Sender<Option<Outcome<T>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> Default for ResourceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResourceSlot<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx,
            task: Mutex::new(None),
        }
    }

    /// Observe the slot. `None` until the first emission.
    pub fn subscribe(&self) -> watch::Receiver<Option<Outcome<T>>> {
        self.tx.subscribe()
    }

    /// The latest emitted outcome, if any.
    pub fn latest(&self) -> Option<Outcome<T>>
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    /// Cancel the active task, if any. The aborted future is dropped at its
    /// next suspension point, releasing any collaborator subscriptions it
    /// held.
    pub fn cancel(&self) {
        if let Some(prev) = self.task.lock().unwrap().take() {
            prev.abort();
        }
    }
}

impl<T: Send + Sync + 'static> ResourceSlot<T> {
    /// Start a unit of work publishing into this slot, cancelling any prior
    /// task first.
    ///
    /// The task body emits zero or more outcomes through its emitter and
    /// returns `Result<()>`; an `Err` becomes a terminal `Outcome::Error`
    /// emission rather than crashing the owning scope. Cancellation via
    /// [`ResourceSlot::cancel`] (or relaunch) is an abort, never converted
    /// into an error emission.
    pub fn launch<F, Fut>(&self, f: F)
    where
        F: FnOnce(SlotEmitter<T>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let mut guard = self.task.lock().unwrap();
        if let Some(prev) = guard.take() {
            prev.abort();
        }

        let emitter = SlotEmitter {
            tx: self.tx.clone(),
        };
        let fut = f(emitter.clone());
        *guard = Some(tokio::spawn(async move {
            if let Err(e) = fut.await {
                debug!("resource task failed: {e}");
                emitter.emit(Outcome::failed(e));
            }
        }));
    }
}

impl<T> Drop for ResourceSlot<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Cancellable handle for a callback-style external subscription.
///
/// Wraps the forwarding task; dropping the handle aborts it, so no callback
/// fires after the owning scope is disposed.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn spawn<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(fut)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
        }
    }
}
