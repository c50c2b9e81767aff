//! Latest-value broadcast for store facets (loading, paused, error).

use crossbeam_channel::{unbounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::time::Duration;

struct Inner<T> {
    current: T,
    senders: Vec<Sender<T>>,
    completed: bool,
}

/// Holds a current value and forwards changes to watchers.
///
/// A new watcher receives the current value first. A published value that
/// `is_duplicate` considers equal to the current one is swallowed.
pub(crate) struct Subject<T> {
    inner: Mutex<Inner<T>>,
    is_duplicate: fn(&T, &T) -> bool,
}

impl<T: Clone + Send> Subject<T> {
    pub(crate) fn new(initial: T, is_duplicate: fn(&T, &T) -> bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                senders: Vec::new(),
                completed: false,
            }),
            is_duplicate,
        }
    }

    pub(crate) fn publish(&self, value: T) {
        let mut inner = self.inner.lock();
        if inner.completed || (self.is_duplicate)(&inner.current, &value) {
            return;
        }
        inner.current = value.clone();
        inner
            .senders
            .retain(|sender| sender.send(value.clone()).is_ok());
    }

    pub(crate) fn watch(&self) -> Watch<T> {
        let (sender, receiver) = unbounded();
        let mut inner = self.inner.lock();
        if !inner.completed && sender.send(inner.current.clone()).is_ok() {
            inner.senders.push(sender);
        }
        Watch { receiver }
    }

    /// Close every watcher. Later publishes are ignored.
    pub(crate) fn complete(&self) {
        let mut inner = self.inner.lock();
        inner.completed = true;
        inner.senders.clear();
    }
}

/// Receiving end of a store facet.
///
/// Disconnects once the store is destroyed.
pub struct Watch<T> {
    receiver: Receiver<T>,
}

impl<T> Watch<T> {
    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv()
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything received so far.
    pub fn try_iter(&self) -> impl Iterator<Item = T> + '_ {
        self.receiver.try_iter()
    }
}
