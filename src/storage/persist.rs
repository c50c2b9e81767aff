//! Debounced write-behind of store values.

use super::StorageApi;
use crate::config::Stringify;
use crate::value::Value;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Command {
    Write(Value),
    Stop,
}

/// Worker that writes the latest value once no new value has arrived for
/// the debounce period.
///
/// `stop` discards a pending write. Dropping without `stop` flushes it.
pub(crate) struct Persister {
    sender: Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl Persister {
    pub(crate) fn spawn(
        storage: Arc<dyn StorageApi>,
        key: String,
        debounce: Duration,
        stringify: Stringify,
    ) -> std::io::Result<Self> {
        let (sender, receiver) = unbounded();
        let worker = thread::Builder::new()
            .name("snapstore-persist".into())
            .spawn(move || {
                let write = |value: Value| {
                    let result = stringify(&value).and_then(|text| storage.set_item(&key, text));
                    if let Err(e) = result {
                        tracing::warn!("Failed to persist value under key \"{}\": {}", key, e);
                    }
                };

                let mut pending: Option<Value> = None;
                loop {
                    let command = if pending.is_some() {
                        match receiver.recv_timeout(debounce) {
                            Ok(command) => command,
                            Err(RecvTimeoutError::Timeout) => {
                                if let Some(value) = pending.take() {
                                    write(value);
                                }
                                continue;
                            }
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    } else {
                        match receiver.recv() {
                            Ok(command) => command,
                            Err(_) => break,
                        }
                    };

                    match command {
                        Command::Write(value) => pending = Some(value),
                        Command::Stop => return,
                    }
                }

                // Owner went away without stopping us.
                if let Some(value) = pending.take() {
                    write(value);
                }
            })?;

        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// Queue `value`, restarting the quiet period.
    pub(crate) fn push(&self, value: Value) {
        let _ = self.sender.send(Command::Write(value));
    }

    /// Stop the worker and wait for it, dropping any pending write.
    pub(crate) fn stop(&mut self) {
        let _ = self.sender.send(Command::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
