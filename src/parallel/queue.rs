use crossbeam::channel::{Receiver, Sender, unbounded};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("work queue is already marked done")]
pub struct QueueClosed;

/// Multi-consumer FIFO of pending work items
///
/// Items are handed out in push order. `pop` blocks until an item is
/// available, or returns `None` once the queue has been marked done and
/// drained. Marking done wakes every blocked consumer.
pub struct WorkQueue<T> {
    sender: Mutex<Option<Sender<T>>>,
    receiver: Receiver<T>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    pub fn push(&self, item: T) -> Result<(), QueueClosed> {
        let guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(sender) => sender.send(item).map_err(|_| QueueClosed),
            None => Err(QueueClosed),
        }
    }

    /// Next item in FIFO order, or `None` when done and drained
    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Signal that no further items will be pushed
    pub fn mark_done(&self) {
        let mut guard = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        // Dropping the last sender disconnects the channel once it is empty
        guard.take();
    }

    pub fn is_done(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    /// Items still waiting to be popped
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
