//! One-shot UI events.
//!
//! Events are intents such as "navigate to the edit screen" or "show the undo
//! prompt". Unlike the task list, they must fire exactly once and must not be
//! replayed. [`EventChannel`] is a bounded queue with a single consumer slot:
//! while nobody is attached, events wait in the buffer; an attached
//! [`EventSubscription`] takes each event out as it reads it, so detaching and
//! reattaching never sees an event twice.

use crate::types::Task;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tracing::{debug, warn};

/// Default buffer size for event channels.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Events emitted by the task list screen model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TasksEvent {
    NavigateToAddTaskScreen,
    NavigateToEditTaskScreen(Task),
    ShowUndoDeleteTaskMessage(Task),
    ShowTaskConfirmationMessage(String),
    NavigateToDeleteAllCompletedDialog,
}

/// Outcome reported by the add/edit screen when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddEditResult {
    Added,
    Updated,
}

impl AddEditResult {
    /// Confirmation shown on the task list after the add/edit screen closes.
    pub fn confirmation_message(&self) -> &'static str {
        match self {
            AddEditResult::Added => "Task Added",
            AddEditResult::Updated => "Task Updated",
        }
    }
}

/// Events emitted by the add/edit screen model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddEditTaskEvent {
    ShowInvalidInputMessage(String),
    NavigateBackWithResult(AddEditResult),
}

/// Bounded single-consumer event queue.
pub struct EventChannel<E> {
    tx: mpsc::Sender<E>,
    rx: Arc<Mutex<mpsc::Receiver<E>>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<E: Send + std::fmt::Debug + 'static> EventChannel<E> {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Queue an event, waiting for buffer space if the queue is full.
    pub async fn send(&self, event: E) {
        debug!(?event, "Queueing UI event");
        // The receiver lives in `self.rx`, so the channel cannot be closed
        // while this handle exists.
        if let Err(err) = self.tx.send(event).await {
            warn!(event = ?err.0, "Dropped UI event: channel closed");
        }
    }

    /// Attach the consumer. Returns `None` while another consumer is attached.
    pub fn attach(&self) -> Option<EventSubscription<E>> {
        let guard = Arc::clone(&self.rx).try_lock_owned().ok()?;
        debug!("Event consumer attached");
        Some(EventSubscription { rx: guard })
    }

    /// Number of events waiting to be consumed.
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// The attached consumer of an [`EventChannel`]. Dropping it detaches.
pub struct EventSubscription<E> {
    rx: OwnedMutexGuard<mpsc::Receiver<E>>,
}

impl<E> EventSubscription<E> {
    /// Wait for the next event. Returns `None` once every sender is gone and
    /// the buffer is empty.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Take every buffered event without waiting.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

impl<E> Drop for EventSubscription<E> {
    fn drop(&mut self) {
        debug!("Event consumer detached");
    }
}
