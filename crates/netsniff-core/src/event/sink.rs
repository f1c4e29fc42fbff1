use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use super::SniffEvent;

/// Destination for emitted events.
///
/// Implementations are shared by every concurrent dispatch call and must not
/// block the caller for longer than a bounded hand-off.
pub trait EventSink: Send + Sync {
    fn push(&self, event: SniffEvent);
}

/// Bounded queue feeding one consumer thread.
///
/// A [`bounded`](Self::bounded) sink never blocks: when the queue is full the
/// event is dropped and counted. A [`blocking`](Self::blocking) sink waits for
/// room instead, which suits replaying a file where the producer can be
/// slowed down. Either way, events pushed after the consumer has gone away
/// are counted as dropped.
///
/// # Examples
/// ```
/// use netsniff_core::{ChannelSink, EventSink, SniffEvent};
///
/// let (sink, events) = ChannelSink::bounded(8);
/// sink.push(SniffEvent::new(None, "tcp", "a", "b"));
/// assert_eq!(events.recv().unwrap().protocol, "tcp");
/// ```
pub struct ChannelSink {
    tx: SyncSender<SniffEvent>,
    mode: QueueMode,
    dropped: AtomicU64,
}

/// What `push` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueMode {
    Lossy,
    Blocking,
}

impl ChannelSink {
    /// Drop-on-full queue for live sources.
    pub fn bounded(capacity: usize) -> (Self, Receiver<SniffEvent>) {
        Self::with_mode(capacity, QueueMode::Lossy)
    }

    /// Wait-on-full queue for offline replay.
    pub fn blocking(capacity: usize) -> (Self, Receiver<SniffEvent>) {
        Self::with_mode(capacity, QueueMode::Blocking)
    }

    fn with_mode(capacity: usize, mode: QueueMode) -> (Self, Receiver<SniffEvent>) {
        let (tx, rx) = sync_channel(capacity);
        let sink = Self {
            tx,
            mode,
            dropped: AtomicU64::new(0),
        };
        (sink, rx)
    }

    /// Number of events discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record_drop(&self, reason: &str) {
        let previous = self.dropped.fetch_add(1, Ordering::Relaxed);
        if previous == 0 {
            log::warn!("event sink started dropping events ({reason})");
        } else {
            log::debug!("event dropped ({reason}), total {}", previous + 1);
        }
    }
}

impl EventSink for ChannelSink {
    fn push(&self, event: SniffEvent) {
        if self.mode == QueueMode::Blocking {
            if self.tx.send(event).is_err() {
                self.record_drop("consumer disconnected");
            }
            return;
        }
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.record_drop("queue full"),
            Err(TrySendError::Disconnected(_)) => self.record_drop("consumer disconnected"),
        }
    }
}

/// Collects events in memory, in push order.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<SniffEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything pushed so far.
    pub fn events(&self) -> Vec<SniffEvent> {
        self.lock().clone()
    }

    /// Remove and return everything pushed so far.
    pub fn take(&self) -> Vec<SniffEvent> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SniffEvent>> {
        // A panicking producer cannot leave the vector half-written.
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for MemorySink {
    fn push(&self, event: SniffEvent) {
        self.lock().push(event);
    }
}
