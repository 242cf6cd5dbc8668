//! # Typed broadcast emitter.
//!
//! [`Emitter`] delivers every emitted value to all currently attached queues.
//! Unlike [`tokio::sync::broadcast`], each subscriber owns an **unbounded** queue,
//! so a slow subscriber never lags or loses events; it pays in memory instead.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Subscribers (many):
//!   SupervisedTask ──┐               ┌──► [queue S1] ─► Subscription::recv()
//!   Journals       ──┼──► emit(v) ───┼──► [queue S2] ─► Attachment (caller queue)
//!   ...            ──┘  (clone/queue)└──► [queue SN] ─► listen_once worker
//! ```
//!
//! ## Rules
//! - **Non-blocking emit**: `emit()` only enqueues; it never awaits consumers.
//! - **FIFO per subscriber**: values arrive in emission order.
//! - **Scoped membership**: [`Subscription`] and [`Attachment`] detach on drop.
//!   After detachment nothing more is enqueued for that queue.
//! - **No replay**: a subscriber only sees values emitted after it attached.
//! - Emitting with zero subscribers is a no-op.
//!
//! Queues whose receiver was dropped without detaching are pruned on the next emit.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::panic_message;

struct Streams<T> {
    next_id: AtomicU64,
    queues: Mutex<HashMap<u64, mpsc::UnboundedSender<T>>>,
}

/// Typed one-to-many event emitter with per-subscriber unbounded queues.
///
/// Cloning is cheap and yields a handle to the same subscriber set.
///
/// # Example
/// ```rust
/// use binp::Emitter;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let on_greeting: Emitter<String> = Emitter::new();
/// let mut sub = on_greeting.subscribe();
///
/// on_greeting.emit("hello".to_string());
/// assert_eq!(sub.recv().await.as_deref(), Some("hello"));
/// # }
/// ```
pub struct Emitter<T> {
    streams: Arc<Streams<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            streams: Arc::clone(&self.streams),
        }
    }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            streams: Arc::new(Streams {
                next_id: AtomicU64::new(0),
                queues: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T> Emitter<T> {
    /// Creates an emitter without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently attached queues.
    pub fn subscriber_count(&self) -> usize {
        self.streams.queues.lock().len()
    }

    /// Attaches a caller-supplied queue.
    ///
    /// The queue stays attached until the returned [`Attachment`] is dropped.
    /// One sender may be attached to several emitters to merge their streams.
    pub fn attach(&self, queue: mpsc::UnboundedSender<T>) -> Attachment<T> {
        let id = self.streams.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams.queues.lock().insert(id, queue);
        Attachment {
            id,
            streams: Arc::downgrade(&self.streams),
        }
    }

    /// Creates a new queue attached to this emitter.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let attachment = self.attach(tx);
        Subscription {
            rx,
            _attachment: attachment,
        }
    }
}

impl<T: Clone> Emitter<T> {
    /// Enqueues `payload` for every attached queue. Never blocks.
    ///
    /// The subscriber set is locked for the whole fan-out, so concurrent emits
    /// are observed in one order by all subscribers.
    pub fn emit(&self, payload: T) {
        let mut queues = self.streams.queues.lock();
        queues.retain(|_, queue| queue.send(payload.clone()).is_ok());
    }
}

impl<T: Clone + Send + 'static> Emitter<T> {
    /// Registers a listener invoked with the **next** emitted value only.
    ///
    /// The queue is attached before this method returns, so the next `emit` is
    /// never missed. Errors and panics from `f` are logged and swallowed; they do
    /// not affect the emitter or other listeners. Aborting the returned handle
    /// cancels the listener. Register again for continued delivery.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn listen_once<F, Fut>(&self, label: impl Into<Cow<'static, str>>, f: F) -> JoinHandle<()>
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let label = label.into();
        let mut sub = self.subscribe();

        tokio::spawn(async move {
            let Some(payload) = sub.recv().await else {
                return;
            };
            drop(sub);

            match AssertUnwindSafe(f(payload)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(listener = %label, error = %format!("{err:#}"), "failed to process event");
                }
                Err(panic) => {
                    warn!(listener = %label, info = %panic_message(panic.as_ref()), "listener panicked");
                }
            }
        })
    }
}

/// Scoped registration of a caller-supplied queue. Detaches on drop.
#[must_use = "the queue is detached as soon as the attachment is dropped"]
pub struct Attachment<T> {
    id: u64,
    streams: Weak<Streams<T>>,
}

impl<T> Drop for Attachment<T> {
    fn drop(&mut self) {
        if let Some(streams) = self.streams.upgrade() {
            streams.queues.lock().remove(&self.id);
        }
    }
}

/// Scoped subscriber queue created by [`Emitter::subscribe`]. Detaches on drop.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    _attachment: Attachment<T>,
}

impl<T> Subscription<T> {
    /// Waits for the next value.
    ///
    /// Returns `None` once the emitter and all its clones are dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Returns the next queued value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
