//! # Persistence Writer
//!
//! Carries snapshot writes from the store to storage without blocking the
//! caller.
//!
//! ## Write Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Write Ordering Policies                            │
//! │                                                                         │
//! │  SEQUENCED (Default)                │  UNORDERED                        │
//! │  ───────────────────                │  ─────────                        │
//! │  • One writer task drains a queue   │  • One task spawned per write     │
//! │  • Writes land in issue order       │  • Writes race each other         │
//! │  • Storage ends at the newest       │  • Slowest write lands last and   │
//! │    snapshot                         │    wins, even if it is stale      │
//! │                                                                         │
//! │  mutation #1 ─► set(A) ─┐           │  mutation #1 ─► set(A) ····┐      │
//! │  mutation #2 ─► set(B) ─┤ queue     │  mutation #2 ─► set(B) ─┐  │      │
//! │                         ▼           │                         ▼  ▼      │
//! │             A then B (B stored)     │             B then A (A stored)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures are logged and dropped; nothing is retried. An issued write is
//! never cancelled: dropping the writer or an unfinished `flush` leaves
//! in-flight writes running on the runtime.

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::storage::KeyValueStorage;
use crate::store::WriteOrdering;

/// A single storage operation on the cart slot.
#[derive(Debug)]
enum WriteOp {
    Set(String),
    Remove,
}

#[derive(Debug)]
enum QueueMessage {
    Write(WriteOp),
    Flush(oneshot::Sender<()>),
}

/// Where writes go once issued.
#[derive(Debug)]
pub(crate) struct PersistWriter {
    inner: WriterInner,
}

#[derive(Debug)]
enum WriterInner {
    Sequenced {
        queue: mpsc::UnboundedSender<QueueMessage>,
    },
    Unordered {
        target: Arc<WriteTarget>,
        runtime: Handle,
        in_flight: InFlight,
    },
}

#[derive(Debug)]
struct WriteTarget {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    session_id: Uuid,
}

impl WriteTarget {
    async fn apply(&self, op: WriteOp) {
        let result = match &op {
            WriteOp::Set(value) => self.storage.set(&self.key, value).await,
            WriteOp::Remove => self.storage.remove(&self.key).await,
        };

        match result {
            Ok(()) => debug!(session = %self.session_id, key = %self.key, op = op.name(), "Cart persisted"),
            Err(e) => warn!(
                session = %self.session_id,
                key = %self.key,
                op = op.name(),
                error = %e,
                "Failed to persist cart"
            ),
        }
    }
}

impl WriteOp {
    fn name(&self) -> &'static str {
        match self {
            WriteOp::Set(_) => "set",
            WriteOp::Remove => "remove",
        }
    }
}

impl PersistWriter {
    /// Starts a writer for `key` on `runtime`.
    pub(crate) fn spawn(
        storage: Arc<dyn KeyValueStorage>,
        key: String,
        session_id: Uuid,
        ordering: WriteOrdering,
        runtime: Handle,
    ) -> Self {
        let target = Arc::new(WriteTarget {
            storage,
            key,
            session_id,
        });

        let inner = match ordering {
            WriteOrdering::Sequenced => {
                let (queue, rx) = mpsc::unbounded_channel();
                runtime.spawn(run_queue(target, rx));
                WriterInner::Sequenced { queue }
            }
            WriteOrdering::Unordered => WriterInner::Unordered {
                target,
                runtime,
                in_flight: Mutex::new(Vec::new()),
            },
        };

        PersistWriter { inner }
    }

    /// Issues a write of `snapshot`. Returns immediately.
    pub(crate) fn set(&self, snapshot: String) {
        self.issue(WriteOp::Set(snapshot));
    }

    /// Issues a removal of the slot. Returns immediately.
    pub(crate) fn remove(&self) {
        self.issue(WriteOp::Remove);
    }

    fn issue(&self, op: WriteOp) {
        match &self.inner {
            WriterInner::Sequenced { queue } => {
                if queue.send(QueueMessage::Write(op)).is_err() {
                    warn!("Persistence queue closed, dropping cart write");
                }
            }
            WriterInner::Unordered {
                target,
                runtime,
                in_flight,
            } => {
                let target = Arc::clone(target);
                let mut tasks = lock(in_flight);
                tasks.retain(|task| !task.is_finished());
                tasks.push(runtime.spawn(async move { target.apply(op).await }));
            }
        }
    }

    /// Waits until every write issued before this call has completed.
    pub(crate) async fn flush(&self) {
        match &self.inner {
            WriterInner::Sequenced { queue } => {
                let (done_tx, done_rx) = oneshot::channel();
                if queue.send(QueueMessage::Flush(done_tx)).is_ok() {
                    let _ = done_rx.await;
                }
            }
            WriterInner::Unordered { in_flight, .. } => {
                // A dropped JoinHandle detaches; abandoning flush keeps writes running
                let tasks = std::mem::take(&mut *lock(in_flight));
                for task in tasks {
                    if let Err(e) = task.await {
                        warn!(error = %e, "Cart write task failed");
                    }
                }
            }
        }
    }
}

type InFlight = Mutex<Vec<JoinHandle<()>>>;

fn lock(in_flight: &InFlight) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Single-writer loop for [`WriteOrdering::Sequenced`].
///
/// Exits once every sender is dropped and the queue is drained.
async fn run_queue(target: Arc<WriteTarget>, mut rx: mpsc::UnboundedReceiver<QueueMessage>) {
    debug!(session = %target.session_id, "Persistence writer started");

    while let Some(message) = rx.recv().await {
        match message {
            QueueMessage::Write(op) => target.apply(op).await,
            QueueMessage::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    info!(session = %target.session_id, "Persistence writer stopped");
}
