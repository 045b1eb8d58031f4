//! One-shot reconciliation queue
//!
//! The update path must never wait for DNS work. It hands a request to
//! [`ReconcileQueue`] (a [`Reconciler`]) and returns; a [`ReconcileWorker`]
//! with its own lifecycle drains the queue and runs the [`ReconcileJob`].
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────┐  trigger_one_shot  ┌────────────────┐
//! │ UpdateOrchestrator │ ─────────────────▶ │ ReconcileQueue │
//! └────────────────────┘    (try_send)      └────────────────┘
//!                                                   │ bounded mpsc
//!                                                   ▼
//!                                          ┌─────────────────┐
//!                                          │ ReconcileWorker │──▶ ReconcileJob::run_once
//!                                          └─────────────────┘
//!                                                   │
//!                                                   ▼
//!                                           ReconcileEvent stream
//! ```
//!
//! ## Event Flow
//!
//! 1. A trigger enqueues a request (dropped with a warning when the queue
//!    is full: a pending run already covers it)
//! 2. The worker takes a request and folds in everything else pending
//! 3. The job runs once, `force_full` if any folded request asked for it
//! 4. Started / Completed / Failed events are emitted for observability
//!
//! ## Known race
//!
//! A run reads whatever the store holds when it starts. If two updates
//! race, a run triggered by the first may already see the second, or a
//! run may start before a slower save lands. Nothing here serializes
//! updates.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use crate::config::AdminSettings;
use crate::error::Result;
use crate::traits::{ReconcileJob, Reconciler};

/// Events emitted by the ReconcileWorker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// A run started
    Started {
        /// Whether cached state is ignored
        force_full: bool,
        /// Number of triggers folded into this run
        coalesced: usize,
    },

    /// A run finished successfully
    Completed {
        force_full: bool,
    },

    /// A run failed
    Failed {
        error: String,
    },

    /// Worker stopped
    Stopped {
        reason: String,
    },
}

/// A queued trigger
#[derive(Debug, Clone, Copy)]
struct ReconcileRequest {
    force_full: bool,
}

/// Trigger side of the queue
///
/// Cheap to clone; the worker stops once every clone is dropped and the
/// remaining requests are drained.
#[derive(Debug, Clone)]
pub struct ReconcileQueue {
    tx: mpsc::Sender<ReconcileRequest>,
}

impl ReconcileQueue {
    /// Create a queue and the worker that drains it
    ///
    /// # Returns
    ///
    /// A tuple of (queue, worker, event_receiver) where event_receiver
    /// yields worker events
    pub fn new(
        job: Arc<dyn ReconcileJob>,
        settings: &AdminSettings,
    ) -> (Self, ReconcileWorker, mpsc::Receiver<ReconcileEvent>) {
        let (tx, rx) = mpsc::channel(settings.reconcile_queue_capacity);
        let (event_tx, event_rx) = mpsc::channel(settings.event_channel_capacity);

        let worker = ReconcileWorker {
            requests: rx,
            job,
            event_tx,
        };

        (Self { tx }, worker, event_rx)
    }
}

impl Reconciler for ReconcileQueue {
    fn trigger_one_shot(&self, force_full: bool) {
        match self.tx.try_send(ReconcileRequest { force_full }) {
            Ok(()) => debug!("Reconciliation queued (force_full: {})", force_full),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Reconciliation queue full, dropping trigger. A pending run will pick up the change.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Reconciliation worker is not running, trigger dropped");
            }
        }
    }
}

/// Executor side of the queue
pub struct ReconcileWorker {
    requests: mpsc::Receiver<ReconcileRequest>,
    job: Arc<dyn ReconcileJob>,
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl ReconcileWorker {
    /// Run until every queue handle is dropped
    ///
    /// Requests still pending at that point are processed first.
    pub async fn run(self) -> Result<()> {
        self.run_with_shutdown(None).await
    }

    /// Run until every queue handle is dropped or `shutdown_rx` fires
    ///
    /// A shutdown signal stops the worker after the current run; pending
    /// requests are discarded.
    pub async fn run_with_shutdown(self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let Self {
            requests,
            job,
            event_tx,
        } = self;
        let mut requests = ReceiverStream::new(requests);

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);

        info!("Reconciliation worker started");

        let reason = loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break "Shutdown signal",

                next = requests.next() => match next {
                    Some(request) => {
                        Self::process(request, &mut requests, job.as_ref(), &event_tx).await;
                    }
                    None => break "All triggers dropped",
                },
            }
        };

        info!("Reconciliation worker stopped: {}", reason);
        emit_event(
            &event_tx,
            ReconcileEvent::Stopped {
                reason: reason.to_string(),
            },
        );
        Ok(())
    }

    /// Spawn the worker on the current runtime
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Fold pending requests into `first` and run the job once
    async fn process(
        first: ReconcileRequest,
        requests: &mut ReceiverStream<ReconcileRequest>,
        job: &dyn ReconcileJob,
        event_tx: &mpsc::Sender<ReconcileEvent>,
    ) {
        let mut force_full = first.force_full;
        let mut coalesced = 1;
        while let Ok(more) = requests.as_mut().try_recv() {
            force_full |= more.force_full;
            coalesced += 1;
        }

        debug!(
            "Reconciliation run starting ({} trigger(s), force_full: {})",
            coalesced, force_full
        );
        emit_event(event_tx, ReconcileEvent::Started { force_full, coalesced });

        match job.run_once(force_full).await {
            Ok(()) => {
                info!("Reconciliation run completed");
                emit_event(event_tx, ReconcileEvent::Completed { force_full });
            }
            Err(e) => {
                error!("Reconciliation run failed: {}", e);
                emit_event(
                    event_tx,
                    ReconcileEvent::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }
    }
}

/// Emit a worker event, dropping it with a warning when the channel is full
fn emit_event(event_tx: &mpsc::Sender<ReconcileEvent>, event: ReconcileEvent) {
    if event_tx.try_send(event).is_err() {
        warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
    }
}
