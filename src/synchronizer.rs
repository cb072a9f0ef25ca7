//! Synchronizer: the owner of the directory.
//!
//! Orchestrates full-list refreshes, streamed status deltas, and user
//! mutations so the directory never shows contradictory data. Mutations
//! go to the backend only; a successful one always triggers a refresh,
//! and the directory is never patched from a mutation's own response —
//! the authoritative list may have changed shape in between.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::api::ServiceApi;
use crate::directory::Directory;
use crate::error::MutationError;
use crate::service::{DeltaBatch, Service};

/// User intents from the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add { url: String, name: String },
    Edit { id: String, url: String, name: String },
    Delete { id: String },
    OpenEdit { id: String },
    Refresh,
}

/// Results surfaced back to the rendering surface.
///
/// Errors from explicit user actions land here; the surface owns the
/// user-visible feedback and re-enabling of any disabled control.
#[derive(Debug)]
pub enum Notice {
    /// The service fetched for an edit form (`OpenEdit`).
    EditReady(Service),
    EditFailed {
        id: String,
        error: MutationError,
    },
    MutationFailed {
        action: MutationKind,
        error: MutationError,
    },
    RefreshFailed {
        error: MutationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// Directory lifecycle. A failed refresh never falls back from `Ready`
/// to `Empty`: the last known-good view stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Empty,
    Loading,
    Ready,
}

/// Completion of a spawned backend call, applied in arrival order.
enum Outcome {
    Load(Result<Vec<Service>, MutationError>),
    Mutation {
        kind: MutationKind,
        result: Result<(), MutationError>,
    },
    EditFetch {
        id: String,
        result: Result<Service, MutationError>,
    },
}

pub struct Synchronizer<A> {
    api: Arc<A>,
    directory: Directory,
    state: SyncState,
    ever_loaded: bool,
    snapshot_tx: watch::Sender<Vec<Service>>,
    notice_tx: mpsc::UnboundedSender<Notice>,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl<A: ServiceApi + 'static> Synchronizer<A> {
    pub fn new(api: Arc<A>) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let synchronizer = Self {
            api,
            directory: Directory::new(),
            state: SyncState::Empty,
            ever_loaded: false,
            snapshot_tx,
            notice_tx,
            outcome_tx,
            outcome_rx,
        };
        (synchronizer, notice_rx)
    }

    /// Subscribe to rendered snapshots. The receiver starts on an empty
    /// directory and observes every change thereafter.
    pub fn watch_snapshots(&self) -> watch::Receiver<Vec<Service>> {
        self.snapshot_tx.subscribe()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn snapshot(&self) -> Vec<Service> {
        self.directory.snapshot()
    }

    /// Process intents and deltas until the intent channel closes.
    ///
    /// Loads the full directory once at startup. In-flight backend calls
    /// whose completions arrive after shutdown are simply discarded with
    /// the outcome channel.
    pub async fn run(
        mut self,
        mut intent_rx: mpsc::UnboundedReceiver<Intent>,
        mut delta_rx: mpsc::UnboundedReceiver<DeltaBatch>,
    ) {
        self.start_refresh();

        loop {
            tokio::select! {
                maybe_intent = intent_rx.recv() => {
                    match maybe_intent {
                        Some(intent) => self.handle_intent(intent),
                        None => break,
                    }
                }
                Some(batch) = delta_rx.recv() => {
                    self.apply_delta(&batch);
                }
                Some(outcome) = self.outcome_rx.recv() => {
                    self.apply_outcome(outcome);
                }
            }
        }

        tracing::debug!("intent channel closed, synchronizer stopping");
    }

    /// Applies one status batch to the directory. Deltas keep flowing
    /// even while a refresh is in flight; a delta superseded by the next
    /// `replace_all` is an accepted race, convergence comes from the next
    /// batch per still-existing service.
    pub fn apply_delta(&mut self, batch: &DeltaBatch) {
        self.directory.apply_status(batch);
        self.publish();
    }

    /// Kicks off a full-directory load. Several may be in flight at once;
    /// completions are applied in arrival order, so the last one to
    /// finish wins regardless of start order.
    pub fn start_refresh(&mut self) {
        self.state = SyncState::Loading;

        let api = Arc::clone(&self.api);
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_all().await;
            let _ = outcome_tx.send(Outcome::Load(result));
        });
    }

    fn handle_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Refresh => self.start_refresh(),
            Intent::Add { url, name } => {
                let api = Arc::clone(&self.api);
                let outcome_tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    // the created service is discarded; the follow-up
                    // refresh is the authoritative source
                    let result = api.create_service(&url, &name).await.map(drop);
                    let _ = outcome_tx.send(Outcome::Mutation {
                        kind: MutationKind::Create,
                        result,
                    });
                });
            },
            Intent::Edit { id, url, name } => {
                let api = Arc::clone(&self.api);
                let outcome_tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = api.update_service(&id, &url, &name).await.map(drop);
                    let _ = outcome_tx.send(Outcome::Mutation {
                        kind: MutationKind::Update,
                        result,
                    });
                });
            },
            Intent::Delete { id } => {
                let api = Arc::clone(&self.api);
                let outcome_tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = api.delete_service(&id).await;
                    let _ = outcome_tx.send(Outcome::Mutation {
                        kind: MutationKind::Delete,
                        result,
                    });
                });
            },
            Intent::OpenEdit { id } => {
                let api = Arc::clone(&self.api);
                let outcome_tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = api.fetch_service(&id).await;
                    let _ = outcome_tx.send(Outcome::EditFetch { id, result });
                });
            },
        }
    }

    fn apply_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Load(Ok(services)) => {
                self.directory.replace_all(services);
                self.state = SyncState::Ready;
                self.ever_loaded = true;
                self.publish();
            },
            Outcome::Load(Err(error)) => {
                // keep the stale view; only a never-loaded directory
                // returns to Empty
                self.state = if self.ever_loaded {
                    SyncState::Ready
                } else {
                    SyncState::Empty
                };
                tracing::warn!(error = %error, "directory refresh failed, keeping previous view");
                let _ = self.notice_tx.send(Notice::RefreshFailed { error });
            },
            Outcome::Mutation { kind, result: Ok(()) } => {
                tracing::debug!(?kind, "mutation succeeded, refreshing directory");
                self.start_refresh();
            },
            Outcome::Mutation { kind, result: Err(error) } => {
                tracing::warn!(?kind, error = %error, "mutation failed");
                let _ = self.notice_tx.send(Notice::MutationFailed { action: kind, error });
            },
            Outcome::EditFetch { id: _, result: Ok(service) } => {
                let _ = self.notice_tx.send(Notice::EditReady(service));
            },
            Outcome::EditFetch { id, result: Err(error) } => {
                let _ = self.notice_tx.send(Notice::EditFailed { id, error });
            },
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.directory.snapshot());
    }
}
