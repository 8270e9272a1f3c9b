//! Report view model.
//!
//! A [`ReportSession`] owns the single visible result slot. Each submission
//! is tagged with a generation number; only the newest generation may write
//! the slot. Submitting again cancels the previous in-flight query, and any
//! response that still arrives for an older generation is dropped. Both end
//! as [`Outcome::Stale`]; [`Outcome::Cancelled`] is reserved for teardown.

use crate::client::ReportApi;
use crate::error::{Error, ValidationError};
use crate::metrics::record_stale;
use crate::report::form::ReportForm;
use crate::report::types::{AggregationRequest, AggregationResult};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub type Generation = u64;

/// What the report page currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReportView {
    #[default]
    Empty,
    Loading {
        generation: Generation,
        request: AggregationRequest,
    },
    Ready {
        generation: Generation,
        result: AggregationResult,
    },
    /// Inline error shown in place of the result table.
    Failed {
        generation: Generation,
        kind: &'static str,
        message: String,
    },
}

impl ReportView {
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Self::Empty => None,
            Self::Loading { generation, .. }
            | Self::Ready { generation, .. }
            | Self::Failed { generation, .. } => Some(*generation),
        }
    }

    pub fn result(&self) -> Option<&AggregationResult> {
        match self {
            Self::Ready { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// How a submitted query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Result stored in the view.
    Ready(Generation),
    /// Error stored in the view.
    Failed(Generation),
    /// Superseded by a newer request, either cancelled in flight or
    /// answered too late; discarded.
    Stale {
        generation: Generation,
        latest: Generation,
    },
    /// Aborted by [`ReportSession::shutdown`] or a failed task.
    Cancelled(Generation),
}

/// A registered request that has not been run yet.
#[derive(Debug)]
pub struct Ticket {
    pub generation: Generation,
    pub request: AggregationRequest,
    token: CancellationToken,
}

/// A submission running in the background.
pub struct Submission {
    pub generation: Generation,
    pub handle: JoinHandle<Outcome>,
    session: Arc<ReportSession>,
}

impl Submission {
    /// Waits for the query to finish.
    pub async fn wait(self) -> Outcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(generation = self.generation, "Report task failed: {}", e);
                self.session.abandon(self.generation)
            }
        }
    }
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct SessionState {
    latest: Generation,
    inflight: Option<CancellationToken>,
    closed: bool,
}

pub struct ReportSession {
    api: Arc<dyn ReportApi>,
    state: Mutex<SessionState>,
    view: watch::Sender<ReportView>,
}

impl ReportSession {
    pub fn new(api: Arc<dyn ReportApi>) -> Arc<Self> {
        let (view, _) = watch::channel(ReportView::Empty);
        Arc::new(Self {
            api,
            state: Mutex::new(SessionState::default()),
            view,
        })
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ReportView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<ReportView> {
        self.view.subscribe()
    }

    pub fn latest_generation(&self) -> Generation {
        self.state.lock().latest
    }

    /// Validates `form` and starts the query in the background.
    ///
    /// On success the form comes back pristine, ready for the next edit.
    /// Invalid input still supersedes any in-flight request and replaces the
    /// view with an inline error.
    pub fn submit(
        self: &Arc<Self>,
        form: &ReportForm,
    ) -> Result<(Submission, ReportForm), ValidationError> {
        match form.build() {
            Ok(request) => Ok((self.submit_request(request), form.clone().mark_pristine())),
            Err(e) => {
                let mut state = self.state.lock();
                let generation = Self::advance(&mut state);
                debug!(generation, "Rejected report input: {}", e);
                self.view.send_replace(ReportView::Failed {
                    generation,
                    kind: "validation",
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Starts `request` in the background.
    pub fn submit_request(self: &Arc<Self>, request: AggregationRequest) -> Submission {
        let ticket = self.begin(request);
        let generation = ticket.generation;
        let session = Arc::clone(self);
        let handle = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.run(ticket).await }
        });
        Submission {
            generation,
            handle,
            session,
        }
    }

    /// Registers `request` as the newest generation and shows it as loading.
    pub fn begin(&self, request: AggregationRequest) -> Ticket {
        let token = CancellationToken::new();
        let mut state = self.state.lock();
        let generation = Self::advance(&mut state);
        state.inflight = Some(token.clone());
        state.closed = false;
        debug!(generation, backend = self.api.backend_name(), field = %request.field, size = request.size.get(), order = %request.order, "Submitting report");
        self.view.send_replace(ReportView::Loading {
            generation,
            request: request.clone(),
        });
        Ticket {
            generation,
            request,
            token,
        }
    }

    /// Runs a ticket against the backend and applies the response.
    pub async fn run(&self, ticket: Ticket) -> Outcome {
        let Ticket {
            generation,
            request,
            token,
        } = ticket;

        let response = tokio::select! {
            biased;
            response = self.api.run_aggregation(&request) => response,
            _ = token.cancelled() => return self.cancelled(generation),
        };

        let result = response.map(|rows| AggregationResult::from_rows(&request, rows));
        self.complete(generation, result)
    }

    /// Cancels whatever is in flight and clears the view; later responses
    /// are discarded.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if let Some(token) = state.inflight.take() {
            token.cancel();
        }
        state.latest += 1;
        state.closed = true;
        self.view.send_replace(ReportView::Empty);
        debug!(generation = state.latest, "Report session closed");
    }

    fn cancelled(&self, generation: Generation) -> Outcome {
        let state = self.state.lock();
        if state.closed {
            debug!(generation, "Report request cancelled");
            return Outcome::Cancelled(generation);
        }
        debug!(generation, latest = state.latest, "Report request superseded");
        record_stale();
        Outcome::Stale {
            generation,
            latest: state.latest,
        }
    }

    /// Settles a generation whose task died without completing.
    fn abandon(&self, generation: Generation) -> Outcome {
        let mut state = self.state.lock();
        if generation == state.latest && !state.closed {
            state.inflight = None;
            let e = Error::Cancelled;
            self.view.send_replace(ReportView::Failed {
                generation,
                kind: e.kind(),
                message: e.to_string(),
            });
        }
        Outcome::Cancelled(generation)
    }

    fn advance(state: &mut SessionState) -> Generation {
        if let Some(previous) = state.inflight.take() {
            previous.cancel();
        }
        state.latest += 1;
        state.latest
    }

    fn complete(
        &self,
        generation: Generation,
        result: std::result::Result<AggregationResult, Error>,
    ) -> Outcome {
        let mut state = self.state.lock();
        if generation != state.latest {
            debug!(generation, latest = state.latest, "Discarding stale report response");
            record_stale();
            return Outcome::Stale {
                generation,
                latest: state.latest,
            };
        }
        state.inflight = None;

        match result {
            Ok(result) => {
                info!(generation, field = %result.title, rows = result.rows.len(), "Report ready");
                self.view.send_replace(ReportView::Ready { generation, result });
                Outcome::Ready(generation)
            }
            Err(e) => {
                warn!(generation, "Report failed: {}", e);
                self.view.send_replace(ReportView::Failed {
                    generation,
                    kind: e.kind(),
                    message: e.to_string(),
                });
                Outcome::Failed(generation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::report::form::FormEdit;
    use crate::report::types::{ReportRow, SortOrder};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::num::NonZeroUsize;
    use tokio::sync::oneshot;

    type Reply = Result<Vec<ReportRow>>;

    /// Backend whose answers are released by the test, keyed by field.
    #[derive(Default)]
    struct GatedApi {
        gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    }

    impl GatedApi {
        fn gate(&self, field: &str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(field.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl ReportApi for GatedApi {
        async fn run_aggregation(&self, request: &AggregationRequest) -> Result<Vec<ReportRow>> {
            if request.field == "panic" {
                panic!("backend crashed");
            }
            let rx = self.gates.lock().remove(&request.field);
            match rx {
                Some(rx) => rx.await.unwrap_or(Err(Error::Cancelled)),
                None => Ok(vec![ReportRow::new(request.field.clone(), 1)]),
            }
        }

        fn backend_name(&self) -> &str {
            "gated"
        }
    }

    fn request(field: &str) -> AggregationRequest {
        AggregationRequest::new(field, NonZeroUsize::new(10).unwrap(), SortOrder::Desc)
    }

    #[tokio::test]
    async fn test_submit_shows_result() {
        let session = ReportSession::new(Arc::new(GatedApi::default()));
        assert_eq!(session.view(), ReportView::Empty);

        let form = ReportForm::new().apply(FormEdit::SetField("tls.sni".into()));
        let (submission, form) = session.submit(&form).unwrap();
        assert!(!form.is_dirty());
        assert_eq!(form.field(), "tls.sni");

        assert_eq!(submission.wait().await, Outcome::Ready(1));
        let view = session.view();
        let result = view.result().unwrap();
        assert_eq!(result.title, "tls.sni");
        assert_eq!(result.rows, vec![ReportRow::new("tls.sni", 1)]);
    }

    #[tokio::test]
    async fn test_submit_does_not_block() {
        let api = Arc::new(GatedApi::default());
        let release = api.gate("x");
        let session = ReportSession::new(api);

        let submission = session.submit_request(request("x"));
        assert!(session.view().is_loading());

        release.send(Ok(vec![ReportRow::new("k", 2)])).unwrap();
        assert_eq!(submission.wait().await, Outcome::Ready(1));
    }

    #[tokio::test]
    async fn test_latest_issued_wins_race() {
        let api = Arc::new(GatedApi::default());
        let release_a = api.gate("x");
        let release_b = api.gate("y");
        let session = ReportSession::new(api);

        let a = session.submit_request(request("x"));
        let b = session.submit_request(request("y"));

        release_b.send(Ok(vec![ReportRow::new("from-b", 1)])).unwrap();
        assert_eq!(b.wait().await, Outcome::Ready(2));

        // A was superseded by B; a late answer changes nothing.
        let _ = release_a.send(Ok(vec![ReportRow::new("from-a", 1)]));
        assert_eq!(
            a.wait().await,
            Outcome::Stale {
                generation: 1,
                latest: 2
            }
        );

        let view = session.view();
        assert_eq!(view.generation(), Some(2));
        assert_eq!(view.result().unwrap().title, "y");
    }

    #[tokio::test]
    async fn test_stale_response_discarded() {
        let session = ReportSession::new(Arc::new(GatedApi::default()));

        let a = session.begin(request("x"));
        let b = session.begin(request("y"));

        assert_eq!(session.run(b).await, Outcome::Ready(2));
        // The backend answers immediately, so the response wins the select
        // and reaches the generation check.
        assert_eq!(
            session.run(a).await,
            Outcome::Stale {
                generation: 1,
                latest: 2
            }
        );
        assert_eq!(session.view().result().unwrap().title, "y");
    }

    #[tokio::test]
    async fn test_backend_error_replaces_table() {
        let api = Arc::new(GatedApi::default());
        let session = ReportSession::new(api.clone());

        session.submit_request(request("ok")).wait().await;
        assert!(session.view().result().is_some());

        let release = api.gate("broken");
        let submission = session.submit_request(request("broken"));
        release
            .send(Err(Error::Backend {
                status: 503,
                reason: "unavailable".into(),
            }))
            .unwrap();
        assert_eq!(submission.wait().await, Outcome::Failed(2));

        match session.view() {
            ReportView::Failed { kind, message, .. } => {
                assert_eq!(kind, "backend");
                assert!(message.contains("unavailable"));
            }
            other => panic!("expected failure view, got {:?}", other),
        }

        // Still submittable afterwards.
        assert_eq!(
            session.submit_request(request("again")).wait().await,
            Outcome::Ready(3)
        );
    }

    #[tokio::test]
    async fn test_invalid_form_supersedes_inflight() {
        let api = Arc::new(GatedApi::default());
        let release = api.gate("x");
        let session = ReportSession::new(api);

        let a = session.submit_request(request("x"));
        let err = session
            .submit(&ReportForm::new().apply(FormEdit::SetSize("abc".into())))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyField);

        let _ = release.send(Ok(vec![]));
        assert_eq!(
            a.wait().await,
            Outcome::Stale {
                generation: 1,
                latest: 2
            }
        );
        assert!(matches!(
            session.view(),
            ReportView::Failed {
                generation: 2,
                kind: "validation",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_inflight() {
        let api = Arc::new(GatedApi::default());
        let _release = api.gate("x");
        let session = ReportSession::new(api);

        let a = session.submit_request(request("x"));
        assert!(session.view().is_loading());
        session.shutdown();
        assert_eq!(session.view(), ReportView::Empty);
        assert_eq!(a.wait().await, Outcome::Cancelled(1));
        assert_eq!(session.latest_generation(), 2);
        assert_eq!(session.view(), ReportView::Empty);
    }

    #[tokio::test]
    async fn test_failed_task_leaves_error_view() {
        let session = ReportSession::new(Arc::new(GatedApi::default()));

        let outcome = session.submit_request(request("panic")).wait().await;
        assert_eq!(outcome, Outcome::Cancelled(1));
        assert!(matches!(
            session.view(),
            ReportView::Failed {
                generation: 1,
                kind: "cancelled",
                ..
            }
        ));

        assert_eq!(
            session.submit_request(request("again")).wait().await,
            Outcome::Ready(2)
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let session = ReportSession::new(Arc::new(GatedApi::default()));
        let mut rx = session.subscribe();

        session.submit_request(request("dns.rrname")).wait().await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().generation(), Some(1));
    }
}
