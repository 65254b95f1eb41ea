//! Analysis dispatch with last-submitted-wins semantics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use fasal_core::{
    AnalysisOutcome, AnalysisResult, AnalysisService, AppEvent, EventBus, Result,
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Displayed analysis state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Pending {
        submission: u64,
    },
    Ready {
        submission: u64,
        result: AnalysisResult,
    },
    Failed {
        submission: u64,
        message: String,
    },
}

impl AnalysisState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AnalysisState::Pending { .. })
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisState::Ready { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Sends images to an [`AnalysisService`] and keeps only the newest answer.
///
/// Each call to [`analyze`](Self::analyze) is a numbered submission. A
/// response that settles after a newer submission was made, or after
/// [`detach`](Self::detach), is discarded without touching the state.
pub struct AnalysisCoordinator {
    service: Arc<dyn AnalysisService>,
    latest: AtomicU64,
    state: watch::Sender<AnalysisState>,
    events: EventBus,
}

impl AnalysisCoordinator {
    pub fn new(service: Arc<dyn AnalysisService>, events: EventBus) -> Self {
        let (state, _) = watch::channel(AnalysisState::Idle);
        Self {
            service,
            latest: AtomicU64::new(0),
            state,
            events,
        }
    }

    /// Submit `image` for analysis.
    ///
    /// `Ok(Some(_))` when the result was applied, `Ok(None)` when a newer
    /// submission superseded this one, `Err` when the service failed and the
    /// failure was applied.
    #[instrument(skip(self, image), fields(subsystem = "analysis", backend = self.service.name()))]
    pub async fn analyze(&self, image: &str) -> Result<Option<AnalysisResult>> {
        // Numbering and publishing Pending share the watch lock with the
        // apply check below, so a later submission's answer is never
        // overwritten by an earlier submission's Pending.
        let mut submission = 0;
        self.state.send_modify(|state| {
            submission = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = AnalysisState::Pending { submission };
        });
        debug!(submission, image_len = image.len(), "Submitted image for analysis");

        let started = Instant::now();
        let response = self.service.analyze(image).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        // The check and the write happen under the watch lock, so a newer
        // submission's Pending can never be overwritten by an older answer.
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != submission {
                return false;
            }
            *state = match &response {
                Ok(result) => AnalysisState::Ready {
                    submission,
                    result: result.clone(),
                },
                Err(e) => AnalysisState::Failed {
                    submission,
                    message: e.user_message(),
                },
            };
            true
        });

        if !applied {
            debug!(submission, elapsed_ms, "Discarding superseded analysis response");
            self.settled(submission, AnalysisOutcome::Superseded);
            return Ok(None);
        }

        match response {
            Ok(result) => {
                info!(
                    submission,
                    elapsed_ms,
                    soil_type = %result.soil_type,
                    health = %result.plant_health_status,
                    "Analysis applied"
                );
                self.settled(submission, AnalysisOutcome::Applied);
                Ok(Some(result))
            }
            Err(e) => {
                warn!(submission, elapsed_ms, error = %e, "Analysis failed");
                self.settled(submission, AnalysisOutcome::Failed);
                Err(e)
            }
        }
    }

    /// Drop any pending submission; its response will be discarded.
    pub fn detach(&self) {
        let mut retired = 0;
        self.state.send_modify(|state| {
            retired = self.latest.fetch_add(1, Ordering::SeqCst);
            *state = AnalysisState::Idle;
        });
        debug!(retired, "Analysis consumer detached");
    }

    pub fn state(&self) -> AnalysisState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.state.subscribe()
    }

    pub fn backend_name(&self) -> &str {
        self.service.name()
    }

    /// Whether the analysis backend answers. Errors count as unhealthy.
    pub async fn backend_healthy(&self) -> bool {
        match self.service.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                warn!(backend = self.service.name(), error = %e, "Analysis health check failed");
                false
            }
        }
    }

    fn settled(&self, submission: u64, outcome: AnalysisOutcome) {
        self.events.emit(AppEvent::AnalysisSettled {
            submission,
            outcome,
        });
    }
}
