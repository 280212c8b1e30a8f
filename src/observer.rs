//! Asynchronous observer pipeline.
//!
//! Resolution events (fallbacks, misses, template issues) are pushed onto a
//! bounded queue drained by a single worker thread that invokes the
//! user-supplied [`CatalogObserver`]. Producers never block: when the queue
//! is full the event is dropped and counted, and when the pipeline is torn
//! down the event is counted under `observer_closed`. Each sink invocation
//! is panic-isolated, so a misbehaving sink cannot kill the worker or the
//! request path.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

/// Drop-reason tag for events lost to a saturated queue.
pub const DROP_REASON_QUEUE_FULL: &str = "observer_queue_full";

/// Drop-reason tag for events published after teardown.
pub const DROP_REASON_CLOSED: &str = "observer_closed";

/// Receiver of catalog resolution events.
///
/// Callbacks run on the pipeline's worker thread, strictly after the
/// corresponding stats update, and may interleave across requests. Sinks
/// must not call back into the catalog synchronously.
pub trait CatalogObserver: Send + Sync {
    fn on_language_fallback(&self, requested: &str, resolved: &str);
    fn on_language_missing(&self, lang: &str);
    fn on_message_missing(&self, lang: &str, key: &str);
    fn on_template_issue(&self, lang: &str, key: &str, issue: &str);
}

/// One queued resolution event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ObserverEvent {
    LanguageFallback { requested: String, resolved: String },
    LanguageMissing { lang: String },
    MessageMissing { lang: String, key: String },
    TemplateIssue { lang: String, key: String, issue: String },
}

fn deliver(sink: &dyn CatalogObserver, event: &ObserverEvent) {
    match event {
        ObserverEvent::LanguageFallback {
            requested,
            resolved,
        } => sink.on_language_fallback(requested, resolved),
        ObserverEvent::LanguageMissing { lang } => sink.on_language_missing(lang),
        ObserverEvent::MessageMissing { lang, key } => sink.on_message_missing(lang, key),
        ObserverEvent::TemplateIssue { lang, key, issue } => {
            sink.on_template_issue(lang, key, issue)
        }
    }
}

/// Running pipeline: bounded queue plus its consumer thread.
pub(crate) struct ObserverPipeline {
    tx: SyncSender<ObserverEvent>,
    worker: JoinHandle<()>,
}

/// Outcome of a non-blocking publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PublishOutcome {
    Sent,
    QueueFull,
}

impl ObserverPipeline {
    /// Spawn the consumer thread for `sink` behind a queue of `buffer`
    /// events.
    pub(crate) fn start(sink: Arc<dyn CatalogObserver>, buffer: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel::<ObserverEvent>(buffer.max(1));
        let worker = std::thread::Builder::new()
            .name("msgcat-observer".to_string())
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    // A panicking sink must not take the worker down.
                    if catch_unwind(AssertUnwindSafe(|| deliver(sink.as_ref(), &event)))
                        .is_err()
                    {
                        warn!(?event, "observer sink panicked; event discarded");
                    }
                }
                debug!("observer pipeline drained and stopped");
            })
            .expect("failed to spawn observer worker thread");
        Self { tx, worker }
    }

    /// Non-blocking publish. While the pipeline is held the worker keeps
    /// its receiver alive, so the disconnected arm is unreachable in
    /// practice; it is folded into the drop path rather than panicking.
    pub(crate) fn publish(&self, event: ObserverEvent) -> PublishOutcome {
        match self.tx.try_send(event) {
            Ok(()) => PublishOutcome::Sent,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                PublishOutcome::QueueFull
            }
        }
    }

    /// Close the queue and join the consumer after it drains.
    pub(crate) fn shutdown(self) {
        drop(self.tx);
        if self.worker.join().is_err() {
            warn!("observer worker terminated abnormally");
        }
    }
}
