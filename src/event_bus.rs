// Process-wide publish/subscribe keyed by event kind

use crate::models::{Event, EventKind};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Subscriber callback. Unsubscribe matches by pointer identity, so keep the `Arc` you
/// subscribed with.
pub type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Raised by [`EventBus::publish`] after every handler ran, when at least one failed.
#[derive(Debug, Error)]
#[error("{failed} of {delivered} handlers failed for {kind:?}: {first_error}")]
pub struct PublishError {
    pub kind: EventKind,
    pub delivered: usize,
    pub failed: usize,
    pub first_error: String,
}

#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every future publish of `kind`. Registering the same handler
    /// twice delivers twice.
    pub fn subscribe(&self, kind: EventKind, handler: Handler) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.entry(kind).or_default().push(handler);
        tracing::trace!(?kind, "subscribed");
    }

    /// Remove every registration of `handler` for `kind`. No-op when absent.
    pub fn unsubscribe(&self, kind: EventKind, handler: &Handler) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = handlers.get_mut(&kind) {
            list.retain(|h| !Arc::ptr_eq(h, handler));
            if list.is_empty() {
                handlers.remove(&kind);
            }
        }
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Deliver `event` synchronously to every handler currently registered for its kind.
    ///
    /// The handler list is copied before delivery, so handlers may subscribe or unsubscribe
    /// without deadlocking; such changes apply from the next publish. A handler that fails or
    /// panics does not stop delivery to the rest; failures are reported once all ran.
    pub fn publish(&self, event: &Event) -> Result<(), PublishError> {
        let kind = event.kind();
        let targets: Vec<Handler> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match handlers.get(&kind) {
                Some(list) => list.clone(),
                None => return Ok(()),
            }
        };

        let mut failed = 0;
        let mut first_error = None;
        for h in &targets {
            let outcome = match catch_unwind(AssertUnwindSafe(|| h(event))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(_) => "handler panicked".to_string(),
            };
            tracing::warn!(?kind, error = %outcome, "event handler failed");
            failed += 1;
            first_error.get_or_insert(outcome);
        }

        match first_error {
            None => Ok(()),
            Some(first_error) => Err(PublishError {
                kind,
                delivered: targets.len(),
                failed,
                first_error,
            }),
        }
    }

    /// Publish from a producer that has no caller to report to; failures are already logged.
    pub(crate) fn emit(&self, event: Event) {
        let _ = self.publish(&event);
    }
}
