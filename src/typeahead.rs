// Debounced airport typeahead for one form field

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{AirportLookup, ApiError};
use crate::debounce::Debouncer;
use crate::models::AirportOption;

pub const NO_AIRPORTS_FOUND: &str = "No airports found";
pub const AIRPORT_LOOKUP_FAILED: &str = "Unable to load airports";

// Progress of one independent async operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading,
    Settled(Result<(), String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub query: String,
    pub options: Vec<AirportOption>,
    pub loading: bool,
    pub error: Option<String>,
    // Set once a lookup has completed for the current options
    settled: bool,
}

impl FieldState {
    pub fn request_state(&self) -> RequestState {
        if self.loading {
            RequestState::Loading
        } else if !self.settled {
            RequestState::Idle
        } else {
            match &self.error {
                Some(message) => RequestState::Settled(Err(message.clone())),
                None => RequestState::Settled(Ok(())),
            }
        }
    }

    // What the dropdown shows when there is nothing to pick
    pub fn empty_state_message(&self) -> Option<String> {
        if !self.options.is_empty() || self.loading {
            return None;
        }
        Some(
            self.error
                .clone()
                .unwrap_or_else(|| NO_AIRPORTS_FOUND.to_string()),
        )
    }
}

pub fn lookup_error_message(err: &ApiError) -> String {
    err.server_message()
        .unwrap_or_else(|| AIRPORT_LOOKUP_FAILED.to_string())
}

struct FieldInner {
    name: &'static str,
    lookup: Arc<dyn AirportLookup>,
    state: watch::Sender<FieldState>,
    // Bumped by every fired lookup and every clear; only the latest may apply
    issued: AtomicU64,
}

// One airport input: debounces keystrokes into lookups and keeps the
// candidate list for the dropdown.
//
// A lookup result is applied only if no newer lookup or clear was issued
// after it. Dropping the field cancels any pending trigger, and lookups
// still in flight discard their result.
pub struct AirportField {
    inner: Arc<FieldInner>,
    debouncer: Debouncer,
}

impl AirportField {
    pub fn new(name: &'static str, lookup: Arc<dyn AirportLookup>, window: Duration) -> Self {
        let (state, _) = watch::channel(FieldState::default());
        Self {
            inner: Arc::new(FieldInner {
                name,
                lookup,
                state,
                issued: AtomicU64::new(0),
            }),
            debouncer: Debouncer::new(window),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn state(&self) -> FieldState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FieldState> {
        self.inner.state.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    // Returns the query unchanged, as the input element expects
    pub fn input_changed(&self, query: &str) -> String {
        if query.trim().is_empty() {
            self.clear(query);
            return query.to_string();
        }

        self.inner.state.send_modify(|s| s.query = query.to_string());
        debug!(field = self.inner.name, query, "Scheduling airport lookup");

        let inner = Arc::downgrade(&self.inner);
        let keyword = query.to_string();
        self.debouncer.schedule(run_lookup(inner, keyword));
        query.to_string()
    }

    // Cancels the pending trigger; in-flight lookups discard their result
    pub fn teardown(&self) {
        self.debouncer.cancel();
        self.inner.issued.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_modify(|s| s.loading = false);
    }

    fn clear(&self, query: &str) {
        self.debouncer.cancel();
        self.inner.issued.fetch_add(1, Ordering::SeqCst);
        self.inner.state.send_modify(|s| {
            s.query = query.to_string();
            s.options.clear();
            s.loading = false;
            s.error = None;
            s.settled = false;
        });
        debug!(field = self.inner.name, "Cleared airport options");
    }
}

impl Drop for AirportField {
    fn drop(&mut self) {
        self.debouncer.cancel();
    }
}

async fn run_lookup(inner: Weak<FieldInner>, keyword: String) {
    let (seq, lookup, name) = match inner.upgrade() {
        Some(field) => {
            let seq = field.issued.fetch_add(1, Ordering::SeqCst) + 1;
            field.state.send_modify(|s| s.loading = true);
            (seq, Arc::clone(&field.lookup), field.name)
        }
        None => return,
    };

    let outcome = lookup.search_airports(&keyword).await;

    let Some(field) = inner.upgrade() else {
        debug!(field = name, keyword, "Field dropped before lookup completed");
        return;
    };
    if field.issued.load(Ordering::SeqCst) != seq {
        debug!(field = name, keyword, seq, "Discarding stale airport lookup");
        return;
    }

    field.state.send_modify(|s| {
        s.loading = false;
        s.settled = true;
        match outcome {
            Ok(options) => {
                s.options = options;
                s.error = None;
            }
            Err(err) => {
                warn!(field = name, keyword, error = %err, "Airport lookup failed");
                s.options.clear();
                s.error = Some(lookup_error_message(&err));
            }
        }
    });
}
