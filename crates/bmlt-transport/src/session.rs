//! Single-flight transport session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use bmlt_protocol::redact_secrets;

use crate::error::TransportError;
use crate::fetch::Fetcher;

/// A response body: decoded JSON when it parses, the raw bytes otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Raw(Vec<u8>),
}

impl ResponseBody {
    /// Attempts a JSON decode, falling back to the raw bytes.
    pub fn decode(bytes: Vec<u8>) -> Self {
        match serde_json::from_slice(&bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw(bytes),
        }
    }

    /// The body as text, for bare-string answers such as `OK`.
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Json(Value::String(s)) => Some(s.trim().to_string()),
            Self::Json(Value::Number(n)) => Some(n.to_string()),
            Self::Json(_) => None,
            Self::Raw(bytes) => std::str::from_utf8(bytes).ok().map(|s| s.trim().to_string()),
        }
    }
}

/// What a completion callback receives.
#[derive(Debug)]
pub enum Outcome {
    Body(ResponseBody),
    Failed(TransportError),
    /// A transport failure swallowed because the session suppresses errors.
    Suppressed,
}

/// Owns the HTTP context and allows at most one request in flight.
pub struct TransportSession {
    fetcher: Arc<dyn Fetcher>,
    busy: Arc<AtomicBool>,
    in_flight: Option<JoinHandle<()>>,
    suppress_errors: bool,
}

impl TransportSession {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            busy: Arc::new(AtomicBool::new(false)),
            in_flight: None,
            suppress_errors: false,
        }
    }

    /// When set, transport failures are reported as [`Outcome::Suppressed`].
    pub fn set_suppress_errors(&mut self, suppress: bool) {
        self.suppress_errors = suppress;
    }

    pub fn suppress_errors(&self) -> bool {
        self.suppress_errors
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Issues a GET for `uri` and calls `on_complete` with the result on a
    /// runtime task.
    ///
    /// Returns false without doing anything if a request is outstanding.
    /// Must be called from within a tokio runtime.
    pub fn send<F>(&mut self, uri: String, on_complete: F) -> bool
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(uri = %redact_secrets(&uri), "Transport busy, request refused");
            return false;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let busy = Arc::clone(&self.busy);
        let suppress = self.suppress_errors;
        debug!(uri = %redact_secrets(&uri), "Issuing request");

        self.in_flight = Some(tokio::spawn(async move {
            let outcome = match fetcher.fetch(&uri).await {
                Ok(bytes) => {
                    trace!(bytes = bytes.len(), "Response received");
                    Outcome::Body(ResponseBody::decode(bytes))
                }
                Err(e) if suppress => {
                    debug!(error = %e, "Transport error suppressed");
                    Outcome::Suppressed
                }
                Err(e) => {
                    warn!(error = %e, "Transport error");
                    Outcome::Failed(e)
                }
            };
            busy.store(false, Ordering::Release);
            on_complete(outcome);
        }));
        true
    }

    /// Cancels any outstanding request and drops session-local state.
    ///
    /// The cancelled request's callback never fires.
    pub fn reset(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                debug!("Cancelling in-flight request");
            }
            handle.abort();
        }
        self.busy.store(false, Ordering::Release);
        self.fetcher.reset();
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
