//! HTTPS transport for root server calls.
//!
//! A [`TransportSession`] runs at most one request at a time over a
//! [`Fetcher`]; a [`RequestCorrelator`] ties each request to a token and
//! delivers the result to a [`CompletionSink`].

pub mod config;
pub mod correlator;
pub mod error;
pub mod fetch;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
pub mod session;

pub use config::TransportConfig;
pub use correlator::{Completion, CompletionSink, RequestCorrelator};
pub use error::{TransportError, TransportErrorCode, TransportResult};
pub use fetch::{BoxFuture, Fetcher, HttpsFetcher, basic_auth};
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedFetcher;
pub use session::{Outcome, ResponseBody, TransportSession};
