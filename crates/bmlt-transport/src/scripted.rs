//! Canned-response fetcher for driving sessions without a network.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::{TransportError, TransportErrorCode, TransportResult};
use crate::fetch::{BoxFuture, Fetcher};

enum Scripted {
    Body(Vec<u8>),
    Error(TransportError),
    Pending,
}

/// Answers requests from a FIFO of scripted responses and records every URI
/// it was asked for.
///
/// An exhausted script answers with a connect error.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<String>>,
    resets: Mutex<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response.
    pub fn push_json(&self, value: Value) -> &Self {
        self.push_bytes(value.to_string().into_bytes())
    }

    /// Queues a bare text response such as `OK`.
    pub fn push_text(&self, text: &str) -> &Self {
        self.push_bytes(text.as_bytes().to_vec())
    }

    pub fn push_bytes(&self, bytes: Vec<u8>) -> &Self {
        lock(&self.script).push_back(Scripted::Body(bytes));
        self
    }

    pub fn push_error(&self, error: TransportError) -> &Self {
        lock(&self.script).push_back(Scripted::Error(error));
        self
    }

    /// Queues a response that never arrives.
    pub fn push_pending(&self) -> &Self {
        lock(&self.script).push_back(Scripted::Pending);
        self
    }

    /// Every URI requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }

    pub fn reset_count(&self) -> usize {
        *lock(&self.resets)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, uri: &str) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
        lock(&self.requests).push(uri.to_string());
        let next = lock(&self.script).pop_front();
        Box::pin(async move {
            match next {
                Some(Scripted::Body(bytes)) => Ok(bytes),
                Some(Scripted::Error(e)) => Err(e),
                Some(Scripted::Pending) => std::future::pending().await,
                None => Err(TransportError::new(
                    TransportErrorCode::Connect,
                    "no scripted response left",
                )),
            }
        })
    }

    fn reset(&self) {
        *lock(&self.resets) += 1;
    }
}
