//! Request correlator: one request, one completion, tagged with a token.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::session::{Outcome, TransportSession};

/// A finished request paired with the token it was issued with.
#[derive(Debug)]
pub struct Completion<T> {
    pub token: T,
    pub outcome: Outcome,
}

/// Where completions are delivered.
pub trait CompletionSink<T>: Send + 'static {
    fn complete(&self, completion: Completion<T>);
}

impl<T: Send + 'static> CompletionSink<T> for mpsc::UnboundedSender<Completion<T>> {
    fn complete(&self, completion: Completion<T>) {
        if self.send(completion).is_err() {
            debug!("Completion receiver dropped");
        }
    }
}

/// Pairs a URI, a sink and a correlation token for a single request.
///
/// Consumed when the request is issued; nothing survives the completion.
pub struct RequestCorrelator<T, S> {
    uri: String,
    sink: S,
    token: T,
}

impl<T, S> RequestCorrelator<T, S>
where
    T: Send + 'static,
    S: CompletionSink<T>,
{
    /// Creates a correlator and issues its request right away.
    pub fn issue(
        session: &mut TransportSession,
        uri: impl Into<String>,
        sink: S,
        token: T,
    ) -> TransportResult<()> {
        Self::deferred(uri, sink, token).start(session)
    }

    /// Creates a correlator without issuing anything.
    pub fn deferred(uri: impl Into<String>, sink: S, token: T) -> Self {
        Self {
            uri: uri.into(),
            sink,
            token,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Issues the request. Fails with a busy error if the session already has
    /// one outstanding.
    pub fn start(self, session: &mut TransportSession) -> TransportResult<()> {
        let Self { uri, sink, token } = self;
        let sent = session.send(uri, move |outcome| {
            sink.complete(Completion { token, outcome });
        });
        if sent {
            Ok(())
        } else {
            Err(TransportError::busy())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportErrorCode;
    use crate::scripted::ScriptedFetcher;
    use crate::session::ResponseBody;
    use std::sync::Arc;

    #[tokio::test]
    async fn completion_carries_token() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.push_text("OK");
        let mut session = TransportSession::new(fetcher);
        let (tx, mut rx) = mpsc::unbounded_channel();

        RequestCorrelator::issue(&mut session, "https://example.org/login", tx, 7u64).unwrap();
        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.token, 7);
        assert!(matches!(completion.outcome, Outcome::Body(ResponseBody::Raw(_))));
    }

    #[tokio::test]
    async fn deferred_waits_for_start() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        fetcher.push_pending();
        let mut session = TransportSession::new(fetcher.clone());
        let (tx, _rx) = mpsc::unbounded_channel::<Completion<u8>>();

        let correlator = RequestCorrelator::deferred("https://example.org/x", tx.clone(), 1);
        assert_eq!(correlator.uri(), "https://example.org/x");
        assert!(fetcher.requests().is_empty());
        correlator.start(&mut session).unwrap();

        let err = RequestCorrelator::issue(&mut session, "https://example.org/y", tx, 2).unwrap_err();
        assert_eq!(err.code(), TransportErrorCode::Busy);
    }
}
