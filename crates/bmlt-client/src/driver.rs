//! Runs one session operation to completion for the CLI.
//!
//! The handler reports through events; the driver waits until nothing is in
//! flight and picks the result for the operation it started out of the
//! events that arrived.

use tracing::{debug, warn};

use bmlt_core::{ChangeRecord, FormatRecord};
use bmlt_protocol::ServiceError;
use bmlt_session::{
    ChangeQuery, CommunicationHandler, DeletedQuery, EventReceiver, Meeting, SessionConfig,
    SessionEvent,
};

use crate::error::{ClientError, ClientResult};

/// A meeting search answer.
#[derive(Debug, Default)]
pub struct SearchOutput {
    pub meetings: Vec<Meeting>,
    /// Present when the server sent formats along with the meetings.
    pub formats: Vec<FormatRecord>,
}

pub struct Driver {
    handler: CommunicationHandler,
    events: EventReceiver,
}

impl Driver {
    pub fn new(handler: CommunicationHandler, events: EventReceiver) -> Self {
        Self { handler, events }
    }

    /// A driver talking HTTPS to the configured root server.
    pub fn https(config: SessionConfig) -> ClientResult<Self> {
        let (handler, events) = CommunicationHandler::with_https(config)?;
        Ok(Self::new(handler, events))
    }

    pub fn handler(&self) -> &CommunicationHandler {
        &self.handler
    }

    /// Runs the handshake; fails unless the session becomes ready.
    pub async fn connect(&mut self) -> ClientResult<()> {
        self.handler.connect()?;
        let events = self.settle().await;
        let mut error = None;
        for event in events {
            match event {
                SessionEvent::ServerValidity { valid: true, .. } => return Ok(()),
                SessionEvent::ServerValidity {
                    valid: false,
                    failure: Some(failure),
                } => return Err(ClientError::Handshake(failure)),
                SessionEvent::Error(e) => error = Some(e),
                other => debug!(event = other.kind(), "Ignoring event during handshake"),
            }
        }
        Err(error.map_or(ClientError::NoResult("server validity"), ClientError::Service))
    }

    pub async fn search(&mut self, criteria: &str) -> ClientResult<SearchOutput> {
        self.handler.search(criteria)?;
        let mut output = SearchOutput::default();
        let mut error = None;
        for event in self.settle().await {
            match event {
                SessionEvent::FormatResults(formats) => output.formats = formats,
                SessionEvent::SearchResults(meetings) => {
                    output.meetings = meetings;
                    return Ok(output);
                }
                SessionEvent::Error(e) => error = Some(e),
                other => debug!(event = other.kind(), "Ignoring event during search"),
            }
        }
        // A format-only answer carries no meetings.
        if !output.formats.is_empty() {
            return Ok(output);
        }
        Err(missing(error, "search results"))
    }

    pub async fn changes(&mut self, query: &ChangeQuery) -> ClientResult<Vec<ChangeRecord>> {
        self.handler.fetch_changes(query)?;
        self.change_results().await
    }

    pub async fn deleted(&mut self, query: &DeletedQuery) -> ClientResult<Vec<ChangeRecord>> {
        self.handler.fetch_deleted_meetings(query)?;
        self.change_results().await
    }

    /// Logs in; fails when the server refuses the credentials or grants no
    /// permissions.
    pub async fn login(&mut self, login: &str, password: &str) -> ClientResult<()> {
        self.handler.login(login, password)?;
        let mut error = None;
        for event in self.settle().await {
            match event {
                SessionEvent::LoginChanged { logged_in: true } => return Ok(()),
                SessionEvent::LoginChanged { logged_in: false } => {
                    return Err(match error {
                        Some(e) => ClientError::Service(e),
                        None => ClientError::LoginFailed(login.to_string()),
                    });
                }
                SessionEvent::Error(e) => error = Some(e),
                other => debug!(event = other.kind(), "Ignoring event during login"),
            }
        }
        Err(missing(error, "login result"))
    }

    /// Logs out if logged in. Failures are only logged.
    pub async fn logout(&mut self) {
        if !self.handler.is_logged_in() {
            return;
        }
        if let Err(e) = self.handler.logout() {
            warn!(error = %e, "Logout not sent");
            return;
        }
        self.settle().await;
    }

    async fn change_results(&mut self) -> ClientResult<Vec<ChangeRecord>> {
        let mut error = None;
        for event in self.settle().await {
            match event {
                SessionEvent::ChangeResults { changes, .. } => return Ok(changes),
                SessionEvent::Error(e) => error = Some(e),
                other => debug!(event = other.kind(), "Ignoring event during change query"),
            }
        }
        Err(missing(error, "change results"))
    }

    /// Waits until the handler is idle and returns every event it emitted.
    async fn settle(&mut self) -> Vec<SessionEvent> {
        self.handler.run_until_idle().await;
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

fn missing(error: Option<ServiceError>, what: &'static str) -> ClientError {
    error.map_or(ClientError::NoResult(what), ClientError::Service)
}
