//! The communication handler.
//!
//! Owns the transport session and all cached server state. Operations issue
//! one tagged request each; completions come back through a channel and are
//! routed by their call type. Nothing here blocks: callers drive the handler
//! with [`CommunicationHandler::process_next`] and read results from the
//! event receiver returned at construction.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use bmlt_core::{
    EditableMeeting, FormatRecord, FormatRegistry, LanguageRecord, MeetingRecord,
    PermissionTable, ServerInfo, ServiceBodyNode, correlate_changes, mark_native_language,
};
use bmlt_protocol::{
    CallType, DomainValue, ErrorCode, HandshakeFailure, MeetingChange, Query, ServiceError,
    affected_meeting_id, classify_bytes, interpret, new_meeting_id, redact_secrets, request_uri,
};
use bmlt_transport::{
    Completion, Fetcher, HttpsFetcher, Outcome, RequestCorrelator, ResponseBody,
    TransportErrorCode, TransportSession,
};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::event::SessionEvent;
use crate::meeting::Meeting;
use crate::query::{ChangeQuery, DeletedQuery};
use crate::state::{
    AdminSession, AdminState, CallToken, HandshakePhase, HandshakeState, InFlight, SessionCache,
};

/// Receiving end of the session's notifications.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Orchestrates one root server session.
pub struct CommunicationHandler {
    config: SessionConfig,
    transport: TransportSession,
    completions_tx: mpsc::UnboundedSender<Completion<CallToken>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<CallToken>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    in_flight: InFlight,
    next_token: u64,
    state: HandshakeState,
    admin: AdminSession,
    last_failure: Option<HandshakeFailure>,
}

impl CommunicationHandler {
    /// Creates a disconnected handler over the given fetcher.
    pub fn new(config: SessionConfig, fetcher: Arc<dyn Fetcher>) -> (Self, EventReceiver) {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();
        let handler = Self {
            config,
            transport: TransportSession::new(fetcher),
            completions_tx,
            completions_rx,
            events,
            in_flight: InFlight::Idle,
            next_token: 0,
            state: HandshakeState::Disconnected,
            admin: AdminSession::LoggedOut,
            last_failure: None,
        };
        (handler, events_rx)
    }

    /// Creates a handler that talks HTTPS to the configured root server.
    pub fn with_https(config: SessionConfig) -> SessionResult<(Self, EventReceiver)> {
        let fetcher = HttpsFetcher::new(config.transport.clone())?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> HandshakePhase {
        self.state.phase()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == HandshakePhase::Ready
    }

    pub fn admin_state(&self) -> AdminState {
        self.admin.state()
    }

    pub fn is_logged_in(&self) -> bool {
        self.admin_state() == AdminState::LoggedIn
    }

    /// True while a request is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self.in_flight, InFlight::Awaiting(_))
    }

    /// Why the last handshake ended, if it failed.
    pub fn handshake_failure(&self) -> Option<HandshakeFailure> {
        self.last_failure
    }

    pub fn cache(&self) -> Option<&SessionCache> {
        match &self.state {
            HandshakeState::Ready(cache) => Some(cache),
            _ => None,
        }
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.cache().map(|c| &c.info)
    }

    pub fn hierarchy(&self) -> Option<&ServiceBodyNode> {
        self.cache().map(|c| &c.hierarchy)
    }

    pub fn formats(&self) -> Option<&FormatRegistry> {
        self.cache().map(|c| &c.formats)
    }

    pub fn languages(&self) -> &[LanguageRecord] {
        self.cache().map(|c| c.languages.as_slice()).unwrap_or_default()
    }

    /// The admin's permission table while logged in.
    pub fn permissions(&self) -> Option<&PermissionTable> {
        self.admin.permissions()
    }

    /// The service body node a meeting belongs to.
    pub fn service_body_for(&self, meeting: &MeetingRecord) -> Option<&ServiceBodyNode> {
        self.hierarchy()?.find(meeting.service_body_id())
    }

    /// The cached format records a meeting lists, skipping unknown keys.
    pub fn formats_for(&self, meeting: &MeetingRecord) -> Vec<&FormatRecord> {
        let Some(registry) = self.formats() else {
            return Vec::new();
        };
        meeting
            .format_keys()
            .into_iter()
            .filter_map(|key| registry.by_key(key))
            .collect()
    }

    pub fn observable_service_bodies(&self) -> Vec<&ServiceBodyNode> {
        self.service_bodies_where(ServiceBodyNode::can_observe)
    }

    pub fn editable_service_bodies(&self) -> Vec<&ServiceBodyNode> {
        self.service_bodies_where(ServiceBodyNode::can_edit)
    }

    pub fn administered_service_bodies(&self) -> Vec<&ServiceBodyNode> {
        self.service_bodies_where(ServiceBodyNode::can_administer)
    }

    fn service_bodies_where(&self, keep: fn(&ServiceBodyNode) -> bool) -> Vec<&ServiceBodyNode> {
        if !self.is_logged_in() {
            return Vec::new();
        }
        self.hierarchy()
            .map(|root| root.descendants().into_iter().filter(|n| keep(n)).collect())
            .unwrap_or_default()
    }

    /// A blank meeting in the first service body the admin can edit.
    pub fn new_meeting_template(&self) -> SessionResult<EditableMeeting> {
        let cache = self.require_ready()?;
        let service_body_id = self
            .editable_service_bodies()
            .first()
            .map(|n| n.id())
            .ok_or(SessionError::NotLoggedIn)?;
        Ok(EditableMeeting::template(&cache.info, service_body_id))
    }

    /// Starts the handshake, discarding any previous session.
    pub fn connect(&mut self) -> SessionResult<()> {
        self.reset_session();
        info!(root = %self.config.root_uri(), "Connecting");
        self.state = HandshakeState::TestingServer;
        self.transport.set_suppress_errors(true);
        if let Err(e) = self.issue(CallType::ServerTest, Query::new(), None) {
            self.transport.set_suppress_errors(false);
            self.state = HandshakeState::Disconnected;
            return Err(e);
        }
        Ok(())
    }

    /// Drops the session and cancels any outstanding request.
    pub fn disconnect(&mut self) {
        info!("Disconnecting");
        self.reset_session();
    }

    /// Runs a meeting search with a pre-built criteria suffix.
    pub fn search(&mut self, criteria: &str) -> SessionResult<()> {
        self.require_ready()?;
        self.issue(CallType::MeetingSearch, Query::new().raw(criteria), None)
    }

    /// Fetches change history. Results for a single meeting are tagged with
    /// that meeting's id.
    pub fn fetch_changes(&mut self, query: &ChangeQuery) -> SessionResult<()> {
        self.require_ready()?;
        let (call, target) = match query.target_meeting() {
            Some(id) => (CallType::MeetingChanges, Some(id)),
            None => (CallType::Changes, None),
        };
        let logged_in = self.is_logged_in();
        self.issue(call, query.to_query(logged_in), target)
    }

    /// Fetches deletions of meetings that no longer exist.
    pub fn fetch_deleted_meetings(&mut self, query: &DeletedQuery) -> SessionResult<()> {
        self.require_ready()?;
        self.issue(CallType::DeletedMeetings, query.to_query(), None)
    }

    /// Logs in as an administrator. A login-changed event always follows.
    pub fn login(&mut self, login: &str, password: &str) -> SessionResult<()> {
        let cache = self.require_ready()?;
        if !cache.info.semantic_admin() {
            return Err(SessionError::AdminDisabled);
        }
        self.require_idle()?;
        if self.is_logged_in() {
            debug!("Already logged in");
            self.emit(SessionEvent::LoginChanged { logged_in: true });
            return Ok(());
        }
        let query = Query::new()
            .param("c_comdef_admin_login", login)
            .param("c_comdef_admin_password", password);
        self.issue(CallType::AdminLogin, query, None)?;
        self.admin = AdminSession::LoggingIn;
        Ok(())
    }

    /// Logs out. A login-changed event always follows.
    pub fn logout(&mut self) -> SessionResult<()> {
        self.require_ready()?;
        self.require_idle()?;
        if self.admin_state() == AdminState::LoggedOut {
            debug!("Already logged out");
            self.emit(SessionEvent::LoginChanged { logged_in: false });
            return Ok(());
        }
        self.issue(CallType::AdminLogout, Query::new(), None)
    }

    /// Saves an edited meeting, or creates it when its id is 0.
    ///
    /// Only changed fields are sent for existing meetings; an unchanged
    /// meeting completes immediately without a request.
    pub fn save_meeting(&mut self, meeting: &EditableMeeting) -> SessionResult<()> {
        self.require_admin()?;
        self.require_idle()?;
        let fields = meeting.save_fields();
        let id = meeting.id();
        if id == 0 {
            return self.issue(CallType::AdminCreateMeeting, field_query(Query::new(), &fields), None);
        }
        if fields.is_empty() {
            debug!(meeting_id = id, "Nothing to save");
            self.emit(SessionEvent::ChangeComplete(None));
            return Ok(());
        }
        let query = field_query(Query::new().param("meeting_id", id), &fields);
        self.issue(CallType::AdminSaveMeeting, query, Some(id))
    }

    /// Creates a new meeting with the same field values.
    pub fn save_meeting_as_copy(&mut self, meeting: &EditableMeeting) -> SessionResult<()> {
        let mut copy = EditableMeeting::new(meeting.record().clone());
        copy.assign_id(0);
        self.save_meeting(&copy)
    }

    pub fn delete_meeting(&mut self, meeting_id: i64) -> SessionResult<()> {
        self.require_admin()?;
        let meeting_id = positive_id(meeting_id)?;
        let query = Query::new().param("meeting_id", meeting_id);
        self.issue(CallType::AdminDeleteMeeting, query, Some(meeting_id))
    }

    /// Restores a deleted meeting, then reads it back.
    pub fn restore_deleted_meeting(&mut self, meeting_id: i64) -> SessionResult<()> {
        self.require_admin()?;
        let meeting_id = positive_id(meeting_id)?;
        let query = Query::new().param("meeting_id", meeting_id);
        self.issue(CallType::AdminRestoreMeeting, query, Some(meeting_id))
    }

    /// Rolls a meeting back to its state before a change, then reads it back.
    pub fn rollback_meeting(&mut self, meeting_id: i64, change_id: i64) -> SessionResult<()> {
        self.require_admin()?;
        let meeting_id = positive_id(meeting_id)?;
        let change_id = positive_id(change_id)?;
        let query = Query::new()
            .param("meeting_id", meeting_id)
            .param("change_id", change_id);
        self.issue(CallType::AdminRollbackMeeting, query, Some(meeting_id))
    }

    /// Sends a message to a meeting's contact through the server.
    ///
    /// Refused with a message-sent(false) event when the server has email
    /// disabled.
    pub fn send_message(
        &mut self,
        meeting: &MeetingRecord,
        from_address: &str,
        message: &str,
    ) -> SessionResult<()> {
        let cache = self.require_ready()?;
        if !cache.info.email_enabled() {
            self.emit(SessionEvent::MessageSent(false));
            return Err(SessionError::EmailDisabled);
        }
        let query = Query::new()
            .param("meeting_id", meeting.id())
            .param("service_body_id", meeting.service_body_id())
            .param("from_address", from_address)
            .param("message", message);
        self.issue(CallType::SendMessage, query, Some(meeting.id()))
    }

    /// Waits for the next completion and dispatches it.
    ///
    /// Returns false when nothing is in flight.
    pub async fn process_next(&mut self) -> bool {
        if !self.is_busy() {
            return false;
        }
        let next = self.completions_rx.recv().await;
        match next {
            Some(completion) => {
                self.dispatch(completion);
                true
            }
            None => false,
        }
    }

    /// Processes completions until no request is outstanding, following
    /// chained calls such as the handshake stages.
    pub async fn run_until_idle(&mut self) {
        while self.process_next().await {}
    }

    /// Routes one completion to its handler. Completions whose token is not
    /// the one in flight are dropped.
    pub fn dispatch(&mut self, completion: Completion<CallToken>) {
        let Completion { token, outcome } = completion;
        match self.in_flight {
            InFlight::Awaiting(current) if current.id == token.id => {}
            _ => {
                debug!(call = %token.call, token = token.id, "Dropping stale completion");
                return;
            }
        }
        self.in_flight = InFlight::Idle;
        if token.call == CallType::ServerTest {
            self.transport.set_suppress_errors(false);
        }
        trace!(call = %token.call, token = token.id, "Dispatching completion");

        match outcome {
            Outcome::Body(body) => self.on_body(token, body),
            Outcome::Failed(error) => {
                let service = if token.call.is_handshake() {
                    ServiceError::general(format!("{} request failed", token.call))
                } else {
                    ServiceError::bad_data(format!("{} request failed", token.call))
                };
                self.fail(token, service.with_source(error));
            }
            Outcome::Suppressed => {
                info!(call = %token.call, "No usable answer from server");
                if token.call.is_handshake() {
                    self.teardown(HandshakeFailure::BadUri);
                } else {
                    self.fail(token, ServiceError::general("request failed"));
                }
            }
        }
    }

    fn on_body(&mut self, token: CallToken, body: ResponseBody) {
        let value = match &body {
            ResponseBody::Json(json) => interpret(json),
            ResponseBody::Raw(bytes) => classify_bytes(bytes),
        };
        trace!(call = %token.call, kind = value.kind(), "Response classified");

        let value = match value {
            DomainValue::Error(e)
                if e.code() == ErrorCode::NoDataReceived && tolerates_empty(token.call) =>
            {
                DomainValue::List(Vec::new())
            }
            DomainValue::Error(e) => return self.fail(token, e),
            other => other,
        };
        let json = match &body {
            ResponseBody::Json(json) => Some(json),
            ResponseBody::Raw(_) => None,
        };

        match token.call {
            CallType::ServerTest => self.on_server_info(value),
            CallType::ServiceBodies => self.on_service_bodies(value),
            CallType::Formats => self.on_formats(value),
            CallType::Languages => self.on_languages(value),
            CallType::MeetingSearch => self.on_search(token, value),
            CallType::Changes | CallType::MeetingChanges | CallType::DeletedMeetings => {
                self.on_changes(token, value)
            }
            CallType::AdminLogin => self.on_login(value),
            CallType::AdminPermissions => self.on_permissions(value),
            CallType::AdminLogout => self.set_logged_out(),
            CallType::AdminSaveMeeting => {
                let change = json.and_then(MeetingChange::from_response);
                self.emit(SessionEvent::ChangeComplete(change));
            }
            CallType::AdminCreateMeeting => self.on_created(token, json),
            CallType::AdminDeleteMeeting => {
                let deleted = json.and_then(affected_meeting_id).is_some();
                self.emit(SessionEvent::Deleted {
                    meeting_id: token.meeting_id.unwrap_or_default(),
                    deleted,
                });
            }
            CallType::AdminRestoreMeeting | CallType::AdminRollbackMeeting => {
                self.on_revived(token, json)
            }
            CallType::NewMeetingInfo
            | CallType::RestoredMeetingInfo
            | CallType::RolledBackMeetingInfo => self.on_read_back(token, value),
            CallType::SendMessage => match value.as_text() {
                Some("1") => self.emit(SessionEvent::MessageSent(true)),
                status => {
                    let error = ServiceError::mail(status.unwrap_or_default());
                    self.fail(token, error);
                }
            },
        }
    }

    fn on_server_info(&mut self, value: DomainValue) {
        if !matches!(self.state, HandshakeState::TestingServer) {
            return self.unexpected_stage(CallType::ServerTest);
        }
        let info = match value {
            DomainValue::ServerInfo(info) => info,
            other => {
                warn!(kind = other.kind(), "Server test did not return server info");
                return self.teardown(HandshakeFailure::BadUri);
            }
        };
        if !info.meets_min_version(self.config.min_version) {
            warn!(
                version = info.version(),
                min = self.config.min_version,
                "Server version too old"
            );
            return self.teardown(HandshakeFailure::WrongVersion);
        }
        let missing = info.missing_standard_keys();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Server lacks standard meeting fields");
            return self.teardown(HandshakeFailure::MissingFields);
        }
        info!(version = info.version(), "Server accepted");
        self.state = HandshakeState::FetchingServiceBodies { info };
        self.advance(CallType::ServiceBodies);
    }

    fn on_service_bodies(&mut self, value: DomainValue) {
        let HandshakeState::FetchingServiceBodies { info } = std::mem::take(&mut self.state) else {
            return self.unexpected_stage(CallType::ServiceBodies);
        };
        let service_bodies = match value {
            DomainValue::ServiceBodies(bodies) => bodies,
            DomainValue::ServiceBody(body) => vec![body],
            _ => Vec::new(),
        };
        if service_bodies.is_empty() {
            return self.teardown(HandshakeFailure::NoServiceBodies);
        }
        debug!(count = service_bodies.len(), "Service bodies received");
        self.state = HandshakeState::FetchingFormats {
            info,
            service_bodies,
        };
        self.advance(CallType::Formats);
    }

    fn on_formats(&mut self, value: DomainValue) {
        let HandshakeState::FetchingFormats {
            info,
            service_bodies,
        } = std::mem::take(&mut self.state)
        else {
            return self.unexpected_stage(CallType::Formats);
        };
        let formats = value.into_formats().unwrap_or_default();
        if formats.is_empty() {
            return self.teardown(HandshakeFailure::NoFormats);
        }
        debug!(count = formats.len(), "Formats received");
        self.state = HandshakeState::FetchingLanguages {
            info,
            service_bodies,
            formats,
        };
        self.advance(CallType::Languages);
    }

    fn on_languages(&mut self, value: DomainValue) {
        let HandshakeState::FetchingLanguages {
            info,
            service_bodies,
            formats,
        } = std::mem::take(&mut self.state)
        else {
            return self.unexpected_stage(CallType::Languages);
        };
        let mut languages = match value {
            DomainValue::Languages(languages) => languages,
            DomainValue::Language(language) => vec![language],
            _ => Vec::new(),
        };
        if languages.is_empty() {
            warn!("Server returned no languages");
            return self.teardown(HandshakeFailure::CommError);
        }
        if !info.native_lang().is_empty() {
            mark_native_language(&mut languages, info.native_lang());
        }

        let cache = SessionCache::new(
            info,
            service_bodies,
            formats,
            languages,
            &PermissionTable::default(),
        );
        info!(
            service_bodies = cache.service_bodies.len(),
            formats = cache.formats.len(),
            languages = cache.languages.len(),
            "Session ready"
        );
        self.state = HandshakeState::Ready(Box::new(cache));
        self.last_failure = None;
        self.emit(SessionEvent::ServerValidity {
            valid: true,
            failure: None,
        });
    }

    fn on_search(&mut self, token: CallToken, value: DomainValue) {
        match value {
            DomainValue::SearchResults { meetings, formats } => {
                if let Some(formats) = formats {
                    self.emit(SessionEvent::FormatResults(formats));
                }
                let meetings = self.wrap_meetings(meetings);
                self.emit(SessionEvent::SearchResults(meetings));
            }
            DomainValue::Formats(formats) => self.emit(SessionEvent::FormatResults(formats)),
            other if is_empty_value(&other) => self.emit(SessionEvent::SearchResults(Vec::new())),
            other => self.fail(
                token,
                ServiceError::bad_data(format!("unexpected {} in search response", other.kind())),
            ),
        }
    }

    fn on_changes(&mut self, token: CallToken, value: DomainValue) {
        let mut changes = if is_empty_value(&value) {
            Vec::new()
        } else {
            let kind = value.kind();
            match value.into_changes() {
                Some(changes) => changes,
                None => {
                    return self.fail(
                        token,
                        ServiceError::bad_data(format!("unexpected {} in change response", kind)),
                    );
                }
            }
        };
        if let Some(meeting_id) = token.meeting_id {
            for change in &mut changes {
                change.target_meeting = Some(meeting_id);
            }
        }
        let deleted_only = token.call == CallType::DeletedMeetings;
        let changes = correlate_changes(changes, deleted_only, self.admin.permissions());
        debug!(count = changes.len(), deleted_only, "Change results");
        self.emit(SessionEvent::ChangeResults {
            changes,
            meeting_id: token.meeting_id,
            deleted_only,
        });
    }

    fn on_login(&mut self, value: DomainValue) {
        if value.as_text() != Some("OK") {
            info!("Login refused");
            return self.set_logged_out();
        }
        self.admin = AdminSession::AwaitingPermissions;
        if let Err(e) = self.issue(CallType::AdminPermissions, Query::new(), None) {
            self.emit(SessionEvent::Error(ServiceError::general(e.to_string())));
            self.set_logged_out();
        }
    }

    fn on_permissions(&mut self, value: DomainValue) {
        let entries = match value {
            DomainValue::Permissions(entries) => entries,
            _ => Vec::new(),
        };
        if entries.is_empty() {
            info!("No permissions granted");
            return self.set_logged_out();
        }
        let table = PermissionTable::new(entries);
        if let HandshakeState::Ready(cache) = &mut self.state {
            cache.hierarchy.refresh_permissions(&table);
        }
        info!(service_bodies = table.len(), "Logged in");
        self.admin = AdminSession::LoggedIn(table);
        self.emit(SessionEvent::LoginChanged { logged_in: true });
    }

    fn on_created(&mut self, token: CallToken, json: Option<&Value>) {
        match json.and_then(new_meeting_id) {
            Some(id) => self.read_back(CallType::NewMeetingInfo, id),
            None => self.fail(token, ServiceError::bad_data("new meeting id missing")),
        }
    }

    fn on_revived(&mut self, token: CallToken, json: Option<&Value>) {
        let read_back = if token.call == CallType::AdminRestoreMeeting {
            CallType::RestoredMeetingInfo
        } else {
            CallType::RolledBackMeetingInfo
        };
        match json.and_then(affected_meeting_id) {
            Some(id) => self.read_back(read_back, id),
            None => self.fail(token, ServiceError::bad_data("meeting id missing")),
        }
    }

    fn read_back(&mut self, call: CallType, meeting_id: i64) {
        let query = Query::new().param("SearchString", meeting_id);
        if let Err(e) = self.issue(call, query, Some(meeting_id)) {
            warn!(call = %call, error = %e, "Read-back not issued");
            self.emit(SessionEvent::Error(ServiceError::general(e.to_string())));
        }
    }

    fn on_read_back(&mut self, token: CallToken, value: DomainValue) {
        let mut meetings = value.into_meetings().unwrap_or_default();
        let position = meetings
            .iter()
            .position(|m| Some(m.id()) == token.meeting_id)
            .unwrap_or(0);
        if meetings.is_empty() {
            return self.fail(token, ServiceError::bad_data("meeting read-back was empty"));
        }
        let record = meetings.swap_remove(position);
        let meeting = Meeting::classify(record, self.admin.permissions());
        let event = match token.call {
            CallType::NewMeetingInfo => SessionEvent::NewMeeting(meeting),
            CallType::RestoredMeetingInfo => SessionEvent::Restored(meeting),
            _ => SessionEvent::RolledBack(meeting),
        };
        self.emit(event);
    }

    /// Surfaces a failure once and applies the call's failure policy.
    fn fail(&mut self, token: CallToken, error: ServiceError) {
        warn!(call = %token.call, error = %error, "Call failed");
        let failure = if error.code() == ErrorCode::IncorrectCredentials {
            HandshakeFailure::AuthError
        } else {
            HandshakeFailure::CommError
        };
        self.emit(SessionEvent::Error(error));

        match token.call {
            call if call.is_handshake() => self.teardown(failure),
            CallType::AdminLogin | CallType::AdminLogout | CallType::AdminPermissions => {
                self.set_logged_out()
            }
            CallType::AdminDeleteMeeting => self.emit(SessionEvent::Deleted {
                meeting_id: token.meeting_id.unwrap_or_default(),
                deleted: false,
            }),
            CallType::SendMessage => self.emit(SessionEvent::MessageSent(false)),
            _ => {}
        }
    }

    fn unexpected_stage(&mut self, call: CallType) {
        warn!(call = %call, phase = ?self.phase(), "Handshake response out of order");
        self.teardown(HandshakeFailure::CommError);
    }

    /// Issues the next handshake call, tearing down if it cannot go out.
    fn advance(&mut self, call: CallType) {
        if let Err(e) = self.issue(call, Query::new(), None) {
            warn!(call = %call, error = %e, "Handshake stage not issued");
            self.emit(SessionEvent::Error(ServiceError::general(e.to_string())));
            self.teardown(HandshakeFailure::CommError);
        }
    }

    /// Discards every piece of cached session state and reports the session
    /// invalid.
    fn teardown(&mut self, failure: HandshakeFailure) {
        warn!(failure = %failure, "Session torn down");
        self.state = HandshakeState::Disconnected;
        self.admin = AdminSession::LoggedOut;
        self.last_failure = Some(failure);
        self.emit(SessionEvent::ServerValidity {
            valid: false,
            failure: Some(failure),
        });
    }

    fn reset_session(&mut self) {
        self.transport.reset();
        self.in_flight = InFlight::Idle;
        self.state = HandshakeState::Disconnected;
        self.admin = AdminSession::LoggedOut;
        self.last_failure = None;
    }

    fn set_logged_out(&mut self) {
        self.admin = AdminSession::LoggedOut;
        if let HandshakeState::Ready(cache) = &mut self.state {
            cache.hierarchy.refresh_permissions(&PermissionTable::default());
        }
        self.emit(SessionEvent::LoginChanged { logged_in: false });
    }

    fn wrap_meetings(&self, meetings: Vec<MeetingRecord>) -> Vec<Meeting> {
        let permissions = self.admin.permissions();
        meetings
            .into_iter()
            .map(|m| Meeting::classify(m, permissions))
            .collect()
    }

    fn issue(&mut self, call: CallType, query: Query, meeting_id: Option<i64>) -> SessionResult<()> {
        self.require_idle()?;
        self.next_token += 1;
        let token = CallToken {
            id: self.next_token,
            call,
            meeting_id,
        };
        let uri = request_uri(self.config.root_uri(), call, &query, self.config.calling_app());
        debug!(call = %call, token = token.id, uri = %redact_secrets(&uri), "Issuing call");

        RequestCorrelator::issue(&mut self.transport, uri, self.completions_tx.clone(), token)
            .map_err(|e| match e.code() {
                TransportErrorCode::Busy => SessionError::Busy,
                _ => SessionError::from(e),
            })?;
        self.in_flight = InFlight::Awaiting(token);
        Ok(())
    }

    fn require_idle(&self) -> SessionResult<()> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn require_ready(&self) -> SessionResult<&SessionCache> {
        self.cache().ok_or(SessionError::NotReady)
    }

    fn require_admin(&self) -> SessionResult<()> {
        self.require_ready()?;
        if !self.is_logged_in() {
            return Err(SessionError::NotLoggedIn);
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        trace!(event = event.kind(), "Emitting event");
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

/// Calls for which an empty body simply means no results.
fn tolerates_empty(call: CallType) -> bool {
    matches!(
        call,
        CallType::MeetingSearch
            | CallType::Changes
            | CallType::MeetingChanges
            | CallType::DeletedMeetings
            | CallType::AdminPermissions
    )
}

fn is_empty_value(value: &DomainValue) -> bool {
    match value {
        DomainValue::List(items) => items.is_empty(),
        DomainValue::Map(map) => map.is_empty(),
        DomainValue::Text(text) => text.is_empty(),
        _ => false,
    }
}

fn field_query(query: Query, fields: &[(String, String)]) -> Query {
    fields
        .iter()
        .fold(query, |q, (key, value)| q.meeting_field(key, value))
}

fn positive_id(id: i64) -> SessionResult<i64> {
    if id > 0 {
        Ok(id)
    } else {
        Err(SessionError::invalid_argument(format!("id must be positive, got {}", id)))
    }
}
