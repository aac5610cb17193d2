//! Root server wire protocol.
//!
//! Everything needed to talk to a root server short of the HTTP client
//! itself: endpoint paths, URI construction, the structural response
//! interpreter and the error taxonomy surfaced to callers.

pub mod endpoints;
pub mod error;
pub mod interpret;
pub mod number;
pub mod responses;
pub mod uri;

pub use endpoints::CallType;
pub use error::{ErrorCode, ErrorDomain, HandshakeFailure, ServiceError, ServiceResult};
pub use interpret::{DomainValue, classify, classify_bytes, interpret, matching_rule};
pub use number::{normalize_float, normalize_number};
pub use responses::{MeetingChange, affected_meeting_id, int_value, mail_status, new_meeting_id};
pub use uri::{Query, append_calling_app, clean_uri, redact_secrets, request_uri};
