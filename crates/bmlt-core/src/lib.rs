//! Core types: meetings, formats, service bodies, change history, permissions
//!
//! Everything here is plain data plus the two pure algorithms the session
//! layer relies on: the service body tree builder and the change list
//! correlator.

pub mod change;
pub mod correlate;
pub mod format;
pub mod language;
pub mod meeting;
pub mod permission;
pub mod server_info;
pub mod service_body;
pub mod tracing;

pub use change::{ChangeRecord, ChangeSnapshot, FieldChange};
pub use correlate::correlate_changes;
pub use format::{FormatRecord, FormatRegistry};
pub use language::{LanguageRecord, mark_native_language};
pub use meeting::{EditableMeeting, MeetingRecord, normalize_formats};
pub use permission::{PermissionEntry, PermissionLevel, PermissionTable};
pub use server_info::{DistanceUnits, MIN_SERVER_VERSION, STANDARD_MEETING_KEYS, ServerInfo};
pub use service_body::{ServiceBodyNode, ServiceBodyRecord, build_hierarchy};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
