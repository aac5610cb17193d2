//! Root server session orchestration.
//!
//! [`CommunicationHandler`] drives the connection handshake
//! (server test, service bodies, formats, languages), keeps the cached
//! server data, runs the admin login and the meeting mutation round-trips,
//! and reports everything as [`SessionEvent`]s.

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod meeting;
pub mod query;
pub mod state;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use event::SessionEvent;
pub use handler::{CommunicationHandler, EventReceiver};
pub use meeting::Meeting;
pub use query::{ChangeQuery, DeletedQuery};
pub use state::{AdminState, HandshakePhase, SessionCache};
