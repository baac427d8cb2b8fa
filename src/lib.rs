//! Punchcard: projects, start/stop timers, manual entries, and a single
//! durable snapshot of all of it.

pub mod clock;
pub mod color;
pub mod db;
pub mod logging;
pub mod persist;
pub mod store;
pub mod timeutil;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{Store, StoreError, StoreResult};
pub use types::{DragPayload, NewSession, Project, ProjectId, Session, SessionId, SessionPatch};
