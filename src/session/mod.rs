//! Client sessions and the notifications pushed to them.
//!
//! A session is one live WebSocket connection. Jobs only ever refer to it by
//! [`SessionId`]; the outbound channel handle stays inside the registry.

pub mod notification;
pub mod registry;

pub use notification::{CompletedData, Notification};
pub use registry::{SessionId, SessionRegistry};
