//! Shared types for QuickMart
//!
//! Wire-level domain models, realtime event types and request/response
//! DTOs used by both the server and the chat client.

pub mod client;
pub mod models;
pub mod realtime;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use realtime::{ClientEvent, ServerEvent};
