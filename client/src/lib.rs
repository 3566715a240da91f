//! QuickMart Client - 聊天会话协调器
//!
//! 封装 WebSocket 聊天协议的客户端侧：
//! - 乐观回显与服务端回包的对账 ([`ledger`])
//! - 断线指数退避重连、重连后自动重新入房 ([`session`])
//! - 输入状态跟踪，只在状态翻转时发送 typing 事件 ([`typing`])

pub mod backoff;
pub mod config;
pub mod error;
pub mod ledger;
pub mod session;
pub mod typing;

pub use backoff::{Backoff, ReconnectPolicy};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use ledger::{MessageLedger, Reconciliation};
pub use session::{ChatSession, SessionEvent};
pub use typing::TypingTracker;

// Re-export shared types for convenience
pub use shared::models::{ChatMessage, Conversation};
pub use shared::realtime::{ClientEvent, ServerEvent};
