//! 实时通信模块
//!
//! WebSocket 网关 + 房间制广播：
//!
//! ```text
//! /ws ──▶ gateway (JWT 校验, 升级)
//!            │
//!            ▼
//!    ConnectionRegistry (连接/房间表)
//!            │
//!            ▼
//!       ChatRelay (持久化后广播)
//! ```
//!
//! | 房间 | 成员 | 用途 |
//! |------|------|------|
//! | `user_<id>` | 该用户的所有连接 | 个人通知 |
//! | `admin_room` | 所有管理员连接 | 客服面板 |
//! | `chat_<id>` | 已加入该会话的连接 | 会话消息 |

pub mod gateway;
pub mod registry;
pub mod rooms;
pub mod service;

pub use registry::{ConnectionId, ConnectionRegistry};
pub use rooms::{Actor, RoomId};
pub use service::ChatRelay;
