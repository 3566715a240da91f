//! QuickMart Server - 杂货订购平台后端
//!
//! # 架构概述
//!
//! - **实时网关** (`realtime`): WebSocket 聊天中继，房间广播
//! - **订单** (`orders`): 订单状态机和库存调整
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **认证** (`auth`): JWT + Argon2 认证体系
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、密码哈希
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! ├── orders/        # 订单生命周期
//! ├── realtime/      # 实时网关
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod realtime;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::OrderLifecycle;
pub use realtime::{Actor, ChatRelay, ConnectionRegistry, RoomId};
pub use utils::{AppError, AppResult};

/// Load dotenv and initialize logging. Call once at process start.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    let log_dir = std::env::var("LOG_DIR").ok();
    utils::logger::init_logger_with_file(
        std::env::var("LOG_LEVEL").ok().as_deref(),
        log_dir.as_deref(),
    );
    Ok(())
}
