//! HTTP API 模块
//!
//! 每个子模块提供一个 `router()`，由 `core::server::build_router` 合并。

pub mod auth;
pub mod cart;
pub mod categories;
pub mod chat;
pub mod health;
pub mod orders;
pub mod products;
