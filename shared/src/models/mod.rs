//! Wire-level domain models
//!
//! These are the shapes that cross the HTTP/WebSocket boundary. The
//! server keeps its own record types (with database ids) and converts
//! into these before anything leaves the process.

pub mod cart;
pub mod category;
pub mod chat;
pub mod order;
pub mod product;
pub mod user;

pub use cart::CartItem;
pub use category::Category;
pub use chat::{ChatMessage, ChatStatus, Conversation, UnreadCount};
pub use order::{Order, OrderItem, OrderStatus, StockIssue};
pub use product::Product;
pub use user::{Role, UserInfo};
