//! 订单模块
//!
//! [`OrderLifecycle`] 封装订单状态机与库存补偿逻辑。

pub mod lifecycle;

pub use lifecycle::{LifecycleError, OrderLifecycle};
