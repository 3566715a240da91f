//! Order Lifecycle Service
//!
//! 订单创建与状态机：
//!
//! ```text
//! pending -> confirmed -> preparing -> out_for_delivery -> delivered
//!    │           │
//!    └───────────┴──> cancelled (客户仅限 pending/confirmed)
//! ```
//!
//! 库存规则：
//! - 创建时逐项原子扣减；任一项不足则回补已扣项并整单拒绝
//! - 取消时回补库存，`stock_restored` 标志保证只回补一次

use shared::client::CreateOrderRequest;
use shared::models::{Order, OrderItem, OrderStatus, StockIssue};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::models::Order as OrderRecord;
use crate::db::repository::{OrderRepository, ProductRepository, RepoError};
use crate::utils::AppError;

/// Order lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Quantity must be positive")]
    InvalidQuantity,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Insufficient stock for some items")]
    InsufficientStock(Vec<StockIssue>),

    #[error("Order cannot be cancelled in status '{0}'")]
    CannotCancel(OrderStatus),

    #[error("Order is in terminal status '{0}'")]
    TerminalState(OrderStatus),

    #[error("Order does not belong to this customer")]
    NotOwner,

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] RepoError),
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::EmptyOrder | LifecycleError::InvalidQuantity => {
                AppError::validation(err.to_string())
            }
            LifecycleError::ProductNotFound(id) => {
                AppError::not_found(format!("Product not found: {}", id))
            }
            LifecycleError::InsufficientStock(issues) => AppError::InsufficientStock(issues),
            LifecycleError::CannotCancel(_) | LifecycleError::TerminalState(_) => {
                AppError::conflict(err.to_string())
            }
            LifecycleError::NotOwner => AppError::forbidden(err.to_string()),
            LifecycleError::NotFound(id) => AppError::not_found(format!("Order not found: {}", id)),
            LifecycleError::Store(e) => match e {
                RepoError::NotFound(msg) => AppError::not_found(msg),
                RepoError::Validation(msg) => AppError::validation(msg),
                RepoError::Duplicate(msg) => AppError::conflict(msg),
                RepoError::Database(msg) => AppError::database(msg),
            },
        }
    }
}

/// Order lifecycle service
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: OrderRepository,
    products: ProductRepository,
}

impl OrderLifecycle {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db),
        }
    }

    /// Create a new order for a customer.
    ///
    /// 流程：校验 → 解析商品 → 预检库存 → 逐项原子扣减 →
    /// 持久化 pending 订单。扣减中途失败则回补已扣项。
    pub async fn create_order(
        &self,
        customer_id: &str,
        request: CreateOrderRequest,
    ) -> Result<Order, LifecycleError> {
        if request.items.is_empty() {
            return Err(LifecycleError::EmptyOrder);
        }
        if request.items.iter().any(|i| i.quantity <= 0) {
            return Err(LifecycleError::InvalidQuantity);
        }

        // Resolve all products; price is snapshotted here
        let mut items: Vec<OrderItem> = Vec::with_capacity(request.items.len());
        let mut issues: Vec<StockIssue> = Vec::new();
        for line in &request.items {
            let product = self
                .products
                .find_by_id(&line.product)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| LifecycleError::ProductNotFound(line.product.clone()))?;

            if product.stock < line.quantity {
                issues.push(StockIssue {
                    product: line.product.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            items.push(OrderItem {
                product: line.product.clone(),
                product_name: product.name,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }

        // Pre-check gives the client a complete issue list in one round
        if !issues.is_empty() {
            return Err(LifecycleError::InsufficientStock(issues));
        }

        // Decrement phase. The pre-check can race with concurrent
        // orders, so each decrement is individually guarded; a failed
        // line rolls back everything taken so far.
        let mut taken: Vec<&OrderItem> = Vec::new();
        for item in &items {
            let applied = match self
                .products
                .try_decrement_stock(&item.product, item.quantity)
                .await
            {
                Ok(applied) => applied,
                Err(e) => {
                    self.restore_items(&taken).await;
                    return Err(LifecycleError::Store(e));
                }
            };

            if !applied {
                let available = self
                    .products
                    .find_by_id(&item.product)
                    .await
                    .ok()
                    .flatten()
                    .map(|p| p.stock)
                    .unwrap_or(0);
                self.restore_items(&taken).await;
                return Err(LifecycleError::InsufficientStock(vec![StockIssue {
                    product: item.product.clone(),
                    requested: item.quantity,
                    available,
                }]));
            }

            taken.push(item);
        }

        let total_amount = items.iter().map(|i| i.quantity * i.unit_price).sum();

        let record = OrderRecord {
            id: None,
            customer: customer_id.to_string(),
            items: items.clone(),
            total_amount,
            status: OrderStatus::Pending,
            delivery_address: request.delivery_address,
            created_at: now_millis(),
            stock_restored: false,
        };

        let created = match self.orders.create(record).await {
            Ok(created) => created,
            Err(e) => {
                // Order never existed; give the stock back
                self.restore_items(&taken).await;
                return Err(LifecycleError::Store(e));
            }
        };

        info!(
            customer = %customer_id,
            total = created.total_amount,
            "Order created"
        );

        Ok(created.to_wire())
    }

    /// Customer-initiated cancellation (only pending/confirmed)
    pub async fn cancel_by_customer(
        &self,
        customer_id: &str,
        order_id: &str,
    ) -> Result<Order, LifecycleError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(order_id.to_string()))?;

        if order.customer != customer_id {
            return Err(LifecycleError::NotOwner);
        }

        if !order.status.customer_can_cancel() {
            return Err(LifecycleError::CannotCancel(order.status));
        }

        let updated = self.orders.set_status(order_id, OrderStatus::Cancelled).await?;
        self.restore_stock_once(order_id, &updated.items).await?;

        info!(order = %order_id, "Order cancelled by customer");

        Ok(updated.to_wire())
    }

    /// Admin status transition. Free movement between non-terminal
    /// states; terminal orders are locked.
    pub async fn set_status_admin(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, LifecycleError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(order_id.to_string()))?;

        if order.status.is_terminal() {
            return Err(LifecycleError::TerminalState(order.status));
        }

        let updated = self.orders.set_status(order_id, status).await?;

        if status == OrderStatus::Cancelled {
            self.restore_stock_once(order_id, &updated.items).await?;
        }

        info!(order = %order_id, status = %status, "Order status updated");

        Ok(updated.to_wire())
    }

    /// Restore stock for a cancelled order, at most once per order
    async fn restore_stock_once(
        &self,
        order_id: &str,
        items: &[OrderItem],
    ) -> Result<(), LifecycleError> {
        if !self.orders.mark_stock_restored(order_id).await? {
            return Ok(());
        }

        let refs: Vec<&OrderItem> = items.iter().collect();
        self.restore_items(&refs).await;
        Ok(())
    }

    /// Best-effort compensation: failures are logged, not propagated,
    /// so one bad product record cannot wedge a cancellation.
    async fn restore_items(&self, items: &[&OrderItem]) {
        for item in items {
            if let Err(e) = self
                .products
                .increment_stock(&item.product, item.quantity)
                .await
            {
                warn!(
                    product = %item.product,
                    quantity = item.quantity,
                    error = %e,
                    "Failed to restore stock"
                );
            }
        }
    }
}
