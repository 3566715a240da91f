//! Order Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::Order;
use shared::models::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a new order
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create("orders").content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing = parse_id(id)?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Orders of one customer, newest first
    pub async fn find_by_customer(&self, customer_id: &str) -> RepoResult<Vec<Order>> {
        let customer_owned = customer_id.to_string();
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM orders WHERE customer = $customer ORDER BY created_at DESC")
            .bind(("customer", customer_owned))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// All orders with optional status filter, newest first (admin view)
    pub async fn find_all(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = match status {
            Some(status) => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM orders WHERE status = $status \
                         ORDER BY created_at DESC LIMIT $limit START $offset",
                    )
                    .bind(("status", status))
                    .bind(("limit", limit))
                    .bind(("offset", offset))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM orders ORDER BY created_at DESC LIMIT $limit START $offset")
                    .bind(("limit", limit))
                    .bind(("offset", offset))
                    .await?
                    .take(0)?
            }
        };
        Ok(orders)
    }

    /// Count orders with optional status filter
    pub async fn count(&self, status: Option<OrderStatus>) -> RepoResult<i64> {
        let count: Option<i64> = match status {
            Some(status) => {
                self.base
                    .db()
                    .query("SELECT count() FROM orders WHERE status = $status GROUP ALL")
                    .bind(("status", status))
                    .await?
                    .take((0, "count"))?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT count() FROM orders GROUP ALL")
                    .await?
                    .take((0, "count"))?
            }
        };
        Ok(count.unwrap_or(0))
    }

    /// Set the order status
    pub async fn set_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let thing = parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status RETURN AFTER")
            .bind(("thing", thing))
            .bind(("status", status))
            .await?;
        let updated: Vec<Order> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    /// Flip the stock_restored flag.
    ///
    /// Returns `true` only for the call that performed the flip, so
    /// callers restore stock exactly once even under races.
    pub async fn mark_stock_restored(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET stock_restored = true \
                 WHERE stock_restored = false RETURN BEFORE",
            )
            .bind(("thing", thing))
            .await?;
        let flipped: Vec<Order> = result.take(0)?;

        // Empty result: the flag was already set (or the order vanished)
        Ok(!flipped.is_empty())
    }
}
