//! Cart Repository
//!
//! 每个客户一份购物车 (get-or-create)。加购会累加同商品数量，
//! 加购与改量都校验商品上架与库存；数量归零即移除该行。

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Cart, CartEntry, Product};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Get the customer's cart, creating an empty one on first use
    pub async fn get_or_create(&self, customer_id: &str) -> RepoResult<Cart> {
        let customer_owned = customer_id.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM cart WHERE customer = $customer LIMIT 1")
            .bind(("customer", customer_owned))
            .await?;
        let carts: Vec<Cart> = result.take(0)?;
        if let Some(existing) = carts.into_iter().next() {
            return Ok(existing);
        }

        let cart = Cart {
            id: None,
            customer: customer_id.to_string(),
            items: Vec::new(),
            created_at: now_millis(),
        };
        let created: Option<Cart> = self.base.db().create("cart").content(cart).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create cart".to_string()))
    }

    /// Add a product to the cart; an existing line's quantity accumulates.
    /// The combined quantity must be in stock.
    pub async fn add_item(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> RepoResult<Cart> {
        if quantity <= 0 {
            return Err(RepoError::Validation(
                "Quantity must be positive".to_string(),
            ));
        }

        let product = self.active_product(product_id).await?;
        let mut cart = self.get_or_create(customer_id).await?;

        let new_quantity = cart
            .items
            .iter()
            .find(|e| e.product == product_id)
            .map_or(quantity, |e| e.quantity + quantity);
        check_stock(&product, new_quantity)?;

        match cart.items.iter_mut().find(|e| e.product == product_id) {
            Some(entry) => entry.quantity = new_quantity,
            None => cart.items.push(CartEntry {
                product: product_id.to_string(),
                quantity,
            }),
        }

        self.save(cart).await
    }

    /// Set a line's quantity; zero removes the line
    pub async fn update_item(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> RepoResult<Cart> {
        if quantity < 0 {
            return Err(RepoError::Validation(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let mut cart = self.get_or_create(customer_id).await?;
        let Some(pos) = cart.items.iter().position(|e| e.product == product_id) else {
            return Err(RepoError::NotFound("Item not found in cart".to_string()));
        };

        if quantity == 0 {
            cart.items.remove(pos);
        } else {
            let product = self.active_product(product_id).await?;
            check_stock(&product, quantity)?;
            cart.items[pos].quantity = quantity;
        }

        self.save(cart).await
    }

    /// Remove a line; removing an absent line is a no-op
    pub async fn remove_item(&self, customer_id: &str, product_id: &str) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(customer_id).await?;
        cart.items.retain(|e| e.product != product_id);
        self.save(cart).await
    }

    /// Empty the cart
    pub async fn clear(&self, customer_id: &str) -> RepoResult<Cart> {
        let mut cart = self.get_or_create(customer_id).await?;
        cart.items.clear();
        self.save(cart).await
    }

    /// Load a product that exists and is still purchasable
    async fn active_product(&self, id: &str) -> RepoResult<Product> {
        let thing = parse_id(id)?;
        let product: Option<Product> = self.base.db().select(thing).await?;
        let product =
            product.ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;
        if !product.is_active {
            return Err(RepoError::Validation(
                "Product is not available".to_string(),
            ));
        }
        Ok(product)
    }

    async fn save(&self, cart: Cart) -> RepoResult<Cart> {
        let thing = cart
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Cart has no id".to_string()))?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET items = $items RETURN AFTER")
            .bind(("thing", thing))
            .bind(("items", cart.items))
            .await?;
        let updated: Vec<Cart> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound("Cart not found".to_string()))
    }
}

/// Cart lines are reservations-to-be, not reservations: the real check
/// happens again at order time, this one just keeps the cart honest.
fn check_stock(product: &Product, quantity: i64) -> RepoResult<()> {
    if product.stock < quantity {
        return Err(RepoError::Validation(format!(
            "Insufficient stock: {} available, {} requested",
            product.stock, quantity
        )));
    }
    Ok(())
}
