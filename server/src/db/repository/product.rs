//! Product Repository
//!
//! 库存调整只能通过 [`ProductRepository::try_decrement_stock`] 和
//! [`ProductRepository::increment_stock`]，保证 `stock` 永不为负。

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find active products within a category
    pub async fn find_by_category(&self, category_id: &str) -> RepoResult<Vec<Product>> {
        let category_owned = category_id.to_string();
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE category = $cat AND is_active = true ORDER BY name")
            .bind(("cat", category_owned))
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let thing = parse_id(id)?;
        let product: Option<Product> = self.base.db().select(thing).await?;
        Ok(product)
    }

    /// Create a new product
    pub async fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        if data.price < 0 {
            return Err(RepoError::Validation("Price cannot be negative".to_string()));
        }
        if data.stock < 0 {
            return Err(RepoError::Validation("Stock cannot be negative".to_string()));
        }

        let product = Product {
            id: None,
            name: data.name,
            category: data.category,
            price: data.price,
            stock: data.stock,
            is_active: true,
        };

        let created: Option<Product> = self.base.db().create("product").content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let thing = parse_id(id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))?;

        if let Some(price) = data.price
            && price < 0
        {
            return Err(RepoError::Validation("Price cannot be negative".to_string()));
        }
        if let Some(stock) = data.stock
            && stock < 0
        {
            return Err(RepoError::Validation("Stock cannot be negative".to_string()));
        }

        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", thing))
            .bind(("data", data))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {} not found", id)))
    }

    /// Soft delete a product
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing = parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET is_active = false")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Atomically decrement stock, guarded against going negative.
    ///
    /// Returns `true` when the decrement was applied, `false` when the
    /// product had fewer than `quantity` units (record left untouched).
    pub async fn try_decrement_stock(&self, id: &str, quantity: i64) -> RepoResult<bool> {
        if quantity <= 0 {
            return Err(RepoError::Validation(
                "Quantity must be positive".to_string(),
            ));
        }

        let thing = parse_id(id)?;
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET stock -= $qty WHERE stock >= $qty RETURN AFTER")
            .bind(("thing", thing))
            .bind(("qty", quantity))
            .await?;
        let updated: Vec<Product> = result.take(0)?;

        Ok(!updated.is_empty())
    }

    /// Restore stock (order cancellation compensation)
    pub async fn increment_stock(&self, id: &str, quantity: i64) -> RepoResult<()> {
        if quantity <= 0 {
            return Err(RepoError::Validation(
                "Quantity must be positive".to_string(),
            ));
        }

        let thing = parse_id(id)?;
        self.base
            .db()
            .query("UPDATE $thing SET stock += $qty")
            .bind(("thing", thing))
            .bind(("qty", quantity))
            .await?;
        Ok(())
    }
}
