//! 购物车集成测试 (内存数据库)

use quickmart_server::core::{Config, ServerState};
use quickmart_server::db::models::{ProductCreate, ProductUpdate};
use quickmart_server::db::repository::{CartRepository, ProductRepository, RepoError};

async fn test_state() -> ServerState {
    ServerState::initialize_in_memory(&Config::default())
        .await
        .expect("failed to initialize in-memory state")
}

async fn seed_product(state: &ServerState, name: &str, price: i64, stock: i64) -> String {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .create(ProductCreate {
            name: name.to_string(),
            category: None,
            price,
            stock,
        })
        .await
        .expect("failed to seed product");
    product.id.expect("product has no id").to_string()
}

#[tokio::test]
async fn adding_same_product_accumulates_quantity() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let carts = CartRepository::new(state.get_db());
    carts
        .add_item("user:alice", &apples, 2)
        .await
        .expect("first add failed");
    let cart = carts
        .add_item("user:alice", &apples, 3)
        .await
        .expect("second add failed");

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
}

#[tokio::test]
async fn add_is_capped_by_stock() {
    let state = test_state().await;
    let milk = seed_product(&state, "Milk", 150, 4).await;

    let carts = CartRepository::new(state.get_db());
    carts
        .add_item("user:alice", &milk, 3)
        .await
        .expect("add within stock failed");

    // 3 in the cart + 2 more would exceed the 4 in stock
    let result = carts.add_item("user:alice", &milk, 2).await;
    assert!(matches!(result, Err(RepoError::Validation(_))));

    let cart = carts
        .get_or_create("user:alice")
        .await
        .expect("cart lookup failed");
    assert_eq!(cart.items[0].quantity, 3);
}

#[tokio::test]
async fn inactive_product_cannot_be_added() {
    let state = test_state().await;
    let milk = seed_product(&state, "Milk", 150, 4).await;

    let products = ProductRepository::new(state.get_db());
    products.delete(&milk).await.expect("soft delete failed");

    let result = CartRepository::new(state.get_db())
        .add_item("user:alice", &milk, 1)
        .await;
    assert!(matches!(result, Err(RepoError::Validation(_))));
}

#[tokio::test]
async fn unknown_product_cannot_be_added() {
    let state = test_state().await;
    let result = CartRepository::new(state.get_db())
        .add_item("user:alice", "product:nope", 1)
        .await;
    assert!(matches!(result, Err(RepoError::NotFound(_))));
}

#[tokio::test]
async fn updating_to_zero_removes_the_line() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let carts = CartRepository::new(state.get_db());
    carts
        .add_item("user:alice", &apples, 2)
        .await
        .expect("add failed");

    let cart = carts
        .update_item("user:alice", &apples, 0)
        .await
        .expect("update failed");
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn update_checks_stock_against_new_quantity() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let carts = CartRepository::new(state.get_db());
    carts
        .add_item("user:alice", &apples, 2)
        .await
        .expect("add failed");

    // Stock drops to 3 behind the cart's back
    ProductRepository::new(state.get_db())
        .update(
            &apples,
            ProductUpdate {
                name: None,
                category: None,
                price: None,
                stock: Some(3),
                is_active: None,
            },
        )
        .await
        .expect("stock update failed");

    let result = carts.update_item("user:alice", &apples, 5).await;
    assert!(matches!(result, Err(RepoError::Validation(_))));
}

#[tokio::test]
async fn updating_a_missing_line_is_not_found() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let result = CartRepository::new(state.get_db())
        .update_item("user:alice", &apples, 2)
        .await;
    assert!(matches!(result, Err(RepoError::NotFound(_))));
}

#[tokio::test]
async fn remove_and_clear_empty_the_cart() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;
    let milk = seed_product(&state, "Milk", 150, 4).await;

    let carts = CartRepository::new(state.get_db());
    carts
        .add_item("user:alice", &apples, 1)
        .await
        .expect("add failed");
    carts
        .add_item("user:alice", &milk, 1)
        .await
        .expect("add failed");

    let cart = carts
        .remove_item("user:alice", &apples)
        .await
        .expect("remove failed");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product, milk);

    // Removing an absent line changes nothing
    let cart = carts
        .remove_item("user:alice", &apples)
        .await
        .expect("remove failed");
    assert_eq!(cart.items.len(), 1);

    let cart = carts.clear("user:alice").await.expect("clear failed");
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn carts_are_per_customer() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let carts = CartRepository::new(state.get_db());
    carts
        .add_item("user:alice", &apples, 2)
        .await
        .expect("add failed");

    let bobs = carts
        .get_or_create("user:bob")
        .await
        .expect("cart lookup failed");
    assert!(bobs.items.is_empty());
}
