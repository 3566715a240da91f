//! 订单生命周期集成测试 (内存数据库)

use quickmart_server::core::{Config, ServerState};
use quickmart_server::db::models::ProductCreate;
use quickmart_server::db::repository::ProductRepository;
use quickmart_server::orders::{LifecycleError, OrderLifecycle};
use shared::client::{CreateOrderRequest, OrderItemRequest};
use shared::models::OrderStatus;

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

fn order_of(items: Vec<(String, i64)>) -> CreateOrderRequest {
    CreateOrderRequest {
        items: items
            .into_iter()
            .map(|(product, quantity)| OrderItemRequest { product, quantity })
            .collect(),
        delivery_address: "1 Main Street".to_string(),
    }
}

async fn stock_of(state: &ServerState, id: &str) -> i64 {
    ProductRepository::new(state.get_db())
        .find_by_id(id)
        .await
        .expect("lookup failed")
        .expect("product missing")
        .stock
}

#[tokio::test]
async fn create_order_snapshots_price_and_decrements_stock() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle
        .create_order("user:alice", order_of(vec![(apples.clone(), 3)]))
        .await
        .expect("order should succeed");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, 750);
    assert_eq!(order.items[0].product_name, "Apples");
    assert_eq!(stock_of(&state, &apples).await, 7);

    // Later price changes must not affect the stored order
    let repo = ProductRepository::new(state.get_db());
    repo.update(
        &apples,
        quickmart_server::db::models::ProductUpdate {
            name: None,
            category: None,
            price: Some(999),
            stock: None,
            is_active: None,
        },
    )
    .await
    .expect("price update failed");

    let stored = quickmart_server::db::repository::OrderRepository::new(state.get_db())
        .find_by_id(&order.id)
        .await
        .expect("lookup failed")
        .expect("order missing");
    assert_eq!(stored.items[0].unit_price, 250);
}

#[tokio::test]
async fn empty_order_is_rejected() {
    let state = test_state().await;
    let lifecycle = OrderLifecycle::new(state.get_db());

    let result = lifecycle.create_order("user:alice", order_of(vec![])).await;
    assert!(matches!(result, Err(LifecycleError::EmptyOrder)));
}

#[tokio::test]
async fn insufficient_stock_rejects_whole_order() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;
    let milk = seed_product(&state, "Milk", 150, 2).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let result = lifecycle
        .create_order(
            "user:alice",
            order_of(vec![(apples.clone(), 5), (milk.clone(), 3)]),
        )
        .await;

    match result {
        Err(LifecycleError::InsufficientStock(issues)) => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].product, milk);
            assert_eq!(issues[0].requested, 3);
            assert_eq!(issues[0].available, 2);
        }
        other => panic!("expected InsufficientStock, got {:?}", other.map(|o| o.id)),
    }

    // Nothing was taken
    assert_eq!(stock_of(&state, &apples).await, 10);
    assert_eq!(stock_of(&state, &milk).await, 2);
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 5).await;

    // Ten shoppers race for five units; the guarded decrement is what
    // keeps the losers out, not the pre-check
    let mut handles = Vec::new();
    for n in 0..10 {
        let db = state.get_db();
        let apples = apples.clone();
        handles.push(tokio::spawn(async move {
            OrderLifecycle::new(db)
                .create_order(&format!("user:shopper{}", n), order_of(vec![(apples, 1)]))
                .await
        }));
    }

    let mut succeeded: i64 = 0;
    for handle in handles {
        match handle.await.expect("order task panicked") {
            Ok(_) => succeeded += 1,
            Err(LifecycleError::InsufficientStock(_)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    let remaining = stock_of(&state, &apples).await;
    assert!(remaining >= 0, "stock went negative: {}", remaining);
    assert!(succeeded <= 5, "oversold: {} orders succeeded", succeeded);
    assert_eq!(remaining, 5 - succeeded);
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let state = test_state().await;
    let lifecycle = OrderLifecycle::new(state.get_db());

    let result = lifecycle
        .create_order("user:alice", order_of(vec![("product:nope".into(), 1)]))
        .await;
    assert!(matches!(result, Err(LifecycleError::ProductNotFound(_))));
}

#[tokio::test]
async fn customer_cancel_restores_stock_exactly_once() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle
        .create_order("user:alice", order_of(vec![(apples.clone(), 4)]))
        .await
        .expect("order should succeed");
    assert_eq!(stock_of(&state, &apples).await, 6);

    let cancelled = lifecycle
        .cancel_by_customer("user:alice", &order.id)
        .await
        .expect("cancel should succeed");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, &apples).await, 10);

    // Terminal orders are locked; no double restore path exists
    let again = lifecycle
        .set_status_admin(&order.id, OrderStatus::Cancelled)
        .await;
    assert!(matches!(again, Err(LifecycleError::TerminalState(_))));
    assert_eq!(stock_of(&state, &apples).await, 10);
}

#[tokio::test]
async fn cancel_requires_ownership() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle
        .create_order("user:alice", order_of(vec![(apples, 1)]))
        .await
        .expect("order should succeed");

    let result = lifecycle.cancel_by_customer("user:mallory", &order.id).await;
    assert!(matches!(result, Err(LifecycleError::NotOwner)));
}

#[tokio::test]
async fn customer_cannot_cancel_once_preparing() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle
        .create_order("user:alice", order_of(vec![(apples.clone(), 2)]))
        .await
        .expect("order should succeed");

    lifecycle
        .set_status_admin(&order.id, OrderStatus::Preparing)
        .await
        .expect("transition should succeed");

    let result = lifecycle.cancel_by_customer("user:alice", &order.id).await;
    assert!(matches!(
        result,
        Err(LifecycleError::CannotCancel(OrderStatus::Preparing))
    ));
    assert_eq!(stock_of(&state, &apples).await, 8);
}

#[tokio::test]
async fn admin_cancel_restores_stock() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle
        .create_order("user:alice", order_of(vec![(apples.clone(), 5)]))
        .await
        .expect("order should succeed");

    lifecycle
        .set_status_admin(&order.id, OrderStatus::Confirmed)
        .await
        .expect("transition should succeed");
    lifecycle
        .set_status_admin(&order.id, OrderStatus::Cancelled)
        .await
        .expect("cancel should succeed");

    assert_eq!(stock_of(&state, &apples).await, 10);
}

#[tokio::test]
async fn delivered_orders_are_locked() {
    let state = test_state().await;
    let apples = seed_product(&state, "Apples", 250, 10).await;

    let lifecycle = OrderLifecycle::new(state.get_db());
    let order = lifecycle
        .create_order("user:alice", order_of(vec![(apples.clone(), 1)]))
        .await
        .expect("order should succeed");

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        lifecycle
            .set_status_admin(&order.id, status)
            .await
            .expect("transition should succeed");
    }

    let result = lifecycle
        .set_status_admin(&order.id, OrderStatus::Pending)
        .await;
    assert!(matches!(result, Err(LifecycleError::TerminalState(_))));

    // Delivered orders never give stock back
    assert_eq!(stock_of(&state, &apples).await, 9);
}
