//! 订单全流程集成测试
//!
//! 跑在 `mem://` 引擎上，每个测试一个独立的内存实例。
//! 覆盖：定价、原子创建/回滚、库存守恒、取消、状态机、分页。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use surrealdb::RecordId;

use storefront_server::db::models::{
    AddressCreate, CartItem, CreateOrderRequest, OrderStatus, PaymentStatus, ProductCreate,
    StatusUpdate,
};
use storefront_server::db::repository::{AddressRepository, ProductRepository};
use storefront_server::db::{ConnectionManager, ConnectionSettings};
use storefront_server::inventory::LedgerError;
use storefront_server::orders::{OrderEngine, OrderError, OrderFilter};

struct Harness {
    conn: Arc<ConnectionManager>,
    engine: OrderEngine,
    products: ProductRepository,
    addresses: AddressRepository,
}

async fn setup() -> Harness {
    let settings = ConnectionSettings {
        retry_base: Duration::from_millis(10),
        ..Default::default()
    };
    let conn = Arc::new(ConnectionManager::new(settings));
    conn.test_connection().await.expect("mem:// must connect");
    Harness {
        engine: OrderEngine::new(Arc::clone(&conn)),
        products: ProductRepository::new(Arc::clone(&conn)),
        addresses: AddressRepository::new(Arc::clone(&conn)),
        conn,
    }
}

impl Harness {
    async fn seed_product(&self, name: &str, price: f64, stock: i64) -> String {
        self.seed_product_with(name, price, stock, true).await
    }

    async fn seed_product_with(&self, name: &str, price: f64, stock: i64, active: bool) -> String {
        let product = self
            .products
            .create(ProductCreate {
                name: name.to_string(),
                description: None,
                price,
                stock,
                is_active: Some(active),
            })
            .await
            .expect("seed product");
        product.id.expect("product id").to_string()
    }

    async fn seed_address(&self, user_id: &str) -> String {
        let address = self
            .addresses
            .create(AddressCreate {
                user_id: user_id.to_string(),
                full_name: "Jamie Doe".to_string(),
                line1: "1 Harbour St".to_string(),
                line2: None,
                city: "Porto".to_string(),
                postal_code: "4000-001".to_string(),
                country: "PT".to_string(),
                phone: None,
            })
            .await
            .expect("seed address");
        address.id.expect("address id").to_string()
    }

    async fn stock_of(&self, product_id: &str) -> i64 {
        self.products
            .find_by_id(product_id)
            .await
            .expect("query product")
            .expect("product exists")
            .stock
    }
}

fn cart(product_id: &str, quantity: i64) -> CartItem {
    CartItem {
        product_id: product_id.to_string(),
        quantity,
        size: None,
        color: None,
    }
}

fn request(address_id: &str, items: Vec<CartItem>) -> CreateOrderRequest {
    CreateOrderRequest {
        address_id: address_id.to_string(),
        items,
        payment_method: "card".to_string(),
        notes: None,
    }
}

// =============================================================================
// Creation + pricing
// =============================================================================

#[tokio::test]
async fn create_order_prices_cart_above_free_shipping() {
    let h = setup().await;
    assert!(h.conn.is_connected());
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 4)]))
        .await
        .expect("order created");

    assert_eq!(detail.order.subtotal, 1000.0);
    assert_eq!(detail.order.shipping_cost, 0.0);
    assert_eq!(detail.order.tax_amount, 180.0);
    assert_eq!(detail.order.total_amount, 1180.0);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(detail.order.user_id, "user:alice");
    assert_eq!(detail.order.shipping_address.city, "Porto");

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].name, "Desk");
    assert_eq!(detail.items[0].quantity, 4);
    assert_eq!(detail.items[0].unit_price, 250.0);

    assert_eq!(h.stock_of(&product).await, 6);
}

#[tokio::test]
async fn create_order_charges_flat_shipping_below_threshold() {
    let h = setup().await;
    let product = h.seed_product("Lamp", 100.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 3)]))
        .await
        .expect("order created");

    assert_eq!(detail.order.subtotal, 300.0);
    assert_eq!(detail.order.shipping_cost, 50.0);
    assert_eq!(detail.order.tax_amount, 54.0);
    assert_eq!(detail.order.total_amount, 404.0);
}

#[tokio::test]
async fn order_number_format_and_uniqueness() {
    let h = setup().await;
    let product = h.seed_product("Mug", 10.0, 1000).await;
    let address = h.seed_address("user:alice").await;

    let mut numbers = HashSet::new();
    for _ in 0..10 {
        let detail = h
            .engine
            .create_order("user:alice", request(&address, vec![cart(&product, 1)]))
            .await
            .expect("order created");
        let number = detail.order.order_number;
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().unwrap() > 0);
        assert_eq!(parts[2].len(), 6);
        assert!(numbers.insert(number), "order numbers must be unique");
    }
}

// =============================================================================
// Validation + rejection paths
// =============================================================================

#[tokio::test]
async fn insufficient_stock_is_rejected_and_stock_unchanged() {
    let h = setup().await;
    let product = h.seed_product("Chair", 80.0, 2).await;
    let address = h.seed_address("user:alice").await;

    let err = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 5)]))
        .await
        .expect_err("must reject");
    assert!(matches!(err, OrderError::InsufficientStock { .. }));
    assert_eq!(h.stock_of(&product).await, 2);
}

#[tokio::test]
async fn inactive_product_is_rejected() {
    let h = setup().await;
    let product = h.seed_product_with("Retired", 10.0, 100, false).await;
    let address = h.seed_address("user:alice").await;

    let err = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 1)]))
        .await
        .expect_err("must reject");
    assert!(matches!(err, OrderError::ProductInactive(_)));
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let h = setup().await;
    let address = h.seed_address("user:alice").await;

    let err = h
        .engine
        .create_order(
            "user:alice",
            request(&address, vec![cart("product:missing", 1)]),
        )
        .await
        .expect_err("must reject");
    assert!(matches!(err, OrderError::ProductNotFound(_)));
}

#[tokio::test]
async fn address_must_belong_to_the_ordering_user() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let err = h
        .engine
        .create_order("user:bob", request(&address, vec![cart(&product, 1)]))
        .await
        .expect_err("must reject");
    assert!(matches!(err, OrderError::AddressNotFound));

    let err = h
        .engine
        .create_order(
            "user:alice",
            request("address:missing", vec![cart(&product, 1)]),
        )
        .await
        .expect_err("must reject");
    assert!(matches!(err, OrderError::AddressNotFound));

    assert_eq!(h.stock_of(&product).await, 10);
}

#[tokio::test]
async fn empty_cart_and_non_positive_quantity_are_rejected() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let err = h
        .engine
        .create_order("user:alice", request(&address, vec![]))
        .await
        .expect_err("empty cart");
    assert!(matches!(err, OrderError::Validation(_)));

    let err = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 0)]))
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, OrderError::Validation(_)));
}

// =============================================================================
// Atomicity
// =============================================================================

#[tokio::test]
async fn failed_creation_leaves_no_trace() {
    let h = setup().await;
    // Both lines pass the read-only validation (6 <= 10), but the second
    // conditional decrement inside the transaction finds only 4 left.
    let product = h.seed_product("Desk", 100.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let err = h
        .engine
        .create_order(
            "user:alice",
            request(&address, vec![cart(&product, 6), cart(&product, 6)]),
        )
        .await
        .expect_err("reservation must fail");
    assert!(matches!(err, OrderError::InsufficientStock { .. }));

    // Rollback: no partial decrement, no order, no items
    assert_eq!(h.stock_of(&product).await, 10);
    let (orders, total) = h
        .engine
        .list_orders("user:alice", 1, 10)
        .await
        .expect("list");
    assert!(orders.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn concurrent_reservations_never_drive_stock_negative() {
    let h = setup().await;
    let product = h.seed_product("Limited", 20.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = h.engine.clone();
        let req = request(&address, vec![cart(&product, 1)]);
        handles.push(tokio::spawn(
            async move { engine.create_order("user:alice", req).await },
        ));
    }

    let mut successes = 0i64;
    let mut numbers = HashSet::new();
    for handle in handles {
        if let Ok(detail) = handle.await.expect("task") {
            successes += 1;
            assert!(
                numbers.insert(detail.order.order_number),
                "order numbers must be unique under concurrency"
            );
        }
    }

    // Conflicting transactions may abort, but every success took exactly one
    // unit and every failure took none.
    let stock = h.stock_of(&product).await;
    assert!(stock >= 0, "stock must never go negative, got {stock}");
    assert_eq!(stock, 10 - successes);
    assert!(successes <= 10);

    let (_, total) = h
        .engine
        .list_orders("user:alice", 1, 50)
        .await
        .expect("list");
    assert_eq!(total, successes);
}

#[tokio::test]
async fn ledger_reserve_is_conditional_and_release_restores() {
    let h = setup().await;
    let product = h.seed_product("Bolt", 1.0, 5).await;
    let record: RecordId = product.parse().expect("record id");
    let ledger = h.engine.ledger();

    ledger
        .reserve(&[(record.clone(), 3)])
        .await
        .expect("reserve");
    assert_eq!(h.stock_of(&product).await, 2);

    // Not enough left: the whole reservation is refused, as a stock error
    let err = ledger
        .reserve(&[(record.clone(), 3)])
        .await
        .expect_err("short on stock");
    assert!(matches!(err, LedgerError::InsufficientStock { .. }));
    assert_eq!(h.stock_of(&product).await, 2);

    ledger
        .release(&[(record.clone(), 3)])
        .await
        .expect("release");
    assert_eq!(h.stock_of(&product).await, 5);
}

#[tokio::test]
async fn ledger_reports_unavailable_products_distinctly_from_shortage() {
    let h = setup().await;
    let ledger = h.engine.ledger();

    // Deactivated product: unavailable, not a stock shortage
    let inactive = h.seed_product_with("Retired", 1.0, 5, false).await;
    let record: RecordId = inactive.parse().expect("record id");
    let err = ledger
        .reserve(&[(record, 1)])
        .await
        .expect_err("inactive product");
    match err {
        LedgerError::ProductUnavailable { product_id } => assert_eq!(product_id, inactive),
        other => panic!("expected ProductUnavailable, got {other:?}"),
    }
    assert_eq!(h.stock_of(&inactive).await, 5);

    // Missing product: same classification
    let missing: RecordId = "product:missing".parse().expect("record id");
    let err = ledger
        .reserve(&[(missing, 1)])
        .await
        .expect_err("missing product");
    assert!(matches!(err, LedgerError::ProductUnavailable { .. }));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancellation_restores_stock_and_is_not_repeatable() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 3)]))
        .await
        .expect("order created");
    assert_eq!(h.stock_of(&product).await, 7);

    let order_id = detail.order.id.expect("order id").to_string();
    h.engine
        .cancel_order(&order_id, "user:alice")
        .await
        .expect("cancel");

    assert_eq!(h.stock_of(&product).await, 10);
    let after = h
        .engine
        .get_order(&order_id, "user:alice")
        .await
        .expect("fetch");
    assert_eq!(after.order.status, OrderStatus::Cancelled);

    // A second cancel must not release stock again
    let err = h
        .engine
        .cancel_order(&order_id, "user:alice")
        .await
        .expect_err("already cancelled");
    assert!(matches!(err, OrderError::NotCancellable));
    assert_eq!(h.stock_of(&product).await, 10);
}

#[tokio::test]
async fn only_the_owner_may_cancel() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 2)]))
        .await
        .expect("order created");
    let order_id = detail.order.id.expect("order id").to_string();

    let err = h
        .engine
        .cancel_order(&order_id, "user:bob")
        .await
        .expect_err("wrong user");
    assert!(matches!(err, OrderError::NotCancellable));

    let after = h
        .engine
        .get_order(&order_id, "user:alice")
        .await
        .expect("fetch");
    assert_eq!(after.order.status, OrderStatus::Pending);
    assert_eq!(h.stock_of(&product).await, 8);
}

#[tokio::test]
async fn user_cannot_cancel_once_confirmed() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 1)]))
        .await
        .expect("order created");
    let order_id = detail.order.id.expect("order id").to_string();

    h.engine
        .update_order_status(
            &order_id,
            StatusUpdate {
                status: Some(OrderStatus::Confirmed),
                payment_status: None,
            },
        )
        .await
        .expect("confirm");

    let err = h
        .engine
        .cancel_order(&order_id, "user:alice")
        .await
        .expect_err("no longer pending");
    assert!(matches!(err, OrderError::NotCancellable));
    assert_eq!(h.stock_of(&product).await, 9);
}

// =============================================================================
// Reads + pagination
// =============================================================================

#[tokio::test]
async fn get_order_hides_other_users_orders() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 1)]))
        .await
        .expect("order created");
    let order_id = detail.order.id.expect("order id").to_string();

    let err = h
        .engine
        .get_order(&order_id, "user:bob")
        .await
        .expect_err("not visible");
    assert!(matches!(err, OrderError::NotFound(_)));
}

#[tokio::test]
async fn listing_paginates_and_counts() {
    let h = setup().await;
    let product = h.seed_product("Mug", 10.0, 1000).await;
    let address = h.seed_address("user:alice").await;

    let mut created = HashSet::new();
    for _ in 0..5 {
        let detail = h
            .engine
            .create_order("user:alice", request(&address, vec![cart(&product, 1)]))
            .await
            .expect("order created");
        created.insert(detail.order.order_number);
    }

    let mut seen = HashSet::new();
    let (page1, total) = h.engine.list_orders("user:alice", 1, 2).await.expect("p1");
    assert_eq!(total, 5);
    assert_eq!(page1.len(), 2);
    seen.extend(page1.into_iter().map(|o| o.order_number));

    let (page2, _) = h.engine.list_orders("user:alice", 2, 2).await.expect("p2");
    assert_eq!(page2.len(), 2);
    seen.extend(page2.into_iter().map(|o| o.order_number));

    let (page3, _) = h.engine.list_orders("user:alice", 3, 2).await.expect("p3");
    assert_eq!(page3.len(), 1);
    seen.extend(page3.into_iter().map(|o| o.order_number));

    // Pages are disjoint and jointly exhaustive
    assert_eq!(seen, created);

    let (other, total) = h.engine.list_orders("user:bob", 1, 10).await.expect("bob");
    assert!(other.is_empty());
    assert_eq!(total, 0);
}

// =============================================================================
// Admin status machine
// =============================================================================

#[tokio::test]
async fn admin_progresses_status_and_payment_independently() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 1)]))
        .await
        .expect("order created");
    let order_id = detail.order.id.expect("order id").to_string();

    let order = h
        .engine
        .update_order_status(
            &order_id,
            StatusUpdate {
                status: Some(OrderStatus::Confirmed),
                payment_status: Some(PaymentStatus::Paid),
            },
        )
        .await
        .expect("confirm + pay");
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);

    // Payment axis alone, order status untouched
    let order = h
        .engine
        .update_order_status(
            &order_id,
            StatusUpdate {
                status: None,
                payment_status: Some(PaymentStatus::Refunded),
            },
        )
        .await
        .expect("refund");
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment_status, PaymentStatus::Refunded);

    let order = h
        .engine
        .update_order_status(
            &order_id,
            StatusUpdate {
                status: Some(OrderStatus::Shipped),
                payment_status: None,
            },
        )
        .await
        .expect("ship");
    assert_eq!(order.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn admin_cancel_releases_stock_and_cancelled_is_terminal() {
    let h = setup().await;
    let product = h.seed_product("Desk", 250.0, 10).await;
    let address = h.seed_address("user:alice").await;

    let detail = h
        .engine
        .create_order("user:alice", request(&address, vec![cart(&product, 4)]))
        .await
        .expect("order created");
    let order_id = detail.order.id.expect("order id").to_string();
    assert_eq!(h.stock_of(&product).await, 6);

    let order = h
        .engine
        .update_order_status(
            &order_id,
            StatusUpdate {
                status: Some(OrderStatus::Cancelled),
                payment_status: None,
            },
        )
        .await
        .expect("admin cancel");
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(h.stock_of(&product).await, 10);

    // No way out of CANCELLED
    for to in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let err = h
            .engine
            .update_order_status(
                &order_id,
                StatusUpdate {
                    status: Some(to),
                    payment_status: None,
                },
            )
            .await
            .expect_err("terminal state");
        assert!(matches!(err, OrderError::InvalidTransition { .. }));
    }
    assert_eq!(h.stock_of(&product).await, 10);
}

#[tokio::test]
async fn status_update_on_missing_order_is_not_found() {
    let h = setup().await;
    let err = h
        .engine
        .update_order_status(
            "orders:missing",
            StatusUpdate {
                status: Some(OrderStatus::Confirmed),
                payment_status: None,
            },
        )
        .await
        .expect_err("missing order");
    assert!(matches!(err, OrderError::NotFound(_)));
}

#[tokio::test]
async fn admin_list_filters_by_status() {
    let h = setup().await;
    let product = h.seed_product("Mug", 10.0, 1000).await;
    let alice = h.seed_address("user:alice").await;
    let bob = h.seed_address("user:bob").await;

    let first = h
        .engine
        .create_order("user:alice", request(&alice, vec![cart(&product, 1)]))
        .await
        .expect("order created");
    h.engine
        .create_order("user:bob", request(&bob, vec![cart(&product, 1)]))
        .await
        .expect("order created");

    let order_id = first.order.id.expect("order id").to_string();
    h.engine
        .cancel_order(&order_id, "user:alice")
        .await
        .expect("cancel");

    let (all, total) = h
        .engine
        .list_all_orders(OrderFilter::default(), 1, 10)
        .await
        .expect("all");
    assert_eq!(total, 2);
    assert_eq!(all.len(), 2);

    let (cancelled, total) = h
        .engine
        .list_all_orders(
            OrderFilter {
                status: Some(OrderStatus::Cancelled),
            },
            1,
            10,
        )
        .await
        .expect("cancelled");
    assert_eq!(total, 1);
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].order_number, first.order.order_number);
}
