//! PostgreSQL integration tests for the repositories.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p domain --test postgres_integration
//! ```

use std::sync::Arc;

use common::{MemberId, ProductId};
use domain::{
    DomainError, Member, MemberRepository, NewProduct, Order, OrderLine, OrderRepository,
    OrderStatus, PageRequest, PostgresMemberRepository, PostgresOrderRepository,
    PostgresProductRepository, Product, ProductRepository, ProductSearch, StockApply,
    run_migrations,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            run_migrations(&temp_pool).await.unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh pool with cleared tables for test isolation.
async fn get_test_pool() -> PgPool {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_lines, orders, products, members")
        .execute(&pool)
        .await
        .unwrap();

    pool
}

fn sample_product(stock: i64) -> Product {
    Product::register(NewProduct {
        name: "Widget".to_string(),
        category: "tools".to_string(),
        price_cents: 1500,
        stock_quantity: stock,
    })
}

#[tokio::test]
#[serial]
async fn member_insert_and_lookup() {
    let pool = get_test_pool().await;
    let repo = PostgresMemberRepository::new(pool);

    let member = Member::new("a@example.com", "A");
    let id = member.id;
    repo.insert(member).await.unwrap();

    let by_id = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "a@example.com");

    let by_email = repo.find_by_email("a@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, id);

    assert!(repo.find_by_id(MemberId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn duplicate_email_maps_to_domain_error() {
    let pool = get_test_pool().await;
    let repo = PostgresMemberRepository::new(pool);

    repo.insert(Member::new("a@example.com", "A")).await.unwrap();
    let result = repo.insert(Member::new("a@example.com", "B")).await;
    assert!(matches!(result, Err(DomainError::DuplicateEmail(_))));
}

#[tokio::test]
#[serial]
async fn soft_delete_frees_the_email() {
    let pool = get_test_pool().await;
    let repo = PostgresMemberRepository::new(pool);

    let member = Member::new("a@example.com", "A");
    let id = member.id;
    repo.insert(member).await.unwrap();
    repo.soft_delete(id).await.unwrap();

    assert!(repo.find_by_id(id).await.unwrap().is_none());
    // The partial unique index only covers active rows.
    repo.insert(Member::new("a@example.com", "A2")).await.unwrap();
}

#[tokio::test]
#[serial]
async fn product_search_filters_and_pages() {
    let pool = get_test_pool().await;
    let repo = PostgresProductRepository::new(pool);

    let mut widget = sample_product(5);
    widget.name = "Blue Widget".to_string();
    let mut gadget = sample_product(5);
    gadget.name = "Gadget".to_string();
    gadget.category = "toys".to_string();
    repo.insert(widget).await.unwrap();
    repo.insert(gadget).await.unwrap();

    let by_name = repo
        .search(
            ProductSearch {
                name: Some("Widget".to_string()),
                category: None,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "Blue Widget");

    let paged = repo
        .search(ProductSearch::default(), PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
}

#[tokio::test]
#[serial]
async fn apply_stock_delta_is_conditional_on_sequence() {
    let pool = get_test_pool().await;
    let repo = PostgresProductRepository::new(pool);

    let product = sample_product(10);
    let id = product.id;
    repo.insert(product).await.unwrap();

    let applied = repo.apply_stock_delta(id, -4, 1).await.unwrap();
    assert_eq!(applied, StockApply::Applied { new_quantity: 6 });

    // Redelivery: same sequence must not double-apply.
    let skipped = repo.apply_stock_delta(id, -4, 1).await.unwrap();
    assert_eq!(skipped, StockApply::Skipped { applied_sequence: 1 });
    assert_eq!(
        repo.find_by_id(id).await.unwrap().unwrap().stock_quantity,
        6
    );

    let result = repo.apply_stock_delta(ProductId::new(), -1, 1).await;
    assert!(matches!(result, Err(DomainError::ProductNotFound(_))));
}

#[tokio::test]
#[serial]
async fn order_inserts_atomically_with_lines() {
    let pool = get_test_pool().await;
    let members = PostgresMemberRepository::new(pool.clone());
    let products = PostgresProductRepository::new(pool.clone());
    let orders = PostgresOrderRepository::new(pool);

    let member = Member::new("a@example.com", "A");
    let member_id = member.id;
    members.insert(member).await.unwrap();

    let p1 = sample_product(10);
    let p2 = sample_product(10);
    let (id1, id2) = (p1.id, p2.id);
    products.insert(p1).await.unwrap();
    products.insert(p2).await.unwrap();

    let order = Order::place(
        member_id,
        vec![
            OrderLine::new(id1, 2).unwrap(),
            OrderLine::new(id2, 1).unwrap(),
        ],
    )
    .unwrap();
    orders.insert(&order).await.unwrap();

    let stored = orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Placed);
    assert_eq!(stored.lines.len(), 2);
    assert_eq!(stored.lines[0].product_id, id1);
    assert_eq!(stored.lines[1].quantity, 1);

    let mine = orders.list_by_member(member_id).await.unwrap();
    assert_eq!(mine.len(), 1);

    orders
        .update_status(order.id, OrderStatus::Canceled)
        .await
        .unwrap();
    let stored = orders.find_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Canceled);
}
