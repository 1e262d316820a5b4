use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{MemberId, OrderId, ProductId, Role};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DomainError, Member, MemberRepository, Order, OrderLine, OrderRepository, OrderStatus,
    PageRequest, Product, ProductRepository, ProductSearch, Result, StockApply,
};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

fn row_to_member(row: PgRow) -> Result<Member> {
    let role: String = row.try_get("role")?;
    let role = Role::parse(&role).ok_or(DomainError::InvalidColumn {
        column: "members.role",
        value: role,
    })?;

    Ok(Member {
        id: MemberId::from_uuid(row.try_get::<Uuid, _>("id")?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        role,
        deleted: row.try_get("deleted")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

/// PostgreSQL-backed member store.
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn insert(&self, member: Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (id, email, name, role, deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(member.id.as_uuid())
        .bind(&member.email)
        .bind(&member.name)
        .bind(member.role.as_str())
        .bind(member.deleted)
        .bind(member.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("members_active_email_key")
            {
                return DomainError::DuplicateEmail(member.email.clone());
            }
            DomainError::Database(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, deleted, created_at
            FROM members
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_member).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, deleted, created_at
            FROM members
            WHERE email = $1 AND NOT deleted
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_member).transpose()
    }

    async fn list(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, name, role, deleted, created_at
            FROM members
            WHERE NOT deleted
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_member).collect()
    }

    async fn soft_delete(&self, id: MemberId) -> Result<()> {
        let result = sqlx::query("UPDATE members SET deleted = TRUE WHERE id = $1 AND NOT deleted")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MemberNotFound(id));
        }
        Ok(())
    }
}

fn row_to_product(row: PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        price_cents: row.try_get("price_cents")?,
        stock_quantity: row.try_get("stock_quantity")?,
        applied_sequence: row.try_get("applied_sequence")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

/// PostgreSQL-backed product store.
///
/// `apply_stock_delta` is a single conditional `UPDATE`, so the sequence
/// check and the quantity change commit or skip together.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn insert(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, category, price_cents, stock_quantity, applied_sequence, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .bind(product.applied_sequence)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, product: Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, category = $3, price_cents = $4, stock_quantity = $5
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock_quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ProductNotFound(product.id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, category, price_cents, stock_quantity, applied_sequence, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_product).transpose()
    }

    async fn search(&self, search: ProductSearch, page: PageRequest) -> Result<Vec<Product>> {
        let mut sql = String::from(
            "SELECT id, name, category, price_cents, stock_quantity, applied_sequence, created_at FROM products WHERE 1=1",
        );
        let mut param_count = 0;

        if search.name.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND name LIKE '%' || ${param_count} || '%'"));
        }
        if search.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category = ${param_count}"));
        }

        sql.push_str(" ORDER BY created_at ASC");
        sql.push_str(&format!(
            " LIMIT ${} OFFSET ${}",
            param_count + 1,
            param_count + 2
        ));

        let mut query = sqlx::query(&sql);
        if let Some(name) = search.name {
            query = query.bind(name);
        }
        if let Some(category) = search.category {
            query = query.bind(category);
        }
        query = query.bind(i64::from(page.size)).bind(page.offset());

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_product).collect()
    }

    async fn apply_stock_delta(
        &self,
        product_id: ProductId,
        delta: i64,
        sequence: i64,
    ) -> Result<StockApply> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $2, applied_sequence = $3
            WHERE id = $1 AND applied_sequence < $3
            RETURNING stock_quantity
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(delta)
        .bind(sequence)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(StockApply::Applied {
                new_quantity: row.try_get("stock_quantity")?,
            });
        }

        // Either the record is missing (poison) or the sequence is stale.
        let applied: Option<i64> =
            sqlx::query_scalar("SELECT applied_sequence FROM products WHERE id = $1")
                .bind(product_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match applied {
            Some(applied_sequence) => Ok(StockApply::Skipped { applied_sequence }),
            None => Err(DomainError::ProductNotFound(product_id)),
        }
    }
}

/// PostgreSQL-backed order store.
///
/// An order and its lines are written in one transaction; readers never
/// observe a partially inserted aggregate.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM order_lines
            WHERE order_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderLine {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    quantity: row.try_get("quantity")?,
                })
            })
            .collect()
    }

    fn row_to_order(row: PgRow, lines: Vec<OrderLine>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status).ok_or(DomainError::InvalidColumn {
            column: "orders.status",
            value: status,
        })?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            member_id: MemberId::from_uuid(row.try_get::<Uuid, _>("member_id")?),
            status,
            lines,
            placed_at: row.try_get::<DateTime<Utc>, _>("placed_at")?,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, member_id, status, placed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.member_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.placed_at)
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, line_no, product_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(line_no as i32)
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, member_id, status, placed_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.load_lines(id).await?;
                Ok(Some(Self::row_to_order(row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, member_id, status, placed_at
            FROM orders
            ORDER BY placed_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let lines = self.load_lines(id).await?;
            orders.push(Self::row_to_order(row, lines)?);
        }
        Ok(orders)
    }

    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, member_id, status, placed_at
            FROM orders
            WHERE member_id = $1
            ORDER BY placed_at ASC
            "#,
        )
        .bind(member_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let lines = self.load_lines(id).await?;
            orders.push(Self::row_to_order(row, lines)?);
        }
        Ok(orders)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::OrderNotFound(id));
        }
        Ok(())
    }
}
