use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{MemberId, OrderId, ProductId};
use tokio::sync::RwLock;

use crate::{
    DomainError, Member, MemberRepository, Order, OrderRepository, OrderStatus, PageRequest,
    Product, ProductRepository, ProductSearch, Result, StockApply,
};

/// In-memory member store for tests and single-node runs.
#[derive(Clone, Default)]
pub struct InMemoryMemberRepository {
    members: Arc<RwLock<Vec<Member>>>,
}

impl InMemoryMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn insert(&self, member: Member) -> Result<()> {
        let mut members = self.members.write().await;
        if members
            .iter()
            .any(|m| m.email == member.email && !m.deleted)
        {
            return Err(DomainError::DuplicateEmail(member.email));
        }
        members.push(member);
        Ok(())
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|m| m.id == id && !m.deleted).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members
            .iter()
            .find(|m| m.email == email && !m.deleted)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().filter(|m| !m.deleted).cloned().collect())
    }

    async fn soft_delete(&self, id: MemberId) -> Result<()> {
        let mut members = self.members.write().await;
        let member = members
            .iter_mut()
            .find(|m| m.id == id && !m.deleted)
            .ok_or(DomainError::MemberNotFound(id))?;
        member.deleted = true;
        Ok(())
    }
}

/// In-memory product store for tests and single-node runs.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: Product) -> Result<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn update(&self, product: Product) -> Result<()> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(DomainError::ProductNotFound(product.id));
        }
        products.insert(product.id, product);
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn search(&self, search: ProductSearch, page: PageRequest) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| search.matches(p))
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.created_at);
        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .collect())
    }

    async fn apply_stock_delta(
        &self,
        product_id: ProductId,
        delta: i64,
        sequence: i64,
    ) -> Result<StockApply> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&product_id)
            .ok_or(DomainError::ProductNotFound(product_id))?;

        if sequence <= product.applied_sequence {
            return Ok(StockApply::Skipped {
                applied_sequence: product.applied_sequence,
            });
        }

        product.stock_quantity += delta;
        product.applied_sequence = sequence;
        Ok(StockApply::Applied {
            new_quantity: product.stock_quantity,
        })
    }
}

/// In-memory order store for tests and single-node runs.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>> {
        Ok(self.orders.read().await.clone())
    }

    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| o.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::OrderNotFound(id))?;
        order.status = status;
        Ok(())
    }
}
