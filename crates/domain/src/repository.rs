use async_trait::async_trait;
use common::{MemberId, OrderId, ProductId};

use crate::{Member, Order, OrderStatus, Product, Result, StockApply};

/// Page request for list endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Row offset of the first element on this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 20 }
    }
}

/// Search filters for the product list.
#[derive(Debug, Clone, Default)]
pub struct ProductSearch {
    /// Substring match on the product name.
    pub name: Option<String>,
    /// Exact match on the category.
    pub category: Option<String>,
}

impl ProductSearch {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ref name) = self.name
            && !product.name.contains(name.as_str())
        {
            return false;
        }
        if let Some(ref category) = self.category
            && &product.category != category
        {
            return false;
        }
        true
    }
}

/// Store of registered members.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Inserts a new member. Fails with `DuplicateEmail` when the email
    /// is already registered to a non-deleted member.
    async fn insert(&self, member: Member) -> Result<()>;

    /// Looks up an active member by id. Soft-deleted members are absent.
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>>;

    /// Looks up an active member by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>>;

    /// Lists all active members.
    async fn list(&self) -> Result<Vec<Member>>;

    /// Marks a member deleted. Fails with `MemberNotFound` when absent.
    async fn soft_delete(&self, id: MemberId) -> Result<()>;
}

/// Store of catalog products (the authoritative stock records).
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert(&self, product: Product) -> Result<()>;

    /// Replaces the mutable fields of an existing product.
    async fn update(&self, product: Product) -> Result<()>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;

    /// Pages through products matching the search filters.
    async fn search(&self, search: ProductSearch, page: PageRequest) -> Result<Vec<Product>>;

    /// Applies a stock delta to the authoritative record, in one
    /// transaction, conditionally on `sequence` exceeding the product's
    /// stored high-water mark.
    ///
    /// Returns [`StockApply::Skipped`] for redelivered (stale) sequences
    /// and fails with `ProductNotFound` when the record is absent; the
    /// caller treats that as a poison message.
    async fn apply_stock_delta(
        &self,
        product_id: ProductId,
        delta: i64,
        sequence: i64,
    ) -> Result<StockApply>;
}

/// Store of order aggregates.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists the order and all its lines in one transaction.
    async fn insert(&self, order: &Order) -> Result<()>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// All committed orders, oldest first.
    async fn list(&self) -> Result<Vec<Order>>;

    /// Committed orders owned by one member, oldest first.
    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Order>>;

    /// Persists a status flip decided by the aggregate.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<()>;
}
