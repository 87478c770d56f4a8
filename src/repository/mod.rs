//! Storage interface used by the services.
//!
//! Handlers never talk to the database directly; they receive an
//! `Arc<dyn Store>` through [`crate::state::AppState`]. [`SeaOrmStore`] backs
//! the running server and [`MemoryStore`] backs tests.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::{
        cart::{CartChange, CartMutation},
        pricing::PricingContext,
        promo::AppliedPromo,
    },
    error::AppResult,
    models::{
        AuditEntry, CartLine, NewProduct, NewUser, Order, OrderWithItems, Product,
        ShippingDetails, User,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

impl PageWindow {
    pub fn first(limit: u64) -> Self {
        Self { limit, offset: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| product.category == category);
        let search_ok = self
            .search
            .as_deref()
            .is_none_or(|search| text_matches(product, search));
        let min_ok = self.min_price.is_none_or(|min| product.price >= min);
        let max_ok = self.max_price.is_none_or(|max| product.price <= max);
        category_ok && search_ok && min_ok && max_ok
    }
}

/// Case-insensitive substring match on name or description.
pub fn text_matches(product: &Product, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product.description.to_lowercase().contains(&needle)
}

/// Result of an atomic cart mutation.
#[derive(Debug, Clone)]
pub struct CartUpdate {
    pub product: Product,
    pub change: CartChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistInsert {
    Added,
    AlreadyPresent,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Fails with `AppError::Conflict` when the username or email is already stored.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        window: PageWindow,
    ) -> AppResult<Page<Product>>;

    async fn search_products(&self, query: &str) -> AppResult<Vec<Product>>;

    /// Distinct non-empty category labels, sorted.
    async fn categories(&self) -> AppResult<Vec<String>>;

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Other products from the same category.
    async fn related_products(&self, product: &Product, limit: u64) -> AppResult<Vec<Product>>;

    async fn count_products(&self) -> AppResult<u64>;

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn cart_lines(&self, user_id: Uuid) -> AppResult<Vec<CartLine>>;

    async fn count_cart_items(&self, user_id: Uuid) -> AppResult<u64>;

    /// Reads the row and the product's stock, applies `domain::cart::plan`, and
    /// writes the outcome atomically. Nothing changes when the rule refuses.
    async fn mutate_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        mutation: CartMutation,
    ) -> AppResult<CartUpdate>;
}

#[async_trait]
pub trait WishlistRepository: Send + Sync {
    /// Fails with `AppError::NotFound` when the product does not exist.
    async fn add_to_wishlist(&self, user_id: Uuid, product_id: Uuid)
    -> AppResult<WishlistInsert>;

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> AppResult<bool>;

    async fn wishlist_products(&self, user_id: Uuid) -> AppResult<Vec<Product>>;

    async fn count_wishlist_items(&self, user_id: Uuid) -> AppResult<u64>;
}

#[async_trait]
pub trait PromoRepository: Send + Sync {
    async fn active_promo(&self, user_id: Uuid) -> AppResult<Option<AppliedPromo>>;

    /// Replaces whatever promo the user had.
    async fn save_promo(&self, user_id: Uuid, promo: &AppliedPromo) -> AppResult<()>;

    async fn clear_promo(&self, user_id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Turns the user's cart into an order in one transaction: stock is
    /// decremented and the cart emptied. The stored promo is consumed only
    /// when it is the one in `ctx`; a code applied meanwhile survives.
    async fn place_order(
        &self,
        user_id: Uuid,
        ctx: &PricingContext,
        shipping: ShippingDetails,
    ) -> AppResult<OrderWithItems>;

    /// Newest first.
    async fn list_orders(&self, user_id: Uuid, window: PageWindow) -> AppResult<Page<Order>>;

    async fn find_order(&self, user_id: Uuid, order_id: Uuid)
    -> AppResult<Option<OrderWithItems>>;

    async fn total_spent(&self, user_id: Uuid) -> AppResult<Decimal>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()>;
}

pub trait Store:
    UserRepository
    + CatalogRepository
    + CartRepository
    + WishlistRepository
    + PromoRepository
    + OrderRepository
    + AuditRepository
{
}

impl<T> Store for T where
    T: UserRepository
        + CatalogRepository
        + CartRepository
        + WishlistRepository
        + PromoRepository
        + OrderRepository
        + AuditRepository
{
}
