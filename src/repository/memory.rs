use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AuditRepository, CartRepository, CartUpdate, CatalogRepository, OrderRepository, Page,
    PageWindow, ProductFilter, PromoRepository, UserRepository, WishlistInsert,
    WishlistRepository, text_matches,
};
use crate::{
    domain::{
        cart::{self, CartChange, CartMutation},
        pricing::{self, PricingContext},
        promo::AppliedPromo,
    },
    error::{AppError, AppResult},
    models::{
        AuditEntry, CartLine, NewProduct, NewUser, Order, OrderItem, OrderWithItems, Product,
        ShippingDetails, User,
    },
};

/// In-process store for tests and local experiments.
///
/// One mutex guards all tables, so every operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    products: Vec<Product>,
    cart: Vec<CartRow>,
    wishlist: Vec<WishlistRow>,
    promos: HashMap<Uuid, AppliedPromo>,
    orders: Vec<OrderWithItems>,
    audit: Vec<AuditEntry>,
}

struct CartRow {
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
}

struct WishlistRow {
    user_id: Uuid,
    product_id: Uuid,
    created_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit entries recorded so far, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.state.lock().await.audit.clone()
    }
}

impl MemoryState {
    fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn cart_lines(&self, user_id: Uuid) -> Vec<CartLine> {
        self.cart
            .iter()
            .filter(|row| row.user_id == user_id)
            .filter_map(|row| {
                self.product(row.product_id).map(|product| CartLine {
                    product: product.clone(),
                    quantity: row.quantity,
                })
            })
            .collect()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(AppError::Conflict(
                "Username or email already registered.".into(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        window: PageWindow,
    ) -> AppResult<Page<Product>> {
        let state = self.state.lock().await;
        let matching: Vec<&Product> = state.products.iter().filter(|p| filter.matches(p)).collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn search_products(&self, query: &str) -> AppResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut found: Vec<Product> = state
            .products
            .iter()
            .filter(|p| text_matches(p, query))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn categories(&self) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        let mut categories: Vec<String> = state
            .products
            .iter()
            .map(|p| p.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.product(id).cloned())
    }

    async fn related_products(&self, product: &Product, limit: u64) -> AppResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .filter(|p| p.category == product.category && p.id != product.id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_products(&self) -> AppResult<u64> {
        Ok(self.state.lock().await.products.len() as u64)
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        if product.price < Decimal::ZERO || product.stock < 0 {
            return Err(AppError::BadRequest(
                "price and stock must not be negative".into(),
            ));
        }
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            image_url: product.image_url,
            stock: product.stock,
            category: product.category,
            created_at: Utc::now(),
        };
        self.state.lock().await.products.push(product.clone());
        Ok(product)
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn cart_lines(&self, user_id: Uuid) -> AppResult<Vec<CartLine>> {
        Ok(self.state.lock().await.cart_lines(user_id))
    }

    async fn count_cart_items(&self, user_id: Uuid) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state.cart.iter().filter(|row| row.user_id == user_id).count() as u64)
    }

    async fn mutate_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        mutation: CartMutation,
    ) -> AppResult<CartUpdate> {
        let mut state = self.state.lock().await;
        let product = match state.product(product_id) {
            Some(product) => product.clone(),
            None if mutation == CartMutation::Add => return Err(AppError::NotFound),
            None => return Err(AppError::CartItemNotFound),
        };

        let position = state
            .cart
            .iter()
            .position(|row| row.user_id == user_id && row.product_id == product_id);
        let current = position.map(|idx| state.cart[idx].quantity);
        let change = cart::plan(mutation, current, product.stock)?;

        match (change, position) {
            (CartChange::Insert { quantity }, _) => state.cart.push(CartRow {
                user_id,
                product_id,
                quantity,
            }),
            (CartChange::Update { quantity }, Some(idx)) => state.cart[idx].quantity = quantity,
            (CartChange::Delete, Some(idx)) => {
                state.cart.remove(idx);
            }
            (_, None) => return Err(AppError::CartItemNotFound),
        }

        Ok(CartUpdate { product, change })
    }
}

#[async_trait]
impl WishlistRepository for MemoryStore {
    async fn add_to_wishlist(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<WishlistInsert> {
        let mut state = self.state.lock().await;
        if state.product(product_id).is_none() {
            return Err(AppError::NotFound);
        }
        if state
            .wishlist
            .iter()
            .any(|row| row.user_id == user_id && row.product_id == product_id)
        {
            return Ok(WishlistInsert::AlreadyPresent);
        }
        state.wishlist.push(WishlistRow {
            user_id,
            product_id,
            created_at: Utc::now(),
        });
        Ok(WishlistInsert::Added)
    }

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.wishlist.len();
        state
            .wishlist
            .retain(|row| !(row.user_id == user_id && row.product_id == product_id));
        Ok(state.wishlist.len() < before)
    }

    async fn wishlist_products(&self, user_id: Uuid) -> AppResult<Vec<Product>> {
        let state = self.state.lock().await;
        let mut rows: Vec<&WishlistRow> = state
            .wishlist
            .iter()
            .filter(|row| row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .filter_map(|row| state.product(row.product_id).cloned())
            .collect())
    }

    async fn count_wishlist_items(&self, user_id: Uuid) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state.wishlist.iter().filter(|row| row.user_id == user_id).count() as u64)
    }
}

#[async_trait]
impl PromoRepository for MemoryStore {
    async fn active_promo(&self, user_id: Uuid) -> AppResult<Option<AppliedPromo>> {
        Ok(self.state.lock().await.promos.get(&user_id).cloned())
    }

    async fn save_promo(&self, user_id: Uuid, promo: &AppliedPromo) -> AppResult<()> {
        self.state.lock().await.promos.insert(user_id, promo.clone());
        Ok(())
    }

    async fn clear_promo(&self, user_id: Uuid) -> AppResult<()> {
        self.state.lock().await.promos.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place_order(
        &self,
        user_id: Uuid,
        ctx: &PricingContext,
        shipping: ShippingDetails,
    ) -> AppResult<OrderWithItems> {
        let mut state = self.state.lock().await;
        let lines = state.cart_lines(user_id);
        if lines.is_empty() {
            return Err(AppError::EmptyCart);
        }
        if lines.iter().any(|line| line.quantity > line.product.stock) {
            return Err(AppError::InsufficientStock);
        }

        let totals = pricing::checkout_totals(pricing::subtotal(&lines), ctx);
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order = Order {
            id: order_id,
            user_id,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            tax: totals.tax,
            discount: totals.discount,
            total: totals.total,
            promo_code: ctx.promo.as_ref().map(|promo| promo.code.clone()),
            status: "pending".into(),
            full_name: shipping.full_name,
            email: shipping.email,
            phone: shipping.phone,
            address: shipping.address,
            city: shipping.city,
            state: shipping.state,
            zip_code: shipping.zip_code,
            country: shipping.country,
            card_last4: shipping.card_last4,
            created_at: now,
        };

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Some(product) = state.products.iter_mut().find(|p| p.id == line.product.id) {
                product.stock -= line.quantity;
            }
            items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: line.product.id,
                product_name: line.product.name.clone(),
                quantity: line.quantity,
                unit_price: line.product.price,
                created_at: now,
            });
        }

        state.cart.retain(|row| row.user_id != user_id);
        let priced_code = ctx.promo.as_ref().map(|promo| promo.code.as_str());
        if priced_code.is_some()
            && state.promos.get(&user_id).map(|promo| promo.code.as_str()) == priced_code
        {
            state.promos.remove(&user_id);
        }

        let placed = OrderWithItems { order, items };
        state.orders.push(placed.clone());
        Ok(placed)
    }

    async fn list_orders(&self, user_id: Uuid, window: PageWindow) -> AppResult<Page<Order>> {
        let state = self.state.lock().await;
        // Pushed in creation order, so reversing yields newest first.
        let orders: Vec<&Order> = state
            .orders
            .iter()
            .rev()
            .map(|placed| &placed.order)
            .filter(|order| order.user_id == user_id)
            .collect();
        let total = orders.len() as u64;
        let items = orders
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn find_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<Option<OrderWithItems>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|placed| placed.order.id == order_id && placed.order.user_id == user_id)
            .cloned())
    }

    async fn total_spent(&self, user_id: Uuid) -> AppResult<Decimal> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|placed| placed.order.user_id == user_id)
            .map(|placed| placed.order.total)
            .sum())
    }
}

#[async_trait]
impl AuditRepository for MemoryStore {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        self.state.lock().await.audit.push(entry);
        Ok(())
    }
}
