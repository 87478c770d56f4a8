use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use super::{
    AuditRepository, CartRepository, CartUpdate, CatalogRepository, OrderRepository, Page,
    PageWindow, ProductFilter, PromoRepository, UserRepository, WishlistInsert,
    WishlistRepository,
};
use crate::{
    domain::{
        cart::{self, CartChange, CartMutation},
        pricing::{self, PricingContext},
        promo::AppliedPromo,
    },
    entity::{
        audit_logs::ActiveModel as AuditActive,
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
        promo_sessions::{ActiveModel as PromoActive, Column as PromoCol, Entity as PromoSessions},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
        wishlist_items::{ActiveModel as WishlistActive, Column as WishlistCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    models::{
        AuditEntry, CartLine, NewProduct, NewUser, Order, OrderItem, OrderWithItems, Product,
        ShippingDetails, User,
    },
};

/// Postgres-backed store built on SeaORM.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards in the input escaped.
fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn text_condition(needle: &str) -> Condition {
    let pattern = contains_pattern(needle);
    Condition::any()
        .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
        .add(Expr::col(ProdCol::Description).ilike(pattern))
}

#[async_trait]
impl UserRepository for SeaOrmStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = Users::find_by_id(id).one(&self.db).await?;
        Ok(user.map(user_from_entity))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = Users::find()
            .filter(UserCol::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user.map(user_from_entity))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = Users::find()
            .filter(UserCol::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(user.map(user_from_entity))
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let active = UserActive {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            created_at: NotSet,
        };
        match active.insert(&self.db).await {
            Ok(model) => Ok(user_from_entity(model)),
            Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(
                "Username or email already registered.".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmStore {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        window: PageWindow,
    ) -> AppResult<Page<Product>> {
        let mut condition = Condition::all();
        if let Some(category) = filter.category.as_deref() {
            condition = condition.add(ProdCol::Category.eq(category));
        }
        if let Some(search) = filter.search.as_deref() {
            condition = condition.add(text_condition(search));
        }
        if let Some(min_price) = filter.min_price {
            condition = condition.add(ProdCol::Price.gte(min_price));
        }
        if let Some(max_price) = filter.max_price {
            condition = condition.add(ProdCol::Price.lte(max_price));
        }

        let finder = Products::find()
            .filter(condition)
            .order_by_asc(ProdCol::CreatedAt)
            .order_by_asc(ProdCol::Id);

        let total = finder.clone().count(&self.db).await?;

        let items = finder
            .limit(window.limit)
            .offset(window.offset)
            .all(&self.db)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect();

        Ok(Page { items, total })
    }

    async fn search_products(&self, query: &str) -> AppResult<Vec<Product>> {
        let products = Products::find()
            .filter(text_condition(query))
            .order_by_asc(ProdCol::Name)
            .all(&self.db)
            .await?;
        Ok(products.into_iter().map(product_from_entity).collect())
    }

    async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = Products::find()
            .select_only()
            .column(ProdCol::Category)
            .distinct()
            .filter(ProdCol::Category.ne(""))
            .order_by_asc(ProdCol::Category)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    async fn find_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let product = Products::find_by_id(id).one(&self.db).await?;
        Ok(product.map(product_from_entity))
    }

    async fn related_products(&self, product: &Product, limit: u64) -> AppResult<Vec<Product>> {
        let related = Products::find()
            .filter(ProdCol::Category.eq(product.category.as_str()))
            .filter(ProdCol::Id.ne(product.id))
            .order_by_asc(ProdCol::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(related.into_iter().map(product_from_entity).collect())
    }

    async fn count_products(&self) -> AppResult<u64> {
        Ok(Products::find().count(&self.db).await?)
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        let active = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            image_url: Set(product.image_url),
            stock: Set(product.stock),
            category: Set(product.category),
            created_at: NotSet,
        };
        let model = active.insert(&self.db).await?;
        Ok(product_from_entity(model))
    }
}

#[async_trait]
impl CartRepository for SeaOrmStore {
    async fn cart_lines(&self, user_id: Uuid) -> AppResult<Vec<CartLine>> {
        let rows = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .find_also_related(Products)
            .order_by_asc(CartCol::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| {
                product.map(|product| CartLine {
                    product: product_from_entity(product),
                    quantity: item.quantity,
                })
            })
            .collect())
    }

    async fn count_cart_items(&self, user_id: Uuid) -> AppResult<u64> {
        let count = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mutate_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        mutation: CartMutation,
    ) -> AppResult<CartUpdate> {
        let txn = self.db.begin().await?;

        // The product row lock serialises concurrent changes to the same line.
        let product = Products::find_by_id(product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None if mutation == CartMutation::Add => return Err(AppError::NotFound),
            None => return Err(AppError::CartItemNotFound),
        };

        let existing = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .filter(CartCol::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        let change = cart::plan(mutation, existing.as_ref().map(|i| i.quantity), product.stock)?;

        match (change, existing) {
            (CartChange::Insert { quantity }, _) => {
                CartActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    created_at: NotSet,
                }
                .insert(&txn)
                .await?;
            }
            (CartChange::Update { quantity }, Some(item)) => {
                let mut active: CartActive = item.into();
                active.quantity = Set(quantity);
                active.update(&txn).await?;
            }
            (CartChange::Delete, Some(item)) => {
                item.delete(&txn).await?;
            }
            (_, None) => return Err(AppError::CartItemNotFound),
        }

        txn.commit().await?;

        Ok(CartUpdate {
            product: product_from_entity(product),
            change,
        })
    }
}

#[async_trait]
impl WishlistRepository for SeaOrmStore {
    async fn add_to_wishlist(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<WishlistInsert> {
        if Products::find_by_id(product_id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let existing = WishlistItems::find()
            .filter(WishlistCol::UserId.eq(user_id))
            .filter(WishlistCol::ProductId.eq(product_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(WishlistInsert::AlreadyPresent);
        }

        let active = WishlistActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            created_at: NotSet,
        };
        match active.insert(&self.db).await {
            Ok(_) => Ok(WishlistInsert::Added),
            Err(err) if is_unique_violation(&err) => Ok(WishlistInsert::AlreadyPresent),
            Err(err) => Err(err.into()),
        }
    }

    async fn remove_from_wishlist(&self, user_id: Uuid, product_id: Uuid) -> AppResult<bool> {
        let result = WishlistItems::delete_many()
            .filter(WishlistCol::UserId.eq(user_id))
            .filter(WishlistCol::ProductId.eq(product_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn wishlist_products(&self, user_id: Uuid) -> AppResult<Vec<Product>> {
        let rows = WishlistItems::find()
            .filter(WishlistCol::UserId.eq(user_id))
            .find_also_related(Products)
            .order_by_desc(WishlistCol::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(_, product)| product.map(product_from_entity))
            .collect())
    }

    async fn count_wishlist_items(&self, user_id: Uuid) -> AppResult<u64> {
        let count = WishlistItems::find()
            .filter(WishlistCol::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl PromoRepository for SeaOrmStore {
    async fn active_promo(&self, user_id: Uuid) -> AppResult<Option<AppliedPromo>> {
        let session = PromoSessions::find_by_id(user_id).one(&self.db).await?;
        Ok(session.map(|s| AppliedPromo {
            code: s.code,
            discount: s.discount,
        }))
    }

    async fn save_promo(&self, user_id: Uuid, promo: &AppliedPromo) -> AppResult<()> {
        let active = PromoActive {
            user_id: Set(user_id),
            code: Set(promo.code.clone()),
            discount: Set(promo.discount),
            applied_at: Set(Utc::now().into()),
        };
        PromoSessions::insert(active)
            .on_conflict(
                OnConflict::column(PromoCol::UserId)
                    .update_columns([PromoCol::Code, PromoCol::Discount, PromoCol::AppliedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn clear_promo(&self, user_id: Uuid) -> AppResult<()> {
        PromoSessions::delete_by_id(user_id).exec(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for SeaOrmStore {
    async fn place_order(
        &self,
        user_id: Uuid,
        ctx: &PricingContext,
        shipping: ShippingDetails,
    ) -> AppResult<OrderWithItems> {
        let txn = self.db.begin().await?;

        let cart_rows = CartItems::find()
            .filter(CartCol::UserId.eq(user_id))
            .order_by_asc(CartCol::CreatedAt)
            .lock(LockType::Update)
            .all(&txn)
            .await?;
        if cart_rows.is_empty() {
            return Err(AppError::EmptyCart);
        }

        // Lock products in id order so concurrent checkouts cannot deadlock.
        let product_ids: Vec<Uuid> = cart_rows.iter().map(|row| row.product_id).collect();
        let products: HashMap<Uuid, ProductModel> = Products::find()
            .filter(ProdCol::Id.is_in(product_ids))
            .order_by_asc(ProdCol::Id)
            .lock(LockType::Update)
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines = Vec::with_capacity(cart_rows.len());
        for row in &cart_rows {
            let product = products
                .get(&row.product_id)
                .ok_or(AppError::CartItemNotFound)?;
            if row.quantity > product.stock {
                return Err(AppError::InsufficientStock);
            }
            lines.push(CartLine {
                product: product_from_entity(product.clone()),
                quantity: row.quantity,
            });
        }

        let totals = pricing::checkout_totals(pricing::subtotal(&lines), ctx);
        let order_id = Uuid::new_v4();

        let order = OrderActive {
            id: Set(order_id),
            user_id: Set(user_id),
            subtotal: Set(totals.subtotal),
            shipping: Set(totals.shipping),
            tax: Set(totals.tax),
            discount: Set(totals.discount),
            total: Set(totals.total),
            promo_code: Set(ctx.promo.as_ref().map(|promo| promo.code.clone())),
            status: Set("pending".into()),
            full_name: Set(shipping.full_name),
            email: Set(shipping.email),
            phone: Set(shipping.phone),
            address: Set(shipping.address),
            city: Set(shipping.city),
            state: Set(shipping.state),
            zip_code: Set(shipping.zip_code),
            country: Set(shipping.country),
            card_last4: Set(shipping.card_last4),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(line.product.id),
                product_name: Set(line.product.name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.product.price),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            items.push(order_item_from_entity(item));

            let updated = Products::update_many()
                .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
                .filter(ProdCol::Id.eq(line.product.id))
                .filter(ProdCol::Stock.gte(line.quantity))
                .exec(&txn)
                .await?;
            if updated.rows_affected != 1 {
                return Err(AppError::InsufficientStock);
            }
        }

        CartItems::delete_many()
            .filter(CartCol::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        // Only the promo that priced this order is consumed.
        if let Some(priced) = ctx.promo.as_ref() {
            PromoSessions::delete_many()
                .filter(PromoCol::UserId.eq(user_id))
                .filter(PromoCol::Code.eq(priced.code.as_str()))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;

        Ok(OrderWithItems {
            order: order_from_entity(order),
            items,
        })
    }

    async fn list_orders(&self, user_id: Uuid, window: PageWindow) -> AppResult<Page<Order>> {
        let finder = Orders::find()
            .filter(OrderCol::UserId.eq(user_id))
            .order_by_desc(OrderCol::CreatedAt);

        let total = finder.clone().count(&self.db).await?;

        let items = finder
            .limit(window.limit)
            .offset(window.offset)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect();

        Ok(Page { items, total })
    }

    async fn find_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<Option<OrderWithItems>> {
        let order = Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::UserId.eq(user_id))
                    .add(OrderCol::Id.eq(order_id)),
            )
            .one(&self.db)
            .await?;
        let order = match order {
            Some(o) => o,
            None => return Ok(None),
        };

        let items = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(order.id))
            .order_by_asc(OrderItemCol::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_item_from_entity)
            .collect();

        Ok(Some(OrderWithItems {
            order: order_from_entity(order),
            items,
        }))
    }

    async fn total_spent(&self, user_id: Uuid) -> AppResult<Decimal> {
        let total = Orders::find()
            .select_only()
            .column_as(Expr::col(OrderCol::Total).sum(), "total_spent")
            .filter(OrderCol::UserId.eq(user_id))
            .into_tuple::<Option<Decimal>>()
            .one(&self.db)
            .await?;
        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl AuditRepository for SeaOrmStore {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        AuditActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            resource: Set(entry.resource),
            metadata: Set(entry.metadata),
            created_at: NotSet,
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image_url: model.image_url,
        stock: model.stock,
        category: model.category,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        subtotal: model.subtotal,
        shipping: model.shipping,
        tax: model.tax,
        discount: model.discount,
        total: model.total,
        promo_code: model.promo_code,
        status: model.status,
        full_name: model.full_name,
        email: model.email,
        phone: model.phone,
        address: model.address,
        city: model.city,
        state: model.state,
        zip_code: model.zip_code,
        country: model.country,
        card_last4: model.card_last4,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: model.product_name,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
