use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{pricing::CheckoutTotals, promo::AppliedPromo},
    dto::{
        auth::{FormDescriptor, FormField, LoginRequest, LoginResponse, RegisterRequest, UserProfile},
        cart::{CartItemDto, CartItemQuantity, CartItemRequest, CartView, PromoRequest, UpdateCartRequest},
        catalog::{ProductDetail, ProductListing, SearchResults},
        orders::{CheckoutRequest, CheckoutSummary, Dashboard},
        wishlist::WishlistRequest,
    },
    models::{Order, OrderItem, OrderWithItems, Product},
    response::{ActionResponse, ApiResponse, Meta},
    routes::{auth, cart, catalog, health, orders, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register_form,
        auth::register,
        auth::login_form,
        auth::login,
        auth::logout,
        catalog::list_products,
        catalog::get_product,
        catalog::search,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart,
        cart::remove_from_cart,
        cart::apply_promo,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        orders::checkout_summary,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::dashboard
    ),
    components(
        schemas(
            Product,
            Order,
            OrderItem,
            OrderWithItems,
            AppliedPromo,
            CheckoutTotals,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserProfile,
            FormDescriptor,
            FormField,
            ProductListing,
            ProductDetail,
            SearchResults,
            CartView,
            CartItemDto,
            CartItemQuantity,
            UpdateCartRequest,
            CartItemRequest,
            PromoRequest,
            WishlistRequest,
            CheckoutRequest,
            CheckoutSummary,
            Dashboard,
            ActionResponse,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductListing>,
            ApiResponse<OrderWithItems>,
            ApiResponse<CheckoutSummary>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Catalog", description = "Product browsing and search"),
        (name = "Cart", description = "Cart and promo codes"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Orders", description = "Checkout, order history and dashboard"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
