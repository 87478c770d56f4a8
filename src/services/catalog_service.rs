use uuid::Uuid;

use crate::{
    dto::catalog::{
        PRODUCTS_PER_PAGE, ProductDetail, ProductListing, ProductQuery, RELATED_PRODUCTS,
        SearchResults,
    },
    error::{AppError, AppResult},
    repository::{ProductFilter, Store},
    response::{ApiResponse, Meta},
};

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn list_products(
    store: &dyn Store,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductListing>> {
    let (page, per_page, window) = query.pagination().window(PRODUCTS_PER_PAGE);
    let filter = ProductFilter {
        category: non_empty(query.category),
        search: non_empty(query.search),
        min_price: query.min_price,
        max_price: query.max_price,
    };

    let result = store.list_products(&filter, window).await?;
    let categories = store.categories().await?;

    let meta = Meta::new(page, per_page, result.total as i64);
    Ok(ApiResponse::success(
        "OK",
        ProductListing {
            items: result.items,
            categories,
        },
        Some(meta),
    ))
}

pub async fn get_product(store: &dyn Store, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = store.find_product(id).await?.ok_or(AppError::NotFound)?;
    let related = store.related_products(&product, RELATED_PRODUCTS).await?;
    Ok(ApiResponse::success(
        "OK",
        ProductDetail { product, related },
        None,
    ))
}

/// Substring search over name and description. A blank query yields no results.
pub async fn search(store: &dyn Store, q: Option<String>) -> AppResult<ApiResponse<SearchResults>> {
    let query = q.unwrap_or_default().trim().to_string();
    let items = if query.is_empty() {
        Vec::new()
    } else {
        store.search_products(&query).await?
    };
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        SearchResults { query, items },
        Some(Meta {
            page: None,
            per_page: None,
            total: Some(total),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        repository::{CatalogRepository, MemoryStore},
        services::testing::product,
    };

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        product(&store, "MacBook Pro M3", "Laptops", "1299.99", 15).await;
        product(&store, "Magic Keyboard", "Accessories", "149.99", 40).await;
        product(&store, "AirPods Pro 2", "Accessories", "249.99", 50).await;
        product(&store, "iPhone 15 Pro", "Phones", "999.99", 25).await;
        store
    }

    #[tokio::test]
    async fn listing_filters_by_category_and_price() {
        let store = seeded().await;
        let query = ProductQuery {
            category: Some("Accessories".into()),
            max_price: Some(Decimal::new(200, 0)),
            ..Default::default()
        };
        let resp = list_products(&store, query).await.expect("list");
        let listing = resp.data.expect("listing");
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].name, "Magic Keyboard");
        assert_eq!(
            listing.categories,
            vec!["Accessories", "Laptops", "Phones"]
        );
        assert_eq!(resp.meta.and_then(|m| m.total), Some(1));
    }

    #[tokio::test]
    async fn listing_paginates() {
        let store = seeded().await;
        let query = ProductQuery {
            page: Some(2),
            per_page: Some(3),
            ..Default::default()
        };
        let resp = list_products(&store, query).await.expect("list");
        assert_eq!(resp.data.expect("listing").items.len(), 1);
        let meta = resp.meta.expect("meta");
        assert_eq!((meta.page, meta.per_page, meta.total), (Some(2), Some(3), Some(4)));
    }

    #[tokio::test]
    async fn detail_includes_related_products() {
        let store = seeded().await;
        let keyboard = store
            .search_products("keyboard")
            .await
            .expect("search")
            .remove(0);
        let detail = get_product(&store, keyboard.id)
            .await
            .expect("detail")
            .data
            .expect("data");
        assert_eq!(detail.related.len(), 1);
        assert_eq!(detail.related[0].name, "AirPods Pro 2");
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = seeded().await;
        let err = get_product(&store, Uuid::new_v4())
            .await
            .expect_err("missing");
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn blank_search_returns_nothing() {
        let store = seeded().await;
        let resp = search(&store, Some("   ".into())).await.expect("search");
        assert!(resp.data.expect("results").items.is_empty());

        let resp = search(&store, Some("PRO".into())).await.expect("search");
        assert_eq!(resp.data.expect("results").items.len(), 3);
    }
}
