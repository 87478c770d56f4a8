pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod dashboard_service;
pub mod order_service;
pub mod wishlist_service;

#[cfg(test)]
pub(crate) mod testing {
    use rust_decimal::Decimal;

    use crate::{
        models::{NewProduct, Product},
        repository::{CatalogRepository, MemoryStore},
    };

    pub async fn product(
        store: &MemoryStore,
        name: &str,
        category: &str,
        price: &str,
        stock: i32,
    ) -> Product {
        store
            .insert_product(NewProduct {
                name: name.to_string(),
                description: format!("{name} description"),
                price: price.parse::<Decimal>().expect("decimal literal"),
                image_url: None,
                stock,
                category: category.to_string(),
            })
            .await
            .expect("insert product")
    }
}
