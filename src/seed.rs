use rust_decimal::Decimal;

use crate::{error::AppResult, models::NewProduct, repository::Store};

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: Decimal,
    image_url: &'static str,
    stock: i32,
    category: &'static str,
}

const fn dollars(cents: i64) -> Decimal {
    Decimal::from_parts(cents as u32, 0, 0, false, 2)
}

const SAMPLE_PRODUCTS: [SampleProduct; 8] = [
    SampleProduct {
        name: "MacBook Pro M3",
        description: "Powerful laptop for professionals with M3 chip and stunning Retina display. Perfect for creative work and development.",
        price: dollars(129_999),
        image_url: "https://images.unsplash.com/photo-1541807084-5c52b6b3adef?w=400&h=300&fit=crop",
        stock: 15,
        category: "Laptops",
    },
    SampleProduct {
        name: "iPhone 15 Pro",
        description: "Latest smartphone with titanium design, advanced camera system, and USB-C connectivity.",
        price: dollars(99_999),
        image_url: "https://images.unsplash.com/photo-1592899677977-9c10ca588bbd?w=400&h=300&fit=crop",
        stock: 25,
        category: "Phones",
    },
    SampleProduct {
        name: "AirPods Pro 2",
        description: "Wireless earbuds with active noise cancellation, spatial audio, and adaptive transparency.",
        price: dollars(24_999),
        image_url: "https://images.unsplash.com/photo-1606220945770-b5b6c2c55bf1?w=400&h=300&fit=crop",
        stock: 50,
        category: "Accessories",
    },
    SampleProduct {
        name: "iPad Air 5th Gen",
        description: "Versatile tablet with M1 chip, 10.9-inch Liquid Retina display, perfect for work and creativity.",
        price: dollars(59_999),
        image_url: "https://images.unsplash.com/photo-1544244015-0df4b3ffc6b0?w=400&h=300&fit=crop",
        stock: 20,
        category: "Tablets",
    },
    SampleProduct {
        name: "Apple Watch Series 9",
        description: "Advanced smartwatch with health monitoring, fitness tracking, and always-on display.",
        price: dollars(39_999),
        image_url: "https://images.unsplash.com/photo-1510017803434-a899398421b3?w=400&h=300&fit=crop",
        stock: 30,
        category: "Wearables",
    },
    SampleProduct {
        name: "Magic Keyboard",
        description: "Wireless keyboard with numeric keypad, scissor mechanism, and rechargeable battery.",
        price: dollars(14_999),
        image_url: "https://images.unsplash.com/photo-1587829741301-dc798b83add3?w=400&h=300&fit=crop",
        stock: 40,
        category: "Accessories",
    },
    SampleProduct {
        name: "Studio Display",
        description: "27-inch 5K Retina display with P3 wide color, True Tone, and anti-reflective coating.",
        price: dollars(159_999),
        image_url: "https://images.unsplash.com/photo-1527864550417-7fd91fc51a46?w=400&h=300&fit=crop",
        stock: 10,
        category: "Monitors",
    },
    SampleProduct {
        name: "Mac Mini M2",
        description: "Compact desktop computer with M2 chip, perfect for home office and creative projects.",
        price: dollars(59_999),
        image_url: "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=400&h=300&fit=crop",
        stock: 18,
        category: "Computers",
    },
];

/// Inserts the sample catalog when no product exists yet. Returns how many rows were added.
pub async fn seed_catalog(store: &dyn Store) -> AppResult<usize> {
    if store.count_products().await? > 0 {
        return Ok(0);
    }

    for sample in &SAMPLE_PRODUCTS {
        store
            .insert_product(NewProduct {
                name: sample.name.to_string(),
                description: sample.description.to_string(),
                price: sample.price,
                image_url: Some(sample.image_url.to_string()),
                stock: sample.stock,
                category: sample.category.to_string(),
            })
            .await?;
    }
    Ok(SAMPLE_PRODUCTS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{CatalogRepository, MemoryStore};

    #[tokio::test]
    async fn seeds_only_an_empty_catalog() {
        let store = MemoryStore::new();
        assert_eq!(seed_catalog(&store).await.expect("seed"), 8);
        assert_eq!(seed_catalog(&store).await.expect("reseed"), 0);
        assert_eq!(store.count_products().await.expect("count"), 8);

        let macbook = store
            .search_products("MacBook")
            .await
            .expect("search")
            .remove(0);
        assert_eq!(macbook.price, Decimal::new(129_999, 2));
    }
}
