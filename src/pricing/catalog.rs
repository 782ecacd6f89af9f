//! In-memory product catalog.

use std::sync::Arc;

use dashmap::DashMap;

use crate::pricing::types::{Product, ProductId};

/// A thread-safe product catalog holding each product's stored price.
#[derive(Clone, Default)]
pub struct Catalog {
    inner: Arc<DashMap<ProductId, Product>>,
}

impl Catalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from configured products. Later duplicates replace earlier ones.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let catalog = Self::new();
        for product in products {
            catalog.upsert(product);
        }
        tracing::info!("Loaded {} products into catalog", catalog.len());
        catalog
    }

    /// Insert or replace a product.
    pub fn upsert(&self, product: Product) {
        self.inner.insert(product.id.clone(), product);
    }

    pub fn get(&self, id: &ProductId) -> Option<Product> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// All products, ordered by id.
    pub fn list(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.inner.iter().map(|r| r.value().clone()).collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
