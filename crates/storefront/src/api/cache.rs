//! Cache types for the customer menu.

use std::sync::Arc;

use super::types::{Category, MenuItem};

/// Cache key for menu data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    CustomerItems,
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Items(Arc<Vec<MenuItem>>),
    Categories(Arc<Vec<Category>>),
}
