//! Menu endpoints (`/items/*` and `/categories/*`).

use std::sync::Arc;

use tracing::{debug, instrument};

use aromista_core::{CategoryId, ItemId};

use super::cache::{CacheKey, CacheValue};
use super::types::{CategoriesEnvelope, Category, CategoryInput, ItemInput, ItemsEnvelope, MenuItem};
use super::{ApiClient, Credentials, Result, decode};

impl ApiClient {
    /// Menu items as customers see them. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn customer_items(&self, credentials: &Credentials) -> Result<Arc<Vec<MenuItem>>> {
        if let Some(CacheValue::Items(items)) = self.inner.cache.get(&CacheKey::CustomerItems).await
        {
            debug!("Cache hit for customer menu");
            return Ok(items);
        }

        let envelope: ItemsEnvelope = self
            .get_json(credentials, "/items/customer/getall")
            .await?;
        let items = Arc::new(envelope.items);
        self.inner
            .cache
            .insert(CacheKey::CustomerItems, CacheValue::Items(Arc::clone(&items)))
            .await;
        Ok(items)
    }

    /// Every menu item, including unavailable ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn all_items(&self, credentials: &Credentials) -> Result<Vec<MenuItem>> {
        let envelope: ItemsEnvelope = self.get_json(credentials, "/items/getall").await?;
        Ok(envelope.items)
    }

    /// Menu items for the admin items screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn admin_items(&self, credentials: &Credentials) -> Result<Vec<MenuItem>> {
        let envelope: ItemsEnvelope = self.get_json(credentials, "/items/admin/getall").await?;
        Ok(envelope.items)
    }

    /// Create a menu item (multipart, optional image).
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the item.
    #[instrument(skip(self, credentials, input), fields(name = %input.name))]
    pub async fn create_item(&self, credentials: &Credentials, input: &ItemInput) -> Result<()> {
        let url = self.endpoint("/items/create");
        self.send_authed(credentials, |client| {
            client.post(&url).multipart(input.to_form())
        })
        .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Update a menu item; without an image the current picture is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, credentials, input))]
    pub async fn update_item(
        &self,
        credentials: &Credentials,
        id: &ItemId,
        input: &ItemInput,
    ) -> Result<()> {
        let url = self.resource_endpoint("/items/update", id)?;
        self.send_authed(credentials, |client| {
            client.put(&url).multipart(input.to_form())
        })
        .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Flip an item between `AVAILABLE` and `UNAVAILABLE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn toggle_item_status(&self, credentials: &Credentials, id: &ItemId) -> Result<()> {
        let url = self.resource_endpoint("/items/status", id)?;
        self.send_authed(credentials, |client| client.patch(&url))
            .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Delete a menu item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn delete_item(&self, credentials: &Credentials, id: &ItemId) -> Result<()> {
        let url = self.resource_endpoint("/items/delete", id)?;
        self.send_authed(credentials, |client| client.delete(&url))
            .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Every category. Cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn categories(&self, credentials: &Credentials) -> Result<Arc<Vec<Category>>> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.endpoint("/categories/getall");
        let response = self
            .send_authed(credentials, |client| client.get(&url))
            .await?;
        let envelope: CategoriesEnvelope = decode(response).await?;
        let categories = Arc::new(Vec::from(envelope));
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        Ok(categories)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the name.
    #[instrument(skip(self, credentials))]
    pub async fn create_category(&self, credentials: &Credentials, name: &str) -> Result<()> {
        let url = self.endpoint("/categories/create");
        let body = CategoryInput {
            category_name: name,
        };
        self.send_authed(credentials, |client| client.post(&url).json(&body))
            .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the name.
    #[instrument(skip(self, credentials))]
    pub async fn update_category(
        &self,
        credentials: &Credentials,
        id: &CategoryId,
        name: &str,
    ) -> Result<()> {
        let url = self.resource_endpoint("/categories/update", id)?;
        let body = CategoryInput {
            category_name: name,
        };
        self.send_authed(credentials, |client| client.put(&url).json(&body))
            .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Flip a category between `AVAILABLE` and `UNAVAILABLE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn toggle_category_status(
        &self,
        credentials: &Credentials,
        id: &CategoryId,
    ) -> Result<()> {
        let url = self.resource_endpoint("/categories/togglestatus", id)?;
        self.send_authed(credentials, |client| client.patch(&url))
            .await?;
        self.invalidate_menu().await;
        Ok(())
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn delete_category(&self, credentials: &Credentials, id: &CategoryId) -> Result<()> {
        let url = self.resource_endpoint("/categories/delete", id)?;
        self.send_authed(credentials, |client| client.delete(&url))
            .await?;
        self.invalidate_menu().await;
        Ok(())
    }
}
