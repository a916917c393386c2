//! Order endpoints (`/orders/*`).

use tracing::instrument;

use aromista_core::{OrderId, OrderLine, OrderStatus};

use super::types::{NewOrder, Order, OrdersEnvelope, StaffOrder, StatusUpdate, UserRef, UsersEnvelope};
use super::{ApiClient, Credentials, Result, decode};

/// Shortest query the user search runs for.
pub const MIN_USER_QUERY_LEN: usize = 2;

impl ApiClient {
    /// Place an order for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order.
    #[instrument(skip(self, credentials, lines), fields(lines = lines.len()))]
    pub async fn place_order(&self, credentials: &Credentials, lines: &[OrderLine]) -> Result<()> {
        let url = self.endpoint("/orders/create");
        let body = NewOrder { items: lines };
        self.send_authed(credentials, |client| client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    /// Orders placed by the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn my_orders(&self, credentials: &Credentials) -> Result<Vec<Order>> {
        let envelope: OrdersEnvelope = self
            .get_json(credentials, "/orders/getall/orders/foruser")
            .await?;
        Ok(envelope.orders)
    }

    /// Every order, for the admin screens.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn all_orders(&self, credentials: &Credentials) -> Result<Vec<Order>> {
        let envelope: OrdersEnvelope = self.get_json(credentials, "/orders/getall").await?;
        Ok(envelope.orders)
    }

    /// Orders visible on the barista board.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn barista_orders(&self, credentials: &Credentials) -> Result<Vec<Order>> {
        let envelope: OrdersEnvelope = self
            .get_json(credentials, "/orders/barista/getall")
            .await?;
        Ok(envelope.orders)
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the transition.
    #[instrument(skip(self, credentials))]
    pub async fn update_order_status(
        &self,
        credentials: &Credentials,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<()> {
        let url = self.resource_endpoint("/orders/update-status", id)?;
        let body = StatusUpdate { status };
        self.send_authed(credentials, |client| client.patch(&url).json(&body))
            .await?;
        Ok(())
    }

    /// Find customers by name or email for the order composer.
    ///
    /// Queries shorter than [`MIN_USER_QUERY_LEN`] characters return nothing
    /// without calling the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn search_users(&self, credentials: &Credentials, query: &str) -> Result<Vec<UserRef>> {
        let query = query.trim();
        if query.chars().count() < MIN_USER_QUERY_LEN {
            return Ok(Vec::new());
        }

        let url = self.endpoint("/orders/search-user");
        let response = self
            .send_authed(credentials, |client| {
                client.get(&url).query(&[("query", query)])
            })
            .await?;
        let envelope: UsersEnvelope = decode(response).await?;
        Ok(envelope.users)
    }

    /// Place an order on behalf of a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order.
    #[instrument(skip(self, credentials, order), fields(user = %order.user_id))]
    pub async fn create_staff_order(&self, credentials: &Credentials, order: &StaffOrder) -> Result<()> {
        let url = self.endpoint("/orders/create-admin");
        self.send_authed(credentials, |client| client.post(&url).json(order))
            .await?;
        Ok(())
    }

    /// Replace the lines of an existing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, credentials, order))]
    pub async fn update_order(
        &self,
        credentials: &Credentials,
        id: &OrderId,
        order: &StaffOrder,
    ) -> Result<()> {
        let url = self.resource_endpoint("/orders/update-order", id)?;
        self.send_authed(credentials, |client| client.put(&url).json(order))
            .await?;
        Ok(())
    }
}
