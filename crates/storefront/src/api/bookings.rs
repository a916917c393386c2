//! Table booking endpoints (`/bookings/*`).

use tracing::instrument;

use aromista_core::{BookingId, BookingStatus};

use super::types::{BookedTablesEnvelope, Booking, BookingsEnvelope, NewBooking, StatusUpdate};
use super::{ApiClient, Credentials, Result, decode};

impl ApiClient {
    /// Reserve a table.
    ///
    /// # Errors
    ///
    /// Returns [`super::ApiError::Status`] when the table is already taken.
    #[instrument(skip(self, credentials))]
    pub async fn create_booking(&self, credentials: &Credentials, booking: &NewBooking) -> Result<()> {
        let url = self.endpoint("/bookings/create");
        self.send_authed(credentials, |client| client.post(&url).json(booking))
            .await?;
        Ok(())
    }

    /// Ids of the tables already booked for a date and time slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn booked_tables(
        &self,
        credentials: &Credentials,
        date: &str,
        time: &str,
    ) -> Result<Vec<String>> {
        let url = self.endpoint("/bookings/booked-tables");
        let response = self
            .send_authed(credentials, |client| {
                client.get(&url).query(&[("date", date), ("time", time)])
            })
            .await?;
        let envelope: BookedTablesEnvelope = decode(response).await?;
        Ok(envelope.booked_table_ids)
    }

    /// Every booking, for the admin screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn all_bookings(&self, credentials: &Credentials) -> Result<Vec<Booking>> {
        let envelope: BookingsEnvelope = self.get_json(credentials, "/bookings/getall").await?;
        Ok(envelope.bookings)
    }

    /// Confirm or cancel a booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn update_booking_status(
        &self,
        credentials: &Credentials,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<()> {
        let url = self.resource_endpoint("/bookings/update-status", id)?;
        let body = StatusUpdate { status };
        self.send_authed(credentials, |client| client.patch(&url).json(&body))
            .await?;
        Ok(())
    }

    /// Delete a booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn delete_booking(&self, credentials: &Credentials, id: &BookingId) -> Result<()> {
        let url = self.resource_endpoint("/bookings/delete", id)?;
        self.send_authed(credentials, |client| client.delete(&url))
            .await?;
        Ok(())
    }
}
