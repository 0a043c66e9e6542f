use crate::error::StoreError;
use crate::types::{DeleteResult, InsertResult, PriceOrder, Record, UpdateResult};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait BookingBackend: Clone + Send + Sync + 'static {
    async fn services(&self, order: PriceOrder) -> Result<Vec<Record>, StoreError>;
    async fn service(&self, id: &str) -> Result<Option<Record>, StoreError>;
    /// `None` matches every booking.
    async fn bookings(&self, email: Option<&str>) -> Result<Vec<Record>, StoreError>;
    async fn add_booking(&self, booking: Record) -> Result<InsertResult, StoreError>;
    async fn update_booking_status(&self, id: &str, status: Value)
        -> Result<UpdateResult, StoreError>;
    async fn remove_booking(&self, id: &str) -> Result<DeleteResult, StoreError>;
}
