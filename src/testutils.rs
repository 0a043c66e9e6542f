use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    backend::BookingBackend,
    error::StoreError,
    types::{DeleteResult, InsertResult, PriceOrder, Record, UpdateResult},
};

pub struct MockBackendInner {
    pub success: AtomicBool,
    pub calls_to_services: AtomicU64,
    pub calls_to_service: AtomicU64,
    pub calls_to_bookings: AtomicU64,
    pub calls_to_add_booking: AtomicU64,
    pub calls_to_update_booking_status: AtomicU64,
    pub calls_to_remove_booking: AtomicU64,
    pub bookings: Mutex<Vec<Record>>,
    pub last_email_filter: Mutex<Option<Option<String>>>,
    pub last_price_order: Mutex<Option<PriceOrder>>,
}

#[derive(Clone)]
pub struct MockBackend(pub Arc<MockBackendInner>);

impl MockBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            calls_to_services: AtomicU64::default(),
            calls_to_service: AtomicU64::default(),
            calls_to_bookings: AtomicU64::default(),
            calls_to_add_booking: AtomicU64::default(),
            calls_to_update_booking_status: AtomicU64::default(),
            calls_to_remove_booking: AtomicU64::default(),
            bookings: Mutex::default(),
            last_email_filter: Mutex::default(),
            last_price_order: Mutex::default(),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBackendInner::new()))
    }

    fn result(&self) -> Result<(), StoreError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StoreError::Encoding("Supposed to fail".into())),
        }
    }
}

#[async_trait]
impl BookingBackend for MockBackend {
    async fn services(&self, order: PriceOrder) -> Result<Vec<Record>, StoreError> {
        self.0.calls_to_services.fetch_add(1, Ordering::SeqCst);
        *self.0.last_price_order.lock().unwrap() = Some(order);
        self.result()?;
        Ok(vec![])
    }

    async fn service(&self, _id: &str) -> Result<Option<Record>, StoreError> {
        self.0.calls_to_service.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(None)
    }

    async fn bookings(&self, email: Option<&str>) -> Result<Vec<Record>, StoreError> {
        self.0.calls_to_bookings.fetch_add(1, Ordering::SeqCst);
        *self.0.last_email_filter.lock().unwrap() = Some(email.map(String::from));
        self.result()?;
        Ok(self.0.bookings.lock().unwrap().clone())
    }

    async fn add_booking(&self, _booking: Record) -> Result<InsertResult, StoreError> {
        self.0.calls_to_add_booking.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(InsertResult {
            acknowledged: true,
            inserted_id: Value::String("64b7f0c2a1b2c3d4e5f60718".into()),
        })
    }

    async fn update_booking_status(
        &self,
        _id: &str,
        _status: Value,
    ) -> Result<UpdateResult, StoreError> {
        self.0
            .calls_to_update_booking_status
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 0,
            upserted_id: None,
        })
    }

    async fn remove_booking(&self, _id: &str) -> Result<DeleteResult, StoreError> {
        self.0.calls_to_remove_booking.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: 0,
        })
    }
}
