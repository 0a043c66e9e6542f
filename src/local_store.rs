use crate::backend::BookingBackend;
use crate::error::StoreError;
use crate::types::{
    DeleteResult, InsertResult, PriceOrder, Record, UpdateResult, SERVICE_PROJECTION,
};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::Value;
use std::{
    cmp::Ordering,
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::debug;

/// Mirrors BSON typing of `_id`: a JSON string that happens to look like an
/// ObjectId is still a string and is never matched by an ObjectId lookup.
#[derive(Debug, Clone, PartialEq)]
enum DocumentId {
    Object(ObjectId),
    Other(Value),
}

#[derive(Debug, Clone)]
struct StoredDocument {
    id: DocumentId,
    record: Record,
}

impl StoredDocument {
    /// Keeps a supplied `_id` as is, otherwise assigns a fresh ObjectId.
    fn new(mut record: Record) -> Self {
        let id = match record.get("_id") {
            Some(id) => DocumentId::Other(id.clone()),
            None => {
                let oid = ObjectId::new();
                record.insert("_id".into(), Value::String(oid.to_hex()));
                DocumentId::Object(oid)
            }
        };
        Self { id, record }
    }

    /// Catalog exports render ObjectIds as hex strings, so those are read back as ObjectIds.
    fn seeded(record: Record) -> Self {
        let oid = record
            .get("_id")
            .and_then(Value::as_str)
            .and_then(|id| ObjectId::parse_str(id).ok());
        match oid {
            Some(oid) => Self {
                id: DocumentId::Object(oid),
                record,
            },
            None => Self::new(record),
        }
    }

    fn has_object_id(&self, oid: &ObjectId) -> bool {
        self.id == DocumentId::Object(*oid)
    }
}

/// In-memory document store. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    services: Arc<Mutex<Vec<StoredDocument>>>,
    bookings: Arc<Mutex<Vec<StoredDocument>>>,
}

impl LocalStore {
    pub fn with_services(services: Vec<Record>) -> Self {
        let services = services.into_iter().map(StoredDocument::seeded).collect();
        Self {
            services: Arc::new(Mutex::new(services)),
            bookings: Arc::default(),
        }
    }

    /// Reads a JSON array of service documents, e.g. an export of the catalog collection.
    pub async fn load_services(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let services: Vec<Record> = serde_json::from_str(&contents)?;
        debug!(count = services.len(), ?path, "loaded service catalog");
        Ok(Self::with_services(services))
    }
}

fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|err| StoreError::InvalidId(err.to_string()))
}

/// Null and missing prices sort first, then numbers, then strings, then the rest.
fn compare_prices(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl BookingBackend for LocalStore {
    async fn services(&self, order: PriceOrder) -> Result<Vec<Record>, StoreError> {
        let mut services: Vec<Record> = self
            .services
            .lock()
            .unwrap()
            .iter()
            .map(|service| service.record.clone())
            .collect();
        services.sort_by(|a, b| {
            let ordering = compare_prices(a.get("price"), b.get("price"));
            match order {
                PriceOrder::Ascending => ordering,
                PriceOrder::Descending => ordering.reverse(),
            }
        });
        Ok(services)
    }

    async fn service(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let oid = parse_id(id)?;
        let services = self.services.lock().unwrap();
        let projected = services
            .iter()
            .find(|service| service.has_object_id(&oid))
            .map(|service| {
                service
                    .record
                    .iter()
                    .filter(|(key, _)| {
                        key.as_str() == "_id" || SERVICE_PROJECTION.contains(&key.as_str())
                    })
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            });
        Ok(projected)
    }

    async fn bookings(&self, email: Option<&str>) -> Result<Vec<Record>, StoreError> {
        let bookings = self.bookings.lock().unwrap();
        Ok(bookings
            .iter()
            .map(|booking| &booking.record)
            .filter(|booking| match email {
                Some(email) => booking.get("email").and_then(Value::as_str) == Some(email),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn add_booking(&self, booking: Record) -> Result<InsertResult, StoreError> {
        let booking = StoredDocument::new(booking);
        let inserted_id = booking.record.get("_id").cloned().unwrap_or(Value::Null);

        let mut bookings = self.bookings.lock().unwrap();
        if bookings.iter().any(|existing| existing.id == booking.id) {
            return Err(StoreError::DuplicateKey(inserted_id.to_string()));
        }
        bookings.push(booking);

        Ok(InsertResult {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_booking_status(
        &self,
        id: &str,
        status: Value,
    ) -> Result<UpdateResult, StoreError> {
        let oid = parse_id(id)?;
        let mut bookings = self.bookings.lock().unwrap();

        let (matched_count, modified_count) =
            match bookings.iter_mut().find(|booking| booking.has_object_id(&oid)) {
                Some(booking) if booking.record.get("status") == Some(&status) => (1, 0),
                Some(booking) => {
                    booking.record.insert("status".into(), status);
                    (1, 1)
                }
                None => (0, 0),
            };

        Ok(UpdateResult {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        })
    }

    async fn remove_booking(&self, id: &str) -> Result<DeleteResult, StoreError> {
        let oid = parse_id(id)?;
        let mut bookings = self.bookings.lock().unwrap();

        let before = bookings.len();
        if let Some(index) = bookings.iter().position(|booking| booking.has_object_id(&oid)) {
            bookings.remove(index);
        }

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: (before - bookings.len()) as u64,
        })
    }
}
