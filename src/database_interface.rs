use crate::backend::BookingBackend;
use crate::error::StoreError;
use crate::types::{
    DeleteResult, InsertResult, PriceOrder, Record, UpdateResult, SERVICE_PROJECTION,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::options::{ClientOptions, FindOneOptions, FindOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection};
use serde_json::Value;
use tracing::info;

const MAX_POOL_SIZE: u32 = 10;

/// MongoDB backed store. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct DatabaseInterface {
    services: Collection<Document>,
    bookings: Collection<Document>,
}

impl DatabaseInterface {
    /// Connects and pings the deployment, so an unreachable database fails here
    /// rather than on the first request.
    pub async fn new(database_url: &str, database_name: &str) -> Result<Self, StoreError> {
        let client = Self::establish_connection(database_url).await?;
        let database = client.database(database_name);
        Ok(Self {
            services: database.collection("services"),
            bookings: database.collection("bookings"),
        })
    }

    async fn establish_connection(database_url: &str) -> Result<Client, mongodb::error::Error> {
        let mut options = ClientOptions::parse(database_url).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        options.max_pool_size = Some(MAX_POOL_SIZE);

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        info!("Pinged deployment, database connection established");
        Ok(client)
    }
}

fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|err| StoreError::InvalidId(err.to_string()))
}

/// Renders BSON the way the HTTP API exposes it: ObjectIds become hex strings,
/// dates become RFC 3339 strings with millisecond precision, everything else
/// uses relaxed extended JSON.
fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(datetime) => {
            DateTime::<Utc>::from_timestamp_millis(datetime.timestamp_millis())
                .map(|utc| Value::String(utc.to_rfc3339_opts(SecondsFormat::Millis, true)))
                .unwrap_or_else(|| Bson::DateTime(datetime).into_relaxed_extjson())
        }
        Bson::Document(document) => Value::Object(document_to_record(document)),
        Bson::Array(values) => Value::Array(values.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn document_to_record(document: Document) -> Record {
    document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

#[async_trait]
impl BookingBackend for DatabaseInterface {
    async fn services(&self, order: PriceOrder) -> Result<Vec<Record>, StoreError> {
        let direction = match order {
            PriceOrder::Ascending => 1,
            PriceOrder::Descending => -1,
        };
        let options = FindOptions::builder()
            .sort(doc! { "price": direction })
            .build();

        let cursor = self.services.find(doc! {}, options).await?;
        let services: Vec<Document> = cursor.try_collect().await?;
        Ok(services.into_iter().map(document_to_record).collect())
    }

    async fn service(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let oid = parse_id(id)?;
        let filter = doc! { "_id": oid };
        let projection: Document = SERVICE_PROJECTION
            .iter()
            .map(|field| (field.to_string(), Bson::Int32(1)))
            .collect();
        let options = FindOneOptions::builder().projection(projection).build();

        let service = self.services.find_one(filter, options).await?;
        Ok(service.map(document_to_record))
    }

    async fn bookings(&self, email: Option<&str>) -> Result<Vec<Record>, StoreError> {
        let filter = match email {
            Some(email) => doc! { "email": email },
            None => doc! {},
        };

        let cursor = self.bookings.find(filter, None).await?;
        let bookings: Vec<Document> = cursor.try_collect().await?;
        Ok(bookings.into_iter().map(document_to_record).collect())
    }

    async fn add_booking(&self, booking: Record) -> Result<InsertResult, StoreError> {
        let document = bson::to_document(&booking)?;
        let result = self.bookings.insert_one(document, None).await?;
        Ok(InsertResult {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        })
    }

    async fn update_booking_status(
        &self,
        id: &str,
        status: Value,
    ) -> Result<UpdateResult, StoreError> {
        let oid = parse_id(id)?;
        let status = bson::to_bson(&status)?;
        let filter = doc! { "_id": oid };
        let update = doc! { "$set": { "status": status } };

        let result = self.bookings.update_one(filter, update, None).await?;
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.map(bson_to_json),
        })
    }

    async fn remove_booking(&self, id: &str) -> Result<DeleteResult, StoreError> {
        let oid = parse_id(id)?;
        let filter = doc! { "_id": oid };
        let result = self.bookings.delete_one(filter, None).await?;
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }
}
