use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A schema-less document as stored in a collection.
pub type Record = Map<String, Value>;

/// Fields returned when a single service is looked up.
pub const SERVICE_PROJECTION: [&str; 4] = ["title", "price", "service_id", "img"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOrder {
    Ascending,
    Descending,
}

impl PriceOrder {
    /// Only `asc` sorts ascending, anything else (or nothing) sorts descending.
    pub fn from_query(sort: Option<&str>) -> Self {
        match sort {
            Some("asc") => PriceOrder::Ascending,
            _ => PriceOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}
