//! Store listing model - the navigation product's store documents.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A store entry as the mobile product writes it; the console lists,
/// edits, and deletes these but never creates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreListing {
    #[serde(rename = "_id")]
    pub id: String,
    pub store_name: String,
    pub opening_time: String,
    pub closing_time: String,
}

impl StoreListing {
    pub fn new(store_name: String, opening_time: String, closing_time: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            store_name,
            opening_time,
            closing_time,
        }
    }
}
