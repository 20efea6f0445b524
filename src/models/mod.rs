//! Typed record models.
//!
//! Each model knows the collection it lives in and the field that keys it,
//! and converts to and from the generic [`Document`] form the store holds.
//! Field names on disk are camelCase (`memberId`, `bookIsbn`, `returnDate`).

mod book;
mod loan;
mod member;

pub use book::Book;
pub use loan::Loan;
pub use member::Member;

use crate::error::{Result, StoreError};
use crate::types::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A record type stored in a named collection.
pub trait Model: Serialize + DeserializeOwned {
    /// Collection the records live in.
    const COLLECTION: &'static str;

    /// Field holding the unique key.
    const KEY_FIELD: &'static str;

    /// Value of the key field.
    fn key(&self) -> &str;

    /// Encode into a store document.
    fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(doc) => Ok(doc),
            other => Err(StoreError::Serialization(format!(
                "{} record encoded as {}, expected an object",
                Self::COLLECTION,
                other
            ))),
        }
    }

    /// Decode from a store document.
    fn from_document(doc: Document) -> Result<Self> {
        serde_json::from_value(Value::Object(doc)).map_err(|e| {
            StoreError::Deserialization(format!("malformed {} record: {}", Self::COLLECTION, e))
        })
    }
}

fn default_true() -> bool {
    true
}
