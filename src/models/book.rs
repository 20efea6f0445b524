//! Catalog entries.

use super::{default_true, Model};
use crate::types::BOOKS;
use serde::{Deserialize, Serialize};

/// A book in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,

    /// False while the book is out on loan.
    #[serde(default = "default_true")]
    pub available: bool,
}

impl Book {
    pub const ISBN: &'static str = "isbn";
    pub const AVAILABLE: &'static str = "available";

    /// A new, available book.
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            available: true,
        }
    }
}

impl Model for Book {
    const COLLECTION: &'static str = BOOKS;
    const KEY_FIELD: &'static str = Self::ISBN;

    fn key(&self) -> &str {
        &self.isbn
    }
}
