use async_trait::async_trait;
use derive_more::Display;
use mongodb::bson::{Bson, Document};

use crate::errors::DBError;

/// CRUD against a single bound collection.
///
/// Every method issues at most one driver call and never retries. Inputs are
/// plain [`Bson`] values so that callers can hand over anything they built;
/// a value that is not a document is rejected with [`DBError::Validation`]
/// before the database is touched.
#[async_trait]
pub trait DBProvider {
    /// Inserts `document` and returns the identifier the server assigned.
    async fn create(&self, document: Bson) -> Result<Bson, DBError>;

    /// Returns every document matching `query`, fully materialised.
    async fn read(&self, query: Bson) -> Result<Vec<Document>, DBError>;

    /// Applies the operator spec `update` to the first match, or to all
    /// matches when `many` is set. Returns the modified count.
    async fn update(&self, query: Bson, update: Bson, many: bool) -> Result<u64, DBError>;

    /// Removes the first match, or all matches when `many` is set. Returns
    /// the deleted count.
    async fn delete(&self, query: Bson, many: bool) -> Result<u64, DBError>;
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    #[display("CREATE")]
    Create,
    #[display("READ")]
    Read,
    #[display("UPDATE")]
    Update,
    #[display("DELETE")]
    Delete,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}
