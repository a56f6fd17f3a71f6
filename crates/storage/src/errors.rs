use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DBError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("[MongoDB] Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl DBError {
    /// Caller mistakes, as opposed to anything the server or driver reported.
    pub fn is_validation(&self) -> bool {
        matches!(self, DBError::Validation(_))
    }
}
