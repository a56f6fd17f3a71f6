use log::error;
use mongodb::bson::{Bson, Document};

use config::ConnectionConfig;

use crate::db_provider::Operation;
use crate::{DBError, DBProvider, MongoDBClient};

/// Lenient CRUD over a MongoDB collection.
pub type Crud = LenientCrud<MongoDBClient>;

/// Wraps a [`DBProvider`] so that server and driver failures come back as
/// "nothing happened" (`false`, no documents, `0`) instead of errors.
///
/// Failures are logged at error level, tagged with the operation. Caller
/// mistakes (a query that is not a document, an update spec without
/// operators) still come back as `Err(DBError::Validation)`.
#[derive(Debug)]
pub struct LenientCrud<P> {
    provider: P,
}

impl Crud {
    /// Connects and binds to `db_name.collection_name`, see [`MongoDBClient::new`].
    pub async fn connect(
        config: &ConnectionConfig,
        db_name: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Result<Self, DBError> {
        let provider = MongoDBClient::new(config, db_name, collection_name).await?;
        Ok(Self::new(provider))
    }

    pub async fn shutdown(self) {
        self.provider.shutdown().await;
    }
}

impl<P: DBProvider> LenientCrud<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_inner(self) -> P {
        self.provider
    }

    /// `true` only when the server assigned an identifier to the new document.
    pub async fn create(&self, document: impl Into<Bson>) -> Result<bool, DBError> {
        match self.provider.create(document.into()).await {
            Ok(inserted_id) => Ok(inserted_id != Bson::Null),
            Err(err) => collapse(Operation::Create, err, false),
        }
    }

    pub async fn read(&self, query: impl Into<Bson>) -> Result<Vec<Document>, DBError> {
        match self.provider.read(query.into()).await {
            Ok(documents) => Ok(documents),
            Err(err) => collapse(Operation::Read, err, Vec::new()),
        }
    }

    pub async fn update(
        &self,
        query: impl Into<Bson>,
        new_values: impl Into<Bson>,
        many: bool,
    ) -> Result<u64, DBError> {
        match self.provider.update(query.into(), new_values.into(), many).await {
            Ok(modified) => Ok(modified),
            Err(err) => collapse(Operation::Update, err, 0),
        }
    }

    pub async fn delete(&self, query: impl Into<Bson>, many: bool) -> Result<u64, DBError> {
        match self.provider.delete(query.into(), many).await {
            Ok(deleted) => Ok(deleted),
            Err(err) => collapse(Operation::Delete, err, 0),
        }
    }
}

fn collapse<T>(operation: Operation, err: DBError, fallback: T) -> Result<T, DBError> {
    if err.is_validation() {
        return Err(err);
    }

    error!("[MongoDB][{}] Error: {}", operation, err);
    Ok(fallback)
}
