use std::time::Duration;

use async_trait::async_trait;
use derive_more::Display;
use futures::TryStreamExt;
use log::{debug, info};
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::{ClientOptions, Credential, ServerAddress, Tls, TlsOptions},
    Client, Collection,
};
use serde::{de::DeserializeOwned, Serialize};

use config::ConnectionConfig;

use crate::db_provider::Operation;
use crate::validation::{expect_mapping, expect_update_spec};
use crate::{DBError, DBProvider};

pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_millis(5000);

/// A live client bound to one collection for its whole lifetime.
///
/// Construction either yields a reachable, bound client or fails with
/// [`DBError::ConnectionFailed`]. Share it behind an `Arc` and release it
/// with [`MongoDBClient::shutdown`].
#[derive(Debug, Display)]
#[display(
    "MongoDBClient {{ db_name: {}, collection_name: {} }}",
    db_name,
    collection_name
)]
pub struct MongoDBClient {
    client: Client,
    collection: Collection<Document>,
    db_name: String,
    collection_name: String,
}

impl MongoDBClient {
    pub async fn new(
        config: &ConnectionConfig,
        db_name: impl Into<String>,
        collection_name: impl Into<String>,
    ) -> Result<Self, DBError> {
        info!("Connecting to MongoDB at {}:{}", config.host, config.port);

        let client =
            Self::connect(config).await.map_err(|e| DBError::ConnectionFailed(e.to_string()))?;
        let provider = Self::from_client(client, db_name.into(), collection_name.into());

        info!("Connected to MongoDB, bound to {}.{}", provider.db_name, provider.collection_name);
        Ok(provider)
    }

    async fn connect(config: &ConnectionConfig) -> Result<Client, mongodb::error::Error> {
        let client = Client::with_options(client_options(config))?;
        // Selecting a server is lazy; ping so failures show up here
        client.database("admin").run_command(doc! { "ping": 1 }, None).await?;
        Ok(client)
    }

    pub(crate) fn from_client(client: Client, db_name: String, collection_name: String) -> Self {
        let collection = client.database(&db_name).collection(&collection_name);
        Self { client, collection, db_name, collection_name }
    }

    pub fn get_collection(&self) -> &Collection<Document> {
        &self.collection
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Closes the connection pool, waiting for in-flight operations.
    pub async fn shutdown(self) {
        info!("Shutting down MongoDB client for {}.{}", self.db_name, self.collection_name);
        self.client.shutdown().await;
    }

    pub fn to_document<T: Serialize>(&self, item: &T) -> Result<Document, DBError> {
        let doc = bson::to_bson(item)?
            .as_document()
            .cloned()
            .ok_or_else(|| DBError::Other("Failed to convert item to BSON document".to_string()))?;
        Ok(doc)
    }

    pub fn from_document<T: DeserializeOwned>(&self, doc: Document) -> Result<T, DBError> {
        let item = bson::from_bson(Bson::Document(doc))?;
        Ok(item)
    }
}

/// Driver options for `config`: fixed timeouts, credentials only when both
/// halves are present, replica set only when named.
pub fn client_options(config: &ConnectionConfig) -> ClientOptions {
    let tls = if config.tls { Tls::Enabled(TlsOptions::default()) } else { Tls::Disabled };
    let mut options = ClientOptions::builder()
        .hosts(vec![ServerAddress::Tcp { host: config.host.clone(), port: Some(config.port) }])
        .connect_timeout(CONNECT_TIMEOUT)
        .server_selection_timeout(SERVER_SELECTION_TIMEOUT)
        .tls(tls)
        .build();

    if let Some((username, password)) = config.credentials() {
        options.credential = Some(
            Credential::builder()
                .username(username.to_string())
                .password(password.to_string())
                .source(config.auth_source.clone())
                .build(),
        );
    }

    if let Some(replica_set) = config.replica_set() {
        options.repl_set_name = Some(replica_set.to_string());
    }

    options
}

#[async_trait]
impl DBProvider for MongoDBClient {
    async fn create(&self, document: Bson) -> Result<Bson, DBError> {
        let document = expect_mapping(Operation::Create, document)?;
        debug!("Inserting into {}: {}", self.collection_name, document);

        let result = self.collection.insert_one(document, None).await?;
        Ok(result.inserted_id)
    }

    async fn read(&self, query: Bson) -> Result<Vec<Document>, DBError> {
        let query = expect_mapping(Operation::Read, query)?;
        debug!("Finding in {}: {}", self.collection_name, query);

        let cursor = self.collection.find(query, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn update(&self, query: Bson, update: Bson, many: bool) -> Result<u64, DBError> {
        let query = expect_mapping(Operation::Update, query)?;
        let update = expect_update_spec(update)?;
        debug!("Updating (many: {}) in {}: {} with {}", many, self.collection_name, query, update);

        let result = if many {
            self.collection.update_many(query, update, None).await?
        } else {
            self.collection.update_one(query, update, None).await?
        };
        Ok(result.modified_count)
    }

    async fn delete(&self, query: Bson, many: bool) -> Result<u64, DBError> {
        let query = expect_mapping(Operation::Delete, query)?;
        debug!("Deleting (many: {}) from {}: {}", many, self.collection_name, query);

        let result = if many {
            self.collection.delete_many(query, None).await?
        } else {
            self.collection.delete_one(query, None).await?
        };
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{doc, Bson};
    use mongodb::options::{ServerAddress, Tls};
    use mongodb::Client;
    use serde::{Deserialize, Serialize};

    use config::ConnectionConfig;

    use super::{client_options, CONNECT_TIMEOUT, SERVER_SELECTION_TIMEOUT};
    use crate::{DBError, DBProvider, MongoDBClient};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Animal {
        name: String,
        species: String,
    }

    // Nothing listens here, so any I/O would fail after server selection
    fn unreachable_config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", 1)
    }

    fn unconnected_client() -> MongoDBClient {
        let client = Client::with_options(client_options(&unreachable_config())).unwrap();
        MongoDBClient::from_client(client, "aac".to_string(), "animals".to_string())
    }

    #[test]
    fn test_options_without_credentials() {
        let options = client_options(&ConnectionConfig::new("db.internal", 27018));

        assert_eq!(
            options.hosts,
            vec![ServerAddress::Tcp { host: "db.internal".to_string(), port: Some(27018) }]
        );
        assert_eq!(options.connect_timeout, Some(CONNECT_TIMEOUT));
        assert_eq!(options.server_selection_timeout, Some(SERVER_SELECTION_TIMEOUT));
        assert!(matches!(options.tls, Some(Tls::Disabled)));
        assert!(options.credential.is_none());
        assert!(options.repl_set_name.is_none());
    }

    #[test]
    fn test_options_with_credentials_tls_and_replica_set() {
        let config = ConnectionConfig::default()
            .with_credentials("aacuser", "secret")
            .with_auth_source("admin")
            .with_tls(true)
            .with_replica_set("rs0");
        let options = client_options(&config);

        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("aacuser"));
        assert_eq!(credential.password.as_deref(), Some("secret"));
        assert_eq!(credential.source.as_deref(), Some("admin"));
        assert!(matches!(options.tls, Some(Tls::Enabled(_))));
        assert_eq!(options.repl_set_name.as_deref(), Some("rs0"));
    }

    #[test]
    fn test_options_ignore_half_credentials() {
        let mut config = ConnectionConfig::default();
        config.username = Some("aacuser".to_string());
        assert!(client_options(&config).credential.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_construction() {
        let result = MongoDBClient::new(&unreachable_config(), "aac", "animals").await;
        assert!(matches!(result, Err(DBError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_non_mapping_input_is_rejected_before_io() {
        let provider = unconnected_client();

        let err = provider.create(Bson::String("Rex".to_string())).await.unwrap_err();
        assert!(err.is_validation());

        let err = provider.read(Bson::Int32(1)).await.unwrap_err();
        assert!(err.is_validation());

        let err = provider
            .update(Bson::String("Rex".to_string()), doc! { "$set": { "a": 1 } }.into(), false)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = provider
            .update(doc! { "name": "Rex" }.into(), doc! { "species": "Canine" }.into(), true)
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = provider.delete(Bson::Null, true).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_document_conversion() {
        let provider = unconnected_client();
        let rex = Animal { name: "Rex".to_string(), species: "Dog".to_string() };

        let document = provider.to_document(&rex).unwrap();
        assert_eq!(document, doc! { "name": "Rex", "species": "Dog" });

        let animal: Animal = provider.from_document(document).unwrap();
        assert_eq!(animal, rex);
    }

    #[tokio::test]
    async fn test_display_names_target() {
        let provider = unconnected_client();
        assert_eq!(provider.db_name(), "aac");
        assert_eq!(provider.collection_name(), "animals");
        assert_eq!(provider.to_string(), "MongoDBClient { db_name: aac, collection_name: animals }");
    }
}
