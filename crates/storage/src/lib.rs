pub use db_provider::{DBProvider, Operation};
pub use errors::DBError;
pub use lenient::{Crud, LenientCrud};
pub use mongodb::bson;
pub use mongodb_client::MongoDBClient;

pub mod db_provider;
pub mod errors;
pub mod lenient;
pub mod mongodb_client;
pub mod validation;
