use derive_more::{Display, From};
use serde::Deserialize;
use serde_valid::yaml::FromYamlStr;
use serde_valid::Validate;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 27017;
const DEFAULT_AUTH_SOURCE: &str = "aac";

// Config Type
#[derive(Debug, Clone)]
pub struct Config {
    // How to reach the MongoDB deployment
    pub connection: ConnectionConfig,
    // Which database and collection the adapter binds to
    pub target: TargetConfig,
}

impl Config {
    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let config_file_content = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&config_file_content)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let raw_config = RawConfig::from_yaml_str(s)?;

        Ok(Config { connection: raw_config.connection, target: raw_config.target })
    }
}

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("Serde Error: {}", _0)]
    SerdeError(serde_valid::Error<serde_yaml::Error>),

    #[display("Error Reading Config File: {}", _0)]
    IoError(std::io::Error),
}

// Intermediate Config Type as Deserialization Target
#[derive(Debug, Deserialize, Validate)]
pub struct RawConfig {
    #[serde(default)]
    #[validate]
    pub connection: ConnectionConfig,
    #[validate]
    pub target: TargetConfig,
}

/// Connection parameters for a single MongoDB deployment.
///
/// Credentials are only applied when both `username` and `password` are
/// present and non-empty, see [`ConnectionConfig::credentials`].
#[derive(Debug, Deserialize, Validate, Clone, PartialEq)]
pub struct ConnectionConfig {
    // User to authenticate as
    pub username: Option<String>,
    // Password for the user above
    pub password: Option<String>,
    // Hostname of the server (or one member of the replica set)
    #[serde(default = "default_host")]
    #[validate(min_length = 1)]
    pub host: String,
    // Port the server listens on
    #[serde(default = "default_port")]
    #[validate(minimum = 1)]
    pub port: u16,
    // Database the user was created in
    #[serde(default = "default_auth_source")]
    #[validate(min_length = 1)]
    pub auth_source: String,
    // Whether to connect over TLS
    #[serde(default)]
    pub tls: bool,
    // Replica set name, if the deployment is one
    pub replica_set: Option<String>,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, ..Default::default() }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_auth_source(mut self, auth_source: impl Into<String>) -> Self {
        self.auth_source = auth_source.into();
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_replica_set(mut self, replica_set: impl Into<String>) -> Self {
        self.replica_set = Some(replica_set.into());
        self
    }

    /// Username and password, only if both are set and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }

    pub fn replica_set(&self) -> Option<&str> {
        self.replica_set.as_deref().filter(|name| !name.is_empty())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            host: default_host(),
            port: default_port(),
            auth_source: default_auth_source(),
            tls: false,
            replica_set: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, Clone, PartialEq)]
pub struct TargetConfig {
    // The database holding the collection
    #[validate(min_length = 1)]
    pub database: String,
    // The collection every operation runs against
    #[validate(min_length = 1)]
    pub collection: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_auth_source() -> String {
    DEFAULT_AUTH_SOURCE.to_string()
}

pub fn get_sample_config() -> Config {
    Config::from_file("../../config.yaml.example").unwrap()
}
