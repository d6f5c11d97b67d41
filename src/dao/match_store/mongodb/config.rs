use std::time::Duration;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "match_tracker";
const URI_ENV: &str = "MONGO_URI";
const DB_ENV: &str = "MONGO_DB";

/// Connection settings for the MongoDB match store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub uri: String,
    pub database_name: String,
    /// Pings attempted at startup before giving up.
    pub connect_attempts: u32,
    pub initial_retry_delay: Duration,
    pub max_retry_delay: Duration,
}

impl MongoConfig {
    pub fn new(uri: impl Into<String>, database_name: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            database_name: database_name.unwrap_or(DEFAULT_DB).to_owned(),
            connect_attempts: 10,
            initial_retry_delay: Duration::from_millis(250),
            max_retry_delay: Duration::from_secs(5),
        }
    }

    /// Read `MONGO_URI` and the optional `MONGO_DB`.
    pub fn from_env() -> MongoResult<Self> {
        let uri = std::env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let database_name = std::env::var(DB_ENV).ok().filter(|name| !name.is_empty());
        Ok(Self::new(uri, database_name.as_deref()))
    }

    pub(super) async fn client_options(&self) -> MongoResult<ClientOptions> {
        ClientOptions::parse(&self.uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: self.uri.clone(),
                source,
            })
    }

    pub(super) fn next_retry_delay(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_retry_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_defaults_to_match_tracker() {
        let config = MongoConfig::new("mongodb://localhost:27017", None);
        assert_eq!(config.database_name, "match_tracker");
        assert_eq!(config.connect_attempts, 10);
    }

    #[test]
    fn retry_delay_doubles_up_to_cap() {
        let config = MongoConfig::new("mongodb://localhost:27017", Some("tracker"));
        assert_eq!(
            config.next_retry_delay(Duration::from_millis(250)),
            Duration::from_millis(500)
        );
        assert_eq!(
            config.next_retry_delay(Duration::from_secs(4)),
            Duration::from_secs(5)
        );
    }
}
