use mongodb::{Client, Database, bson::doc};
use tokio::time::sleep;
use tracing::{debug, info};

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Open the configured database, pinging until the server answers or attempts run out.
pub(super) async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let options = config.client_options().await?;
    let client = Client::with_options(options)
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut delay = config.initial_retry_delay;
    let mut attempt = 1;
    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => {
                info!(database = %config.database_name, attempt, "connected to MongoDB");
                return Ok(database);
            }
            Err(source) if attempt >= config.connect_attempts => {
                return Err(MongoDaoError::InitialPing {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                debug!(attempt, error = %err, retry_in = ?delay, "MongoDB not reachable yet");
                sleep(delay).await;
                delay = config.next_retry_delay(delay);
                attempt += 1;
            }
        }
    }
}
