//! Client entry point: owns a driver and hands out sessions

use crate::config::ConnectionConfig;
use crate::driver::GraphDriver;
use crate::error::{ClientError, ClientResult};
use crate::neo4j::Neo4jDriver;
use crate::record::Record;
use crate::session::Session;
use crate::statement::Statement;
use tracing::{debug, info, warn};

/// Graph database client
pub struct Client {
    driver: Box<dyn GraphDriver>,
    default_database: String,
    closed: bool,
}

impl Client {
    /// Connect to the server described by `config` over Bolt
    pub async fn connect(config: &ConnectionConfig) -> ClientResult<Self> {
        let driver = Neo4jDriver::connect(config).await?;
        Ok(Self::with_driver(Box::new(driver), config.database.clone()))
    }

    /// Wrap an already constructed driver
    pub fn with_driver(driver: Box<dyn GraphDriver>, default_database: impl Into<String>) -> Self {
        let default_database = default_database.into();
        debug!(target_db = %default_database, driver = %driver.describe(), "Client created");
        Self {
            driver,
            default_database,
            closed: false,
        }
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Open a session bound to `database`
    pub async fn session(&self, database: &str) -> ClientResult<Session> {
        if self.closed {
            return Err(ClientError::DriverClosed);
        }
        let backend = self.driver.open_session(database).await?;
        Ok(Session::new(database, backend))
    }

    /// Run one statement on the default database
    pub async fn execute(&self, statement: &Statement) -> ClientResult<Vec<Record>> {
        self.execute_on(&self.default_database, statement).await
    }

    /// Run one statement in a fresh session on `database`, collecting every
    /// record. The session is closed whether or not the statement succeeds.
    pub async fn execute_on(
        &self,
        database: &str,
        statement: &Statement,
    ) -> ClientResult<Vec<Record>> {
        let mut session = self.session(database).await?;
        let outcome = session.collect(statement).await;
        let closed = session.close().await;

        match (outcome, closed) {
            (Ok(records), Ok(())) => {
                info!(database, rows = records.len(), "Query returned");
                Ok(records)
            }
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(error = %close_err, "Session close failed after query error");
                Err(err)
            }
        }
    }

    /// Release the driver and every connection it holds
    pub async fn close(mut self) -> ClientResult<()> {
        self.closed = true;
        debug!(driver = %self.driver.describe(), "Closing client");
        self.driver.close().await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if !self.closed {
            warn!(driver = %self.driver.describe(), "Client dropped without close");
        }
    }
}
