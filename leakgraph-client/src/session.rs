//! Database-scoped sessions

use crate::driver::{RecordCursor, SessionBackend};
use crate::error::{ClientError, ClientResult};
use crate::record::Record;
use crate::statement::Statement;
use tracing::{debug, warn};

/// A handle bound to one database.
///
/// `close` consumes the session, so it cannot be used after release. A
/// session dropped without `close` still frees its backend but logs a warning.
pub struct Session {
    database: String,
    backend: Option<Box<dyn SessionBackend>>,
}

impl Session {
    pub fn new(database: impl Into<String>, backend: Box<dyn SessionBackend>) -> Self {
        Self {
            database: database.into(),
            backend: Some(backend),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Run a statement and return a cursor over its records
    pub async fn run(&mut self, statement: &Statement) -> ClientResult<Box<dyn RecordCursor>> {
        statement.validate()?;
        let backend = self.backend.as_mut().ok_or(ClientError::SessionClosed)?;
        debug!(database = %self.database, "Running statement");
        backend.run(statement).await
    }

    /// Run a statement and drain every record before returning
    pub async fn collect(&mut self, statement: &Statement) -> ClientResult<Vec<Record>> {
        let mut cursor = self.run(statement).await?;
        let mut records = Vec::new();
        while let Some(record) = cursor.next().await? {
            records.push(record);
        }
        debug!(database = %self.database, rows = records.len(), "Statement complete");
        Ok(records)
    }

    pub async fn close(mut self) -> ClientResult<()> {
        match self.backend.take() {
            Some(mut backend) => {
                debug!(database = %self.database, "Closing session");
                backend.close().await
            }
            None => Err(ClientError::SessionClosed),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.backend.is_some() {
            warn!(database = %self.database, "Session dropped without close");
        }
    }
}
