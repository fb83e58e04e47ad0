//! Backend seams between the client and a concrete driver

use crate::error::ClientResult;
use crate::record::Record;
use crate::statement::Statement;
use async_trait::async_trait;

/// A connection to a graph database server
#[async_trait]
pub trait GraphDriver: Send + Sync {
    /// Open a session bound to `database`
    async fn open_session(&self, database: &str) -> ClientResult<Box<dyn SessionBackend>>;

    /// Release every connection held by the driver
    async fn close(&self) -> ClientResult<()>;

    /// Human readable target, for logs
    fn describe(&self) -> String;
}

/// Driver side of a session
#[async_trait]
pub trait SessionBackend: Send {
    async fn run(&mut self, statement: &Statement) -> ClientResult<Box<dyn RecordCursor>>;

    async fn close(&mut self) -> ClientResult<()>;
}

/// Pull-based sequence of records
#[async_trait]
pub trait RecordCursor: Send {
    /// Next record, or `None` once the result is exhausted
    async fn next(&mut self) -> ClientResult<Option<Record>>;
}
