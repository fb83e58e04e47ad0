//! In-process driver for exercising the client without a server
//!
//! The mock can be configured to return rows, refuse the connection, reject
//! credentials, fail a statement, or fail part way through a result. Every
//! session open/close and driver close is counted so tests can assert that
//! resources are released exactly once.

use crate::driver::{GraphDriver, RecordCursor, SessionBackend};
use crate::error::{ClientError, ClientResult};
use crate::record::Record;
use crate::statement::Statement;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the mock server responds
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Every statement returns these records
    Rows(Vec<Record>),
    /// Opening a session fails as if the host were down
    Unreachable,
    /// Opening a session fails with an authentication error
    RejectCredentials,
    /// Running a statement fails with this message
    FailQuery(String),
    /// Returns `after` records of `rows`, then fails
    FailAfter { rows: Vec<Record>, after: usize },
}

impl MockBehavior {
    pub fn rows(rows: Vec<Record>) -> Self {
        MockBehavior::Rows(rows)
    }
}

/// Release and traffic counters shared between the mock and the test
#[derive(Debug, Default)]
pub struct MockCounters {
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    driver_closes: AtomicUsize,
    statements_run: AtomicUsize,
    last_database: Mutex<Option<String>>,
    last_statement: Mutex<Option<Statement>>,
}

impl MockCounters {
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn driver_closes(&self) -> usize {
        self.driver_closes.load(Ordering::SeqCst)
    }

    pub fn statements_run(&self) -> usize {
        self.statements_run.load(Ordering::SeqCst)
    }

    pub fn last_database(&self) -> Option<String> {
        self.last_database.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.last_statement.lock().ok().and_then(|g| g.clone())
    }

    /// Sessions opened but not yet closed
    pub fn open_sessions(&self) -> usize {
        self.sessions_opened()
            .saturating_sub(self.sessions_closed())
    }
}

/// Scriptable [`GraphDriver`]
pub struct MockDriver {
    behavior: MockBehavior,
    counters: Arc<MockCounters>,
}

impl MockDriver {
    pub fn new(behavior: MockBehavior) -> (Self, Arc<MockCounters>) {
        let counters = Arc::new(MockCounters::default());
        (
            Self {
                behavior,
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }
}

#[async_trait]
impl GraphDriver for MockDriver {
    async fn open_session(&self, database: &str) -> ClientResult<Box<dyn SessionBackend>> {
        if self.counters.driver_closes() > 0 {
            return Err(ClientError::DriverClosed);
        }
        match &self.behavior {
            MockBehavior::Unreachable => {
                return Err(ClientError::ConnectionError(
                    "connection refused (os error 111)".to_string(),
                ))
            }
            MockBehavior::RejectCredentials => {
                return Err(ClientError::AuthenticationError(
                    "The client is unauthorized due to authentication failure.".to_string(),
                ))
            }
            _ => {}
        }

        self.counters.sessions_opened.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.counters.last_database.lock() {
            *last = Some(database.to_string());
        }

        Ok(Box::new(MockSession {
            behavior: self.behavior.clone(),
            counters: Arc::clone(&self.counters),
            closed: false,
        }))
    }

    async fn close(&self) -> ClientResult<()> {
        if self.counters.driver_closes.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(ClientError::DriverClosed);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "mock://in-process".to_string()
    }
}

struct MockSession {
    behavior: MockBehavior,
    counters: Arc<MockCounters>,
    closed: bool,
}

#[async_trait]
impl SessionBackend for MockSession {
    async fn run(&mut self, statement: &Statement) -> ClientResult<Box<dyn RecordCursor>> {
        if self.closed {
            return Err(ClientError::SessionClosed);
        }
        self.counters.statements_run.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.counters.last_statement.lock() {
            *last = Some(statement.clone());
        }

        match &self.behavior {
            MockBehavior::FailQuery(message) => Err(ClientError::QueryError(message.clone())),
            MockBehavior::Rows(rows) => Ok(Box::new(MockCursor {
                rows: rows.iter().cloned().collect(),
                fail_when_drained: false,
            })),
            MockBehavior::FailAfter { rows, after } => Ok(Box::new(MockCursor {
                rows: rows.iter().take(*after).cloned().collect(),
                fail_when_drained: true,
            })),
            MockBehavior::Unreachable | MockBehavior::RejectCredentials => {
                Err(ClientError::ConnectionError("not connected".to_string()))
            }
        }
    }

    async fn close(&mut self) -> ClientResult<()> {
        if self.closed {
            return Err(ClientError::SessionClosed);
        }
        self.closed = true;
        self.counters.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockCursor {
    rows: VecDeque<Record>,
    fail_when_drained: bool,
}

#[async_trait]
impl RecordCursor for MockCursor {
    async fn next(&mut self) -> ClientResult<Option<Record>> {
        match self.rows.pop_front() {
            Some(record) => Ok(Some(record)),
            None if self.fail_when_drained => Err(ClientError::ConnectionError(
                "connection reset by peer".to_string(),
            )),
            None => Ok(None),
        }
    }
}
