//! Bolt backend built on `neo4rs`

use crate::config::ConnectionConfig;
use crate::driver::{GraphDriver, RecordCursor, SessionBackend};
use crate::error::{ClientError, ClientResult, Phase};
use crate::record::Record;
use crate::statement::{ParamValue, Statement};
use async_trait::async_trait;
use neo4rs::{ConfigBuilder, DetachedRowStream, Graph, Query, Row};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Driver backed by a pooled `neo4rs::Graph`
pub struct Neo4jDriver {
    config: ConnectionConfig,
    graph: Graph,
    closed: AtomicBool,
}

impl Neo4jDriver {
    pub async fn connect(config: &ConnectionConfig) -> ClientResult<Self> {
        config.validate()?;
        let graph = build_graph(config, &config.database).await?;
        debug!(uri = %config.uri, database = %config.database, "Connected");
        Ok(Self {
            config: config.clone(),
            graph,
            closed: AtomicBool::new(false),
        })
    }
}

async fn build_graph(config: &ConnectionConfig, database: &str) -> ClientResult<Graph> {
    let driver_config = ConfigBuilder::default()
        .uri(config.uri.as_str())
        .user(config.username.as_str())
        .password(config.password.as_str())
        .db(database)
        .fetch_size(config.fetch_size)
        .max_connections(config.max_connections)
        .build()
        .map_err(|e| ClientError::config(e.to_string()))?;

    Graph::connect(driver_config)
        .map_err(|e| ClientError::from_driver(Phase::Connect, e.to_string()))
}

#[async_trait]
impl GraphDriver for Neo4jDriver {
    async fn open_session(&self, database: &str) -> ClientResult<Box<dyn SessionBackend>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::DriverClosed);
        }

        // The pool is bound to one database; other databases get their own graph.
        let graph = if database == self.config.database {
            self.graph.clone()
        } else {
            build_graph(&self.config, database).await?
        };

        Ok(Box::new(Neo4jSession {
            graph: Some(graph),
        }))
    }

    async fn close(&self) -> ClientResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(ClientError::DriverClosed);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.config.uri, self.config.database)
    }
}

struct Neo4jSession {
    graph: Option<Graph>,
}

#[async_trait]
impl SessionBackend for Neo4jSession {
    async fn run(&mut self, statement: &Statement) -> ClientResult<Box<dyn RecordCursor>> {
        let graph = self.graph.as_ref().ok_or(ClientError::SessionClosed)?;
        let stream = graph
            .execute(to_query(statement))
            .await
            .map_err(|e| ClientError::from_driver(Phase::Run, e.to_string()))?;

        Ok(Box::new(Neo4jCursor {
            stream,
            columns: statement.columns().to_vec(),
        }))
    }

    async fn close(&mut self) -> ClientResult<()> {
        // Dropping the graph handle returns pooled connections.
        self.graph.take().map(drop).ok_or(ClientError::SessionClosed)
    }
}

struct Neo4jCursor {
    stream: DetachedRowStream,
    columns: Vec<String>,
}

#[async_trait]
impl RecordCursor for Neo4jCursor {
    async fn next(&mut self) -> ClientResult<Option<Record>> {
        let row = self
            .stream
            .next()
            .await
            .map_err(|e| ClientError::from_driver(Phase::Fetch, e.to_string()))?;

        row.map(|row| decode_row(&row, &self.columns)).transpose()
    }
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params()
        .iter()
        .fold(neo4rs::query(statement.text()), |query, (key, value)| {
            match value {
                ParamValue::String(s) => query.param(key, s.as_str()),
                ParamValue::Integer(i) => query.param(key, *i),
                ParamValue::Float(f) => query.param(key, *f),
                ParamValue::Boolean(b) => query.param(key, *b),
            }
        })
}

fn decode_row(row: &Row, columns: &[String]) -> ClientResult<Record> {
    let mut record = Record::new();
    for column in columns {
        let value: serde_json::Value =
            row.get(column).map_err(|e| ClientError::DecodeError {
                field: column.clone(),
                reason: e.to_string(),
            })?;
        record.insert(column.as_str(), value);
    }
    Ok(record)
}
