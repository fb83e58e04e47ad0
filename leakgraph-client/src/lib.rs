//! Leakgraph client
//!
//! Connects to a Bolt graph database, opens a database-scoped session, runs a
//! parameterized Cypher statement and returns the rows as ordered records.
//! Pooling and the wire protocol are handled by `neo4rs`; this crate adds
//! configuration layering, address validation, deterministic release of
//! sessions and clients, and the officer traversal.
//!
//! ```no_run
//! use leakgraph_client::{run_query, Client, ConnectionConfig, OfficerLookup};
//!
//! # async fn demo() -> leakgraph_client::ClientResult<()> {
//! let config = ConnectionConfig::default();
//! let statement = OfficerLookup::default().statement()?;
//! let client = Client::connect(&config).await?;
//! for record in run_query(client, &config.database, &statement).await? {
//!     println!("{}", record.get_str("name")?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod lookup;
pub mod mocks;
pub mod neo4j;
pub mod record;
pub mod session;
pub mod statement;

pub use address::{BoltAddress, Scheme, DEFAULT_BOLT_PORT};
pub use client::Client;
pub use config::{ConnectionConfig, LeakgraphConfig, LookupConfig};
pub use driver::{GraphDriver, RecordCursor, SessionBackend};
pub use error::{ClientError, ClientResult};
pub use lookup::{run_query, OfficerLookup};
pub use record::{render_value, Record};
pub use session::Session;
pub use statement::{ParamValue, Statement};
