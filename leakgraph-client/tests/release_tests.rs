//! Session and client release on success and failure paths

use leakgraph_client::mocks::{MockBehavior, MockDriver};
use leakgraph_client::{run_query, Client, ClientError, OfficerLookup, Record, Statement};
use serde_json::Value;

fn officers() -> Vec<Record> {
    vec![
        Record::new().with("name", "Alpha Holdings Ltd"),
        Record::new().with("name", "Beta Nominees SA"),
        Record::new().with("name", "12 Harbour Road"),
    ]
}

#[tokio::test]
async fn test_success_returns_rows_and_releases_once() {
    let (driver, counters) = MockDriver::new(MockBehavior::rows(officers()));
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = OfficerLookup::default().statement().unwrap();

    let records = run_query(client, "neo4j", &statement).await.unwrap();

    let names: Vec<&str> = records.iter().map(|r| r.get_str("name").unwrap()).collect();
    assert_eq!(
        names,
        vec!["Alpha Holdings Ltd", "Beta Nominees SA", "12 Harbour Road"]
    );
    assert_eq!(counters.sessions_opened(), 1);
    assert_eq!(counters.sessions_closed(), 1);
    assert_eq!(counters.driver_closes(), 1);
    assert_eq!(counters.statements_run(), 1);
}

#[tokio::test]
async fn test_parameters_reach_driver() {
    let (driver, counters) = MockDriver::new(MockBehavior::rows(vec![]));
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let lookup = OfficerLookup {
        name: "Jane Roe".into(),
        max_hops: 3,
        limit: 7,
    };

    let records = run_query(client, "offshore", &lookup.statement().unwrap())
        .await
        .unwrap();
    assert!(records.is_empty());

    let sent = counters.last_statement().unwrap();
    assert!(sent.text().contains("*..3]"));
    assert_eq!(
        sent.get_param("name"),
        Some(&leakgraph_client::ParamValue::String("Jane Roe".into()))
    );
    assert_eq!(counters.last_database().as_deref(), Some("offshore"));
}

#[tokio::test]
async fn test_unreachable_server_fails_once_without_rows() {
    let (driver, counters) = MockDriver::new(MockBehavior::Unreachable);
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = OfficerLookup::default().statement().unwrap();

    let err = run_query(client, "neo4j", &statement).await.unwrap_err();

    assert!(matches!(err, ClientError::ConnectionError(_)));
    assert!(err.is_connection_failure());
    assert_eq!(counters.sessions_opened(), 0);
    assert_eq!(counters.statements_run(), 0);
    assert_eq!(counters.driver_closes(), 1);
}

#[tokio::test]
async fn test_rejected_credentials() {
    let (driver, counters) = MockDriver::new(MockBehavior::RejectCredentials);
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = OfficerLookup::default().statement().unwrap();

    let err = run_query(client, "neo4j", &statement).await.unwrap_err();

    assert!(matches!(err, ClientError::AuthenticationError(_)));
    assert_eq!(counters.open_sessions(), 0);
    assert_eq!(counters.driver_closes(), 1);
}

#[tokio::test]
async fn test_query_failure_releases_session_and_client() {
    let (driver, counters) = MockDriver::new(MockBehavior::FailQuery(
        "Invalid input 'MATHC': expected 'MATCH'".into(),
    ));
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = OfficerLookup::default().statement().unwrap();

    let err = run_query(client, "neo4j", &statement).await.unwrap_err();

    assert!(matches!(err, ClientError::QueryError(_)));
    assert_eq!(counters.sessions_opened(), 1);
    assert_eq!(counters.sessions_closed(), 1);
    assert_eq!(counters.driver_closes(), 1);
}

#[tokio::test]
async fn test_mid_stream_failure_yields_no_partial_rows() {
    let (driver, counters) = MockDriver::new(MockBehavior::FailAfter {
        rows: officers(),
        after: 2,
    });
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = OfficerLookup::default().statement().unwrap();

    let result = run_query(client, "neo4j", &statement).await;

    assert!(result.is_err());
    assert_eq!(counters.sessions_closed(), 1);
    assert_eq!(counters.driver_closes(), 1);
}

#[tokio::test]
async fn test_invalid_statement_still_closes_client() {
    let (driver, counters) = MockDriver::new(MockBehavior::rows(officers()));
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = Statement::new("RETURN $missing AS name").returns(["name"]);

    let err = run_query(client, "neo4j", &statement).await.unwrap_err();

    assert!(matches!(err, ClientError::QueryError(_)));
    assert_eq!(counters.sessions_opened(), 0);
    assert_eq!(counters.driver_closes(), 1);
}

#[tokio::test]
async fn test_session_cannot_outlive_client_close() {
    let (driver, counters) = MockDriver::new(MockBehavior::rows(officers()));
    let client = Client::with_driver(Box::new(driver), "neo4j");

    let mut session = client.session("neo4j").await.unwrap();
    let statement = Statement::new("MATCH (n) RETURN n.name AS name").returns(["name"]);
    let records = session.collect(&statement).await.unwrap();
    assert_eq!(records.len(), 3);
    session.close().await.unwrap();

    client.close().await.unwrap();
    assert_eq!(counters.sessions_closed(), 1);
    assert_eq!(counters.driver_closes(), 1);
}

#[tokio::test]
async fn test_null_name_is_decode_error() {
    let rows = vec![Record::new().with("name", Value::Null)];
    let (driver, _counters) = MockDriver::new(MockBehavior::rows(rows));
    let client = Client::with_driver(Box::new(driver), "neo4j");
    let statement = OfficerLookup::default().statement().unwrap();

    let records = run_query(client, "neo4j", &statement).await.unwrap();
    assert!(matches!(
        records[0].get_str("name"),
        Err(ClientError::DecodeError { .. })
    ));
}
