// Copyright (c) 2025 ADBC Drivers Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for client construction and query execution.
//!
//! No test talks to BigQuery; connectors, resolvers and handles are stubs
//! that count how they are used.

use adbc_core::error::Status;
use arrow_array::{Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use bigquery_table::auth::{CredentialResolver, Credentials};
use bigquery_table::{
    BigQueryErrorHelper, BigQueryConnector, ClientFactory, ClientHandle, Connector, QueryResult,
    QueryRunner, Result,
};
use driverbase::error::ErrorHelper;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Calls {
    default_connects: usize,
    explicit_connects: usize,
    resolved: Vec<Vec<String>>,
    queries: Vec<String>,
    closes: usize,
}

type SharedCalls = Arc<Mutex<Calls>>;

#[derive(Debug, Clone)]
enum Outcome {
    Table(QueryResult),
    Fail(String),
}

fn query_error(message: &str) -> bigquery_table::Error {
    BigQueryErrorHelper::invalid_state()
        .message(message.to_string())
        .context("execute query")
}

/// Asserts two errors agree on status and message, not only on display text.
fn assert_same_error(actual: bigquery_table::Error, expected: bigquery_table::Error) {
    let actual = actual.to_adbc();
    let expected = expected.to_adbc();
    assert_eq!(actual.status, Status::InvalidState);
    assert_eq!(actual.status, expected.status);
    assert_eq!(actual.message, expected.message);
}

#[derive(Debug)]
struct StubClient {
    calls: SharedCalls,
    outcome: Outcome,
    project_id: String,
}

impl ClientHandle for StubClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.calls.lock().unwrap().queries.push(sql.to_string());
        match &self.outcome {
            Outcome::Table(table) => Ok(table.clone()),
            Outcome::Fail(message) => Err(query_error(message)),
        }
    }

    fn close(&mut self) {
        self.calls.lock().unwrap().closes += 1;
    }
}

#[derive(Debug, Clone)]
struct StubConnector {
    calls: SharedCalls,
    outcome: Outcome,
    refuse: bool,
}

impl StubConnector {
    fn new(calls: &SharedCalls, outcome: Outcome) -> Self {
        Self {
            calls: Arc::clone(calls),
            outcome,
            refuse: false,
        }
    }

    fn client(&self, project_id: &str) -> StubClient {
        StubClient {
            calls: Arc::clone(&self.calls),
            outcome: self.outcome.clone(),
            project_id: project_id.to_string(),
        }
    }
}

impl Connector for StubConnector {
    type Client = StubClient;

    fn connect_default(&self) -> Result<StubClient> {
        self.calls.lock().unwrap().default_connects += 1;
        if self.refuse {
            return Err(BigQueryErrorHelper::io()
                .message("no ambient credentials")
                .context("find default credentials"));
        }
        Ok(self.client("default-project"))
    }

    fn connect(&self, credentials: Credentials) -> Result<StubClient> {
        self.calls.lock().unwrap().explicit_connects += 1;
        Ok(self.client(credentials.project_id()))
    }
}

#[derive(Debug, Clone)]
struct StubResolver {
    calls: SharedCalls,
}

impl CredentialResolver for StubResolver {
    fn resolve(&self, scope_uris: &[String]) -> Result<Credentials> {
        self.calls.lock().unwrap().resolved.push(scope_uris.to_vec());
        Ok(Credentials::from_access_token("token", "scoped-project"))
    }
}

fn three_by_two() -> QueryResult {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
        ],
    )
    .unwrap();
    QueryResult::new(schema, vec![batch])
}

#[test]
fn test_empty_scopes_never_resolve_credentials() {
    let calls = SharedCalls::default();
    let factory = ClientFactory::new(
        StubConnector::new(&calls, Outcome::Table(QueryResult::empty())),
        StubResolver {
            calls: Arc::clone(&calls),
        },
    );

    let client = factory.create_client(&[]).unwrap();
    assert_eq!(client.project_id(), "default-project");

    let calls = calls.lock().unwrap();
    assert!(calls.resolved.is_empty());
    assert_eq!(calls.default_connects, 1);
    assert_eq!(calls.explicit_connects, 0);
}

#[test]
fn test_scopes_resolve_exact_uri_set() {
    let calls = SharedCalls::default();
    let factory = ClientFactory::new(
        StubConnector::new(&calls, Outcome::Table(QueryResult::empty())),
        StubResolver {
            calls: Arc::clone(&calls),
        },
    );

    let client = factory.create_client(&["a", "b"]).unwrap();
    assert_eq!(client.project_id(), "scoped-project");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.resolved.len(), 1);
    let uris: HashSet<&str> = calls.resolved[0].iter().map(String::as_str).collect();
    let expected: HashSet<&str> = [
        "https://www.googleapis.com/auth/a",
        "https://www.googleapis.com/auth/b",
    ]
    .into_iter()
    .collect();
    assert_eq!(uris, expected);
    assert_eq!(calls.default_connects, 0);
    assert_eq!(calls.explicit_connects, 1);
}

#[test]
fn test_explicit_client_is_used_and_left_open() {
    let calls = SharedCalls::default();
    let connector = StubConnector::new(&calls, Outcome::Table(three_by_two()));
    let mut client = connector.client("caller-project");
    let runner = QueryRunner::new(connector);

    let result = runner
        .query_to_table("SELECT id, name FROM t", Some(&mut client))
        .unwrap();
    assert_eq!(result.shape(), (3, 2));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.default_connects, 0);
    assert_eq!(calls.queries, vec!["SELECT id, name FROM t".to_string()]);
    assert_eq!(calls.closes, 0);
}

#[test]
fn test_implicit_client_opened_used_and_closed_once() {
    let calls = SharedCalls::default();
    let runner = QueryRunner::new(StubConnector::new(&calls, Outcome::Table(three_by_two())));

    runner.query_to_table("SELECT 1", None).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.default_connects, 1);
    assert_eq!(calls.queries.len(), 1);
    assert_eq!(calls.closes, 1);
}

#[test]
fn test_fixed_result_returned_unchanged() {
    let calls = SharedCalls::default();
    let runner = QueryRunner::new(StubConnector::new(&calls, Outcome::Table(three_by_two())));

    let result = runner.query_to_table("SELECT id, name FROM t", None).unwrap();

    assert_eq!(result.shape(), (3, 2));
    assert_eq!(result.column_names(), vec!["id", "name"]);
    assert_eq!(result, three_by_two());
}

#[test]
fn test_query_error_propagated_and_implicit_client_closed() {
    let calls = SharedCalls::default();
    let runner = QueryRunner::new(StubConnector::new(
        &calls,
        Outcome::Fail("Syntax error: Unexpected keyword FROM".to_string()),
    ));

    let err = runner.query_to_table("SELECT FROM", None).unwrap_err();
    assert_eq!(
        err.to_string(),
        query_error("Syntax error: Unexpected keyword FROM").to_string()
    );
    assert_same_error(err, query_error("Syntax error: Unexpected keyword FROM"));

    let calls = calls.lock().unwrap();
    assert_eq!(calls.default_connects, 1);
    assert_eq!(calls.queries.len(), 1);
    assert_eq!(calls.closes, 1);
}

#[test]
fn test_query_error_on_explicit_client_leaves_it_open() {
    let calls = SharedCalls::default();
    let connector = StubConnector::new(&calls, Outcome::Fail("Access Denied".to_string()));
    let mut client = connector.client("caller-project");
    let runner = QueryRunner::new(connector);

    let err = runner
        .query_to_table("SELECT * FROM secret", Some(&mut client))
        .unwrap_err();
    assert_eq!(err.to_string(), query_error("Access Denied").to_string());
    assert_same_error(err, query_error("Access Denied"));
    assert_eq!(calls.lock().unwrap().closes, 0);
}

#[test]
fn test_connect_failure_propagated_without_query() {
    let calls = SharedCalls::default();
    let mut connector = StubConnector::new(&calls, Outcome::Table(three_by_two()));
    connector.refuse = true;
    let runner = QueryRunner::new(connector);

    let err = runner.query_to_table("SELECT 1", None).unwrap_err();
    assert!(err.to_string().contains("no ambient credentials"));

    let calls = calls.lock().unwrap();
    assert!(calls.queries.is_empty());
    assert_eq!(calls.closes, 0);
}

#[test]
fn test_factory_client_feeds_runner() {
    let calls = SharedCalls::default();
    let factory = ClientFactory::new(
        StubConnector::new(&calls, Outcome::Table(three_by_two())),
        StubResolver {
            calls: Arc::clone(&calls),
        },
    );
    let mut client = factory.create_client(&["drive"]).unwrap();
    let runner = QueryRunner::new(factory.connector().clone());

    let result = runner
        .query_to_table("SELECT * FROM sheet", Some(&mut client))
        .unwrap();
    assert_eq!(result.num_rows(), 3);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.default_connects, 0);
    assert_eq!(calls.closes, 0);
}

#[test]
fn test_bigquery_connector_with_scoped_credentials() {
    let calls = SharedCalls::default();
    let factory = ClientFactory::new(
        BigQueryConnector::default(),
        StubResolver {
            calls: Arc::clone(&calls),
        },
    );

    let mut client = factory.create_client(&["bigquery", "drive"]).unwrap();
    assert_eq!(client.project_id(), "scoped-project");
    assert_eq!(calls.lock().unwrap().resolved.len(), 1);

    client.close();
    assert!(client.is_closed());
}

mod logging {
    use super::*;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_query_logs_sql_and_shape() {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        let calls = SharedCalls::default();
        let runner = QueryRunner::new(StubConnector::new(&calls, Outcome::Table(three_by_two())));
        tracing::subscriber::with_default(subscriber, || {
            runner
                .query_to_table("SELECT id, name FROM logged_table", None)
                .unwrap();
        });

        let logs = buffer.contents();
        assert!(logs.contains("Querying BigQuery: SELECT id, name FROM logged_table"));
        assert!(logs.contains("Creating new BigQuery client"));
        assert!(logs.contains("Query result shape: (3, 2)"));
    }

    #[test]
    fn test_factory_logs_requested_scopes() {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        let calls = SharedCalls::default();
        let factory = ClientFactory::new(
            StubConnector::new(&calls, Outcome::Table(QueryResult::empty())),
            StubResolver {
                calls: Arc::clone(&calls),
            },
        );
        tracing::subscriber::with_default(subscriber, || {
            factory.create_client(&[]).unwrap();
            factory.create_client(&["drive"]).unwrap();
        });

        let logs = buffer.contents();
        assert!(logs.contains("Using default BigQuery client"));
        assert!(logs.contains("Using BigQuery client with auth scopes"));
        assert!(logs.contains("drive"));
    }
}

#[test]
fn test_traits_implemented() {
    fn assert_handle<T: ClientHandle>() {}
    fn assert_connector<T: Connector>() {}
    fn assert_resolver<T: CredentialResolver>() {}

    assert_handle::<bigquery_table::BigQueryClient>();
    assert_connector::<bigquery_table::BigQueryConnector>();
    assert_resolver::<bigquery_table::auth::AmbientCredentials>();
}
