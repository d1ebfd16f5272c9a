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

//! HTTP client for the BigQuery v2 REST API.

use super::wire::{DataFormatOptions, ErrorResponse, JobReference, QueryRequest, QueryResponse};
use super::{ClientConfig, ClientHandle, Connector};
use crate::auth::{AmbientCredentials, Credentials, DEFAULT_SCOPE_URIS};
use crate::error::{io_error, BigQueryErrorHelper, Error, Result};
use crate::reader::PageReader;
use crate::result::QueryResult;
use crate::runtime::shared_runtime;
use driverbase::error::ErrorHelper;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::runtime::Runtime;

/// How long the service may hold a request waiting for the job to finish.
const JOB_WAIT_MS: u64 = 10_000;

/// Opens [`BigQueryClient`]s sharing one configuration.
#[derive(Debug, Clone, Default)]
pub struct BigQueryConnector {
    config: ClientConfig,
}

impl BigQueryConnector {
    /// Creates a connector with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Returns the connector configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Connector for BigQueryConnector {
    type Client = BigQueryClient;

    fn connect_default(&self) -> Result<BigQueryClient> {
        let uris: Vec<String> = DEFAULT_SCOPE_URIS.iter().map(|s| s.to_string()).collect();
        let credentials = shared_runtime()?.block_on(AmbientCredentials::discover(&uris))?;
        BigQueryClient::new(self.config.clone(), credentials)
    }

    fn connect(&self, credentials: Credentials) -> Result<BigQueryClient> {
        BigQueryClient::new(self.config.clone(), credentials)
    }
}

/// A blocking BigQuery client.
///
/// Each query runs as a `jobs.query` call followed by as many
/// `jobs.getQueryResults` calls as it takes for the job to finish and every
/// page to arrive.
#[derive(Debug)]
pub struct BigQueryClient {
    config: ClientConfig,
    credentials: Credentials,
    http: Option<reqwest::Client>,
    runtime: &'static Runtime,
}

impl BigQueryClient {
    /// Creates a client from explicit credentials.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| io_error(e, "build the HTTP client"))?;
        Ok(Self {
            config,
            credentials,
            http: Some(http),
            runtime: shared_runtime()?,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns true once [`ClientHandle::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.http.is_none()
    }

    async fn run_query(&self, http: &reqwest::Client, sql: &str) -> Result<QueryResult> {
        let project_id = self.credentials.project_id();
        let request = QueryRequest {
            query: sql,
            use_legacy_sql: false,
            format_options: DataFormatOptions {
                use_int64_timestamp: true,
            },
            timeout_ms: JOB_WAIT_MS,
            max_results: self.config.page_size,
            location: self.config.location.as_deref(),
        };
        let url = queries_url(&self.config.endpoint, project_id);
        let mut page: QueryResponse = self.send(http.post(&url).json(&request)).await?;

        let mut reader = PageReader::new();
        loop {
            reader.push(&page)?;
            if page.job_complete && page.page_token.is_none() {
                break;
            }

            let job = page.job_reference.as_ref().ok_or_else(|| {
                BigQueryErrorHelper::io()
                    .message("response has no job reference")
                    .context("fetch query results")
            })?;
            let url = query_results_url(&self.config.endpoint, project_id, &job.job_id);
            let params = results_params(&self.config, job, page.page_token.as_deref());
            tracing::trace!(job_id = %job.job_id, job_complete = page.job_complete, "Fetching query results");
            page = self.send(http.get(&url).query(&params)).await?;
        }

        tracing::debug!(
            rows = reader.row_count(),
            total_rows = ?page.total_rows,
            "Fetched all result pages"
        );
        Ok(reader.finish())
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let auth_header = self.credentials.provider().get_auth_header().await?;
        let response = request
            .header(reqwest::header::AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| io_error(e, "execute query"))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| io_error(e, "read the query response"))?;
        if !status.is_success() {
            return Err(service_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| io_error(e, "decode the query response"))
    }
}

impl ClientHandle for BigQueryClient {
    fn project_id(&self) -> &str {
        self.credentials.project_id()
    }

    fn query(&mut self, sql: &str) -> Result<QueryResult> {
        let http = self.http.as_ref().ok_or_else(|| {
            BigQueryErrorHelper::invalid_state().message("query on a closed BigQuery client")
        })?;
        self.runtime.block_on(self.run_query(http, sql))
    }

    fn close(&mut self) {
        if self.http.take().is_some() {
            tracing::debug!(project_id = self.credentials.project_id(), "Closed BigQuery client");
        }
    }
}

fn queries_url(endpoint: &str, project_id: &str) -> String {
    format!("{endpoint}/projects/{project_id}/queries")
}

fn query_results_url(endpoint: &str, project_id: &str, job_id: &str) -> String {
    format!("{endpoint}/projects/{project_id}/queries/{job_id}")
}

fn results_params(
    config: &ClientConfig,
    job: &JobReference,
    page_token: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("timeoutMs", JOB_WAIT_MS.to_string()),
        ("formatOptions.useInt64Timestamp", "true".to_string()),
    ];
    if let Some(location) = job.location.as_ref().or(config.location.as_ref()) {
        params.push(("location", location.clone()));
    }
    if let Some(page_size) = config.page_size {
        params.push(("maxResults", page_size.to_string()));
    }
    if let Some(token) = page_token {
        params.push(("pageToken", token.to_string()));
    }
    params
}

/// Builds the error for a non-2xx response, preferring the service's message.
fn service_error(status: StatusCode, body: &[u8]) -> Error {
    let message = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(doc) => match doc.error.status {
            Some(code) => format!("{} ({code})", doc.error.message),
            None => doc.error.message,
        },
        Err(_) => format!("HTTP {status}"),
    };
    BigQueryErrorHelper::io()
        .message(message)
        .context("execute query")
}
