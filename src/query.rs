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

//! Running a query into an in-memory table.

use crate::client::{BigQueryConnector, ClientConfig, ClientHandle, Connector};
use crate::error::Result;
use crate::result::QueryResult;
use std::ops::{Deref, DerefMut};

/// Closes a handle when dropped, on success and on error alike.
struct ScopedClient<C: ClientHandle> {
    inner: C,
}

impl<C: ClientHandle> Deref for ScopedClient<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.inner
    }
}

impl<C: ClientHandle> DerefMut for ScopedClient<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.inner
    }
}

impl<C: ClientHandle> Drop for ScopedClient<C> {
    fn drop(&mut self) {
        self.inner.close();
    }
}

/// Runs queries, opening a short-lived default client when none is given.
#[derive(Debug, Clone, Default)]
pub struct QueryRunner<C> {
    connector: C,
}

impl<C: Connector> QueryRunner<C> {
    /// Creates a runner that opens default clients through `connector`.
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Runs `sql` and returns the whole result.
    ///
    /// A caller-supplied `client` is used as is and left open. Without one, a
    /// default client is opened for this call only and closed before
    /// returning, whether the query succeeded or not. Errors are returned
    /// unchanged.
    pub fn query_to_table(
        &self,
        sql: &str,
        client: Option<&mut dyn ClientHandle>,
    ) -> Result<QueryResult> {
        tracing::info!("Querying BigQuery: {sql}");

        let result = match client {
            Some(client) => client.query(sql)?,
            None => {
                tracing::debug!("Creating new BigQuery client");
                let mut client = ScopedClient {
                    inner: self.connector.connect_default()?,
                };
                client.query(sql)?
            }
        };

        let (rows, columns) = result.shape();
        tracing::info!("Query result shape: ({rows}, {columns})");
        Ok(result)
    }
}

/// Runs `sql` on BigQuery with the default configuration.
///
/// See [`QueryRunner::query_to_table`].
pub fn query_to_table(sql: &str, client: Option<&mut dyn ClientHandle>) -> Result<QueryResult> {
    QueryRunner::new(BigQueryConnector::new(ClientConfig::default())).query_to_table(sql, client)
}
