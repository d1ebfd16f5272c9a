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

//! Client handles and how they are built.
//!
//! A [`Connector`] knows how to open a [`ClientHandle`], either from the
//! ambient defaults or from explicit [`Credentials`]. [`ClientFactory`] picks
//! between the two based on the requested auth scopes.

pub mod config;
pub mod http;
pub(crate) mod wire;

pub use config::ClientConfig;
pub use http::{BigQueryClient, BigQueryConnector};

use crate::auth::{scope_uris, AmbientCredentials, CredentialResolver, Credentials};
use crate::error::Result;
use crate::result::QueryResult;
use std::fmt::Debug;

/// A live, authenticated handle able to run queries.
pub trait ClientHandle: Debug {
    /// Project queries are billed to and run in.
    fn project_id(&self) -> &str;

    /// Runs `sql` and blocks until the complete result is in memory.
    fn query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Releases the handle's resources. Later queries fail.
    fn close(&mut self);
}

/// Opens client handles.
pub trait Connector {
    /// The handle type this connector produces.
    type Client: ClientHandle;

    /// Opens a handle with ambient default credentials and default scopes.
    fn connect_default(&self) -> Result<Self::Client>;

    /// Opens a handle with explicit credentials.
    fn connect(&self, credentials: Credentials) -> Result<Self::Client>;
}

/// Builds client handles, optionally with extra auth scopes.
#[derive(Debug, Clone)]
pub struct ClientFactory<C, R> {
    connector: C,
    resolver: R,
}

impl<C: Connector, R: CredentialResolver> ClientFactory<C, R> {
    /// Creates a factory from a connector and a credential resolver.
    pub fn new(connector: C, resolver: R) -> Self {
        Self {
            connector,
            resolver,
        }
    }

    /// Returns the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Creates a client.
    ///
    /// With no scopes the connector's defaults are used and the resolver is
    /// not consulted. Otherwise each scope `s` becomes
    /// `https://www.googleapis.com/auth/{s}` and ambient credentials are
    /// resolved for exactly that set.
    pub fn create_client(&self, auth_scopes: &[&str]) -> Result<C::Client> {
        if auth_scopes.is_empty() {
            tracing::debug!("Using default BigQuery client");
            return self.connector.connect_default();
        }

        let uris = scope_uris(auth_scopes);
        let credentials = self.resolver.resolve(&uris)?;
        tracing::debug!(
            ?auth_scopes,
            project_id = credentials.project_id(),
            "Using BigQuery client with auth scopes"
        );
        self.connector.connect(credentials)
    }
}

impl ClientFactory<BigQueryConnector, AmbientCredentials> {
    /// A factory for real BigQuery clients.
    pub fn bigquery(config: ClientConfig) -> Self {
        Self::new(BigQueryConnector::new(config), AmbientCredentials::new())
    }
}

/// Creates a BigQuery client with the default configuration.
///
/// Pass no scopes for the default client, or scope names such as
/// `["bigquery", "drive"]` to read Drive-backed tables.
pub fn create_client(auth_scopes: &[&str]) -> Result<BigQueryClient> {
    ClientFactory::bigquery(ClientConfig::default()).create_client(auth_scopes)
}
