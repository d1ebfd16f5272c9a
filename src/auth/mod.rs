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

//! Authentication for BigQuery clients.
//!
//! Scopes are short service names (`"drive"`, `"bigquery"`) that expand to
//! Google OAuth scope URIs. A [`CredentialResolver`] turns a set of scope URIs
//! into [`Credentials`]: an [`AuthProvider`] plus the project the credentials
//! belong to.

pub mod ambient;
pub mod token;

pub use ambient::AmbientCredentials;
pub use token::StaticToken;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Prefix every requested scope is appended to.
pub const SCOPE_URI_PREFIX: &str = "https://www.googleapis.com/auth/";

/// Scopes requested by a default client.
pub const DEFAULT_SCOPE_URIS: &[&str] = &[
    "https://www.googleapis.com/auth/bigquery",
    "https://www.googleapis.com/auth/cloud-platform",
];

/// Expands a scope name into its OAuth scope URI.
///
/// The scope is not validated; whatever is passed ends up in the URI.
pub fn scope_uri(scope: &str) -> String {
    format!("{SCOPE_URI_PREFIX}{scope}")
}

/// Expands every scope name, keeping order and duplicates.
pub fn scope_uris<S: AsRef<str>>(scopes: &[S]) -> Vec<String> {
    scopes.iter().map(|s| scope_uri(s.as_ref())).collect()
}

/// Trait for authentication providers.
#[async_trait]
pub trait AuthProvider: Send + Sync + Debug {
    /// Returns the authorization header value for HTTP requests.
    async fn get_auth_header(&self) -> Result<String>;
}

/// Resolved credentials: how to authenticate, and for which project.
#[derive(Debug, Clone)]
pub struct Credentials {
    provider: Arc<dyn AuthProvider>,
    project_id: String,
}

impl Credentials {
    /// Creates credentials from an auth provider and its project.
    pub fn new(provider: Arc<dyn AuthProvider>, project_id: impl Into<String>) -> Self {
        Self {
            provider,
            project_id: project_id.into(),
        }
    }

    /// Credentials backed by an already minted access token.
    pub fn from_access_token(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self::new(Arc::new(StaticToken::new(token)), project_id)
    }

    /// Returns the auth provider.
    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    /// Returns the project the credentials resolved to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Resolves ambient credentials restricted to a set of scope URIs.
pub trait CredentialResolver: Send + Sync + Debug {
    /// Resolves credentials valid for exactly `scope_uris`.
    fn resolve(&self, scope_uris: &[String]) -> Result<Credentials>;
}
