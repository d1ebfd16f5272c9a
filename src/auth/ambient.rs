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

//! Application Default Credentials.
//!
//! Discovery order is owned by `gcp_auth`: `GOOGLE_APPLICATION_CREDENTIALS`,
//! the gcloud user config, then the metadata server.

use super::{AuthProvider, CredentialResolver, Credentials};
use crate::error::{io_error, Result};
use crate::runtime::shared_runtime;
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves credentials from the environment the process runs in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientCredentials;

impl AmbientCredentials {
    /// Creates a new ambient credential resolver.
    pub fn new() -> Self {
        Self
    }

    /// Finds the default credentials and the project they belong to.
    ///
    /// No token is fetched here; the first request does that.
    pub(crate) async fn discover(scope_uris: &[String]) -> Result<Credentials> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| io_error(e, "find default credentials"))?;
        let project_id = provider
            .project_id()
            .await
            .map_err(|e| io_error(e, "determine the default project"))?;

        let source = ScopedTokenSource {
            provider,
            scopes: scope_uris.to_vec(),
        };
        Ok(Credentials::new(Arc::new(source), project_id.to_string()))
    }
}

impl CredentialResolver for AmbientCredentials {
    fn resolve(&self, scope_uris: &[String]) -> Result<Credentials> {
        shared_runtime()?.block_on(Self::discover(scope_uris))
    }
}

/// Access tokens from a `gcp_auth` provider, limited to a fixed scope set.
struct ScopedTokenSource {
    provider: Arc<dyn gcp_auth::TokenProvider>,
    scopes: Vec<String>,
}

impl std::fmt::Debug for ScopedTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTokenSource")
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for ScopedTokenSource {
    async fn get_auth_header(&self) -> Result<String> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let token = self
            .provider
            .token(&scopes)
            .await
            .map_err(|e| io_error(e, "fetch an access token"))?;
        Ok(format!("Bearer {}", token.as_str()))
    }
}
