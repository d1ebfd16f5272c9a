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

//! Client configuration.

use crate::error::{BigQueryErrorHelper, Result};
use driverbase::error::ErrorHelper;
use std::time::Duration;

/// Public BigQuery v2 REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Configuration shared by every client a connector builds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub endpoint: String,
    /// Location (region) jobs run in. The service infers it when unset.
    pub location: Option<String>,
    /// Rows per result page. The service picks when unset.
    pub page_size: Option<u32>,
    /// Timeout of each HTTP request.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            location: None,
            page_size: None,
            timeout: Duration::from_secs(60),
            user_agent: format!("bigquery-table-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Sets an option by its string key.
    ///
    /// Recognized keys: `bigquery.endpoint`, `bigquery.location`,
    /// `bigquery.page_size`, `bigquery.timeout_secs`, `bigquery.user_agent`.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "bigquery.endpoint" => {
                self.endpoint = value.trim_end_matches('/').to_string();
            }
            "bigquery.location" => {
                self.location = Some(value.to_string());
            }
            "bigquery.page_size" => {
                self.page_size = Some(parse_number(key, value)?);
            }
            "bigquery.timeout_secs" => {
                self.timeout = Duration::from_secs(parse_number(key, value)?);
            }
            "bigquery.user_agent" => {
                self.user_agent = value.to_string();
            }
            _ => {
                return Err(BigQueryErrorHelper::invalid_argument()
                    .message(format!("unknown option '{key}'")))
            }
        }
        Ok(())
    }

    /// Returns an option by its string key.
    pub fn get_option(&self, key: &str) -> Result<String> {
        match key {
            "bigquery.endpoint" => Ok(self.endpoint.clone()),
            "bigquery.location" => self.location.clone().ok_or_else(|| {
                BigQueryErrorHelper::invalid_state().message("option 'bigquery.location' is not set")
            }),
            "bigquery.page_size" => self.page_size.map(|n| n.to_string()).ok_or_else(|| {
                BigQueryErrorHelper::invalid_state().message("option 'bigquery.page_size' is not set")
            }),
            "bigquery.timeout_secs" => Ok(self.timeout.as_secs().to_string()),
            "bigquery.user_agent" => Ok(self.user_agent.clone()),
            _ => Err(BigQueryErrorHelper::invalid_argument()
                .message(format!("unknown option '{key}'"))),
        }
    }

    /// Builds a configuration from `(key, value)` pairs on top of the defaults.
    pub fn with_options<'a>(opts: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in opts {
            config.set_option(key, value)?;
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        BigQueryErrorHelper::invalid_argument()
            .message(format!("option '{key}' expects a non-negative integer, got '{value}'"))
    })
}
