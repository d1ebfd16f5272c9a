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

//! BigQuery queries as Arrow tables.
//!
//! This crate builds authenticated BigQuery clients and runs SQL on them,
//! returning the complete result in memory as Arrow record batches.
//!
//! ## Overview
//!
//! - [`create_client`] / [`ClientFactory`] - build a client, optionally with
//!   extra OAuth scopes (e.g. `drive` for Drive-backed external tables)
//! - [`query_to_table`] / [`QueryRunner`] - run a query, on a given client or
//!   on a default one opened just for that call
//! - [`QueryResult`] - the materialized table
//!
//! Credentials come from the environment (Application Default Credentials).
//! The API is blocking; do not call it from inside an async runtime.
//!
//! ## Example
//!
//! ```ignore
//! use bigquery_table::{create_client, query_to_table};
//!
//! // One-off query on a default client.
//! let table = query_to_table("SELECT 1 AS x", None)?;
//! assert_eq!(table.shape(), (1, 1));
//!
//! // Reuse a client that can also read Google Drive.
//! let mut client = create_client(&["bigquery", "drive"])?;
//! let table = query_to_table("SELECT * FROM dataset.sheet_table", Some(&mut client))?;
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod query;
pub mod reader;
pub mod result;
mod runtime;

pub use client::{
    create_client, BigQueryClient, BigQueryConnector, ClientConfig, ClientFactory, ClientHandle,
    Connector,
};
pub use error::{BigQueryErrorHelper, Error, Result};
pub use query::{query_to_table, QueryRunner};
pub use result::QueryResult;
