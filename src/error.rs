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

//! Error types for the BigQuery client.
//!
//! Errors from collaborators (credential discovery, HTTP, JSON, Arrow) are
//! converted into the driverbase error framework where they enter the crate.
//! From there they travel with `?` and are never re-wrapped.

use driverbase::error::ErrorHelper;

/// Error helper for BigQuery errors.
///
/// Prefixes every message with the service name.
#[derive(Clone)]
pub struct BigQueryErrorHelper;

impl ErrorHelper for BigQueryErrorHelper {
    const NAME: &'static str = "BigQuery";
}

/// The error type for BigQuery operations.
pub type Error = driverbase::error::Error<BigQueryErrorHelper>;

/// A convenient alias for Results with BigQuery errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Converts a transport-level failure into an `io` error with context.
pub(crate) fn io_error(err: impl std::fmt::Display, context: &'static str) -> Error {
    BigQueryErrorHelper::io()
        .message(err.to_string())
        .context(context)
}
