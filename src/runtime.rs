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

//! Tokio runtime backing the blocking API.
//!
//! Credential discovery and HTTP are async; the public API is not. Every
//! blocking call is driven on one process-wide runtime so pooled connections
//! and cached tokens outlive individual calls. Calling the blocking API from
//! inside another async runtime panics, like any `block_on`.

use crate::error::{io_error, Result};
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<std::io::Result<Runtime>> = OnceLock::new();

fn build_runtime() -> std::io::Result<Runtime> {
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("bigquery-io")
        .enable_all()
        .build()?;
    tracing::debug!("Started BigQuery I/O runtime");
    Ok(runtime)
}

/// Returns the shared runtime, building it on first use.
///
/// A failed build is remembered and reported on every call.
pub(crate) fn shared_runtime() -> Result<&'static Runtime> {
    match RUNTIME.get_or_init(build_runtime) {
        Ok(runtime) => Ok(runtime),
        Err(e) => Err(io_error(e, "start the I/O runtime")),
    }
}
