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

//! Decoding of REST result pages.
//!
//! The REST API returns every cell as JSON text (`{"v": "42"}`). Each page is
//! decoded into one record batch using the schema of the first page that
//! carried one.

use crate::client::wire::{QueryResponse, TableFieldSchema, TableRow};
use crate::error::{BigQueryErrorHelper, Error, Result};
use crate::result::QueryResult;
use arrow_array::builder::{
    BooleanBuilder, Date32Builder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow_array::types::Date32Type;
use arrow_array::{ArrayRef, RecordBatch, RecordBatchOptions};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use chrono::NaiveDate;
use driverbase::error::ErrorHelper;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Field metadata key holding the BigQuery type name.
pub const BIGQUERY_TYPE_METADATA_KEY: &str = "bigquery.type";

/// How a BigQuery column is represented in Arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Utf8,
    Int64,
    Float64,
    Boolean,
    Timestamp,
    Date,
    /// Repeated fields and records, kept as their JSON text.
    Json,
}

impl ColumnKind {
    fn of(field: &TableFieldSchema) -> Self {
        if field
            .mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("REPEATED"))
        {
            return Self::Json;
        }
        match field.field_type.to_ascii_uppercase().as_str() {
            "INTEGER" | "INT64" => Self::Int64,
            "FLOAT" | "FLOAT64" => Self::Float64,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "RECORD" | "STRUCT" => Self::Json,
            _ => Self::Utf8,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Utf8 | Self::Json => DataType::Utf8,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
            Self::Boolean => DataType::Boolean,
            Self::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            Self::Date => DataType::Date32,
        }
    }
}

/// Builds the Arrow schema for a BigQuery table schema.
fn to_arrow_schema(fields: &[TableFieldSchema]) -> SchemaRef {
    let fields: Vec<Field> = fields
        .iter()
        .map(|field| {
            let nullable = !field
                .mode
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case("REQUIRED"));
            Field::new(&field.name, ColumnKind::of(field).data_type(), nullable).with_metadata(
                HashMap::from([(
                    BIGQUERY_TYPE_METADATA_KEY.to_string(),
                    field.field_type.clone(),
                )]),
            )
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn decode_error(message: String) -> Error {
    BigQueryErrorHelper::io()
        .message(message)
        .context("decode query results")
}

/// Reads a scalar cell: null or missing becomes `None`.
fn scalar<'a>(column: &str, cell: Option<&'a Value>) -> Result<Option<&'a str>> {
    match cell {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(decode_error(format!(
            "column '{column}': expected a scalar value, got {other}"
        ))),
    }
}

fn parse<T>(column: &str, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| decode_error(format!("column '{column}': invalid value '{text}': {e}")))
}

/// Timestamps arrive as int64 microseconds; older responses use float seconds.
fn parse_timestamp(column: &str, text: &str) -> Result<i64> {
    if let Ok(micros) = text.parse::<i64>() {
        return Ok(micros);
    }
    let seconds: f64 = parse(column, text)?;
    Ok((seconds * 1_000_000.0).round() as i64)
}

fn parse_date(column: &str, text: &str) -> Result<i32> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| decode_error(format!("column '{column}': invalid date '{text}': {e}")))?;
    Ok(Date32Type::from_naive_date(date))
}

fn decode_column<'a>(
    field: &TableFieldSchema,
    cells: impl Iterator<Item = Option<&'a Value>>,
) -> Result<ArrayRef> {
    let name = field.name.as_str();
    let array: ArrayRef = match ColumnKind::of(field) {
        ColumnKind::Utf8 => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                builder.append_option(scalar(name, cell)?);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Int64 => {
            let mut builder = Int64Builder::new();
            for cell in cells {
                let value = scalar(name, cell)?.map(|s| parse::<i64>(name, s));
                builder.append_option(value.transpose()?);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Float64 => {
            let mut builder = Float64Builder::new();
            for cell in cells {
                let value = scalar(name, cell)?.map(|s| parse::<f64>(name, s));
                builder.append_option(value.transpose()?);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Boolean => {
            let mut builder = BooleanBuilder::new();
            for cell in cells {
                let value = scalar(name, cell)?.map(|s| parse::<bool>(name, s));
                builder.append_option(value.transpose()?);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Timestamp => {
            let mut builder = TimestampMicrosecondBuilder::new().with_timezone("UTC");
            for cell in cells {
                let value = scalar(name, cell)?.map(|s| parse_timestamp(name, s));
                builder.append_option(value.transpose()?);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Date => {
            let mut builder = Date32Builder::new();
            for cell in cells {
                let value = scalar(name, cell)?.map(|s| parse_date(name, s));
                builder.append_option(value.transpose()?);
            }
            Arc::new(builder.finish())
        }
        ColumnKind::Json => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                match cell {
                    None | Some(Value::Null) => builder.append_null(),
                    Some(value) => builder.append_value(value.to_string()),
                }
            }
            Arc::new(builder.finish())
        }
    };
    Ok(array)
}

fn decode_rows(
    schema: &SchemaRef,
    fields: &[TableFieldSchema],
    rows: &[TableRow],
) -> Result<RecordBatch> {
    let columns = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let cells = rows.iter().map(move |row| row.f.get(i).map(|c| &c.v));
            decode_column(field, cells)
        })
        .collect::<Result<Vec<_>>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(Arc::clone(schema), columns, &options)
        .map_err(|e| decode_error(e.to_string()))
}

/// Accumulates result pages into a [`QueryResult`].
#[derive(Debug, Default)]
pub(crate) struct PageReader {
    fields: Vec<TableFieldSchema>,
    schema: Option<SchemaRef>,
    batches: Vec<RecordBatch>,
}

impl PageReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the rows of one page.
    pub fn push(&mut self, page: &QueryResponse) -> Result<()> {
        if self.schema.is_none() {
            if let Some(table_schema) = &page.schema {
                self.schema = Some(to_arrow_schema(&table_schema.fields));
                self.fields = table_schema.fields.clone();
            }
        }
        if page.rows.is_empty() {
            return Ok(());
        }
        let Some(schema) = &self.schema else {
            return Err(decode_error("rows received before a schema".to_string()));
        };
        let batch = decode_rows(schema, &self.fields, &page.rows)?;
        self.batches.push(batch);
        Ok(())
    }

    /// Returns the number of rows decoded so far.
    pub fn row_count(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn finish(self) -> QueryResult {
        match self.schema {
            Some(schema) => QueryResult::new(schema, self.batches),
            None => QueryResult::empty(),
        }
    }
}
