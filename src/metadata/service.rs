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

//! Introspection queries over anything that can execute SQL.
//!
//! Each function issues one fixed-shape statement built by
//! [`SqlCommandBuilder`] and reads the materialized rows back into plain
//! values.
//!
//! ## Example
//!
//! ```ignore
//! use dremio_flight_adbc::metadata::service;
//!
//! let schemas = service::list_schemas(&connection)?;
//! let exists = service::table_exists(&connection, "orders", Some("space.folder"))?;
//! ```

use crate::error::{Error, Result};
use crate::metadata::sql::SqlCommandBuilder;
use crate::result::MaterializedResult;
use crate::types::{lookup, SqlType, Value};
use tracing::debug;

/// Something that runs a SQL statement and returns its rows.
pub trait SqlExecutor {
    fn execute_sql(&self, sql: &str) -> Result<MaterializedResult>;
}

/// One column as reported by `DESCRIBE`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    /// Type name as reported by the server.
    pub type_name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

/// Names of all schemas visible to the session, in server order.
pub fn list_schemas<E: SqlExecutor + ?Sized>(executor: &E) -> Result<Vec<String>> {
    let sql = SqlCommandBuilder::new().build_show_schemas();
    let result = run(executor, &sql)?;
    first_column_strings(&result)
}

/// Whether `table` exists, optionally within `schema`.
///
/// A result without rows counts as not found.
pub fn table_exists<E: SqlExecutor + ?Sized>(
    executor: &E,
    table: &str,
    schema: Option<&str>,
) -> Result<bool> {
    let sql = SqlCommandBuilder::new()
        .with_schema(schema)
        .with_table(table)
        .build_table_exists();
    let result = run(executor, &sql)?;

    let count = match result.rows.first().and_then(|row| row.first()) {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_i64().ok_or_else(|| {
            Error::InvalidState(format!("table count is not an integer: {:?}", value))
        })?,
    };
    Ok(count > 0)
}

/// Columns of `table` from `DESCRIBE`.
///
/// Every reported type name must be present in the type table.
pub fn describe_columns<E: SqlExecutor + ?Sized>(
    executor: &E,
    table: &str,
    schema: Option<&str>,
) -> Result<Vec<ColumnMetadata>> {
    let sql = SqlCommandBuilder::new()
        .with_schema(schema)
        .with_table(table)
        .build_describe();
    let result = run(executor, &sql)?;

    result
        .rows
        .iter()
        .map(|row| {
            let name = cell_string(row, 0)?;
            let type_name = cell_string(row, 1)?;
            let sql_type = lookup(&type_name)?;
            let nullable = row.get(2).map(is_truthy).unwrap_or(true);
            Ok(ColumnMetadata {
                name,
                type_name,
                sql_type,
                nullable,
            })
        })
        .collect()
}

/// Table names, optionally restricted to `schema`.
pub fn list_tables<E: SqlExecutor + ?Sized>(
    executor: &E,
    schema: Option<&str>,
) -> Result<Vec<String>> {
    let sql = SqlCommandBuilder::new()
        .with_schema(schema)
        .build_list_tables();
    let result = run(executor, &sql)?;
    first_column_strings(&result)
}

fn run<E: SqlExecutor + ?Sized>(executor: &E, sql: &str) -> Result<MaterializedResult> {
    debug!("Executing metadata query: {}", sql);
    let result = executor.execute_sql(sql)?;
    debug!("Metadata query returned {} row(s)", result.num_rows());
    Ok(result)
}

fn first_column_strings(result: &MaterializedResult) -> Result<Vec<String>> {
    result.rows.iter().map(|row| cell_string(row, 0)).collect()
}

fn cell_string(row: &[Value], index: usize) -> Result<String> {
    match row.get(index) {
        Some(Value::Utf8(s)) => Ok(s.clone()),
        Some(other) => Err(Error::InvalidState(format!(
            "expected a string in column {}, got {:?}",
            index, other
        ))),
        None => Err(Error::InvalidState(format!(
            "row has no column {}",
            index
        ))),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Utf8(s) => s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
