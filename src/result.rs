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

//! Row-oriented materialization of query results.
//!
//! A query is submitted, every batch of its response stream is read in
//! arrival order, the batches are concatenated into one table and the table
//! is converted to rows plus one [`ColumnDescriptor`] per column.

use crate::client::FlightTransport;
use crate::error::Result;
use crate::reader::{FlightResultReader, ResultReader};
use crate::types::{lookup_arrow, SqlType, Value};
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Description of one result column.
///
/// Sizes are never reported and every column is reported nullable.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: SqlType,
    pub display_size: Option<usize>,
    pub internal_size: Option<usize>,
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            display_size: None,
            internal_size: None,
            nullable: true,
        }
    }
}

/// A fully read query result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterializedResult {
    /// Row-major values; each row has one value per column.
    pub rows: Vec<Vec<Value>>,
    pub columns: Vec<ColumnDescriptor>,
}

impl MaterializedResult {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of column `index`, in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }
}

/// Submit `sql` and read its whole result.
///
/// Any failure while submitting or reading is returned; no partial result is
/// produced.
pub fn execute(
    sql: &str,
    transport: Arc<dyn FlightTransport>,
    runtime: &tokio::runtime::Handle,
    cancel: CancellationToken,
) -> Result<MaterializedResult> {
    debug!("Executing query: {}", sql);
    let handle = runtime.block_on(transport.get_flight_info(sql))?;
    let mut reader = FlightResultReader::new(transport, handle, runtime.clone(), cancel);
    materialize(&mut reader)
}

/// Drain `reader` and convert its batches to rows.
pub fn materialize(reader: &mut dyn ResultReader) -> Result<MaterializedResult> {
    let schema = reader.schema()?;
    let columns = column_descriptors(&schema)?;

    let mut batches = Vec::new();
    while let Some(batch) = reader.next_batch()? {
        batches.push(batch);
    }
    debug!(
        "Materializing {} batch(es) into {} column(s)",
        batches.len(),
        columns.len()
    );

    let table = arrow_select::concat::concat_batches(&schema, &batches)?;
    Ok(MaterializedResult {
        rows: rows_from_batch(&table)?,
        columns,
    })
}

/// One descriptor per field, typed through the remote type table.
pub fn column_descriptors(schema: &SchemaRef) -> Result<Vec<ColumnDescriptor>> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let sql_type = lookup_arrow(field.data_type())?;
            Ok(ColumnDescriptor::new(field.name().clone(), sql_type))
        })
        .collect()
}

/// Convert a columnar batch into row-major values.
pub fn rows_from_batch(batch: &RecordBatch) -> Result<Vec<Vec<Value>>> {
    (0..batch.num_rows())
        .map(|row| {
            batch
                .columns()
                .iter()
                .map(|column| Value::from_array(column, row))
                .collect()
        })
        .collect()
}
