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

//! Statement implementation for the Dremio Flight ADBC driver.

use crate::client::{FlightTransport, QueryHandle};
use crate::error::Error;
use crate::reader::{CancelScope, FlightResultReader, ResultReaderAdapter};
use crate::result::{self, MaterializedResult};
use adbc_core::error::Result;
use adbc_core::options::{OptionStatement, OptionValue};
use adbc_core::Optionable;
use arrow_array::RecordBatchReader;
use arrow_schema::Schema;
use std::sync::Arc;
use tokio::runtime::Handle as RuntimeHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Represents a SQL statement that can be executed against Dremio.
///
/// A Statement is created from a Connection and is used to execute SQL
/// queries and retrieve results.
#[derive(Debug)]
pub struct Statement {
    /// The SQL query to execute.
    query: Option<String>,
    /// Flight transport shared with the connection.
    transport: Arc<dyn FlightTransport>,
    /// Cancellation scope of the owning connection.
    scope: CancelScope,
    /// Tokio runtime handle for async operations.
    runtime_handle: RuntimeHandle,
    /// Token of the most recent execution.
    current: Option<CancellationToken>,
}

impl Statement {
    /// Creates a new Statement.
    pub(crate) fn new(
        transport: Arc<dyn FlightTransport>,
        scope: CancelScope,
        runtime_handle: RuntimeHandle,
    ) -> Self {
        Self {
            query: None,
            transport,
            scope,
            runtime_handle,
            current: None,
        }
    }

    /// Returns the current SQL query.
    pub fn sql_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Execute the query and read every row.
    pub fn execute_rows(&mut self) -> crate::error::Result<MaterializedResult> {
        let mut reader = self.open_reader()?;
        result::materialize(&mut reader)
    }

    fn submit(&mut self) -> crate::error::Result<(QueryHandle, CancellationToken)> {
        if self.scope.is_closed() {
            return Err(Error::Cancelled("connection closed".to_string()));
        }
        let query = self
            .query
            .as_deref()
            .ok_or_else(|| Error::InvalidState("No query set".to_string()))?;

        debug!("Executing query: {}", query);

        let token = self.scope.operation_token();
        self.current = Some(token.clone());
        let handle = self
            .runtime_handle
            .block_on(self.transport.get_flight_info(query))?;
        Ok((handle, token))
    }

    fn open_reader(&mut self) -> crate::error::Result<FlightResultReader> {
        let (handle, token) = self.submit()?;
        debug!(
            "Query planned with {} endpoint(s), {:?} record(s)",
            handle.tickets.len(),
            handle.total_records
        );
        Ok(FlightResultReader::new(
            self.transport.clone(),
            handle,
            self.runtime_handle.clone(),
            token,
        ))
    }
}

impl Optionable for Statement {
    type Option = OptionStatement;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        Err(Error::unknown_option(&key).to_adbc())
    }

    fn get_option_string(&self, key: Self::Option) -> Result<String> {
        Err(Error::unknown_option(&key).to_adbc())
    }

    fn get_option_bytes(&self, key: Self::Option) -> Result<Vec<u8>> {
        Err(Error::unknown_option(&key).to_adbc())
    }

    fn get_option_int(&self, key: Self::Option) -> Result<i64> {
        Err(Error::unknown_option(&key).to_adbc())
    }

    fn get_option_double(&self, key: Self::Option) -> Result<f64> {
        Err(Error::unknown_option(&key).to_adbc())
    }
}

impl adbc_core::Statement for Statement {
    fn set_sql_query(&mut self, query: impl AsRef<str>) -> Result<()> {
        self.query = Some(query.as_ref().to_string());
        Ok(())
    }

    fn set_substrait_plan(&mut self, _plan: impl AsRef<[u8]>) -> Result<()> {
        Err(Error::NotImplemented("Substrait plans".to_string()).to_adbc())
    }

    fn prepare(&mut self) -> Result<()> {
        Err(Error::NotImplemented("prepare".to_string()).to_adbc())
    }

    fn get_parameter_schema(&self) -> Result<Schema> {
        Err(Error::NotImplemented("get_parameter_schema".to_string()).to_adbc())
    }

    fn bind(&mut self, _batch: arrow_array::RecordBatch) -> Result<()> {
        Err(Error::NotImplemented("bind parameters".to_string()).to_adbc())
    }

    fn bind_stream(&mut self, _stream: Box<dyn RecordBatchReader + Send>) -> Result<()> {
        Err(Error::NotImplemented("bind_stream".to_string()).to_adbc())
    }

    fn execute(&mut self) -> Result<impl RecordBatchReader + Send> {
        let reader = self.open_reader().map_err(|e| e.to_adbc())?;

        // Wrap in adapter for RecordBatchReader trait
        ResultReaderAdapter::new(Box::new(reader)).map_err(|e| e.to_adbc())
    }

    fn execute_update(&mut self) -> Result<Option<i64>> {
        let reader = self.execute()?;

        // Drain the reader so server-side errors surface here
        for batch in reader {
            batch.map_err(|e| Error::Arrow(e).to_adbc())?;
        }

        // Flight does not report affected row counts for plain DoGet
        Ok(None)
    }

    fn execute_schema(&mut self) -> Result<Schema> {
        // Planning the query is enough; no ticket is redeemed
        let (handle, _) = self.submit().map_err(|e| e.to_adbc())?;
        Ok((*handle.schema).clone())
    }

    fn execute_partitions(&mut self) -> Result<adbc_core::PartitionedResult> {
        Err(Error::NotImplemented("execute_partitions".to_string()).to_adbc())
    }

    fn cancel(&mut self) -> Result<()> {
        if let Some(ref token) = self.current {
            debug!("Cancelling statement");
            token.cancel();
        }
        Ok(())
    }
}
