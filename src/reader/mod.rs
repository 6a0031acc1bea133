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

//! Result readers for pulling query results off a Flight endpoint.
//!
//! This module provides:
//! - `ResultReader`: blocking pull interface over record batches
//! - `FlightResultReader`: redeems every ticket of a `QueryHandle` in order
//! - `EmptyReader`: schema-only reader
//! - `ResultReaderAdapter`: exposes a `ResultReader` as an arrow `RecordBatchReader`

use crate::client::{BatchStream, FlightTransport, QueryHandle};
use crate::error::{Error, Result};
use arrow_array::RecordBatch;
use arrow_flight::Ticket;
use arrow_schema::{ArrowError, SchemaRef};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Cancellation tokens shared by a connection and its statements.
///
/// Every read uses a token derived from the current operation token, which
/// in turn is a child of the close token. Cancelling operations replaces the
/// operation token, so the connection stays usable; closing is final.
#[derive(Debug, Clone)]
pub struct CancelScope {
    closed: CancellationToken,
    operations: Arc<Mutex<CancellationToken>>,
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelScope {
    pub fn new() -> Self {
        let closed = CancellationToken::new();
        let operations = Arc::new(Mutex::new(closed.child_token()));
        Self { closed, operations }
    }

    /// Token for one new read operation.
    pub fn operation_token(&self) -> CancellationToken {
        self.current().child_token()
    }

    /// Cancel every read started so far.
    pub fn cancel_operations(&self) {
        let mut current = self.current();
        current.cancel();
        *current = self.closed.child_token();
    }

    /// Cancel everything, permanently.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn current(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Trait for result readers.
pub trait ResultReader: Send {
    /// Get the schema of the result.
    fn schema(&self) -> Result<SchemaRef>;

    /// Get the next record batch, or None if end of results.
    fn next_batch(&mut self) -> Result<Option<RecordBatch>>;
}

/// Reader over the endpoints of a submitted query.
///
/// Tickets are redeemed lazily and strictly in order, so batches come out in
/// the order the server produced them. Every read races the owning
/// connection's cancellation token.
pub struct FlightResultReader {
    transport: Arc<dyn FlightTransport>,
    schema: SchemaRef,
    tickets: VecDeque<Ticket>,
    current: Option<BatchStream>,
    runtime_handle: tokio::runtime::Handle,
    cancel: CancellationToken,
    batches_read: usize,
}

impl FlightResultReader {
    pub fn new(
        transport: Arc<dyn FlightTransport>,
        handle: QueryHandle,
        runtime_handle: tokio::runtime::Handle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            schema: handle.schema,
            tickets: handle.tickets.into(),
            current: None,
            runtime_handle,
            cancel,
            batches_read: 0,
        }
    }

    async fn next_batch_async(&mut self) -> Result<Option<RecordBatch>> {
        loop {
            if let Some(stream) = self.current.as_mut() {
                match stream.next().await {
                    Some(batch) => return batch.map(Some),
                    None => self.current = None,
                }
            }

            let Some(ticket) = self.tickets.pop_front() else {
                return Ok(None);
            };
            tracing::debug!(
                "Opening DoGet stream ({} ticket(s) remaining)",
                self.tickets.len()
            );
            self.current = Some(self.transport.do_get(&ticket).await?);
        }
    }
}

impl ResultReader for FlightResultReader {
    fn schema(&self) -> Result<SchemaRef> {
        Ok(self.schema.clone())
    }

    fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled("connection closed".to_string()));
        }

        let cancel = self.cancel.clone();
        let handle = self.runtime_handle.clone();
        let batch = handle.block_on(async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    Err(Error::Cancelled("connection cancelled while reading".to_string()))
                }
                batch = self.next_batch_async() => batch,
            }
        })?;

        match batch {
            Some(ref b) => {
                self.batches_read += 1;
                tracing::trace!("Read batch {} with {} rows", self.batches_read, b.num_rows());
            }
            None => {
                tracing::debug!("Result stream drained after {} batch(es)", self.batches_read)
            }
        }
        Ok(batch)
    }
}

/// Empty reader for queries with no results.
///
/// The schema is preserved from the query's declared schema.
pub struct EmptyReader {
    schema: SchemaRef,
}

impl EmptyReader {
    pub fn new(schema: SchemaRef) -> Self {
        Self { schema }
    }
}

impl ResultReader for EmptyReader {
    fn schema(&self) -> Result<SchemaRef> {
        Ok(self.schema.clone())
    }

    fn next_batch(&mut self) -> Result<Option<RecordBatch>> {
        Ok(None)
    }
}

/// Adapter to make ResultReader work as arrow's RecordBatchReader.
pub struct ResultReaderAdapter {
    inner: Box<dyn ResultReader + Send>,
    schema: SchemaRef,
}

impl ResultReaderAdapter {
    /// Create a new adapter wrapping a ResultReader.
    pub fn new(inner: Box<dyn ResultReader + Send>) -> Result<Self> {
        let schema = inner.schema()?;
        Ok(Self { inner, schema })
    }
}

impl arrow_array::RecordBatchReader for ResultReaderAdapter {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}

impl Iterator for ResultReaderAdapter {
    type Item = std::result::Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(Error::Arrow(e)) => Some(Err(e)),
            Err(e) => Some(Err(ArrowError::ExternalError(Box::new(e)))),
        }
    }
}
