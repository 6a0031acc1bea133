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

//! In-memory `FlightTransport` used by unit tests.

use super::{BatchStream, FlightTransport, QueryHandle};
use crate::error::{Error, Result};
use arrow_array::RecordBatch;
use arrow_flight::Ticket;
use arrow_schema::SchemaRef;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One item of a mocked `DoGet` stream.
#[derive(Debug, Clone)]
pub(crate) enum MockItem {
    Batch(RecordBatch),
    /// Yields a transport error.
    Fail(String),
    /// Never yields.
    Hang,
}

#[derive(Debug)]
struct MockResponse {
    sql_prefix: String,
    schema: SchemaRef,
    endpoints: Vec<Vec<MockItem>>,
}

/// Serves canned responses keyed by SQL prefix.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: Vec<MockResponse>,
    submitted: Mutex<Vec<String>>,
    do_get_calls: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer any SQL starting with `sql_prefix` with one endpoint per entry
    /// of `endpoints`.
    pub(crate) fn with_response(
        mut self,
        sql_prefix: &str,
        schema: SchemaRef,
        endpoints: Vec<Vec<MockItem>>,
    ) -> Self {
        self.responses.push(MockResponse {
            sql_prefix: sql_prefix.to_string(),
            schema,
            endpoints,
        });
        self
    }

    /// Answer `sql_prefix` with a single endpoint holding `batches`.
    pub(crate) fn with_batches(
        self,
        sql_prefix: &str,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> Self {
        let items = batches.into_iter().map(MockItem::Batch).collect();
        self.with_response(sql_prefix, schema, vec![items])
    }

    /// SQL text received by `get_flight_info`, in order.
    pub(crate) fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn do_get_calls(&self) -> usize {
        self.do_get_calls.load(Ordering::SeqCst)
    }

    fn find(&self, sql: &str) -> Option<(usize, &MockResponse)> {
        self.responses
            .iter()
            .enumerate()
            .find(|(_, r)| sql.starts_with(&r.sql_prefix))
    }
}

#[async_trait]
impl FlightTransport for MockTransport {
    async fn get_flight_info(&self, sql: &str) -> Result<QueryHandle> {
        self.submitted.lock().unwrap().push(sql.to_string());
        let (index, response) = self
            .find(sql)
            .ok_or_else(|| Error::transport(format!("no mock response for: {}", sql)))?;

        let tickets = (0..response.endpoints.len())
            .map(|endpoint| Ticket::new(format!("{}:{}", index, endpoint)))
            .collect();
        Ok(QueryHandle {
            schema: response.schema.clone(),
            tickets,
            total_records: None,
        })
    }

    async fn do_get(&self, ticket: &Ticket) -> Result<BatchStream> {
        self.do_get_calls.fetch_add(1, Ordering::SeqCst);
        let raw = String::from_utf8_lossy(&ticket.ticket).to_string();
        let (response, endpoint) = raw
            .split_once(':')
            .and_then(|(r, e)| Some((r.parse::<usize>().ok()?, e.parse::<usize>().ok()?)))
            .ok_or_else(|| Error::transport(format!("bad ticket {}", raw)))?;
        let items = self.responses[response].endpoints[endpoint].clone();

        let stream = futures::stream::iter(items).then(|item| async move {
            match item {
                MockItem::Batch(batch) => Ok(batch),
                MockItem::Fail(message) => Err(Error::transport(message)),
                MockItem::Hang => futures::future::pending().await,
            }
        });
        Ok(stream.boxed())
    }
}
