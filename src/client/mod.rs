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

//! Transport for talking to a Dremio Flight endpoint.
//!
//! This module provides:
//! - `FlightTransport` trait: query submission and ticket redemption
//! - `DremioFlightClient`: tonic-based implementation of the trait
//! - `FlightClientConfig`: transport settings read from a connection descriptor

pub mod flight;
#[cfg(test)]
pub(crate) mod mock;

use crate::error::{Error, Result};
use arrow_array::RecordBatch;
use arrow_flight::{FlightInfo, Ticket};
use arrow_schema::SchemaRef;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

pub use flight::{DremioFlightClient, FlightClientConfig};

/// Record batches decoded from one `DoGet` stream, in arrival order.
pub type BatchStream = BoxStream<'static, Result<RecordBatch>>;

/// A submitted query: its declared schema plus the tickets to redeem.
#[derive(Debug, Clone)]
pub struct QueryHandle {
    pub schema: SchemaRef,
    pub tickets: Vec<Ticket>,
    /// Row count announced by the server, if known.
    pub total_records: Option<i64>,
}

impl QueryHandle {
    /// Build a handle from a `GetFlightInfo` response.
    ///
    /// Endpoints without a ticket are skipped.
    pub fn from_flight_info(info: FlightInfo) -> Result<Self> {
        let total_records = (info.total_records >= 0).then_some(info.total_records);
        let tickets = info
            .endpoint
            .iter()
            .filter_map(|endpoint| endpoint.ticket.clone())
            .collect();
        let schema = info.try_decode_schema().map_err(Error::Arrow)?;

        Ok(Self {
            schema: Arc::new(schema),
            tickets,
            total_records,
        })
    }
}

/// Abstract interface to a Flight query service.
///
/// Implementations must be cheap to share across readers; every method
/// takes `&self`.
#[async_trait]
pub trait FlightTransport: Send + Sync + std::fmt::Debug {
    /// Submit `sql` and return the handle describing its result.
    async fn get_flight_info(&self, sql: &str) -> Result<QueryHandle>;

    /// Redeem one ticket, yielding its record batches.
    async fn do_get(&self, ticket: &Ticket) -> Result<BatchStream>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_flight::{FlightDescriptor, FlightEndpoint};
    use arrow_schema::{DataType, Field, Schema};

    #[test]
    fn test_query_handle_from_flight_info() {
        let schema = Schema::new(vec![Field::new("id", DataType::Int32, true)]);
        let info = FlightInfo::new()
            .try_with_schema(&schema)
            .unwrap()
            .with_descriptor(FlightDescriptor::new_cmd("SELECT 1"))
            .with_endpoint(FlightEndpoint::new().with_ticket(Ticket::new("a")))
            .with_endpoint(FlightEndpoint::new())
            .with_endpoint(FlightEndpoint::new().with_ticket(Ticket::new("b")))
            .with_total_records(3);

        let handle = QueryHandle::from_flight_info(info).unwrap();
        assert_eq!(handle.schema.as_ref(), &schema);
        assert_eq!(
            handle.tickets,
            vec![Ticket::new("a"), Ticket::new("b")]
        );
        assert_eq!(handle.total_records, Some(3));
    }

    #[test]
    fn test_query_handle_unknown_total() {
        let schema = Schema::new(vec![Field::new("x", DataType::Utf8, true)]);
        let info = FlightInfo::new()
            .try_with_schema(&schema)
            .unwrap()
            .with_total_records(-1);
        let handle = QueryHandle::from_flight_info(info).unwrap();
        assert!(handle.tickets.is_empty());
        assert_eq!(handle.total_records, None);
    }
}
