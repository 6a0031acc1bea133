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

//! Connection implementation for the Dremio Flight ADBC driver.

use crate::client::FlightTransport;
use crate::error::Error;
use crate::metadata::{self, ColumnMetadata, SqlExecutor};
use crate::reader::CancelScope;
use crate::result::{self, MaterializedResult};
use crate::statement::Statement;
use adbc_core::error::Result;
use adbc_core::options::{InfoCode, ObjectDepth, OptionConnection, OptionValue};
use adbc_core::schemas::{GET_INFO_SCHEMA, GET_TABLE_TYPES_SCHEMA};
use adbc_core::Optionable;
use arrow_array::{
    new_empty_array, ArrayRef, RecordBatch, RecordBatchIterator, RecordBatchReader, StringArray,
    UInt32Array, UnionArray,
};
use arrow_buffer::ScalarBuffer;
use arrow_schema::{ArrowError, DataType, Field, Schema};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Table types reported by `get_table_types`.
const TABLE_TYPES: [&str; 3] = ["TABLE", "VIEW", "SYSTEM_TABLE"];

/// Represents an active connection to a Dremio Flight endpoint.
///
/// A Connection is created from a Database and is used to create Statements
/// for executing SQL queries. It owns the tokio runtime every blocking call
/// runs on. Dropping the connection cancels any result stream still being
/// read through it.
#[derive(Debug)]
pub struct Connection {
    // Default schema from the connection parameters
    schema: Option<String>,

    // Flight transport (trait object so tests can swap it)
    transport: Arc<dyn FlightTransport>,

    cancel: CancelScope,

    // Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,
}

/// Type alias for our empty reader used in stub implementations.
type EmptyReader =
    RecordBatchIterator<std::vec::IntoIter<std::result::Result<RecordBatch, ArrowError>>>;

impl Connection {
    /// Called by Database::new_connection().
    ///
    /// The runtime is created by Database so the transport can be built
    /// inside its context before the Connection exists.
    pub(crate) fn new_with_runtime(
        transport: Arc<dyn FlightTransport>,
        schema: Option<String>,
        runtime: tokio::runtime::Runtime,
    ) -> Self {
        Self {
            schema,
            transport,
            cancel: CancelScope::new(),
            runtime,
        }
    }

    /// Returns the default schema, if one was configured.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Execute `sql` and return every row.
    pub fn execute(&self, sql: &str) -> crate::error::Result<MaterializedResult> {
        if self.cancel.is_closed() {
            return Err(Error::Cancelled("connection closed".to_string()));
        }
        result::execute(
            sql,
            self.transport.clone(),
            self.runtime.handle(),
            self.cancel.operation_token(),
        )
    }

    /// Names of all schemas visible to this session.
    pub fn list_schemas(&self) -> crate::error::Result<Vec<String>> {
        metadata::list_schemas(self)
    }

    /// Whether `table` exists in `schema` (or anywhere, when `None`).
    pub fn table_exists(&self, table: &str, schema: Option<&str>) -> crate::error::Result<bool> {
        metadata::table_exists(self, table, schema)
    }

    /// Columns of `table` as reported by `DESCRIBE`.
    pub fn describe_columns(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> crate::error::Result<Vec<ColumnMetadata>> {
        metadata::describe_columns(self, table, schema)
    }

    /// Table names in `schema` (or all schemas, when `None`).
    pub fn list_tables(&self, schema: Option<&str>) -> crate::error::Result<Vec<String>> {
        metadata::list_tables(self, schema)
    }
}

impl SqlExecutor for Connection {
    fn execute_sql(&self, sql: &str) -> crate::error::Result<MaterializedResult> {
        self.execute(sql)
    }
}

/// Build a `GET_INFO_SCHEMA` batch holding string values only.
fn string_info_batch(entries: Vec<(u32, String)>) -> crate::error::Result<RecordBatch> {
    let DataType::Union(fields, _) = GET_INFO_SCHEMA.field(1).data_type() else {
        return Err(Error::InvalidState(
            "info_value is not a union".to_string(),
        ));
    };
    let (string_type_id, _) = fields
        .iter()
        .find(|(_, field)| field.name() == "string_value")
        .ok_or_else(|| Error::InvalidState("info_value has no string_value".to_string()))?;

    let len = entries.len();
    let (codes, values): (Vec<u32>, Vec<String>) = entries.into_iter().unzip();
    let children: Vec<ArrayRef> = fields
        .iter()
        .map(|(type_id, field)| {
            if type_id == string_type_id {
                Arc::new(StringArray::from(values.clone())) as ArrayRef
            } else {
                new_empty_array(field.data_type())
            }
        })
        .collect();

    let info_value = UnionArray::try_new(
        fields.clone(),
        ScalarBuffer::from(vec![string_type_id; len]),
        Some(ScalarBuffer::from((0..len as i32).collect::<Vec<_>>())),
        children,
    )?;

    Ok(RecordBatch::try_new(
        GET_INFO_SCHEMA.clone(),
        vec![Arc::new(UInt32Array::from(codes)), Arc::new(info_value)],
    )?)
}

impl Optionable for Connection {
    type Option = OptionConnection;

    fn set_option(&mut self, key: Self::Option, _value: OptionValue) -> Result<()> {
        match key {
            OptionConnection::AutoCommit => {
                // Dremio has no transactions; every statement commits itself.
                Ok(())
            }
            _ => Err(Error::unknown_option(&key).to_adbc()),
        }
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

impl adbc_core::Connection for Connection {
    type StatementType = Statement;

    fn new_statement(&mut self) -> Result<Self::StatementType> {
        Ok(Statement::new(
            self.transport.clone(),
            self.cancel.clone(),
            self.runtime.handle().clone(),
        ))
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Cancelling in-flight reads");
        self.cancel.cancel_operations();
        Ok(())
    }

    fn get_info(&self, codes: Option<HashSet<InfoCode>>) -> Result<impl RecordBatchReader + Send> {
        // Filter by requested codes or return all if none specified
        let return_all = codes.is_none();
        let codes = codes.unwrap_or_default();

        let mut entries = Vec::new();
        if return_all || codes.contains(&InfoCode::DriverName) {
            entries.push((
                InfoCode::DriverName as u32,
                "Dremio Flight ADBC Driver".to_string(),
            ));
        }
        if return_all || codes.contains(&InfoCode::DriverVersion) {
            entries.push((
                InfoCode::DriverVersion as u32,
                env!("CARGO_PKG_VERSION").to_string(),
            ));
        }
        if return_all || codes.contains(&InfoCode::VendorName) {
            entries.push((InfoCode::VendorName as u32, "Dremio".to_string()));
        }

        let batch = string_info_batch(entries).map_err(|e| e.to_adbc())?;
        Ok(RecordBatchIterator::new(
            vec![Ok(batch)],
            GET_INFO_SCHEMA.clone(),
        ))
    }

    fn get_objects(
        &self,
        _depth: ObjectDepth,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _table_type: Option<Vec<&str>>,
        _column_name: Option<&str>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(Error::NotImplemented("get_objects".to_string()).to_adbc())
    }

    fn get_table_schema(
        &self,
        catalog: Option<&str>,
        db_schema: Option<&str>,
        table_name: &str,
    ) -> Result<Schema> {
        if let Some(catalog) = catalog.filter(|c| !c.is_empty()) {
            debug!("Ignoring catalog '{}': Dremio has no catalogs", catalog);
        }

        let columns = self
            .describe_columns(table_name, db_schema)
            .map_err(|e| e.to_adbc())?;
        if columns.is_empty() {
            return Err(Error::NotFound(format!("Table not found: {}", table_name)).to_adbc());
        }

        let fields: Vec<Field> = columns
            .iter()
            .map(|c| Field::new(&c.name, c.sql_type.arrow_type(), c.nullable))
            .collect();
        Ok(Schema::new(fields))
    }

    fn get_table_types(&self) -> Result<impl RecordBatchReader + Send> {
        let array = StringArray::from(TABLE_TYPES.to_vec());
        let batch = RecordBatch::try_new(GET_TABLE_TYPES_SCHEMA.clone(), vec![Arc::new(array)])
            .map_err(|e| Error::Arrow(e).to_adbc())?;

        Ok(RecordBatchIterator::new(
            vec![Ok(batch)],
            GET_TABLE_TYPES_SCHEMA.clone(),
        ))
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(Error::NotImplemented("read_partition".to_string()).to_adbc())
    }

    fn commit(&mut self) -> Result<()> {
        // Auto-commit only
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        Err(Error::NotImplemented("rollback - Dremio is auto-commit only".to_string()).to_adbc())
    }

    fn get_statistic_names(&self) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(Error::NotImplemented("get_statistic_names".to_string()).to_adbc())
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> Result<impl RecordBatchReader + Send> {
        Err::<EmptyReader, _>(Error::NotImplemented("get_statistics".to_string()).to_adbc())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("Closing connection");
        self.cancel.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{MockItem, MockTransport};
    use crate::types::{SqlType, Value};
    use adbc_core::error::Status;
    use adbc_core::Connection as _;
    use arrow_array::cast::AsArray;
    use arrow_array::{Array, Int64Array};
    use arrow_schema::SchemaRef;

    fn connection_with(transport: MockTransport) -> (Connection, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let conn = Connection::new_with_runtime(
            transport.clone(),
            Some("space".to_string()),
            runtime,
        );
        (conn, transport)
    }

    fn strings_schema(name: &str) -> SchemaRef {
        Arc::new(Schema::new(vec![Field::new(name, DataType::Utf8, true)]))
    }

    fn strings_batch(schema: &SchemaRef, values: Vec<&str>) -> RecordBatch {
        RecordBatch::try_new(schema.clone(), vec![Arc::new(StringArray::from(values))]).unwrap()
    }

    fn describe_transport() -> MockTransport {
        let schema = Arc::new(Schema::new(vec![
            Field::new("COLUMN_NAME", DataType::Utf8, true),
            Field::new("DATA_TYPE", DataType::Utf8, true),
            Field::new("IS_NULLABLE", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["id", "amount"])),
                Arc::new(StringArray::from(vec!["BIGINT", "DOUBLE"])),
                Arc::new(StringArray::from(vec!["NO", "YES"])),
            ],
        )
        .unwrap();
        MockTransport::new().with_batches("DESCRIBE", schema, vec![batch])
    }

    #[test]
    fn test_get_table_types_returns_correct_types() {
        let (conn, _) = connection_with(MockTransport::new());
        let mut reader = conn.get_table_types().unwrap();

        let schema = reader.schema();
        assert_eq!(schema.fields().len(), 1);
        assert_eq!(schema.field(0).name(), "table_type");

        let batch = reader.next().unwrap().unwrap();
        let table_type_col = batch.column(0).as_string::<i32>();
        let values: Vec<&str> = (0..table_type_col.len())
            .map(|i| table_type_col.value(i))
            .collect();
        assert_eq!(values, vec!["TABLE", "VIEW", "SYSTEM_TABLE"]);

        assert!(reader.next().is_none());
    }

    #[test]
    fn test_get_info_filters_codes() {
        let (conn, _) = connection_with(MockTransport::new());

        let batch = conn.get_info(None).unwrap().next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 3);

        let codes = HashSet::from([InfoCode::VendorName]);
        let batch = conn.get_info(Some(codes)).unwrap().next().unwrap().unwrap();
        assert_eq!(batch.num_rows(), 1);
        let names = batch.column(0).as_primitive::<arrow_array::types::UInt32Type>();
        assert_eq!(names.value(0), InfoCode::VendorName as u32);
    }

    #[test]
    fn test_execute_returns_rows() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, true)]));
        let batch =
            RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(vec![1, 2]))])
                .unwrap();
        let (conn, transport) =
            connection_with(MockTransport::new().with_batches("SELECT", schema, vec![batch]));

        let result = conn.execute("SELECT n FROM t").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]);
        assert_eq!(transport.submitted(), vec!["SELECT n FROM t".to_string()]);
    }

    #[test]
    fn test_list_schemas_via_connection() {
        let schema = strings_schema("SCHEMA_NAME");
        let batch = strings_batch(&schema, vec!["sys", "space.folder"]);
        let (conn, transport) =
            connection_with(MockTransport::new().with_batches("SHOW SCHEMAS", schema, vec![batch]));

        assert_eq!(conn.list_schemas().unwrap(), vec!["sys", "space.folder"]);
        assert_eq!(transport.submitted(), vec!["SHOW SCHEMAS".to_string()]);
    }

    #[test]
    fn test_table_exists_via_connection() {
        let schema = Arc::new(Schema::new(vec![Field::new("EXPR$0", DataType::Int64, true)]));
        let batch =
            RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(vec![0]))])
                .unwrap();
        let (conn, _) =
            connection_with(MockTransport::new().with_batches("SELECT COUNT", schema, vec![batch]));

        assert!(!conn.table_exists("missing", Some("space")).unwrap());
    }

    #[test]
    fn test_get_table_schema_builds_correct_schema() {
        let (conn, transport) = connection_with(describe_transport());

        let schema = conn
            .get_table_schema(None, Some("space.folder"), "orders")
            .unwrap();
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field(0).name(), "id");
        assert_eq!(schema.field(0).data_type(), &SqlType::BigInteger.arrow_type());
        assert!(!schema.field(0).is_nullable());
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert!(schema.field(1).is_nullable());
        assert_eq!(
            transport.submitted(),
            vec!["DESCRIBE \"space\".\"folder\".\"orders\"".to_string()]
        );
    }

    #[test]
    fn test_get_table_schema_not_found() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("COLUMN_NAME", DataType::Utf8, true),
            Field::new("DATA_TYPE", DataType::Utf8, true),
        ]));
        let (conn, _) =
            connection_with(MockTransport::new().with_batches("DESCRIBE", schema, vec![]));

        let err = conn.get_table_schema(None, None, "nope").unwrap_err();
        assert_eq!(err.status, Status::NotFound);
    }

    #[test]
    fn test_cancel_interrupts_and_connection_recovers() {
        let schema = strings_schema("SCHEMA_NAME");
        let batch = strings_batch(&schema, vec!["sys"]);
        let transport = MockTransport::new()
            .with_response("SELECT", schema.clone(), vec![vec![MockItem::Hang]])
            .with_batches("SHOW SCHEMAS", schema, vec![batch]);
        let (mut conn, _) = connection_with(transport);

        let scope = conn.cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            scope.cancel_operations();
        });
        let err = conn.execute("SELECT * FROM slow").unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)));
        canceller.join().unwrap();

        conn.cancel().unwrap();
        assert_eq!(conn.list_schemas().unwrap(), vec!["sys"]);
    }

    #[test]
    fn test_rollback_not_implemented() {
        let (mut conn, _) = connection_with(MockTransport::new());
        assert!(conn.commit().is_ok());
        assert_eq!(conn.rollback().unwrap_err().status, Status::NotImplemented);
    }
}
