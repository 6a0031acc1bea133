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

//! Database metadata for the ADBC Connection interface methods.
//!
//! Schemas, tables and columns are discovered with plain SQL
//! (`SHOW SCHEMAS`, `DESCRIBE`, `INFORMATION_SCHEMA`) run through the same
//! query path as user statements.
//!
//! ## Module Structure
//!
//! - `sql`: identifier quoting and introspection statement builders
//! - `service`: introspection functions over a [`SqlExecutor`]

pub mod service;
pub mod sql;

pub use service::{
    describe_columns, list_schemas, list_tables, table_exists, ColumnMetadata, SqlExecutor,
};
pub use sql::{compile_table_reference, quote_identifier, SqlCommandBuilder};
