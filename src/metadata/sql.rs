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

//! SQL text for introspection queries.
//!
//! Identifiers are always double-quoted so reserved words and names with
//! spaces survive. A dotted schema such as `space.folder` is a namespace
//! path: each segment is quoted on its own.

/// Wrap `name` in double quotes, doubling any embedded `"`.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Wrap `value` in single quotes, doubling any embedded `'`.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Compile a possibly namespaced table name into a quoted SQL reference.
///
/// ```
/// use dremio_flight_adbc::metadata::sql::compile_table_reference;
///
/// assert_eq!(compile_table_reference("t", None), "\"t\"");
/// assert_eq!(
///     compile_table_reference("t", Some("a.b.c")),
///     "\"a\".\"b\".\"c\".\"t\""
/// );
/// ```
pub fn compile_table_reference(name: &str, namespace: Option<&str>) -> String {
    match namespace.filter(|ns| !ns.is_empty()) {
        None => quote_identifier(name),
        Some(ns) => ns
            .split('.')
            .chain(std::iter::once(name))
            .map(quote_identifier)
            .collect::<Vec<_>>()
            .join("."),
    }
}

/// Builds the fixed-shape introspection statements.
///
/// # Examples
///
/// ```ignore
/// let sql = SqlCommandBuilder::new()
///     .with_schema(Some("space.folder"))
///     .with_table("orders")
///     .build_describe();
/// assert_eq!(sql, r#"DESCRIBE "space"."folder"."orders""#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlCommandBuilder {
    schema: Option<String>,
    table: Option<String>,
}

impl SqlCommandBuilder {
    /// Create a new builder with no schema or table set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema (namespace path). Empty means none.
    pub fn with_schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.filter(|s| !s.is_empty()).map(|s| s.to_string());
        self
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Build `SHOW SCHEMAS`.
    pub fn build_show_schemas(&self) -> String {
        "SHOW SCHEMAS".to_string()
    }

    /// Build `DESCRIBE <reference>` for the configured table.
    pub fn build_describe(&self) -> String {
        format!(
            "DESCRIBE {}",
            compile_table_reference(self.table_name(), self.schema.as_deref())
        )
    }

    /// Build a count of `INFORMATION_SCHEMA."TABLES"` rows matching the table.
    ///
    /// Without a schema the `TABLE_SCHEMA` predicate is left out.
    pub fn build_table_exists(&self) -> String {
        let mut sql = "SELECT COUNT(*) FROM INFORMATION_SCHEMA.\"TABLES\" WHERE ".to_string();
        if let Some(ref schema) = self.schema {
            sql.push_str(&format!("TABLE_SCHEMA = {} AND ", quote_literal(schema)));
        }
        sql.push_str(&format!("TABLE_NAME = {}", quote_literal(self.table_name())));
        sql
    }

    /// Build the list of table names, optionally restricted to the schema.
    pub fn build_list_tables(&self) -> String {
        let mut sql = "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.\"TABLES\"".to_string();
        if let Some(ref schema) = self.schema {
            sql.push_str(&format!(" WHERE TABLE_SCHEMA = {}", quote_literal(schema)));
        }
        sql
    }

    fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or_default()
    }
}
