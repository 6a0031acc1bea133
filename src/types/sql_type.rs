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

//! Remote type name → client type mapping.
//!
//! Dremio reports SQL type names (`DESCRIBE`, `INFORMATION_SCHEMA`) while
//! result batches carry Arrow types. Both are resolved through a single
//! table of names. Casing is inconsistent across those sources, so every
//! name is registered in both its upper-case and lower-case spelling and
//! lookups are exact.

use crate::error::{Error, Result};
use arrow_schema::{DataType, TimeUnit};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Client-side SQL type descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    SmallInteger,
    Integer,
    BigInteger,
    /// Binary floating point; `precision` is 32 or 64 bits.
    Float { precision: u8 },
    Numeric,
    String,
    Varchar,
    LargeBinary,
    VarBinary,
    Date,
    Time,
    /// Generic date-time; every timestamp resolution maps here.
    DateTime,
}

impl SqlType {
    /// Arrow type used when reporting this descriptor in an Arrow schema.
    pub fn arrow_type(&self) -> DataType {
        match self {
            SqlType::Boolean => DataType::Boolean,
            SqlType::SmallInteger => DataType::Int16,
            SqlType::Integer => DataType::Int32,
            SqlType::BigInteger => DataType::Int64,
            SqlType::Float { precision } if *precision <= 32 => DataType::Float32,
            SqlType::Float { .. } => DataType::Float64,
            SqlType::Numeric => DataType::Decimal128(38, 0),
            SqlType::String | SqlType::Varchar => DataType::Utf8,
            SqlType::LargeBinary | SqlType::VarBinary => DataType::Binary,
            SqlType::Date => DataType::Date32,
            SqlType::Time => DataType::Time64(TimeUnit::Microsecond),
            SqlType::DateTime => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Boolean => f.write_str("BOOLEAN"),
            SqlType::SmallInteger => f.write_str("SMALLINT"),
            SqlType::Integer => f.write_str("INTEGER"),
            SqlType::BigInteger => f.write_str("BIGINT"),
            SqlType::Float { precision } => write!(f, "FLOAT({})", precision),
            SqlType::Numeric => f.write_str("NUMERIC"),
            SqlType::String => f.write_str("STRING"),
            SqlType::Varchar => f.write_str("VARCHAR"),
            SqlType::LargeBinary => f.write_str("LARGE_BINARY"),
            SqlType::VarBinary => f.write_str("VARBINARY"),
            SqlType::Date => f.write_str("DATE"),
            SqlType::Time => f.write_str("TIME"),
            SqlType::DateTime => f.write_str("DATETIME"),
        }
    }
}

/// Base names and their descriptors. Each is registered upper and lower case.
const TYPE_NAMES: &[(&str, SqlType)] = &[
    ("bool", SqlType::Boolean),
    ("boolean", SqlType::Boolean),
    ("int8", SqlType::SmallInteger),
    ("byte", SqlType::SmallInteger),
    ("tinyint", SqlType::SmallInteger),
    ("smallint", SqlType::SmallInteger),
    ("int16", SqlType::Integer),
    ("int32", SqlType::Integer),
    ("int", SqlType::Integer),
    ("integer", SqlType::Integer),
    ("int64", SqlType::BigInteger),
    ("bigint", SqlType::BigInteger),
    ("float32", SqlType::Float { precision: 32 }),
    ("float", SqlType::Float { precision: 32 }),
    ("real", SqlType::Float { precision: 32 }),
    ("float64", SqlType::Float { precision: 64 }),
    ("double", SqlType::Float { precision: 64 }),
    ("decimal", SqlType::Numeric),
    ("decimal128", SqlType::Numeric),
    ("numeric", SqlType::Numeric),
    ("string", SqlType::String),
    ("utf8", SqlType::String),
    ("large_string", SqlType::String),
    ("object", SqlType::String),
    ("varchar", SqlType::Varchar),
    ("char", SqlType::Varchar),
    ("character", SqlType::Varchar),
    ("character varying", SqlType::Varchar),
    ("varbinary", SqlType::LargeBinary),
    ("binary", SqlType::LargeBinary),
    ("large_binary", SqlType::LargeBinary),
    ("binary varying", SqlType::VarBinary),
    ("date", SqlType::Date),
    ("date32", SqlType::Date),
    ("date64", SqlType::Date),
    ("time", SqlType::Time),
    ("time[s]", SqlType::Time),
    ("time[ms]", SqlType::Time),
    ("time[us]", SqlType::Time),
    ("time[ns]", SqlType::Time),
    ("timestamp", SqlType::DateTime),
    ("timestamp[s]", SqlType::DateTime),
    ("timestamp[ms]", SqlType::DateTime),
    ("timestamp[us]", SqlType::DateTime),
    ("timestamp[ns]", SqlType::DateTime),
    ("datetime64[s]", SqlType::DateTime),
    ("datetime64[ms]", SqlType::DateTime),
    ("datetime64[us]", SqlType::DateTime),
    ("datetime64[ns]", SqlType::DateTime),
];

static TYPE_MAP: OnceLock<HashMap<String, SqlType>> = OnceLock::new();

/// The process-wide mapping table, built on first use.
pub fn type_map() -> &'static HashMap<String, SqlType> {
    TYPE_MAP.get_or_init(|| {
        let mut map = HashMap::with_capacity(TYPE_NAMES.len() * 2);
        for (name, sql_type) in TYPE_NAMES {
            map.insert(name.to_lowercase(), *sql_type);
            map.insert(name.to_uppercase(), *sql_type);
        }
        map
    })
}

/// Resolve a remote type name to its client type.
///
/// A parameter suffix such as `(10,2)` is ignored. Unknown names fail with
/// [`Error::UnsupportedType`].
pub fn lookup(remote_type_name: &str) -> Result<SqlType> {
    let base = match remote_type_name.find('(') {
        Some(idx) => remote_type_name[..idx].trim_end(),
        None => remote_type_name,
    };
    type_map()
        .get(base)
        .copied()
        .ok_or_else(|| Error::UnsupportedType(remote_type_name.to_string()))
}

fn unit_suffix(unit: &TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Second => "s",
        TimeUnit::Millisecond => "ms",
        TimeUnit::Microsecond => "us",
        TimeUnit::Nanosecond => "ns",
    }
}

/// Columnar type name reported for an Arrow data type.
pub fn remote_type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Boolean => "bool".to_string(),
        DataType::Int8 => "int8".to_string(),
        DataType::Int16 => "int16".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::UInt8 => "uint8".to_string(),
        DataType::UInt16 => "uint16".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Float16 => "float16".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::Decimal128(_, _) => "decimal128".to_string(),
        DataType::Decimal256(_, _) => "decimal256".to_string(),
        DataType::Utf8 => "string".to_string(),
        DataType::LargeUtf8 => "large_string".to_string(),
        DataType::Binary => "binary".to_string(),
        DataType::LargeBinary => "large_binary".to_string(),
        DataType::Date32 => "date32".to_string(),
        DataType::Date64 => "date64".to_string(),
        DataType::Time32(unit) | DataType::Time64(unit) => {
            format!("time[{}]", unit_suffix(unit))
        }
        DataType::Timestamp(unit, None) => format!("timestamp[{}]", unit_suffix(unit)),
        DataType::Timestamp(unit, Some(tz)) => {
            format!("timestamp[{}, tz={}]", unit_suffix(unit), tz)
        }
        other => other.to_string().to_lowercase(),
    }
}

/// Resolve the client type for an Arrow column type.
pub fn lookup_arrow(data_type: &DataType) -> Result<SqlType> {
    lookup(&remote_type_name(data_type))
}
