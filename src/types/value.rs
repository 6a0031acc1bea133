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

//! Row cell values extracted from Arrow arrays.

use crate::error::{Error, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Date64Type, Decimal128Type, DecimalType, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, Time32MillisecondType, Time32SecondType, Time64MicrosecondType,
    Time64NanosecondType, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use arrow_array::{Array, ArrayRef};
use arrow_schema::{ArrowError, DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// A single cell of a materialized row.
///
/// Values keep the native representation of their column: integers keep
/// their width and temporal values stay as `chrono` types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Unscaled 128-bit decimal.
    Decimal {
        value: i128,
        precision: u8,
        scale: i8,
    },
    Utf8(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Widen any integer value to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Read the cell at `row` of `array`.
    ///
    /// Fails for Arrow types that have no row representation.
    pub fn from_array(array: &ArrayRef, row: usize) -> Result<Value> {
        if array.is_null(row) {
            return Ok(Value::Null);
        }

        let value = match array.data_type() {
            DataType::Boolean => Value::Boolean(array.as_boolean().value(row)),
            DataType::Int8 => Value::Int8(array.as_primitive::<Int8Type>().value(row)),
            DataType::Int16 => Value::Int16(array.as_primitive::<Int16Type>().value(row)),
            DataType::Int32 => Value::Int32(array.as_primitive::<Int32Type>().value(row)),
            DataType::Int64 => Value::Int64(array.as_primitive::<Int64Type>().value(row)),
            DataType::Float32 => Value::Float32(array.as_primitive::<Float32Type>().value(row)),
            DataType::Float64 => Value::Float64(array.as_primitive::<Float64Type>().value(row)),
            DataType::Decimal128(precision, scale) => Value::Decimal {
                value: array.as_primitive::<Decimal128Type>().value(row),
                precision: *precision,
                scale: *scale,
            },
            DataType::Utf8 => Value::Utf8(array.as_string::<i32>().value(row).to_string()),
            DataType::LargeUtf8 => Value::Utf8(array.as_string::<i64>().value(row).to_string()),
            DataType::Binary => Value::Binary(array.as_binary::<i32>().value(row).to_vec()),
            DataType::LargeBinary => Value::Binary(array.as_binary::<i64>().value(row).to_vec()),
            DataType::Date32 => Value::Date(out_of_range(
                array.as_primitive::<Date32Type>().value_as_date(row),
                array.data_type(),
            )?),
            DataType::Date64 => Value::Date(out_of_range(
                array.as_primitive::<Date64Type>().value_as_date(row),
                array.data_type(),
            )?),
            DataType::Time32(TimeUnit::Second) => Value::Time(out_of_range(
                array.as_primitive::<Time32SecondType>().value_as_time(row),
                array.data_type(),
            )?),
            DataType::Time32(TimeUnit::Millisecond) => Value::Time(out_of_range(
                array
                    .as_primitive::<Time32MillisecondType>()
                    .value_as_time(row),
                array.data_type(),
            )?),
            DataType::Time64(TimeUnit::Microsecond) => Value::Time(out_of_range(
                array
                    .as_primitive::<Time64MicrosecondType>()
                    .value_as_time(row),
                array.data_type(),
            )?),
            DataType::Time64(TimeUnit::Nanosecond) => Value::Time(out_of_range(
                array
                    .as_primitive::<Time64NanosecondType>()
                    .value_as_time(row),
                array.data_type(),
            )?),
            DataType::Timestamp(unit, None) => {
                let datetime = match unit {
                    TimeUnit::Second => array
                        .as_primitive::<TimestampSecondType>()
                        .value_as_datetime(row),
                    TimeUnit::Millisecond => array
                        .as_primitive::<TimestampMillisecondType>()
                        .value_as_datetime(row),
                    TimeUnit::Microsecond => array
                        .as_primitive::<TimestampMicrosecondType>()
                        .value_as_datetime(row),
                    TimeUnit::Nanosecond => array
                        .as_primitive::<TimestampNanosecondType>()
                        .value_as_datetime(row),
                };
                Value::Timestamp(out_of_range(datetime, array.data_type())?)
            }
            other => {
                return Err(Error::UnsupportedType(format!(
                    "no row representation for {}",
                    other
                )))
            }
        };
        Ok(value)
    }
}

fn out_of_range<T>(value: Option<T>, data_type: &DataType) -> Result<T> {
    value.ok_or_else(|| {
        Error::Arrow(ArrowError::CastError(format!(
            "{} value out of range for chrono",
            data_type
        )))
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal {
                value,
                precision,
                scale,
            } => f.write_str(&Decimal128Type::format_decimal(*value, *precision, *scale)),
            Value::Utf8(v) => f.write_str(v),
            Value::Binary(v) => {
                for byte in v {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{
        BinaryArray, BooleanArray, Date32Array, Decimal128Array, Int32Array, StringArray,
        TimestampMillisecondArray, TimestampNanosecondArray, UInt8Array,
    };
    use std::sync::Arc;

    #[test]
    fn test_primitive_values() {
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(7), None]));
        assert_eq!(Value::from_array(&ints, 0).unwrap(), Value::Int32(7));
        assert_eq!(Value::from_array(&ints, 1).unwrap(), Value::Null);

        let bools: ArrayRef = Arc::new(BooleanArray::from(vec![true]));
        assert_eq!(Value::from_array(&bools, 0).unwrap(), Value::Boolean(true));

        let strings: ArrayRef = Arc::new(StringArray::from(vec!["dremio"]));
        assert_eq!(
            Value::from_array(&strings, 0).unwrap(),
            Value::Utf8("dremio".to_string())
        );

        let bytes: ArrayRef = Arc::new(BinaryArray::from(vec![&b"\x01\xff"[..]]));
        assert_eq!(
            Value::from_array(&bytes, 0).unwrap(),
            Value::Binary(vec![0x01, 0xff])
        );
    }

    #[test]
    fn test_temporal_values_are_concrete() {
        let dates: ArrayRef = Arc::new(Date32Array::from(vec![19_000]));
        assert_eq!(
            Value::from_array(&dates, 0).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2022, 1, 8).unwrap())
        );

        let millis: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![1_500]));
        let expected = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 1, 500)
            .unwrap();
        assert_eq!(
            Value::from_array(&millis, 0).unwrap(),
            Value::Timestamp(expected)
        );
    }

    #[test]
    fn test_nanosecond_timestamps_keep_precision() {
        let nanos: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![1_000_000_123]));
        match Value::from_array(&nanos, 0).unwrap() {
            Value::Timestamp(ts) => {
                assert_eq!(ts.and_utc().timestamp_subsec_nanos(), 123);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_decimal_value_and_display() {
        let decimals: ArrayRef = Arc::new(
            Decimal128Array::from(vec![12_345_i128])
                .with_precision_and_scale(10, 2)
                .unwrap(),
        );
        let value = Value::from_array(&decimals, 0).unwrap();
        assert_eq!(
            value,
            Value::Decimal {
                value: 12_345,
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(value.to_string(), "123.45");
    }

    #[test]
    fn test_unsupported_array_type() {
        let unsigned: ArrayRef = Arc::new(UInt8Array::from(vec![1_u8]));
        assert!(matches!(
            Value::from_array(&unsigned, 0),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int16(4).as_i64(), Some(4));
        assert_eq!(Value::Utf8("a".into()).as_str(), Some("a"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Float64(1.0).as_i64(), None);
    }
}
