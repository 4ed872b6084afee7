// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use arrow_array::types::{Date32Type, Decimal128Type};
use arrow_cast::parse::{parse_decimal, string_to_timestamp_nanos, Parser};
use arrow_schema::{ArrowError, TimeUnit, DECIMAL128_MAX_PRECISION, DECIMAL128_MAX_SCALE};
use serde_json::{json, Number, Value};

use crate::descriptor::{DateUnit, FieldDescriptor, TypeShape, MAP_KEY_NAME, MAP_VALUE_NAME};
use crate::resolver::{Resolved, ValueResolver};
use crate::scalar::ScalarValue;

/// Resolves [`serde_json::Value`]s
///
/// * `null` is absent
/// * objects resolve struct fields by name, and arrays resolve them by position
/// * arrays are lists
/// * maps are either objects, whose keys become map keys, or arrays of
///   `{"key": .., "value": ..}` objects
/// * a union value is an object with a single member naming the alternative
/// * numbers and strings are converted according to the scalar descriptor,
///   with strings parsed for dates, timestamps, decimals and integers
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonResolver;

impl ValueResolver for JsonResolver {
    type Value = Value;

    fn resolve(&self, field: &FieldDescriptor, value: &Value) -> Result<Resolved<Value>, ArrowError> {
        if value.is_null() {
            return Ok(Resolved::Null);
        }
        match (field.shape(), value) {
            (TypeShape::List, Value::Array(elements)) => Ok(Resolved::List(elements.clone())),
            (TypeShape::Map { .. }, Value::Object(entries)) => Ok(Resolved::List(
                entries
                    .iter()
                    .map(|(k, v)| json!({ MAP_KEY_NAME: k, MAP_VALUE_NAME: v }))
                    .collect(),
            )),
            (TypeShape::Map { .. }, Value::Array(entries)) => Ok(Resolved::List(entries.clone())),
            (TypeShape::Struct, Value::Object(members)) => Ok(Resolved::Struct(
                field
                    .children()
                    .iter()
                    .map(|c| members.get(c.name()).cloned())
                    .collect(),
            )),
            (TypeShape::Struct, Value::Array(values)) => {
                if values.len() != field.children().len() {
                    return Err(ArrowError::JsonError(format!(
                        "found {} columns for {} fields",
                        values.len(),
                        field.children().len()
                    )));
                }
                Ok(Resolved::Struct(values.iter().cloned().map(Some).collect()))
            }
            (TypeShape::Union, Value::Object(members)) => {
                let mut iter = members.iter();
                let (Some((name, value)), None) = (iter.next(), iter.next()) else {
                    return Err(ArrowError::JsonError(format!(
                        "expected a single alternative for union '{}', found {} members",
                        field.name(),
                        members.len()
                    )));
                };
                let (alternative, _) = field.child_by_name(name).ok_or_else(|| {
                    ArrowError::JsonError(format!(
                        "'{name}' is not an alternative of union '{}'",
                        field.name()
                    ))
                })?;
                Ok(Resolved::Union {
                    alternative,
                    value: value.clone(),
                })
            }
            (shape, value) if !shape.is_nested() => scalar(shape, value).map(Resolved::Scalar),
            (shape, value) => Err(ArrowError::JsonError(format!(
                "expected {shape} for field '{}', found {value}",
                field.name()
            ))),
        }
    }
}

fn scalar(shape: &TypeShape, value: &Value) -> Result<ScalarValue, ArrowError> {
    let unexpected = || ArrowError::JsonError(format!("expected {shape}, found {value}"));
    match (shape, value) {
        (TypeShape::Boolean, Value::Bool(b)) => Ok(ScalarValue::Boolean(*b)),
        (TypeShape::Int { .. }, Value::Number(n)) => Ok(number(n)),
        (TypeShape::Int { .. }, Value::String(s)) => s
            .parse::<i64>()
            .map(ScalarValue::Int64)
            .map_err(|_| unexpected()),
        (TypeShape::Float { bit_width }, Value::Number(n)) => {
            float(n, *bit_width).ok_or_else(unexpected)
        }
        (TypeShape::Decimal { scale, .. }, Value::Number(_) | Value::String(_)) => {
            let text = match value {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            };
            // parse with every digit of the literal so the writer can reject inexact rescaling
            let scale = literal_scale(&text).max(*scale);
            let value = parse_decimal::<Decimal128Type>(&text, DECIMAL128_MAX_PRECISION, scale)?;
            Ok(ScalarValue::Decimal128 {
                value,
                precision: DECIMAL128_MAX_PRECISION,
                scale,
            })
        }
        (
            TypeShape::Utf8 | TypeShape::LargeUtf8,
            Value::String(s),
        ) => Ok(ScalarValue::Utf8(s.clone())),
        (
            TypeShape::Binary | TypeShape::LargeBinary | TypeShape::FixedSizeBinary(_),
            Value::String(s),
        ) => Ok(ScalarValue::Binary(s.as_bytes().to_vec())),
        (TypeShape::Date(DateUnit::Day), Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(ScalarValue::Date32)
            .ok_or_else(unexpected),
        (TypeShape::Date(DateUnit::Millisecond), Value::Number(n)) => {
            n.as_i64().map(ScalarValue::Date64).ok_or_else(unexpected)
        }
        (TypeShape::Date(_), Value::String(s)) => Date32Type::parse(s)
            .map(ScalarValue::Date32)
            .ok_or_else(unexpected),
        (TypeShape::Time(unit), Value::Number(n)) => n
            .as_i64()
            .map(|value| ScalarValue::Time { value, unit: *unit })
            .ok_or_else(unexpected),
        (TypeShape::Timestamp { unit, .. }, Value::Number(n)) => n
            .as_i64()
            .map(|value| ScalarValue::Timestamp { value, unit: *unit })
            .ok_or_else(unexpected),
        (TypeShape::Timestamp { .. }, Value::String(s)) => Ok(ScalarValue::Timestamp {
            value: string_to_timestamp_nanos(s)?,
            unit: TimeUnit::Nanosecond,
        }),
        _ => Err(unexpected()),
    }
}

/// Integral numbers are kept exact. Fractional numbers are rounded to the
/// nearest value of the target width, which they must not overflow.
fn float(n: &Number, bit_width: u8) -> Option<ScalarValue> {
    if n.is_i64() || n.is_u64() {
        return Some(number(n));
    }
    match bit_width {
        64 => n.as_f64().map(ScalarValue::Float64),
        _ => n
            .to_string()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map(ScalarValue::Float32),
    }
}

/// The number of fractional digits written in a decimal literal, accounting
/// for an exponent
fn literal_scale(text: &str) -> i8 {
    let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
        Some(idx) => (&text[..idx], text[idx + 1..].parse::<i32>().unwrap_or(0)),
        None => (text, 0),
    };
    let fraction = mantissa
        .split_once('.')
        .map(|(_, f)| f.len() as i32)
        .unwrap_or(0);
    (fraction - exponent).clamp(0, DECIMAL128_MAX_SCALE as i32) as i8
}

fn number(n: &Number) -> ScalarValue {
    if let Some(v) = n.as_i64() {
        ScalarValue::Int64(v)
    } else if let Some(v) = n.as_u64() {
        ScalarValue::UInt64(v)
    } else {
        ScalarValue::Float64(n.as_f64().unwrap_or(f64::NAN))
    }
}
