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

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::*;
use arrow_array::{Array, ArrayRef};
use arrow_schema::{ArrowError, DataType, TimeUnit};

use crate::descriptor::{FieldDescriptor, TypeShape};
use crate::resolver::{Resolved, ValueResolver};
use crate::scalar::ScalarValue;

/// A single row of an Arrow array
#[derive(Debug, Clone)]
pub struct ArrayValue {
    array: ArrayRef,
    row: usize,
}

impl ArrayValue {
    /// Creates a reference to `row` of `array`
    pub fn new(array: ArrayRef, row: usize) -> Self {
        Self { array, row }
    }

    /// The array this value is read from
    pub fn array(&self) -> &ArrayRef {
        &self.array
    }

    /// The row of [`Self::array`] this value refers to
    pub fn row(&self) -> usize {
        self.row
    }
}

/// Two values are equal when they refer to the same row of the same array
impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.array, &other.array) && self.row == other.row
    }
}

/// Resolves rows of Arrow arrays
///
/// Nested values are navigated through the descriptor: struct children are
/// looked up by name, union alternatives by the name of the active child.
/// Scalars are read according to the array's own [`DataType`], so a row can be
/// written into a vector whose descriptor was remapped, provided the value
/// converts losslessly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayResolver;

impl ValueResolver for ArrayResolver {
    type Value = ArrayValue;

    fn resolve(
        &self,
        field: &FieldDescriptor,
        value: &ArrayValue,
    ) -> Result<Resolved<ArrayValue>, ArrowError> {
        let (array, row) = (&value.array, value.row);
        if row >= array.len() {
            return Err(ArrowError::InvalidArgumentError(format!(
                "row {row} out of bounds for array of length {}",
                array.len()
            )));
        }
        if array.is_null(row) {
            return Ok(Resolved::Null);
        }
        let unexpected = || {
            ArrowError::InvalidArgumentError(format!(
                "cannot resolve {} from an array of type {}",
                field.shape(),
                array.data_type()
            ))
        };

        match field.shape() {
            TypeShape::List => {
                let list = array.as_list_opt::<i32>().ok_or_else(unexpected)?;
                Ok(elements(list.values(), list.value_offsets(), row))
            }
            TypeShape::Map { .. } => {
                let map = array.as_map_opt().ok_or_else(unexpected)?;
                let entries: ArrayRef = Arc::new(map.entries().clone());
                Ok(elements(&entries, map.value_offsets(), row))
            }
            TypeShape::Struct => {
                let s = array.as_struct_opt().ok_or_else(unexpected)?;
                let children = field
                    .children()
                    .iter()
                    .map(|c| {
                        s.column_by_name(c.name())
                            .map(|column| ArrayValue::new(Arc::clone(column), row))
                    })
                    .collect();
                Ok(Resolved::Struct(children))
            }
            TypeShape::Union => {
                let union = array.as_union_opt().ok_or_else(unexpected)?;
                let DataType::Union(fields, _) = union.data_type() else {
                    return Err(unexpected());
                };
                let type_id = union.type_id(row);
                let (_, active) = fields
                    .iter()
                    .find(|(id, _)| *id == type_id)
                    .ok_or_else(unexpected)?;
                let (alternative, _) = field.child_by_name(active.name()).ok_or_else(|| {
                    ArrowError::InvalidArgumentError(format!(
                        "union alternative '{}' is not declared by field '{}'",
                        active.name(),
                        field.name()
                    ))
                })?;
                let child = union.child(type_id);
                let value = ArrayValue::new(Arc::clone(child), union.value_offset(row));
                Ok(Resolved::Union { alternative, value })
            }
            _ => read_scalar(array.as_ref(), row).map(Resolved::Scalar),
        }
    }
}

fn elements(values: &ArrayRef, offsets: &[i32], row: usize) -> Resolved<ArrayValue> {
    let (start, end) = (offsets[row] as usize, offsets[row + 1] as usize);
    Resolved::List(
        (start..end)
            .map(|idx| ArrayValue::new(Arc::clone(values), idx))
            .collect(),
    )
}

fn read_scalar(array: &dyn Array, row: usize) -> Result<ScalarValue, ArrowError> {
    Ok(match array.data_type() {
        DataType::Boolean => ScalarValue::Boolean(array.as_boolean().value(row)),
        DataType::Int8 => ScalarValue::Int8(array.as_primitive::<Int8Type>().value(row)),
        DataType::Int16 => ScalarValue::Int16(array.as_primitive::<Int16Type>().value(row)),
        DataType::Int32 => ScalarValue::Int32(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => ScalarValue::Int64(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => ScalarValue::UInt8(array.as_primitive::<UInt8Type>().value(row)),
        DataType::UInt16 => ScalarValue::UInt16(array.as_primitive::<UInt16Type>().value(row)),
        DataType::UInt32 => ScalarValue::UInt32(array.as_primitive::<UInt32Type>().value(row)),
        DataType::UInt64 => ScalarValue::UInt64(array.as_primitive::<UInt64Type>().value(row)),
        DataType::Float16 => {
            ScalarValue::Float32(array.as_primitive::<Float16Type>().value(row).to_f32())
        }
        DataType::Float32 => ScalarValue::Float32(array.as_primitive::<Float32Type>().value(row)),
        DataType::Float64 => ScalarValue::Float64(array.as_primitive::<Float64Type>().value(row)),
        DataType::Decimal128(precision, scale) => ScalarValue::Decimal128 {
            value: array.as_primitive::<Decimal128Type>().value(row),
            precision: *precision,
            scale: *scale,
        },
        DataType::Utf8 => ScalarValue::Utf8(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => ScalarValue::Utf8(array.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => ScalarValue::Utf8(array.as_string_view().value(row).to_string()),
        DataType::Binary => ScalarValue::Binary(array.as_binary::<i32>().value(row).to_vec()),
        DataType::LargeBinary => ScalarValue::Binary(array.as_binary::<i64>().value(row).to_vec()),
        DataType::BinaryView => ScalarValue::Binary(array.as_binary_view().value(row).to_vec()),
        DataType::FixedSizeBinary(_) => {
            ScalarValue::Binary(array.as_fixed_size_binary().value(row).to_vec())
        }
        DataType::Date32 => ScalarValue::Date32(array.as_primitive::<Date32Type>().value(row)),
        DataType::Date64 => ScalarValue::Date64(array.as_primitive::<Date64Type>().value(row)),
        DataType::Time32(TimeUnit::Second) => ScalarValue::Time {
            value: array.as_primitive::<Time32SecondType>().value(row) as i64,
            unit: TimeUnit::Second,
        },
        DataType::Time32(TimeUnit::Millisecond) => ScalarValue::Time {
            value: array.as_primitive::<Time32MillisecondType>().value(row) as i64,
            unit: TimeUnit::Millisecond,
        },
        DataType::Time64(TimeUnit::Microsecond) => ScalarValue::Time {
            value: array.as_primitive::<Time64MicrosecondType>().value(row),
            unit: TimeUnit::Microsecond,
        },
        DataType::Time64(TimeUnit::Nanosecond) => ScalarValue::Time {
            value: array.as_primitive::<Time64NanosecondType>().value(row),
            unit: TimeUnit::Nanosecond,
        },
        DataType::Timestamp(unit, _) => {
            let value = match unit {
                TimeUnit::Second => array.as_primitive::<TimestampSecondType>().value(row),
                TimeUnit::Millisecond => array.as_primitive::<TimestampMillisecondType>().value(row),
                TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value(row),
                TimeUnit::Nanosecond => array.as_primitive::<TimestampNanosecondType>().value(row),
            };
            ScalarValue::Timestamp { value, unit: *unit }
        }
        d => {
            return Err(ArrowError::NotYetImplemented(format!(
                "Reading scalars of type {d}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::builder::{Int32Builder, ListBuilder, StringBuilder};
    use arrow_array::{Int32Array, StringArray, StructArray, TimestampNanosecondArray};
    use arrow_schema::Field;

    #[test]
    fn resolve_list_row() {
        let mut builder = ListBuilder::new(Int32Builder::new());
        builder.append_value([Some(1), None, Some(3)]);
        builder.append_null();
        builder.append(true);
        let array: ArrayRef = Arc::new(builder.finish());

        let item = FieldDescriptor::new_scalar("item", TypeShape::int(32), true).unwrap();
        let field = FieldDescriptor::new_list("l", item.clone(), true).unwrap();

        let resolved = ArrayResolver
            .resolve(&field, &ArrayValue::new(Arc::clone(&array), 0))
            .unwrap();
        let Resolved::List(elements) = resolved else {
            panic!("expected list, got {resolved:?}")
        };
        assert_eq!(elements.len(), 3);
        assert_eq!(
            ArrayResolver.resolve(&item, &elements[0]).unwrap(),
            Resolved::Scalar(ScalarValue::Int32(1))
        );
        assert_eq!(ArrayResolver.resolve(&item, &elements[1]).unwrap(), Resolved::Null);

        let null = ArrayResolver
            .resolve(&field, &ArrayValue::new(Arc::clone(&array), 1))
            .unwrap();
        assert_eq!(null, Resolved::Null);

        let empty = ArrayResolver
            .resolve(&field, &ArrayValue::new(array, 2))
            .unwrap();
        assert!(matches!(empty, Resolved::List(e) if e.is_empty()));
    }

    #[test]
    fn resolve_struct_by_name() {
        let array: ArrayRef = Arc::new(StructArray::from(vec![
            (
                Arc::new(Field::new("b", DataType::Utf8, true)),
                Arc::new(StringArray::from(vec!["x"])) as ArrayRef,
            ),
            (
                Arc::new(Field::new("a", DataType::Int32, true)),
                Arc::new(Int32Array::from(vec![7])) as ArrayRef,
            ),
        ]));
        let field = FieldDescriptor::new_struct(
            "s",
            vec![
                FieldDescriptor::new_scalar("a", TypeShape::int(32), true).unwrap(),
                FieldDescriptor::new_scalar("missing", TypeShape::Utf8, true).unwrap(),
                FieldDescriptor::new_scalar("b", TypeShape::Utf8, true).unwrap(),
            ],
            true,
        )
        .unwrap();
        let Resolved::Struct(children) = ArrayResolver
            .resolve(&field, &ArrayValue::new(array, 0))
            .unwrap()
        else {
            panic!("expected struct")
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].as_ref().unwrap().array().data_type(), &DataType::Int32);
        assert!(children[1].is_none());
        assert_eq!(children[2].as_ref().unwrap().array().data_type(), &DataType::Utf8);
    }

    #[test]
    fn scalars_follow_array_type() {
        let array: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![1_000_000]));
        let field =
            FieldDescriptor::new_scalar("ts", TypeShape::timestamp(TimeUnit::Millisecond), true)
                .unwrap();
        let resolved = ArrayResolver
            .resolve(&field, &ArrayValue::new(array, 0))
            .unwrap();
        assert_eq!(
            resolved,
            Resolved::Scalar(ScalarValue::Timestamp {
                value: 1_000_000,
                unit: TimeUnit::Nanosecond
            })
        );
    }

    #[test]
    fn shape_disagreement() {
        let mut builder = StringBuilder::new();
        builder.append_value("a");
        let array: ArrayRef = Arc::new(builder.finish());
        let item = FieldDescriptor::new_scalar("item", TypeShape::Utf8, true).unwrap();
        let field = FieldDescriptor::new_list("l", item, true).unwrap();
        let err = ArrayResolver
            .resolve(&field, &ArrayValue::new(Arc::clone(&array), 0))
            .unwrap_err();
        assert!(err.to_string().contains("cannot resolve List from an array of type Utf8"));

        let err = ArrayResolver
            .resolve(&field, &ArrayValue::new(array, 5))
            .unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }
}
