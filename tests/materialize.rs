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

//! Integration tests for materializing nested values
//!
//! 1. JSON values into nested lists and structs
//! 2. Remapping unsupported descriptors and Arrow schemas
//! 3. Arrow to Arrow materialization with [`ArrayResolver`]
//! 4. A custom resolver over a domain type

use arrow_array::cast::AsArray;
use arrow_array::types::{Int32Type, TimestampMillisecondType};
use arrow_array::{Array, ArrayRef, Int64Array, StringArray, StructArray, TimestampNanosecondArray};
use arrow_materialize::{
    assert_supported, compatible_shape, is_supported, remap, remap_arrow_field, set_complex_value,
    ArrayResolver, ArrayValue, ComplexValueWriter, FieldDescriptor, JsonResolver, MaterializeError,
    Resolved, ScalarValue, TypeShape, ValueResolver, Vector, WriterOptions, LIST_ITEM_NAME,
};
use arrow_schema::{ArrowError, DataType, Field, Fields, TimeUnit};
use serde_json::{json, Value};
use std::sync::Arc;

fn person_list() -> FieldDescriptor {
    let name = FieldDescriptor::new_scalar("name", TypeShape::Utf8, true).unwrap();
    let age = FieldDescriptor::new_scalar("age", TypeShape::int(32), true).unwrap();
    let person = FieldDescriptor::new_struct("person", vec![name, age], true).unwrap();
    FieldDescriptor::new_list("people", person, true).unwrap()
}

fn write_json(field: FieldDescriptor, values: &[Value]) -> ArrayRef {
    let mut vector = Vector::try_new(field).unwrap();
    for (row, value) in values.iter().enumerate() {
        set_complex_value(&mut vector, row, &JsonResolver, value).unwrap();
    }
    vector.finish().unwrap()
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn test_list_of_structs() {
    let value = json!([{"name": "a", "age": null}, null, {"name": null, "age": 5}]);
    let array = write_json(person_list(), &[value]);

    let list = array.as_list::<i32>();
    assert_eq!(list.len(), 1);
    assert_eq!(list.value_length(0), 3);

    let people = list.value(0);
    let people = people.as_struct();
    assert!(people.is_valid(0));
    assert!(people.is_null(1));
    assert!(people.is_valid(2));

    let names = people.column_by_name("name").unwrap().as_string::<i32>();
    assert_eq!(names.value(0), "a");
    assert!(names.is_null(2));

    let ages = people.column_by_name("age").unwrap().as_primitive::<Int32Type>();
    assert!(ages.is_null(0));
    assert_eq!(ages.value(2), 5);
}

#[test]
fn test_struct_completeness() {
    let a = FieldDescriptor::new_scalar("a", TypeShape::int(32), true).unwrap();
    let b = FieldDescriptor::new_list(
        "b",
        FieldDescriptor::new_scalar("item", TypeShape::Boolean, true).unwrap(),
        true,
    )
    .unwrap();
    let c = FieldDescriptor::new_scalar("c", TypeShape::Utf8, true).unwrap();
    let field = FieldDescriptor::new_struct("s", vec![a, b, c], false).unwrap();

    let array = write_json(field, &[json!({"c": "x"}), json!({}), json!({"a": 1, "b": [true]})]);
    let s = array.as_struct();
    assert_eq!(s.len(), 3);
    for column in s.columns() {
        assert_eq!(column.len(), 3);
    }
    assert_eq!(s.column(0).null_count(), 2);
    assert_eq!(s.column(1).null_count(), 2);
    assert_eq!(s.column(2).null_count(), 2);
}

#[test]
fn test_empty_list_is_not_null() {
    let item = FieldDescriptor::new_scalar("item", TypeShape::int(64), false).unwrap();
    let field = FieldDescriptor::new_list("l", item, true).unwrap();
    let array = write_json(field, &[json!([]), json!(null)]);
    let list = array.as_list::<i32>();
    assert!(list.is_valid(0));
    assert_eq!(list.value_length(0), 0);
    assert!(list.is_null(1));
}

#[test]
fn test_failed_row_left_unwritten() {
    let mut vector = Vector::try_new(person_list()).unwrap();
    set_complex_value(&mut vector, 0, &JsonResolver, &json!([{"name": "a"}])).unwrap();

    let bad = json!([{"name": "b"}, {"name": "c", "age": "old"}]);
    let err = set_complex_value(&mut vector, 1, &JsonResolver, &bad).unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "people[1].age");
    assert_eq!(vector.len(), 1);

    set_complex_value(&mut vector, 1, &JsonResolver, &json!([])).unwrap();
    let array = vector.finish().unwrap();
    let list = array.as_list::<i32>();
    assert_eq!(list.value_offsets(), &[0, 1, 1]);
    assert_eq!(list.values().len(), 1);
}

#[test]
fn test_depth_limit() {
    let mut field = FieldDescriptor::new_scalar("leaf", TypeShape::int(32), true).unwrap();
    let mut value = json!(1);
    for _ in 0..10 {
        field = FieldDescriptor::new_list("l", field.with_name(LIST_ITEM_NAME), true).unwrap();
        value = json!([value]);
    }
    assert_eq!(field.depth(), 11);

    let mut vector = Vector::try_new(field).unwrap();
    let writer = ComplexValueWriter::new(WriterOptions::default().with_max_depth(8));
    let err = writer
        .set_complex_value(&mut vector, 0, &JsonResolver, &value)
        .unwrap_err();
    assert!(
        matches!(err, MaterializeError::RecursionLimitExceeded { limit: 8, .. }),
        "{err}"
    );
    assert!(vector.is_empty());

    set_complex_value(&mut vector, 0, &JsonResolver, &value).unwrap();
    assert_eq!(vector.len(), 1);
}

// ============================================================================
// Remapping
// ============================================================================

#[test]
fn test_nanosecond_timestamp() {
    let field = FieldDescriptor::new_scalar("asdf", TypeShape::timestamp(TimeUnit::Nanosecond), true)
        .unwrap();
    let err = Vector::try_new(field.clone()).unwrap_err();
    assert!(matches!(err, MaterializeError::UnsupportedType { .. }), "{err}");

    let updated = remap(&field, compatible_shape).unwrap();
    assert!(is_supported(&updated));
    assert_eq!(remap(&updated, compatible_shape).unwrap(), updated);

    let array = write_json(updated, &[json!("2020-01-01T00:00:00.5Z"), json!(null)]);
    let array = array.as_primitive::<TimestampMillisecondType>();
    assert_eq!(array.value(0), 1_577_836_800_500);
    assert!(array.is_null(1));
}

#[test]
fn test_remap_arrow_field() {
    let entries = Fields::from(vec![
        Field::new("k", DataType::UInt16, false),
        Field::new("v", DataType::LargeUtf8, true),
    ]);
    let entries = Field::new("kv", DataType::Struct(entries), false);
    let map = Field::new("m", DataType::Map(Arc::new(entries), false), true);
    let field = Field::new(
        "root",
        DataType::Struct(vec![map, Field::new("t", DataType::Time64(TimeUnit::Microsecond), true)].into()),
        false,
    );
    let remapped = remap_arrow_field(&field, compatible_shape).unwrap();

    let descriptor = FieldDescriptor::try_from(&remapped).unwrap();
    assert_supported(&descriptor).unwrap();

    let DataType::Struct(fields) = remapped.data_type() else {
        panic!("expected struct, got {}", remapped.data_type())
    };
    let DataType::Map(entries, _) = fields[0].data_type() else {
        panic!("expected map, got {}", fields[0].data_type())
    };
    let DataType::Struct(entries) = entries.data_type() else {
        panic!("expected struct entries")
    };
    assert_eq!(entries[0].name(), "key");
    assert_eq!(entries[0].data_type(), &DataType::Int32);
    assert_eq!(entries[1].data_type(), &DataType::Utf8);
    assert_eq!(fields[1].data_type(), &DataType::Date64);
}

// ============================================================================
// Arrow to Arrow
// ============================================================================

#[test]
fn test_arrow_to_arrow_remapped() {
    let ids: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
    let ts: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![
        Some(1_000_000_000),
        None,
        Some(1_500_000),
    ]));
    let source: ArrayRef = Arc::new(StructArray::from(vec![
        (Arc::new(Field::new("id", DataType::Int64, false)), ids),
        (
            Arc::new(Field::new("ts", DataType::Timestamp(TimeUnit::Nanosecond, None), true)),
            ts,
        ),
    ]));
    let field = Field::new("row", source.data_type().clone(), false);
    let descriptor = FieldDescriptor::try_from(&field).unwrap();
    let descriptor = remap(&descriptor, compatible_shape).unwrap();

    let mut vector = Vector::try_new(descriptor).unwrap();
    for row in 0..2 {
        let value = ArrayValue::new(Arc::clone(&source), row);
        set_complex_value(&mut vector, row, &ArrayResolver, &value).unwrap();
    }
    // 1.5ms has no exact millisecond representation
    let value = ArrayValue::new(Arc::clone(&source), 2);
    let err = set_complex_value(&mut vector, 2, &ArrayResolver, &value).unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "row.ts");
    assert_eq!(vector.len(), 2);

    let array = vector.finish().unwrap();
    let s = array.as_struct();
    let ts = s.column(1).as_primitive::<TimestampMillisecondType>();
    assert_eq!(ts.value(0), 1_000);
    assert!(ts.is_null(1));
}

// ============================================================================
// Custom resolver
// ============================================================================

/// A domain value with its own notion of absence
#[derive(Debug, Clone)]
enum Token {
    Missing,
    Word(String),
    Sentence(Vec<Token>),
}

struct TokenResolver;

impl ValueResolver for TokenResolver {
    type Value = Token;

    fn resolve(&self, field: &FieldDescriptor, value: &Token) -> Result<Resolved<Token>, ArrowError> {
        match (field.shape(), value) {
            (_, Token::Missing) => Ok(Resolved::Null),
            (TypeShape::List, Token::Sentence(words)) => Ok(Resolved::List(words.clone())),
            (TypeShape::Utf8, Token::Word(w)) => Ok(Resolved::Scalar(ScalarValue::Utf8(w.clone()))),
            (shape, value) => Err(ArrowError::InvalidArgumentError(format!(
                "cannot resolve {value:?} as {shape}"
            ))),
        }
    }
}

#[test]
fn test_custom_resolver() {
    let item = FieldDescriptor::new_scalar("item", TypeShape::Utf8, true).unwrap();
    let field = FieldDescriptor::new_list("sentence", item, true).unwrap();
    let mut vector = Vector::try_new(field).unwrap();

    let sentence = Token::Sentence(vec![
        Token::Word("hello".to_string()),
        Token::Missing,
        Token::Word("world".to_string()),
    ]);
    set_complex_value(&mut vector, 0, &TokenResolver, &sentence).unwrap();
    set_complex_value(&mut vector, 1, &TokenResolver, &Token::Missing).unwrap();

    let nested = Token::Sentence(vec![Token::Sentence(vec![])]);
    let err = set_complex_value(&mut vector, 2, &TokenResolver, &nested).unwrap_err();
    assert_eq!(err.path().unwrap().to_string(), "sentence[0]");

    let array = vector.finish().unwrap();
    let list = array.as_list::<i32>();
    assert_eq!(list.len(), 2);
    let expected = StringArray::from(vec![Some("hello"), None, Some("world")]);
    assert_eq!(list.value(0).as_string::<i32>(), &expected);
    assert!(list.is_null(1));
}
