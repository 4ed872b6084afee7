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

//! Materialize nested values into Arrow columnar vectors
//!
//! A [`FieldDescriptor`] describes the shape of a column: a scalar, or a
//! [`List`](TypeShape::List), [`Struct`](TypeShape::Struct),
//! [`Map`](TypeShape::Map) or [`Union`](TypeShape::Union) of further
//! descriptors. A [`Vector`] is a growable columnar buffer bound to one
//! descriptor, which [`ComplexValueWriter`] fills one row at a time from
//! caller-defined values interpreted through a [`ValueResolver`].
//!
//! Only a subset of Arrow types can be materialized, see [`is_supported`].
//! Descriptors with unsupported nodes are rewritten with [`remap`] first.
//!
//! ```
//! # use arrow_array::cast::AsArray;
//! # use arrow_array::Array;
//! # use arrow_schema::TimeUnit;
//! # use arrow_materialize::{compatible_shape, remap, set_complex_value, FieldDescriptor, JsonResolver, TypeShape, Vector};
//! # use serde_json::json;
//! let fields = vec![
//!     FieldDescriptor::new_scalar("id", TypeShape::int(64), false).unwrap(),
//!     FieldDescriptor::new_scalar("seen", TypeShape::timestamp(TimeUnit::Nanosecond), true).unwrap(),
//! ];
//! let field = FieldDescriptor::new_struct("event", fields, true).unwrap();
//!
//! // nanosecond timestamps must be remapped before they can be written
//! assert!(Vector::try_new(field.clone()).is_err());
//! let field = remap(&field, compatible_shape).unwrap();
//!
//! let mut vector = Vector::try_new(field).unwrap();
//! let value = json!({"id": 1, "seen": "2024-03-01T12:00:00Z"});
//! set_complex_value(&mut vector, 0, &JsonResolver, &value).unwrap();
//! set_complex_value(&mut vector, 1, &JsonResolver, &json!(null)).unwrap();
//!
//! let array = vector.finish().unwrap();
//! let events = array.as_struct();
//! assert_eq!(events.len(), 2);
//! assert!(events.is_null(1));
//! ```

#![warn(missing_docs)]

#[cfg(any(test, feature = "test_utils"))]
pub mod data_gen;
mod descriptor;
mod error;
mod path;
pub mod resolver;
mod scalar;
mod support;
mod vector;
pub mod visit;
mod writer;

pub use descriptor::{
    DateUnit, DescriptorRef, FieldDescriptor, TypeShape, LIST_ITEM_NAME, MAP_ENTRIES_NAME,
    MAP_KEY_NAME, MAP_VALUE_NAME,
};
pub use error::MaterializeError;
pub use path::{FieldPath, PathSegment};
pub use resolver::{ArrayResolver, ArrayValue, JsonResolver, Resolved, ValueResolver};
pub use scalar::ScalarValue;
pub use support::{
    assert_supported, compatible_shape, is_supported, is_supported_shape, remap,
    remap_arrow_field, remap_schema,
};
pub use vector::Vector;
pub use writer::{
    set_complex_value, ComplexValueWriter, WriterOptions, DEFAULT_MAX_DEPTH,
};
