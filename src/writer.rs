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

//! Recursive materialization of resolved values into a [`Vector`]
//!
//! ```
//! # use arrow_array::cast::AsArray;
//! # use arrow_array::Array;
//! # use arrow_materialize::{set_complex_value, FieldDescriptor, JsonResolver, TypeShape, Vector};
//! # use serde_json::json;
//! let item = FieldDescriptor::new_scalar("item", TypeShape::int(64), true).unwrap();
//! let field = FieldDescriptor::new_list("values", item, true).unwrap();
//! let mut vector = Vector::try_new(field).unwrap();
//!
//! set_complex_value(&mut vector, 0, &JsonResolver, &json!([1, null, 3])).unwrap();
//! set_complex_value(&mut vector, 2, &JsonResolver, &json!([])).unwrap();
//!
//! let array = vector.finish().unwrap();
//! let list = array.as_list::<i32>();
//! assert_eq!(list.value_offsets(), &[0, 3, 3, 3]);
//! assert!(list.is_null(1));
//! assert!(list.is_valid(2));
//! ```

use std::sync::Arc;

use arrow_schema::TimeUnit;
use tracing::debug;

use crate::descriptor::{DateUnit, TypeShape};
use crate::error::MaterializeError;
use crate::path::{FieldPath, PathSegment};
use crate::resolver::{Resolved, ValueResolver};
use crate::scalar::ScalarValue;
use crate::vector::Vector;

/// The default [`WriterOptions::max_depth`]
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for [`ComplexValueWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    max_depth: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl WriterOptions {
    /// Sets the maximum number of nested descriptor levels a single write
    /// may descend through, counting the root as one
    ///
    /// Defaults to [`DEFAULT_MAX_DEPTH`]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the maximum nesting depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Writes resolved values into [`Vector`]s, one row at a time
#[derive(Debug, Clone, Default)]
pub struct ComplexValueWriter {
    options: WriterOptions,
}

impl ComplexValueWriter {
    /// Creates a new writer with the provided options
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Returns the options of this writer
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Writes `value` into `vector` at row `position`
    ///
    /// Any rows at or after `position` are discarded first, and any gap
    /// between the current length and `position` is filled with nulls. On
    /// failure the vector is rolled back so that `position` is left
    /// unwritten, and the error is returned.
    pub fn set_complex_value<R: ValueResolver>(
        &self,
        vector: &mut Vector,
        position: usize,
        resolver: &R,
        value: &R::Value,
    ) -> Result<(), MaterializeError> {
        let path = FieldPath::root(vector.field().name());
        match self.write(vector, position, resolver, value, &path, 1) {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(position, error = %e, "rolling back failed write");
                vector.truncate(position);
                Err(e)
            }
        }
    }

    fn write<R: ValueResolver>(
        &self,
        vector: &mut Vector,
        row: usize,
        resolver: &R,
        value: &R::Value,
        path: &FieldPath,
        depth: usize,
    ) -> Result<(), MaterializeError> {
        if depth > self.options.max_depth {
            return Err(MaterializeError::RecursionLimitExceeded {
                path: path.clone(),
                limit: self.options.max_depth,
            });
        }
        let resolved = resolver
            .resolve(vector.field(), value)
            .map_err(|e| MaterializeError::mismatch(path, e.to_string()))?;
        self.write_resolved(vector, row, resolver, resolved, path, depth)
    }

    fn write_resolved<R: ValueResolver>(
        &self,
        vector: &mut Vector,
        row: usize,
        resolver: &R,
        resolved: Resolved<R::Value>,
        path: &FieldPath,
        depth: usize,
    ) -> Result<(), MaterializeError> {
        let field = Arc::clone(vector.field());
        vector.prepare(row);

        match (field.shape(), resolved) {
            (_, Resolved::Null) => {
                if !field.is_nullable() {
                    return Err(MaterializeError::mismatch(
                        path,
                        "null value for a non-nullable field",
                    ));
                }
                vector.append_null();
            }
            (shape, Resolved::Scalar(scalar)) if !shape.is_nested() => {
                write_scalar(vector, &scalar, path)?;
            }
            (TypeShape::List | TypeShape::Map { .. }, Resolved::List(items)) => {
                let child = &mut vector.children_mut()[0];
                let start = child.len();
                for (idx, item) in items.iter().enumerate() {
                    let path = path.child(PathSegment::Index(idx));
                    self.write(child, start + idx, resolver, item, &path, depth + 1)?;
                }
                vector.append_list()?;
            }
            (TypeShape::Struct, Resolved::Struct(values)) => {
                if values.len() != field.children().len() {
                    return Err(MaterializeError::mismatch(
                        path,
                        format!(
                            "expected {} struct fields, found {}",
                            field.children().len(),
                            values.len()
                        ),
                    ));
                }
                for (child, value) in vector.children_mut().iter_mut().zip(&values) {
                    let path = path.child(PathSegment::field(child.field().name()));
                    match value {
                        Some(value) => self.write(child, row, resolver, value, &path, depth + 1)?,
                        None => self.write_resolved(
                            child,
                            row,
                            resolver,
                            Resolved::Null,
                            &path,
                            depth + 1,
                        )?,
                    }
                }
                vector.append_struct()?;
            }
            (TypeShape::Union, Resolved::Union { alternative, value }) => {
                let type_id = i8::try_from(alternative).ok();
                let Some((type_id, child)) =
                    type_id.zip(vector.children_mut().get_mut(alternative))
                else {
                    return Err(MaterializeError::mismatch(
                        path,
                        format!(
                            "alternative {alternative} out of range for a union of {}",
                            field.children().len()
                        ),
                    ));
                };
                let path = path.child(PathSegment::field(child.field().name()));
                self.write(child, row, resolver, &value, &path, depth + 1)?;
                vector.append_union(type_id)?;
            }
            (shape, resolved) => {
                return Err(MaterializeError::mismatch(
                    path,
                    format!("cannot write a {} value to {shape}", resolved.kind()),
                ))
            }
        }
        Ok(())
    }
}

/// Writes `value` into `vector` at row `position` with the default
/// [`WriterOptions`]
///
/// See [`ComplexValueWriter::set_complex_value`]
pub fn set_complex_value<R: ValueResolver>(
    vector: &mut Vector,
    position: usize,
    resolver: &R,
    value: &R::Value,
) -> Result<(), MaterializeError> {
    ComplexValueWriter::default().set_complex_value(vector, position, resolver, value)
}

fn write_scalar(
    vector: &mut Vector,
    scalar: &ScalarValue,
    path: &FieldPath,
) -> Result<(), MaterializeError> {
    let shape = vector.field().shape().clone();
    let mismatch = || MaterializeError::mismatch(path, format!("cannot convert {scalar:?} to {shape}"));
    match &shape {
        TypeShape::Boolean => vector.append_bool(scalar.to_boolean().ok_or_else(mismatch)?)?,
        TypeShape::Int { bit_width: 8, .. } => {
            vector.append_native(scalar.to_int::<i8>().ok_or_else(mismatch)?)?
        }
        TypeShape::Int { bit_width: 16, .. } => {
            vector.append_native(scalar.to_int::<i16>().ok_or_else(mismatch)?)?
        }
        TypeShape::Int { bit_width: 32, .. } => {
            vector.append_native(scalar.to_int::<i32>().ok_or_else(mismatch)?)?
        }
        TypeShape::Int { .. } => vector.append_native(scalar.to_int::<i64>().ok_or_else(mismatch)?)?,
        TypeShape::Float { bit_width: 32 } => {
            vector.append_native(scalar.to_float::<f32>().ok_or_else(mismatch)?)?
        }
        TypeShape::Float { .. } => {
            vector.append_native(scalar.to_float::<f64>().ok_or_else(mismatch)?)?
        }
        TypeShape::Decimal { precision, scale } => vector.append_native(
            scalar
                .to_decimal(*precision, *scale)
                .ok_or_else(mismatch)?,
        )?,
        TypeShape::Utf8 => {
            let s = scalar.to_utf8().ok_or_else(mismatch)?;
            vector.append_bytes(s.as_bytes())?
        }
        TypeShape::Binary => vector.append_bytes(scalar.as_bytes().ok_or_else(mismatch)?)?,
        TypeShape::Date(DateUnit::Day) => {
            vector.append_native(scalar.to_date32().ok_or_else(mismatch)?)?
        }
        TypeShape::Date(DateUnit::Millisecond) => {
            vector.append_native(scalar.to_date64().ok_or_else(mismatch)?)?
        }
        TypeShape::Timestamp {
            unit: unit @ (TimeUnit::Second | TimeUnit::Millisecond),
            ..
        } => vector.append_native(scalar.to_timestamp(*unit).ok_or_else(mismatch)?)?,
        TypeShape::Timestamp { .. }
        | TypeShape::Time(_)
        | TypeShape::LargeUtf8
        | TypeShape::LargeBinary
        | TypeShape::FixedSizeBinary(_)
        | TypeShape::List
        | TypeShape::Struct
        | TypeShape::Map { .. }
        | TypeShape::Union => return Err(mismatch()),
    }
    Ok(())
}
