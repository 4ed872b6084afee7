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

//! A growable columnar buffer bound to a [`FieldDescriptor`]

use std::sync::Arc;

use arrow_array::{make_array, ArrayRef};
use arrow_buffer::{
    ArrowNativeType, BooleanBufferBuilder, BufferBuilder, MutableBuffer, NullBufferBuilder,
};
use arrow_data::{ArrayData, ArrayDataBuilder};
use arrow_schema::ArrowError;
use tracing::trace;

use crate::descriptor::{DateUnit, DescriptorRef, FieldDescriptor, TypeShape};
use crate::error::MaterializeError;
use crate::path::{FieldPath, PathSegment};
use crate::support::assert_supported;
use crate::writer::DEFAULT_MAX_DEPTH;

/// A positional, growable columnar buffer realising one [`FieldDescriptor`]
///
/// A [`Vector`] is filled row by row with
/// [`ComplexValueWriter`](crate::ComplexValueWriter) and converted into an
/// Arrow array with [`Vector::finish`]. Its length is the highest written
/// position plus one: writing at a position below the current length first
/// truncates the vector back to that position, and writing past the end
/// pads the gap with null rows.
///
/// Children of struct and union vectors are filled lazily, and may therefore
/// be shorter than their parent until the next write or [`Vector::finish`].
#[derive(Debug)]
pub struct Vector {
    field: DescriptorRef,
    len: usize,
    nulls: NullBufferBuilder,
    storage: Storage,
}

#[derive(Debug)]
enum Storage {
    Boolean(BooleanBufferBuilder),
    Fixed {
        values: MutableBuffer,
        byte_width: usize,
    },
    Bytes {
        offsets: BufferBuilder<i32>,
        values: MutableBuffer,
    },
    /// Lists and maps
    List {
        offsets: BufferBuilder<i32>,
        child: Box<Vector>,
    },
    Struct(Vec<Vector>),
    Union {
        type_ids: BufferBuilder<i8>,
        children: Vec<Vector>,
    },
}

impl Vector {
    /// Creates an empty vector for `field`
    ///
    /// Returns [`MaterializeError::UnsupportedType`] if any node of `field` is
    /// not supported, see [`remap`](crate::remap), and
    /// [`MaterializeError::RecursionLimitExceeded`] if `field` is nested more
    /// than [`DEFAULT_MAX_DEPTH`] levels deep
    pub fn try_new(field: impl Into<DescriptorRef>) -> Result<Self, MaterializeError> {
        Self::try_new_with_max_depth(field, DEFAULT_MAX_DEPTH)
    }

    /// Creates an empty vector for `field`, accepting descriptors up to
    /// `max_depth` levels deep, counting the root as one
    ///
    /// See [`WriterOptions::with_max_depth`](crate::WriterOptions::with_max_depth)
    pub fn try_new_with_max_depth(
        field: impl Into<DescriptorRef>,
        max_depth: usize,
    ) -> Result<Self, MaterializeError> {
        let field = field.into();
        check_depth(&field, max_depth)?;
        assert_supported(&field)?;
        Self::new_unchecked(field)
    }

    fn new_unchecked(field: DescriptorRef) -> Result<Self, MaterializeError> {
        let storage = match field.shape() {
            TypeShape::Boolean => Storage::Boolean(BooleanBufferBuilder::new(0)),
            TypeShape::Int { bit_width, .. } | TypeShape::Float { bit_width } => Storage::Fixed {
                values: MutableBuffer::new(0),
                byte_width: *bit_width as usize / 8,
            },
            TypeShape::Decimal { .. } => fixed::<i128>(),
            TypeShape::Date(DateUnit::Day) => fixed::<i32>(),
            TypeShape::Date(DateUnit::Millisecond) | TypeShape::Timestamp { .. } => fixed::<i64>(),
            TypeShape::Utf8 | TypeShape::Binary => Storage::Bytes {
                offsets: new_offsets(),
                values: MutableBuffer::new(0),
            },
            TypeShape::List | TypeShape::Map { .. } => Storage::List {
                offsets: new_offsets(),
                child: Box::new(Self::new_unchecked(Arc::clone(&field.children()[0]))?),
            },
            TypeShape::Struct => Storage::Struct(new_children(&field)?),
            TypeShape::Union => Storage::Union {
                type_ids: BufferBuilder::new(0),
                children: new_children(&field)?,
            },
            TypeShape::LargeUtf8
            | TypeShape::LargeBinary
            | TypeShape::FixedSizeBinary(_)
            | TypeShape::Time(_) => {
                return Err(MaterializeError::Arrow(ArrowError::NotYetImplemented(
                    format!("vector storage for {}", field.shape()),
                )))
            }
        };
        Ok(Self {
            field,
            len: 0,
            nulls: NullBufferBuilder::new(0),
            storage,
        })
    }

    /// The descriptor this vector realises
    pub fn field(&self) -> &DescriptorRef {
        &self.field
    }

    /// The number of rows in this vector
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if this vector has no rows
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `row` has been written with a non-null value
    ///
    /// Union rows are always valid in the Arrow layout; this reports whether
    /// the written union value itself was null.
    pub fn is_valid(&self, row: usize) -> bool {
        row < self.len && self.nulls.is_valid(row)
    }

    /// Shortens this vector to `len` rows, also discarding any child values
    /// that belong to the removed rows
    ///
    /// Has no effect on rows below `len`
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            trace!(field = self.field.name(), from = self.len, to = len, "truncating vector");
            self.len = len;
            self.nulls.truncate(len);
        }
        let len = self.len;
        match &mut self.storage {
            Storage::Boolean(values) => values.truncate(len),
            Storage::Fixed { values, byte_width } => values.truncate(len * *byte_width),
            Storage::Bytes { offsets, values } => {
                offsets.truncate(len + 1);
                values.truncate(offsets.as_slice()[len].as_usize());
            }
            Storage::List { offsets, child } => {
                offsets.truncate(len + 1);
                child.truncate(offsets.as_slice()[len].as_usize());
            }
            Storage::Struct(children) => children.iter_mut().for_each(|c| c.truncate(len)),
            Storage::Union { type_ids, children } => {
                type_ids.truncate(len);
                children.iter_mut().for_each(|c| c.truncate(len));
            }
        }
    }

    /// Freezes this vector into an Arrow array
    ///
    /// The result is validated against the Arrow layout rules, including that
    /// non-nullable children contain no nulls that are not masked by a parent
    pub fn finish(self) -> Result<ArrayRef, MaterializeError> {
        Ok(make_array(self.into_data()?))
    }

    fn into_data(mut self) -> Result<ArrayData, ArrowError> {
        let len = self.len;
        let builder = ArrayDataBuilder::new(self.field.data_type()).len(len);
        let builder = match self.storage {
            Storage::Boolean(mut values) => builder
                .add_buffer(values.finish().into_inner())
                .nulls(self.nulls.finish()),
            Storage::Fixed { values, .. } => {
                builder.add_buffer(values.into()).nulls(self.nulls.finish())
            }
            Storage::Bytes {
                mut offsets,
                values,
            } => builder
                .add_buffer(offsets.finish())
                .add_buffer(values.into())
                .nulls(self.nulls.finish()),
            Storage::List { mut offsets, child } => builder
                .add_buffer(offsets.finish())
                .add_child_data(child.into_data()?)
                .nulls(self.nulls.finish()),
            Storage::Struct(children) => builder
                .child_data(finish_children(children, len)?)
                .nulls(self.nulls.finish()),
            Storage::Union {
                mut type_ids,
                children,
            } => builder
                .add_buffer(type_ids.finish())
                .child_data(finish_children(children, len)?),
        };
        builder.build()
    }

    /// Prepares this vector for a write at `row`, truncating or padding with
    /// nulls so that `row` is the next row appended
    pub(crate) fn prepare(&mut self, row: usize) {
        match row.cmp(&self.len) {
            std::cmp::Ordering::Less => self.truncate(row),
            std::cmp::Ordering::Equal => {}
            std::cmp::Ordering::Greater => self.append_nulls(row - self.len),
        }
    }

    /// Appends `n` null rows
    pub(crate) fn append_nulls(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.nulls.append_n_nulls(n);
        self.len += n;
        match &mut self.storage {
            Storage::Boolean(values) => values.append_n(n, false),
            Storage::Fixed { values, byte_width } => values.extend_zeros(n * *byte_width),
            Storage::Bytes { offsets, .. } | Storage::List { offsets, .. } => {
                let end = last_offset(offsets);
                offsets.append_n(n, end);
            }
            // children are padded on the next write or when finished
            Storage::Struct(_) => {}
            Storage::Union { type_ids, .. } => type_ids.append_n(n, 0),
        }
    }

    /// Appends a null row
    pub(crate) fn append_null(&mut self) {
        self.append_nulls(1)
    }

    /// Appends a boolean row
    pub(crate) fn append_bool(&mut self, value: bool) -> Result<(), ArrowError> {
        match &mut self.storage {
            Storage::Boolean(values) => values.append(value),
            _ => return Err(self.invalid_append("a boolean")),
        }
        self.append_valid();
        Ok(())
    }

    /// Appends a fixed width row, `T` must match the width of the vector
    pub(crate) fn append_native<T: ArrowNativeType>(&mut self, value: T) -> Result<(), ArrowError> {
        match &mut self.storage {
            Storage::Fixed { values, byte_width } if *byte_width == T::get_byte_width() => {
                values.push(value)
            }
            _ => return Err(self.invalid_append(std::any::type_name::<T>())),
        }
        self.append_valid();
        Ok(())
    }

    /// Appends a variable width row
    pub(crate) fn append_bytes(&mut self, value: &[u8]) -> Result<(), ArrowError> {
        match &mut self.storage {
            Storage::Bytes { offsets, values } => {
                let end = values.len() + value.len();
                let end = i32::try_from(end).map_err(|_| offset_overflow(end))?;
                values.extend_from_slice(value);
                offsets.append(end);
            }
            _ => return Err(self.invalid_append("bytes")),
        }
        self.append_valid();
        Ok(())
    }

    /// Appends a list row ending at the current length of the child vector
    pub(crate) fn append_list(&mut self) -> Result<(), ArrowError> {
        match &mut self.storage {
            Storage::List { offsets, child } => {
                let end = i32::try_from(child.len()).map_err(|_| offset_overflow(child.len()))?;
                offsets.append(end);
            }
            _ => return Err(self.invalid_append("a list")),
        }
        self.append_valid();
        Ok(())
    }

    /// Appends a valid struct row, the children must already be written
    pub(crate) fn append_struct(&mut self) -> Result<(), ArrowError> {
        match &self.storage {
            Storage::Struct(_) => {}
            _ => return Err(self.invalid_append("a struct")),
        }
        self.append_valid();
        Ok(())
    }

    /// Appends a union row selecting `type_id`
    pub(crate) fn append_union(&mut self, type_id: i8) -> Result<(), ArrowError> {
        match &mut self.storage {
            Storage::Union { type_ids, .. } => type_ids.append(type_id),
            _ => return Err(self.invalid_append("a union")),
        }
        self.append_valid();
        Ok(())
    }

    /// The child vectors: the item of a list, the entries of a map, the
    /// fields of a struct or the alternatives of a union
    pub(crate) fn children_mut(&mut self) -> &mut [Vector] {
        match &mut self.storage {
            Storage::List { child, .. } => std::slice::from_mut(child.as_mut()),
            Storage::Struct(children) | Storage::Union { children, .. } => children,
            Storage::Boolean(_) | Storage::Fixed { .. } | Storage::Bytes { .. } => &mut [],
        }
    }

    fn append_valid(&mut self) {
        self.nulls.append_non_null();
        self.len += 1;
    }

    fn invalid_append(&self, what: &str) -> ArrowError {
        ArrowError::InvalidArgumentError(format!(
            "cannot append {what} to a vector of {}",
            self.field.shape()
        ))
    }
}

/// Walks `field` without recursion, so that an over-deep tree is rejected
/// before any recursive traversal
fn check_depth(field: &FieldDescriptor, max_depth: usize) -> Result<(), MaterializeError> {
    let mut stack = vec![(field, FieldPath::root(field.name()))];
    while let Some((node, path)) = stack.pop() {
        if path.len() > max_depth {
            return Err(MaterializeError::RecursionLimitExceeded {
                path,
                limit: max_depth,
            });
        }
        for child in node.children() {
            let path = path.child(PathSegment::field(child.name()));
            stack.push((child.as_ref(), path));
        }
    }
    Ok(())
}

fn fixed<T: ArrowNativeType>() -> Storage {
    Storage::Fixed {
        values: MutableBuffer::new(0),
        byte_width: T::get_byte_width(),
    }
}

fn new_offsets() -> BufferBuilder<i32> {
    let mut offsets = BufferBuilder::new(1);
    offsets.append(0);
    offsets
}

fn offset_overflow(end: usize) -> ArrowError {
    ArrowError::ComputeError(format!("offset overflow: {end} exceeds i32::MAX"))
}

fn last_offset(offsets: &BufferBuilder<i32>) -> i32 {
    offsets.as_slice().last().copied().unwrap_or_default()
}

fn new_children(field: &FieldDescriptor) -> Result<Vec<Vector>, MaterializeError> {
    field
        .children()
        .iter()
        .map(|c| Vector::new_unchecked(Arc::clone(c)))
        .collect()
}

fn finish_children(children: Vec<Vector>, len: usize) -> Result<Vec<ArrayData>, ArrowError> {
    children
        .into_iter()
        .map(|mut child| {
            child.prepare(len);
            child.into_data()
        })
        .collect()
}
