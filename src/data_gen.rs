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

//! Utilities to generate random descriptors and arrays
//!
//! Only supported shapes are drawn, so every generated descriptor can be
//! materialized without remapping. Arrays are built bottom-up with the Arrow
//! array constructors, independently of [`Vector`](crate::Vector), and are laid
//! out canonically: null list slots are empty, and each alternative of a sparse
//! union is null wherever it is not selected.

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::*;
use arrow_array::{
    ArrayRef, ArrowPrimitiveType, BinaryArray, BooleanArray, ListArray, MapArray, PrimitiveArray,
    StringArray, StructArray, UnionArray,
};
use arrow_buffer::{NullBuffer, OffsetBuffer, ScalarBuffer};
use arrow_schema::{ArrowError, DataType, TimeUnit};
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::descriptor::{DateUnit, FieldDescriptor, TypeShape, LIST_ITEM_NAME};
use crate::error::MaterializeError;
use crate::support::assert_supported;

const MILLIS_PER_DAY: i64 = 86_400_000;
const DAYS_PER_CENTURY: i32 = 365 * 100;
const SECONDS_PER_CENTURY: i64 = 60 * 60 * 24 * 365 * 100;

/// Bounds for [`create_random_descriptor`] and [`create_random_array`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorOptions {
    max_depth: usize,
    max_children: usize,
    max_list_len: usize,
    null_density: f32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_children: 4,
            max_list_len: 4,
            null_density: 0.2,
        }
    }
}

impl GeneratorOptions {
    /// Sets the maximum depth of generated descriptors, counting the root
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Sets the maximum number of struct fields or union alternatives
    pub fn with_max_children(mut self, max_children: usize) -> Self {
        self.max_children = max_children.max(1);
        self
    }

    /// Sets the maximum number of elements of a generated list or map
    pub fn with_max_list_len(mut self, max_list_len: usize) -> Self {
        self.max_list_len = max_list_len;
        self
    }

    /// Sets the probability of a nullable slot being null
    pub fn with_null_density(mut self, null_density: f32) -> Self {
        self.null_density = null_density.clamp(0.0, 1.0);
        self
    }

    /// Returns the maximum descriptor depth
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the maximum number of children of a struct or union
    pub fn max_children(&self) -> usize {
        self.max_children
    }

    /// Returns the maximum length of a list or map
    pub fn max_list_len(&self) -> usize {
        self.max_list_len
    }

    /// Returns the probability of a nullable slot being null
    pub fn null_density(&self) -> f32 {
        self.null_density
    }
}

/// Create a random supported [`FieldDescriptor`] named `root`
pub fn create_random_descriptor<R: Rng + ?Sized>(
    rng: &mut R,
    options: &GeneratorOptions,
) -> Result<FieldDescriptor, MaterializeError> {
    let nullable = rng.random_bool(0.5);
    let field = random_field(rng, options, "root", 1, nullable)?;
    assert_supported(&field)?;
    Ok(field)
}

/// Create a random [`ArrayRef`] of `size` rows for `field`
pub fn create_random_array<R: Rng + ?Sized>(
    field: &FieldDescriptor,
    size: usize,
    options: &GeneratorOptions,
    rng: &mut R,
) -> Result<ArrayRef, MaterializeError> {
    assert_supported(field)?;
    Ok(random_array(rng, field, options, &vec![false; size], true)?)
}

/// Create a random descriptor together with a random array of `size` rows
pub fn create_random_fixture<R: Rng + ?Sized>(
    rng: &mut R,
    size: usize,
    options: &GeneratorOptions,
) -> Result<(FieldDescriptor, ArrayRef), MaterializeError> {
    let field = create_random_descriptor(rng, options)?;
    let array = create_random_array(&field, size, options, rng)?;
    Ok((field, array))
}

fn random_field<R: Rng + ?Sized>(
    rng: &mut R,
    options: &GeneratorOptions,
    name: &str,
    depth: usize,
    nullable: bool,
) -> Result<FieldDescriptor, MaterializeError> {
    // maps need two levels below them for the entries and their fields
    let max_kind = match options.max_depth.saturating_sub(depth) {
        0 => return FieldDescriptor::new_scalar(name, random_shape(rng), nullable),
        1 => 3,
        _ => 4,
    };
    if rng.random_bool(0.5) {
        return FieldDescriptor::new_scalar(name, random_shape(rng), nullable);
    }
    match rng.random_range(0..max_kind) {
        0 => {
            let item_nullable = rng.random_bool(0.5);
            let item = random_field(rng, options, LIST_ITEM_NAME, depth + 1, item_nullable)?;
            FieldDescriptor::new_list(name, item, nullable)
        }
        1 => {
            let mut children = vec![];
            for idx in 0..rng.random_range(1..=options.max_children) {
                let child_nullable = rng.random_bool(0.5);
                let child = random_field(rng, options, &format!("f{idx}"), depth + 1, child_nullable)?;
                children.push(child);
            }
            FieldDescriptor::new_struct(name, children, nullable)
        }
        // unions carry no validity of their own, so they are always nullable
        2 => {
            let mut alternatives = vec![];
            for idx in 0..rng.random_range(1..=options.max_children) {
                alternatives.push(random_field(rng, options, &format!("a{idx}"), depth + 1, true)?);
            }
            FieldDescriptor::new_union(name, alternatives, true)
        }
        _ => {
            let key = FieldDescriptor::new_scalar("key", random_shape(rng), false)?;
            let value_nullable = rng.random_bool(0.5);
            let value = random_field(rng, options, "value", depth + 2, value_nullable)?;
            FieldDescriptor::new_map(name, key, value, nullable)
        }
    }
}

fn random_shape<R: Rng + ?Sized>(rng: &mut R) -> TypeShape {
    match rng.random_range(0..12) {
        0 => TypeShape::Boolean,
        1 => TypeShape::int(8),
        2 => TypeShape::int(16),
        3 => TypeShape::int(32),
        4 => TypeShape::int(64),
        5 => TypeShape::Float {
            bit_width: if rng.random_bool(0.5) { 32 } else { 64 },
        },
        6 => {
            let precision = rng.random_range(1..=38);
            TypeShape::Decimal {
                precision,
                scale: rng.random_range(0..=precision.min(10)) as i8,
            }
        }
        7 => TypeShape::Utf8,
        8 => TypeShape::Binary,
        9 => TypeShape::Date(DateUnit::Day),
        10 => TypeShape::Date(DateUnit::Millisecond),
        _ => {
            let unit = if rng.random_bool(0.5) {
                TimeUnit::Second
            } else {
                TimeUnit::Millisecond
            };
            let timezone = match rng.random_range(0..3) {
                0 => None,
                1 => Some("UTC".into()),
                _ => Some("+05:00".into()),
            };
            TypeShape::Timestamp { unit, timezone }
        }
    }
}

/// Rows where `mask` is set are generated null. Other rows are null with
/// [`GeneratorOptions::null_density`] if `field` is nullable and `allow_nulls`
fn random_array<R: Rng + ?Sized>(
    rng: &mut R,
    field: &FieldDescriptor,
    options: &GeneratorOptions,
    mask: &[bool],
    allow_nulls: bool,
) -> Result<ArrayRef, ArrowError> {
    let size = mask.len();
    let nullable = field.is_nullable() && allow_nulls;
    let valid: Vec<bool> = mask
        .iter()
        .map(|masked| !masked && !(nullable && rng.random_bool(options.null_density as f64)))
        .collect();
    let nulls = match valid.iter().all(|v| *v) {
        true => None,
        false => Some(NullBuffer::from(valid.as_slice())),
    };

    let array: ArrayRef = match field.shape() {
        TypeShape::Boolean => Arc::new(
            valid
                .iter()
                .map(|v| v.then(|| rng.random_bool(0.5)))
                .collect::<BooleanArray>(),
        ),
        TypeShape::Int { bit_width: 8, .. } => primitive::<Int8Type, _>(&valid, || rng.random()),
        TypeShape::Int { bit_width: 16, .. } => primitive::<Int16Type, _>(&valid, || rng.random()),
        TypeShape::Int { bit_width: 32, .. } => primitive::<Int32Type, _>(&valid, || rng.random()),
        TypeShape::Int { .. } => primitive::<Int64Type, _>(&valid, || rng.random()),
        TypeShape::Float { bit_width: 32 } => {
            primitive::<Float32Type, _>(&valid, || rng.random_range(-1e6..1e6))
        }
        TypeShape::Float { .. } => {
            primitive::<Float64Type, _>(&valid, || rng.random_range(-1e12..1e12))
        }
        TypeShape::Decimal { precision, scale } => {
            let max = 10_i128.pow(*precision as u32) - 1;
            let array = valid
                .iter()
                .map(|v| v.then(|| rng.random_range(-max..=max)))
                .collect::<PrimitiveArray<Decimal128Type>>();
            Arc::new(array.with_precision_and_scale(*precision, *scale)?)
        }
        TypeShape::Utf8 => Arc::new(
            valid
                .iter()
                .map(|v| v.then(|| random_string(rng)))
                .collect::<StringArray>(),
        ),
        TypeShape::Binary => Arc::new(
            valid
                .iter()
                .map(|v| v.then(|| random_string(rng).into_bytes()))
                .collect::<BinaryArray>(),
        ),
        TypeShape::Date(DateUnit::Day) => {
            primitive::<Date32Type, _>(&valid, || rng.random_range(0..DAYS_PER_CENTURY))
        }
        TypeShape::Date(DateUnit::Millisecond) => primitive::<Date64Type, _>(&valid, || {
            rng.random_range(0..DAYS_PER_CENTURY as i64) * MILLIS_PER_DAY
        }),
        TypeShape::Timestamp {
            unit: TimeUnit::Second,
            timezone,
        } => {
            let array = valid
                .iter()
                .map(|v| v.then(|| rng.random_range(0..SECONDS_PER_CENTURY)))
                .collect::<PrimitiveArray<TimestampSecondType>>();
            Arc::new(array.with_timezone_opt(timezone.clone()))
        }
        TypeShape::Timestamp {
            unit: TimeUnit::Millisecond,
            timezone,
        } => {
            let array = valid
                .iter()
                .map(|v| v.then(|| rng.random_range(0..SECONDS_PER_CENTURY * 1_000)))
                .collect::<PrimitiveArray<TimestampMillisecondType>>();
            Arc::new(array.with_timezone_opt(timezone.clone()))
        }
        TypeShape::List | TypeShape::Map { .. } => {
            let lengths = valid
                .iter()
                .map(|v| match v {
                    true => rng.random_range(0..=options.max_list_len),
                    false => 0,
                })
                .collect::<Vec<_>>();
            let total: usize = lengths.iter().sum();
            let offsets = OffsetBuffer::<i32>::from_lengths(lengths);
            let child = &field.children()[0];
            let values = random_array(rng, child, options, &vec![false; total], true)?;
            let child_field = Arc::new(child.to_arrow_field());
            match field.shape() {
                TypeShape::Map { keys_sorted } => Arc::new(MapArray::try_new(
                    child_field,
                    offsets,
                    values.as_struct().clone(),
                    nulls,
                    *keys_sorted,
                )?) as ArrayRef,
                _ => Arc::new(ListArray::try_new(child_field, offsets, values, nulls)?),
            }
        }
        TypeShape::Struct => {
            let DataType::Struct(fields) = field.data_type() else {
                return Err(not_generated(field));
            };
            let no_mask = vec![false; size];
            let mut children = Vec::with_capacity(fields.len());
            for child in field.children() {
                children.push(random_array(rng, child, options, &no_mask, true)?);
            }
            Arc::new(StructArray::try_new(fields, children, nulls)?)
        }
        TypeShape::Union => {
            let DataType::Union(fields, _) = field.data_type() else {
                return Err(not_generated(field));
            };
            let alternatives = field.children().len();
            let type_ids: Vec<i8> = mask
                .iter()
                .map(|masked| match masked {
                    true => 0,
                    false => rng.random_range(0..alternatives) as i8,
                })
                .collect();
            let allow_nulls = allow_nulls && field.is_nullable();
            let mut children = Vec::with_capacity(alternatives);
            for (type_id, child) in field.children().iter().enumerate() {
                let child_mask: Vec<bool> = mask
                    .iter()
                    .zip(&type_ids)
                    .map(|(masked, id)| *masked || *id as usize != type_id)
                    .collect();
                children.push(random_array(rng, child, options, &child_mask, allow_nulls)?);
            }
            Arc::new(UnionArray::try_new(
                fields,
                ScalarBuffer::from(type_ids),
                None,
                children,
            )?)
        }
        TypeShape::LargeUtf8
        | TypeShape::LargeBinary
        | TypeShape::FixedSizeBinary(_)
        | TypeShape::Time(_)
        | TypeShape::Timestamp { .. } => return Err(not_generated(field)),
    };
    Ok(array)
}

fn primitive<T, F>(valid: &[bool], mut value: F) -> ArrayRef
where
    T: ArrowPrimitiveType,
    F: FnMut() -> T::Native,
{
    let array: PrimitiveArray<T> = valid.iter().map(|v| v.then(&mut value)).collect();
    Arc::new(array)
}

fn random_string<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(0..8);
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn not_generated(field: &FieldDescriptor) -> ArrowError {
    ArrowError::NotYetImplemented(format!(
        "Generating arrays of {} for field '{}'",
        field.shape(),
        field.name()
    ))
}
