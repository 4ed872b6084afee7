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

//! Decides which descriptor shapes can be materialized, and rewrites the ones
//! that cannot
//!
//! A descriptor is supported when every node's [`TypeShape`] is supported:
//!
//! | Shape                         | Supported                       |
//! |-------------------------------|---------------------------------|
//! | `Boolean`, `Utf8`, `Binary`   | yes                             |
//! | `Int`                         | signed only                     |
//! | `Float`                       | 32 and 64 bits                  |
//! | `Decimal`                     | yes                             |
//! | `Date`                        | yes                             |
//! | `Timestamp`                   | second and millisecond units    |
//! | `Time`, `LargeUtf8`, `LargeBinary`, `FixedSizeBinary` | no      |
//! | `List`, `Struct`, `Map`, `Union` | yes                          |
//!
//! Unsupported descriptors must be passed through [`remap`] before a
//! [`Vector`](crate::Vector) can be created for them.

use arrow_schema::{Field, Schema, TimeUnit};
use tracing::debug;

use crate::descriptor::{DateUnit, FieldDescriptor, TypeShape};
use crate::error::MaterializeError;
use crate::path::FieldPath;
use crate::visit::{transform, walk};

/// Returns true if `shape` is supported, ignoring any children
pub fn is_supported_shape(shape: &TypeShape) -> bool {
    match shape {
        TypeShape::Boolean
        | TypeShape::Decimal { .. }
        | TypeShape::Utf8
        | TypeShape::Binary
        | TypeShape::Date(_)
        | TypeShape::List
        | TypeShape::Struct
        | TypeShape::Map { .. }
        | TypeShape::Union => true,
        TypeShape::Int { signed, .. } => *signed,
        TypeShape::Float { bit_width } => *bit_width != 16,
        TypeShape::Timestamp { unit, .. } => {
            matches!(unit, TimeUnit::Second | TimeUnit::Millisecond)
        }
        TypeShape::LargeUtf8
        | TypeShape::LargeBinary
        | TypeShape::FixedSizeBinary(_)
        | TypeShape::Time(_) => false,
    }
}

/// Returns true if every node of `field` is supported
pub fn is_supported(field: &FieldDescriptor) -> bool {
    assert_supported(field).is_ok()
}

/// Returns an error naming the first unsupported node of `field`, in pre-order
pub fn assert_supported(field: &FieldDescriptor) -> Result<(), MaterializeError> {
    walk(field, &mut |path: &FieldPath, node: &FieldDescriptor| {
        if is_supported_shape(node.shape()) {
            return Ok(());
        }
        Err(MaterializeError::unsupported(
            path,
            format!("{} is not supported", node.shape()),
        ))
    })
}

/// Rewrites every unsupported node of `field` with `rule`, bottom-up
///
/// Names, nullability and children are preserved; only the shape of each
/// unsupported node is replaced. Supported nodes are left untouched, so
/// remapping an already supported descriptor returns an equal descriptor.
///
/// ```
/// # use arrow_materialize::{assert_supported, compatible_shape, remap, FieldDescriptor, TypeShape};
/// # use arrow_schema::TimeUnit;
/// let ts = FieldDescriptor::new_scalar("ts", TypeShape::timestamp(TimeUnit::Nanosecond), true).unwrap();
/// assert!(assert_supported(&ts).is_err());
///
/// let remapped = remap(&ts, compatible_shape).unwrap();
/// assert_eq!(remapped.shape(), &TypeShape::timestamp(TimeUnit::Millisecond));
/// assert_supported(&remapped).unwrap();
/// ```
pub fn remap<F>(field: &FieldDescriptor, rule: F) -> Result<FieldDescriptor, MaterializeError>
where
    F: Fn(&TypeShape) -> TypeShape,
{
    transform(field, &mut |path: &FieldPath, node: FieldDescriptor| {
        if is_supported_shape(node.shape()) {
            return Ok(node);
        }
        let shape = rule(node.shape());
        debug!(%path, from = %node.shape(), to = %shape, "remapping unsupported type");
        node.with_shape(shape)
    })
}

/// The stock remapping rule
///
/// * `Time` becomes a millisecond `Date`
/// * every `Timestamp` becomes a millisecond `Timestamp` in the same timezone
/// * `FixedSizeBinary`, `LargeBinary` and `LargeUtf8` become `Utf8`
/// * `Float16` becomes `Float32`
/// * unsigned integers become the next wider signed integer, with `UInt64`
///   becoming `Decimal(20, 0)`
///
/// Every other shape is returned unchanged.
pub fn compatible_shape(shape: &TypeShape) -> TypeShape {
    match shape {
        TypeShape::Time(_) => TypeShape::Date(DateUnit::Millisecond),
        TypeShape::Timestamp { timezone, .. } => TypeShape::Timestamp {
            unit: TimeUnit::Millisecond,
            timezone: timezone.clone(),
        },
        TypeShape::FixedSizeBinary(_) | TypeShape::LargeBinary | TypeShape::LargeUtf8 => {
            TypeShape::Utf8
        }
        TypeShape::Float { bit_width: 16 } => TypeShape::Float { bit_width: 32 },
        TypeShape::Int {
            bit_width: 64,
            signed: false,
        } => TypeShape::Decimal {
            precision: 20,
            scale: 0,
        },
        TypeShape::Int {
            bit_width,
            signed: false,
        } => TypeShape::int(bit_width * 2),
        other => other.clone(),
    }
}

/// Applies [`remap`] to an Arrow [`Field`]
pub fn remap_arrow_field<F>(field: &Field, rule: F) -> Result<Field, MaterializeError>
where
    F: Fn(&TypeShape) -> TypeShape,
{
    let descriptor = FieldDescriptor::try_from(field)?;
    let remapped = remap(&descriptor, rule)?.to_arrow_field();
    Ok(remapped.with_metadata(field.metadata().clone()))
}

/// Applies [`remap`] to every field of an Arrow [`Schema`]
pub fn remap_schema<F>(schema: &Schema, rule: F) -> Result<Schema, MaterializeError>
where
    F: Fn(&TypeShape) -> TypeShape,
{
    let fields = schema
        .fields()
        .iter()
        .map(|f| remap_arrow_field(f, &rule))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schema::new_with_metadata(fields, schema.metadata().clone()))
}
