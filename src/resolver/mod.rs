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

//! The [`ValueResolver`] capability through which the writer interprets
//! caller-defined values
//!
//! A resolver translates one opaque value, viewed as an instance of one
//! [`FieldDescriptor`], into a [`Resolved`] representation the writer can act
//! on: a null, a scalar, or the values of the node's children. The writer then
//! resolves each child value against the corresponding child descriptor.
//!
//! Two resolvers are provided:
//!
//! * [`ArrayResolver`] reads values back out of Arrow arrays, which makes
//!   materialization an identity for data that is already columnar
//! * [`JsonResolver`] maps [`serde_json::Value`]s onto descriptors

use arrow_schema::ArrowError;

use crate::descriptor::FieldDescriptor;
use crate::scalar::ScalarValue;

mod array;
mod json;

pub use array::{ArrayResolver, ArrayValue};
pub use json::JsonResolver;

/// The representation of one value at one descriptor node
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<V> {
    /// The value is absent
    Null,
    /// The value of a scalar descriptor
    Scalar(ScalarValue),
    /// The elements of a list, or the entries of a map, in order
    List(Vec<V>),
    /// One entry per declared child of a struct, in descriptor order, with
    /// `None` marking a child the value does not provide
    Struct(Vec<Option<V>>),
    /// The active alternative of a union, by position, and its value
    Union {
        /// Position of the alternative among the union's children
        alternative: usize,
        /// The value of the alternative
        value: V,
    },
}

impl<V> Resolved<V> {
    /// A short name for the kind of representation, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(_) => "scalar",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
            Self::Union { .. } => "union",
        }
    }
}

/// Translates caller-defined values into per-node [`Resolved`] representations
///
/// Implementations must be deterministic for a given `(field, value)` pair and
/// free of side effects visible to the writer.
///
/// # Example
///
/// ```
/// # use arrow_materialize::{FieldDescriptor, Resolved, ScalarValue, TypeShape, ValueResolver};
/// # use arrow_schema::ArrowError;
/// /// Resolves `Option<i64>` for any integer descriptor
/// struct OptionResolver;
///
/// impl ValueResolver for OptionResolver {
///     type Value = Option<i64>;
///
///     fn resolve(
///         &self,
///         _field: &FieldDescriptor,
///         value: &Option<i64>,
///     ) -> Result<Resolved<Option<i64>>, ArrowError> {
///         Ok(match value {
///             Some(v) => Resolved::Scalar(ScalarValue::Int64(*v)),
///             None => Resolved::Null,
///         })
///     }
/// }
/// ```
pub trait ValueResolver {
    /// The caller-defined value type
    type Value;

    /// Resolves `value` as an instance of `field`
    fn resolve(
        &self,
        field: &FieldDescriptor,
        value: &Self::Value,
    ) -> Result<Resolved<Self::Value>, ArrowError>;
}

impl<R: ValueResolver + ?Sized> ValueResolver for &R {
    type Value = R::Value;

    fn resolve(
        &self,
        field: &FieldDescriptor,
        value: &Self::Value,
    ) -> Result<Resolved<Self::Value>, ArrowError> {
        (**self).resolve(field, value)
    }
}
