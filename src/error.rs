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

//! Defines [`MaterializeError`] for representing failures while describing,
//! validating or materializing nested values

use std::error::Error;
use std::fmt::{Display, Formatter};

use arrow_schema::ArrowError;

use crate::path::FieldPath;

/// Many different operations in this crate return this error type.
#[derive(Debug)]
pub enum MaterializeError {
    /// A descriptor tree was constructed with the wrong arity, a duplicate
    /// child name or an out of range type parameter.
    ConstraintViolation(String),
    /// A descriptor node lies outside the supported vocabulary and must be
    /// remapped before it can be materialized.
    UnsupportedType {
        /// Location of the offending node relative to the root descriptor
        path: FieldPath,
        /// Description of the offending type
        message: String,
    },
    /// The value resolved at a node does not agree with the node's descriptor.
    TypeMismatch {
        /// Location of the node being written
        path: FieldPath,
        /// Description of the disagreement
        message: String,
    },
    /// Descriptor or value nesting exceeded the configured maximum depth.
    RecursionLimitExceeded {
        /// Location of the node at which the limit was hit
        path: FieldPath,
        /// The configured limit
        limit: usize,
    },
    /// Building the Arrow representation of a vector failed.
    Arrow(ArrowError),
}

impl MaterializeError {
    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Self::ConstraintViolation(message.into())
    }

    pub(crate) fn unsupported(path: &FieldPath, message: impl Into<String>) -> Self {
        Self::UnsupportedType {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch(path: &FieldPath, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Returns the path of the node this error refers to, if any
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::UnsupportedType { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::RecursionLimitExceeded { path, .. } => Some(path),
            Self::ConstraintViolation(_) | Self::Arrow(_) => None,
        }
    }
}

impl From<ArrowError> for MaterializeError {
    fn from(error: ArrowError) -> Self {
        Self::Arrow(error)
    }
}

impl Display for MaterializeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstraintViolation(message) => {
                write!(f, "Descriptor constraint violated: {message}")
            }
            Self::UnsupportedType { path, message } => {
                write!(f, "Unsupported type at '{path}': {message}")
            }
            Self::TypeMismatch { path, message } => {
                write!(f, "Type mismatch at '{path}': {message}")
            }
            Self::RecursionLimitExceeded { path, limit } => {
                write!(f, "Recursion limit of {limit} exceeded at '{path}'")
            }
            Self::Arrow(e) => write!(f, "Arrow error: {e}"),
        }
    }
}

impl Error for MaterializeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arrow(e) => Some(e),
            _ => None,
        }
    }
}
