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

//! Paths identifying a node within a descriptor tree or a value being written

use std::fmt::{Display, Formatter};

/// A single step from a parent node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named child: a struct field, union alternative or list item field
    Field(String),
    /// The n-th element of a list or map value
    Index(usize),
}

impl PathSegment {
    /// Creates a [`PathSegment::Field`]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }
}

/// The location of a node relative to the root of a descriptor tree
///
/// Rendered as `root.child[3].grandchild`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Creates a path pointing at the root field `name`
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::field(name)],
        }
    }

    /// Returns a new path extended by `segment`
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// The segments of this path, root first
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The number of segments in this path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if idx == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(FieldPath::default().to_string(), "");
        let path = FieldPath::root("a")
            .child(PathSegment::field("b"))
            .child(PathSegment::Index(3))
            .child(PathSegment::field("c"));
        assert_eq!(path.to_string(), "a.b[3].c");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn child_does_not_modify_parent() {
        let parent = FieldPath::root("a");
        let child = parent.child(PathSegment::Index(0));
        assert_eq!(parent.segments(), &[PathSegment::field("a")]);
        assert_eq!(child.segments().len(), 2);
    }
}
