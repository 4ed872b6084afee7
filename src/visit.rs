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

//! Depth-first traversal of descriptor trees
//!
//! Validation, remapping and the random generator all visit descriptor trees
//! in the same order: a node before its children, children in declared order.

use std::sync::Arc;

use crate::descriptor::FieldDescriptor;
use crate::error::MaterializeError;
use crate::path::{FieldPath, PathSegment};

/// A callback invoked for every node of a descriptor tree by [`walk`]
pub trait DescriptorVisitor {
    /// The error that aborts the traversal
    type Error;

    /// Visits `field`, located at `path`, before any of its children
    fn visit(&mut self, path: &FieldPath, field: &FieldDescriptor) -> Result<(), Self::Error>;
}

impl<E, F> DescriptorVisitor for F
where
    F: FnMut(&FieldPath, &FieldDescriptor) -> Result<(), E>,
{
    type Error = E;

    fn visit(&mut self, path: &FieldPath, field: &FieldDescriptor) -> Result<(), E> {
        self(path, field)
    }
}

/// Visits every node of `field` in pre-order, stopping at the first error
pub fn walk<V: DescriptorVisitor>(field: &FieldDescriptor, visitor: &mut V) -> Result<(), V::Error> {
    walk_at(field, &FieldPath::root(field.name()), visitor)
}

fn walk_at<V: DescriptorVisitor>(
    field: &FieldDescriptor,
    path: &FieldPath,
    visitor: &mut V,
) -> Result<(), V::Error> {
    visitor.visit(path, field)?;
    for child in field.children() {
        walk_at(child, &path.child(PathSegment::field(child.name())), visitor)?;
    }
    Ok(())
}

/// Rebuilds `field` bottom-up, passing every node to `f` after its children
/// have been rebuilt
///
/// The node handed to `f` already carries the rebuilt children. Rebuilding a
/// node re-checks the descriptor constraints against the new children.
pub fn transform<E, F>(field: &FieldDescriptor, f: &mut F) -> Result<FieldDescriptor, E>
where
    E: From<MaterializeError>,
    F: FnMut(&FieldPath, FieldDescriptor) -> Result<FieldDescriptor, E>,
{
    transform_at(field, &FieldPath::root(field.name()), f)
}

fn transform_at<E, F>(field: &FieldDescriptor, path: &FieldPath, f: &mut F) -> Result<FieldDescriptor, E>
where
    E: From<MaterializeError>,
    F: FnMut(&FieldPath, FieldDescriptor) -> Result<FieldDescriptor, E>,
{
    let node = match field.children() {
        [] => field.clone(),
        children => {
            let children = children
                .iter()
                .map(|c| {
                    let path = path.child(PathSegment::field(c.name()));
                    transform_at(c, &path, f).map(Arc::new)
                })
                .collect::<Result<Vec<_>, E>>()?;
            field.with_children(children)?
        }
    };
    f(path, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeShape;

    fn tree() -> FieldDescriptor {
        let a = FieldDescriptor::new_scalar("a", TypeShape::int(32), true).unwrap();
        let b = FieldDescriptor::new_scalar("b", TypeShape::Utf8, true).unwrap();
        let inner = FieldDescriptor::new_struct("inner", vec![a, b], true).unwrap();
        let list = FieldDescriptor::new_list("list", inner, true).unwrap();
        let c = FieldDescriptor::new_scalar("c", TypeShape::Boolean, false).unwrap();
        FieldDescriptor::new_struct("root", vec![list, c], false).unwrap()
    }

    #[test]
    fn walk_is_pre_order() {
        let mut visited = vec![];
        walk(&tree(), &mut |path: &FieldPath, _: &FieldDescriptor| {
            visited.push(path.to_string());
            Ok::<_, ()>(())
        })
        .unwrap();
        assert_eq!(
            visited,
            vec![
                "root",
                "root.list",
                "root.list.inner",
                "root.list.inner.a",
                "root.list.inner.b",
                "root.c"
            ]
        );
    }

    #[test]
    fn walk_stops_at_first_error() {
        let mut count = 0;
        let result = walk(&tree(), &mut |_: &FieldPath, field: &FieldDescriptor| {
            count += 1;
            match field.name() {
                "inner" => Err(field.name().to_string()),
                _ => Ok(()),
            }
        });
        assert_eq!(result, Err("inner".to_string()));
        assert_eq!(count, 3);
    }

    #[test]
    fn transform_is_post_order() {
        let mut visited = vec![];
        let rebuilt = transform(&tree(), &mut |path: &FieldPath, node: FieldDescriptor| {
            visited.push(path.to_string());
            Ok::<_, MaterializeError>(node)
        })
        .unwrap();
        assert_eq!(rebuilt, tree());
        assert_eq!(
            visited,
            vec![
                "root.list.inner.a",
                "root.list.inner.b",
                "root.list.inner",
                "root.list",
                "root.c",
                "root"
            ]
        );
    }

    #[test]
    fn transform_rechecks_constraints() {
        let result = transform(&tree(), &mut |_: &FieldPath, node: FieldDescriptor| {
            match node.name() {
                "b" => Ok(node.with_name("a")),
                _ => Ok::<_, MaterializeError>(node),
            }
        });
        assert!(matches!(
            result,
            Err(MaterializeError::ConstraintViolation(_))
        ));
    }
}
