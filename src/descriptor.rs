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

//! The descriptor model: [`TypeShape`] and [`FieldDescriptor`]
//!
//! A [`FieldDescriptor`] tree describes the shape a value must conform to,
//! independently of any buffer. Descriptors are immutable once constructed and
//! are typically shared behind a [`DescriptorRef`].

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use arrow_schema::{
    DataType, Field, Fields, TimeUnit, UnionFields, UnionMode, DECIMAL128_MAX_PRECISION,
};

use crate::error::MaterializeError;
use crate::path::{FieldPath, PathSegment};

/// A shared, immutable [`FieldDescriptor`]
pub type DescriptorRef = Arc<FieldDescriptor>;

/// Name of the single child of a [`TypeShape::Map`] descriptor
pub const MAP_ENTRIES_NAME: &str = "entries";
/// Name of the key field within map entries
pub const MAP_KEY_NAME: &str = "key";
/// Name of the value field within map entries
pub const MAP_VALUE_NAME: &str = "value";
/// Conventional name of the single child of a [`TypeShape::List`] descriptor
pub const LIST_ITEM_NAME: &str = "item";

/// The resolution of a [`TypeShape::Date`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    /// Days since the UNIX epoch, stored in 32 bits
    Day,
    /// Milliseconds since the UNIX epoch, stored in 64 bits
    Millisecond,
}

/// The closed vocabulary of type shapes a [`FieldDescriptor`] can take
///
/// Nested shapes carry no children themselves, the children live on the
/// enclosing [`FieldDescriptor`]:
///
/// * [`TypeShape::List`] has exactly one child, the item
/// * [`TypeShape::Struct`] has any number of uniquely named children
/// * [`TypeShape::Map`] has exactly one non-nullable [`TypeShape::Struct`]
///   child with the fields `key` and `value`
/// * [`TypeShape::Union`] has one or more uniquely named alternatives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// A boolean
    Boolean,
    /// An integer of `bit_width` 8, 16, 32 or 64
    Int {
        /// Width of the integer in bits
        bit_width: u8,
        /// Whether the integer is signed
        signed: bool,
    },
    /// A floating point number of `bit_width` 16, 32 or 64
    Float {
        /// Width of the float in bits
        bit_width: u8,
    },
    /// A 128-bit decimal
    Decimal {
        /// Total number of decimal digits
        precision: u8,
        /// Number of digits after the decimal point
        scale: i8,
    },
    /// UTF-8 text with 32-bit offsets
    Utf8,
    /// UTF-8 text with 64-bit offsets
    LargeUtf8,
    /// Opaque bytes with 32-bit offsets
    Binary,
    /// Opaque bytes with 64-bit offsets
    LargeBinary,
    /// Opaque bytes of a fixed width
    FixedSizeBinary(i32),
    /// A calendar date
    Date(DateUnit),
    /// A time of day
    Time(TimeUnit),
    /// An instant, optionally interpreted in a timezone
    Timestamp {
        /// Resolution of the stored value
        unit: TimeUnit,
        /// Optional timezone, e.g. `UTC` or `+05:00`
        timezone: Option<Arc<str>>,
    },
    /// An ordered sequence of a single item type
    List,
    /// An ordered set of named fields
    Struct,
    /// A sequence of key/value entries, laid out as a list of structs
    Map {
        /// Whether keys are sorted within each entry list
        keys_sorted: bool,
    },
    /// One of several named alternatives, selected per row by a type id
    Union,
}

impl TypeShape {
    /// Returns true if this shape has child descriptors
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::List | Self::Struct | Self::Map { .. } | Self::Union)
    }

    /// Shorthand for a signed integer shape
    pub fn int(bit_width: u8) -> Self {
        Self::Int {
            bit_width,
            signed: true,
        }
    }

    /// Shorthand for a timestamp shape without a timezone
    pub fn timestamp(unit: TimeUnit) -> Self {
        Self::Timestamp {
            unit,
            timezone: None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Int { bit_width, .. } if !matches!(bit_width, 8 | 16 | 32 | 64) => {
                Err(format!("invalid integer bit width {bit_width}"))
            }
            Self::Float { bit_width } if !matches!(bit_width, 16 | 32 | 64) => {
                Err(format!("invalid float bit width {bit_width}"))
            }
            Self::Decimal { precision, scale } => {
                if *precision == 0 || *precision > DECIMAL128_MAX_PRECISION {
                    return Err(format!(
                        "decimal precision must be between 1 and {DECIMAL128_MAX_PRECISION}, got {precision}"
                    ));
                }
                if *scale > 0 && *scale as u8 > *precision {
                    return Err(format!(
                        "decimal scale {scale} is greater than precision {precision}"
                    ));
                }
                Ok(())
            }
            Self::FixedSizeBinary(width) if *width < 0 => {
                Err(format!("invalid fixed size binary width {width}"))
            }
            _ => Ok(()),
        }
    }
}

impl Display for TypeShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean => write!(f, "Boolean"),
            Self::Int {
                bit_width,
                signed: true,
            } => write!(f, "Int{bit_width}"),
            Self::Int {
                bit_width,
                signed: false,
            } => write!(f, "UInt{bit_width}"),
            Self::Float { bit_width } => write!(f, "Float{bit_width}"),
            Self::Decimal { precision, scale } => write!(f, "Decimal({precision}, {scale})"),
            Self::Utf8 => write!(f, "Utf8"),
            Self::LargeUtf8 => write!(f, "LargeUtf8"),
            Self::Binary => write!(f, "Binary"),
            Self::LargeBinary => write!(f, "LargeBinary"),
            Self::FixedSizeBinary(width) => write!(f, "FixedSizeBinary({width})"),
            Self::Date(DateUnit::Day) => write!(f, "Date(Day)"),
            Self::Date(DateUnit::Millisecond) => write!(f, "Date(Millisecond)"),
            Self::Time(unit) => write!(f, "Time({unit:?})"),
            Self::Timestamp {
                unit,
                timezone: None,
            } => write!(f, "Timestamp({unit:?})"),
            Self::Timestamp {
                unit,
                timezone: Some(tz),
            } => write!(f, "Timestamp({unit:?}, {tz})"),
            Self::List => write!(f, "List"),
            Self::Struct => write!(f, "Struct"),
            Self::Map { .. } => write!(f, "Map"),
            Self::Union => write!(f, "Union"),
        }
    }
}

/// A named, typed node of a descriptor tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    name: String,
    shape: TypeShape,
    nullable: bool,
    children: Vec<DescriptorRef>,
}

impl FieldDescriptor {
    /// Creates a new descriptor, verifying that `children` matches what `shape`
    /// requires
    pub fn try_new(
        name: impl Into<String>,
        shape: TypeShape,
        nullable: bool,
        children: Vec<FieldDescriptor>,
    ) -> Result<Self, MaterializeError> {
        let children = children.into_iter().map(Arc::new).collect();
        Self::try_new_with_refs(name.into(), shape, nullable, children)
    }

    fn try_new_with_refs(
        name: String,
        shape: TypeShape,
        nullable: bool,
        children: Vec<DescriptorRef>,
    ) -> Result<Self, MaterializeError> {
        shape
            .validate()
            .map_err(|e| MaterializeError::constraint(format!("field '{name}': {e}")))?;
        check_children(&name, &shape, &children)?;
        Ok(Self {
            name,
            shape,
            nullable,
            children,
        })
    }

    /// Creates a descriptor for a scalar (non-nested) shape
    pub fn new_scalar(
        name: impl Into<String>,
        shape: TypeShape,
        nullable: bool,
    ) -> Result<Self, MaterializeError> {
        Self::try_new(name, shape, nullable, vec![])
    }

    /// Creates a [`TypeShape::List`] descriptor with the given item
    pub fn new_list(
        name: impl Into<String>,
        item: FieldDescriptor,
        nullable: bool,
    ) -> Result<Self, MaterializeError> {
        Self::try_new(name, TypeShape::List, nullable, vec![item])
    }

    /// Creates a [`TypeShape::Struct`] descriptor with the given fields
    pub fn new_struct(
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        nullable: bool,
    ) -> Result<Self, MaterializeError> {
        Self::try_new(name, TypeShape::Struct, nullable, fields)
    }

    /// Creates a [`TypeShape::Map`] descriptor
    ///
    /// `key` and `value` are renamed to `key` and `value` and wrapped in a
    /// non-nullable `entries` struct. `key` must not be nullable.
    pub fn new_map(
        name: impl Into<String>,
        key: FieldDescriptor,
        value: FieldDescriptor,
        nullable: bool,
    ) -> Result<Self, MaterializeError> {
        let entries = Self::new_struct(
            MAP_ENTRIES_NAME,
            vec![key.with_name(MAP_KEY_NAME), value.with_name(MAP_VALUE_NAME)],
            false,
        )?;
        let shape = TypeShape::Map { keys_sorted: false };
        Self::try_new(name, shape, nullable, vec![entries])
    }

    /// Creates a [`TypeShape::Union`] descriptor with the given alternatives
    pub fn new_union(
        name: impl Into<String>,
        alternatives: Vec<FieldDescriptor>,
        nullable: bool,
    ) -> Result<Self, MaterializeError> {
        Self::try_new(name, TypeShape::Union, nullable, alternatives)
    }

    /// Returns a copy of this descriptor with a different name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Returns a copy of this descriptor with `shape` in place of its shape,
    /// keeping name, nullability and children
    pub fn with_shape(&self, shape: TypeShape) -> Result<Self, MaterializeError> {
        Self::try_new_with_refs(self.name.clone(), shape, self.nullable, self.children.clone())
    }

    /// Returns a copy of this descriptor with different children
    pub fn with_children(&self, children: Vec<DescriptorRef>) -> Result<Self, MaterializeError> {
        Self::try_new_with_refs(self.name.clone(), self.shape.clone(), self.nullable, children)
    }

    /// The name of this field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shape of this field
    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    /// Whether this field may contain nulls
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The children of this field, in declared order
    pub fn children(&self) -> &[DescriptorRef] {
        &self.children
    }

    /// Looks up a child by name, returning its position and descriptor
    pub fn child_by_name(&self, name: &str) -> Option<(usize, &DescriptorRef)> {
        self.children
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == name)
    }

    /// Returns the depth of this tree; a scalar has depth 1
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|c| (c.as_ref(), depth + 1)));
        }
        max
    }

    /// The Arrow [`DataType`] this descriptor is laid out as
    pub fn data_type(&self) -> DataType {
        match &self.shape {
            TypeShape::Boolean => DataType::Boolean,
            TypeShape::Int { bit_width, signed } => match (bit_width, signed) {
                (8, true) => DataType::Int8,
                (16, true) => DataType::Int16,
                (32, true) => DataType::Int32,
                (64, true) => DataType::Int64,
                (8, false) => DataType::UInt8,
                (16, false) => DataType::UInt16,
                (32, false) => DataType::UInt32,
                _ => DataType::UInt64,
            },
            TypeShape::Float { bit_width } => match bit_width {
                16 => DataType::Float16,
                32 => DataType::Float32,
                _ => DataType::Float64,
            },
            TypeShape::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale),
            TypeShape::Utf8 => DataType::Utf8,
            TypeShape::LargeUtf8 => DataType::LargeUtf8,
            TypeShape::Binary => DataType::Binary,
            TypeShape::LargeBinary => DataType::LargeBinary,
            TypeShape::FixedSizeBinary(width) => DataType::FixedSizeBinary(*width),
            TypeShape::Date(DateUnit::Day) => DataType::Date32,
            TypeShape::Date(DateUnit::Millisecond) => DataType::Date64,
            TypeShape::Time(unit @ (TimeUnit::Second | TimeUnit::Millisecond)) => {
                DataType::Time32(*unit)
            }
            TypeShape::Time(unit) => DataType::Time64(*unit),
            TypeShape::Timestamp { unit, timezone } => DataType::Timestamp(*unit, timezone.clone()),
            TypeShape::List => DataType::List(Arc::new(self.children[0].to_arrow_field())),
            TypeShape::Struct => DataType::Struct(self.arrow_children()),
            TypeShape::Map { keys_sorted } => {
                DataType::Map(Arc::new(self.children[0].to_arrow_field()), *keys_sorted)
            }
            TypeShape::Union => {
                let type_ids = (0..self.children.len()).map(|i| i as i8);
                let fields = UnionFields::new(type_ids, self.arrow_children().iter().cloned());
                DataType::Union(fields, UnionMode::Sparse)
            }
        }
    }

    fn arrow_children(&self) -> Fields {
        self.children.iter().map(|c| c.to_arrow_field()).collect()
    }

    /// Converts this descriptor into an Arrow [`Field`]
    pub fn to_arrow_field(&self) -> Field {
        Field::new(self.name.clone(), self.data_type(), self.nullable)
    }

    /// Converts an Arrow [`Field`] into a descriptor
    ///
    /// Map entry fields are renamed to `key` and `value`. Arrow types with no
    /// counterpart in [`TypeShape`] fail with [`MaterializeError::UnsupportedType`].
    pub fn from_arrow_field(field: &Field) -> Result<Self, MaterializeError> {
        from_arrow(field, &FieldPath::root(field.name()))
    }
}

impl TryFrom<&Field> for FieldDescriptor {
    type Error = MaterializeError;

    fn try_from(field: &Field) -> Result<Self, Self::Error> {
        Self::from_arrow_field(field)
    }
}

impl From<&FieldDescriptor> for Field {
    fn from(descriptor: &FieldDescriptor) -> Self {
        descriptor.to_arrow_field()
    }
}

fn check_children(
    name: &str,
    shape: &TypeShape,
    children: &[DescriptorRef],
) -> Result<(), MaterializeError> {
    let violation = |message: String| Err(MaterializeError::constraint(format!("field '{name}': {message}")));
    match shape {
        TypeShape::List => {
            if children.len() != 1 {
                return violation(format!(
                    "List must have exactly one child, found {}",
                    children.len()
                ));
            }
        }
        TypeShape::Map { .. } => {
            let [entries] = children else {
                return violation(format!(
                    "Map must have exactly one child, found {}",
                    children.len()
                ));
            };
            if entries.shape != TypeShape::Struct || entries.nullable {
                return violation("Map entries must be a non-nullable Struct".to_string());
            }
            match entries.children.as_slice() {
                [key, value] if key.name == MAP_KEY_NAME && value.name == MAP_VALUE_NAME => {
                    if key.nullable {
                        return violation("Map keys must not be nullable".to_string());
                    }
                }
                _ => {
                    return violation(format!(
                        "Map entries must have exactly the fields '{MAP_KEY_NAME}' and '{MAP_VALUE_NAME}'"
                    ))
                }
            }
        }
        TypeShape::Struct | TypeShape::Union => {
            if *shape == TypeShape::Union {
                if children.is_empty() {
                    return violation("Union must have at least one alternative".to_string());
                }
                if children.len() > i8::MAX as usize + 1 {
                    return violation(format!(
                        "Union has {} alternatives, at most {} are allowed",
                        children.len(),
                        i8::MAX as usize + 1
                    ));
                }
                if let Some(child) = children.iter().find(|c| !c.nullable) {
                    return violation(format!(
                        "Union alternative '{}' must be nullable",
                        child.name
                    ));
                }
            }
            let mut seen = HashSet::with_capacity(children.len());
            for child in children {
                if !seen.insert(child.name.as_str()) {
                    return violation(format!("duplicate child name '{}'", child.name));
                }
            }
        }
        _ => {
            if !children.is_empty() {
                return violation(format!(
                    "{shape} cannot have children, found {}",
                    children.len()
                ));
            }
        }
    }
    Ok(())
}

fn from_arrow(field: &Field, path: &FieldPath) -> Result<FieldDescriptor, MaterializeError> {
    let child = |f: &Field| from_arrow(f, &path.child(PathSegment::field(f.name())));
    let (shape, children) = match field.data_type() {
        DataType::Boolean => (TypeShape::Boolean, vec![]),
        DataType::Int8 => (TypeShape::int(8), vec![]),
        DataType::Int16 => (TypeShape::int(16), vec![]),
        DataType::Int32 => (TypeShape::int(32), vec![]),
        DataType::Int64 => (TypeShape::int(64), vec![]),
        DataType::UInt8 => (unsigned(8), vec![]),
        DataType::UInt16 => (unsigned(16), vec![]),
        DataType::UInt32 => (unsigned(32), vec![]),
        DataType::UInt64 => (unsigned(64), vec![]),
        DataType::Float16 => (TypeShape::Float { bit_width: 16 }, vec![]),
        DataType::Float32 => (TypeShape::Float { bit_width: 32 }, vec![]),
        DataType::Float64 => (TypeShape::Float { bit_width: 64 }, vec![]),
        DataType::Decimal128(precision, scale) => (
            TypeShape::Decimal {
                precision: *precision,
                scale: *scale,
            },
            vec![],
        ),
        DataType::Utf8 => (TypeShape::Utf8, vec![]),
        DataType::LargeUtf8 => (TypeShape::LargeUtf8, vec![]),
        DataType::Binary => (TypeShape::Binary, vec![]),
        DataType::LargeBinary => (TypeShape::LargeBinary, vec![]),
        DataType::FixedSizeBinary(width) => (TypeShape::FixedSizeBinary(*width), vec![]),
        DataType::Date32 => (TypeShape::Date(DateUnit::Day), vec![]),
        DataType::Date64 => (TypeShape::Date(DateUnit::Millisecond), vec![]),
        DataType::Time32(unit) | DataType::Time64(unit) => (TypeShape::Time(*unit), vec![]),
        DataType::Timestamp(unit, timezone) => (
            TypeShape::Timestamp {
                unit: *unit,
                timezone: timezone.clone(),
            },
            vec![],
        ),
        DataType::List(item) => (TypeShape::List, vec![child(item.as_ref())?]),
        DataType::Struct(fields) => (
            TypeShape::Struct,
            fields.iter().map(|f| child(f.as_ref())).collect::<Result<_, _>>()?,
        ),
        DataType::Map(entries, keys_sorted) => {
            let DataType::Struct(kv) = entries.data_type() else {
                return Err(MaterializeError::unsupported(
                    path,
                    format!("map entries of type {}", entries.data_type()),
                ));
            };
            if kv.len() != 2 {
                return Err(MaterializeError::constraint(format!(
                    "field '{}': Map entries must have two fields, found {}",
                    field.name(),
                    kv.len()
                )));
            }
            let entries_path = path.child(PathSegment::field(entries.name()));
            let key = from_arrow(&kv[0], &entries_path.child(PathSegment::field(kv[0].name())))?;
            let value = from_arrow(&kv[1], &entries_path.child(PathSegment::field(kv[1].name())))?;
            let entries = FieldDescriptor::new_struct(
                entries.name().clone(),
                vec![key.with_name(MAP_KEY_NAME), value.with_name(MAP_VALUE_NAME)],
                entries.is_nullable(),
            )?;
            let shape = TypeShape::Map {
                keys_sorted: *keys_sorted,
            };
            (shape, vec![entries])
        }
        DataType::Union(fields, UnionMode::Sparse) => {
            let canonical = fields
                .iter()
                .enumerate()
                .all(|(idx, (type_id, _))| type_id as usize == idx);
            if !canonical {
                return Err(MaterializeError::unsupported(
                    path,
                    "union type ids must be 0..n in declaration order",
                ));
            }
            let children = fields
                .iter()
                .map(|(_, f)| child(f.as_ref()))
                .collect::<Result<_, _>>()?;
            (TypeShape::Union, children)
        }
        d => return Err(MaterializeError::unsupported(path, format!("{d}"))),
    };
    FieldDescriptor::try_new(field.name().clone(), shape, field.is_nullable(), children)
}

fn unsigned(bit_width: u8) -> TypeShape {
    TypeShape::Int {
        bit_width,
        signed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int32(name: &str, nullable: bool) -> FieldDescriptor {
        FieldDescriptor::new_scalar(name, TypeShape::int(32), nullable).unwrap()
    }

    #[test]
    fn list_arity() {
        let err = FieldDescriptor::try_new("l", TypeShape::List, true, vec![]).unwrap_err();
        assert!(matches!(err, MaterializeError::ConstraintViolation(_)));
        assert_eq!(
            err.to_string(),
            "Descriptor constraint violated: field 'l': List must have exactly one child, found 0"
        );

        let two = vec![int32("a", true), int32("b", true)];
        let err = FieldDescriptor::try_new("l", TypeShape::List, true, two).unwrap_err();
        assert!(matches!(err, MaterializeError::ConstraintViolation(_)));

        let list = FieldDescriptor::new_list("l", int32("item", true), true).unwrap();
        assert_eq!(list.children().len(), 1);
        assert_eq!(list.depth(), 2);
    }

    #[test]
    fn scalar_with_children() {
        let err =
            FieldDescriptor::try_new("s", TypeShape::Utf8, true, vec![int32("a", true)]).unwrap_err();
        assert!(err.to_string().contains("Utf8 cannot have children"));
    }

    #[test]
    fn duplicate_names() {
        let fields = vec![int32("a", true), int32("a", false)];
        let err = FieldDescriptor::new_struct("s", fields.clone(), true).unwrap_err();
        assert!(err.to_string().contains("duplicate child name 'a'"));

        let err = FieldDescriptor::new_union("u", fields, true).unwrap_err();
        assert!(matches!(err, MaterializeError::ConstraintViolation(_)));

        let err = FieldDescriptor::new_union("u", vec![], true).unwrap_err();
        assert!(err.to_string().contains("at least one alternative"));
    }

    #[test]
    fn union_alternatives_nullable() {
        let err = FieldDescriptor::new_union("u", vec![int32("a", true), int32("b", false)], true)
            .unwrap_err();
        assert!(matches!(err, MaterializeError::ConstraintViolation(_)));
        assert!(err.to_string().contains("alternative 'b' must be nullable"));

        let field = Field::new(
            "u",
            DataType::Union(
                UnionFields::new(vec![0], vec![Field::new("a", DataType::Int32, false)]),
                UnionMode::Sparse,
            ),
            true,
        );
        let err = FieldDescriptor::from_arrow_field(&field).unwrap_err();
        assert!(matches!(err, MaterializeError::ConstraintViolation(_)), "{err}");
    }

    #[test]
    fn map_constraints() {
        let key = FieldDescriptor::new_scalar("k", TypeShape::Utf8, false).unwrap();
        let map = FieldDescriptor::new_map("m", key, int32("v", true), true).unwrap();
        let entries = &map.children()[0];
        assert_eq!(entries.name(), MAP_ENTRIES_NAME);
        assert_eq!(entries.children()[0].name(), MAP_KEY_NAME);
        assert_eq!(entries.children()[1].name(), MAP_VALUE_NAME);

        let nullable_key = FieldDescriptor::new_scalar("k", TypeShape::Utf8, true).unwrap();
        let err = FieldDescriptor::new_map("m", nullable_key, int32("v", true), true).unwrap_err();
        assert!(err.to_string().contains("keys must not be nullable"));

        let wrong = FieldDescriptor::new_struct(
            "entries",
            vec![int32("k", false), int32("v", true)],
            false,
        )
        .unwrap();
        let err = FieldDescriptor::try_new("m", TypeShape::Map { keys_sorted: false }, true, vec![wrong])
            .unwrap_err();
        assert!(err.to_string().contains("'key' and 'value'"));
    }

    #[test]
    fn invalid_parameters() {
        let shape = TypeShape::Int {
            bit_width: 12,
            signed: true,
        };
        assert!(FieldDescriptor::new_scalar("i", shape, true).is_err());
        let shape = TypeShape::Decimal {
            precision: 39,
            scale: 0,
        };
        assert!(FieldDescriptor::new_scalar("d", shape, true).is_err());
        let shape = TypeShape::Decimal {
            precision: 5,
            scale: 6,
        };
        assert!(FieldDescriptor::new_scalar("d", shape, true).is_err());
        assert!(FieldDescriptor::new_scalar("b", TypeShape::FixedSizeBinary(-1), true).is_err());
    }

    #[test]
    fn with_shape_keeps_name_and_nullability() {
        let ts = FieldDescriptor::new_scalar("ts", TypeShape::timestamp(TimeUnit::Nanosecond), false)
            .unwrap();
        let remapped = ts.with_shape(TypeShape::timestamp(TimeUnit::Millisecond)).unwrap();
        assert_eq!(remapped.name(), "ts");
        assert!(!remapped.is_nullable());
        assert_eq!(remapped.shape(), &TypeShape::timestamp(TimeUnit::Millisecond));

        let list = FieldDescriptor::new_list("l", int32("item", true), true).unwrap();
        assert!(list.with_shape(TypeShape::Utf8).is_err());
    }

    #[test]
    fn arrow_round_trip() {
        let key = FieldDescriptor::new_scalar("k", TypeShape::Utf8, false).unwrap();
        let person = FieldDescriptor::new_struct(
            "person",
            vec![
                FieldDescriptor::new_scalar("name", TypeShape::Utf8, true).unwrap(),
                int32("age", true),
                FieldDescriptor::new_scalar(
                    "seen",
                    TypeShape::Timestamp {
                        unit: TimeUnit::Millisecond,
                        timezone: Some("UTC".into()),
                    },
                    true,
                )
                .unwrap(),
            ],
            true,
        )
        .unwrap();
        let descriptor = FieldDescriptor::new_struct(
            "root",
            vec![
                FieldDescriptor::new_list("people", person, true).unwrap(),
                FieldDescriptor::new_map("tags", key, int32("v", true), true).unwrap(),
                FieldDescriptor::new_union(
                    "either",
                    vec![int32("i", true), FieldDescriptor::new_scalar("s", TypeShape::Utf8, true).unwrap()],
                    true,
                )
                .unwrap(),
            ],
            false,
        )
        .unwrap();

        let field = descriptor.to_arrow_field();
        let DataType::Struct(fields) = field.data_type() else {
            unreachable!()
        };
        assert!(matches!(fields[0].data_type(), DataType::List(_)));
        assert!(matches!(fields[1].data_type(), DataType::Map(_, false)));
        assert!(matches!(
            fields[2].data_type(),
            DataType::Union(_, UnionMode::Sparse)
        ));

        let back = FieldDescriptor::try_from(&field).unwrap();
        assert_eq!(back, descriptor);
        assert_eq!(descriptor.depth(), 4);
    }

    #[test]
    fn arrow_unsupported_type_reports_path() {
        let field = Field::new_struct(
            "root",
            vec![Field::new("view", DataType::Utf8View, true)],
            true,
        );
        let err = FieldDescriptor::from_arrow_field(&field).unwrap_err();
        match err {
            MaterializeError::UnsupportedType { path, .. } => {
                assert_eq!(path.to_string(), "root.view")
            }
            e => panic!("unexpected error {e}"),
        }

        let dense = Field::new(
            "u",
            DataType::Union(
                UnionFields::new(vec![0], vec![Field::new("a", DataType::Int32, true)]),
                UnionMode::Dense,
            ),
            true,
        );
        assert!(FieldDescriptor::from_arrow_field(&dense).is_err());
    }

    #[test]
    fn arrow_map_entries_renamed() {
        let entries = Field::new_struct(
            "key_value",
            vec![
                Field::new("keys", DataType::Utf8, false),
                Field::new("values", DataType::Int64, true),
            ],
            false,
        );
        let field = Field::new("m", DataType::Map(Arc::new(entries), false), true);
        let descriptor = FieldDescriptor::from_arrow_field(&field).unwrap();
        let entries = &descriptor.children()[0];
        assert_eq!(entries.name(), "key_value");
        assert_eq!(entries.children()[0].name(), MAP_KEY_NAME);
        assert_eq!(entries.children()[1].name(), MAP_VALUE_NAME);
    }
}
