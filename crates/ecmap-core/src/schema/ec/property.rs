use super::{ClassId, Direction, PropertyMapHint};
use crate::schema::db::ColumnType;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Property {
    /// Uniquely identifies the property. Stable across imports.
    pub id: PropertyId,

    /// The class declaring the property.
    pub class: ClassId,

    pub name: String,

    pub kind: PropertyKind,

    /// Column-level overrides.
    pub map: PropertyMapHint,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct PropertyId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Primitive(PrimitiveType),

    /// An array of primitives, stored as a single encoded value.
    PrimitiveArray(PrimitiveType),

    /// An embedded struct of the given struct class.
    Struct(ClassId),

    /// An array of structs, stored out of line.
    StructArray(ClassId),

    /// A to-one reference through a relationship class.
    Navigation {
        relationship: ClassId,
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Binary,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "dateTime")]
    DateTime,
    Double,
    #[serde(alias = "int")]
    Integer,
    Long,
    String,
    Point2d,
    Point3d,
    #[serde(alias = "IGeometry")]
    Geometry,
}

impl Property {
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, PropertyKind::Primitive(_))
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, PropertyKind::Navigation { .. })
    }

    /// The struct class embedded or arrayed by this property, if any.
    pub fn struct_class(&self) -> Option<ClassId> {
        match self.kind {
            PropertyKind::Struct(class) | PropertyKind::StructArray(class) => Some(class),
            _ => None,
        }
    }
}

impl PrimitiveType {
    /// Column type used to store a scalar of this type.
    ///
    /// Points have no single column type; their coordinates are stored as
    /// `Double` columns.
    pub fn column_type(self) -> ColumnType {
        match self {
            PrimitiveType::Binary | PrimitiveType::Geometry => ColumnType::Binary,
            PrimitiveType::Boolean => ColumnType::Boolean,
            PrimitiveType::DateTime => ColumnType::DateTime,
            PrimitiveType::Double | PrimitiveType::Point2d | PrimitiveType::Point3d => {
                ColumnType::Double
            }
            PrimitiveType::Integer => ColumnType::Integer,
            PrimitiveType::Long => ColumnType::Long,
            PrimitiveType::String => ColumnType::String,
        }
    }

    /// Coordinate suffixes for point types, `None` for everything else.
    pub fn point_coordinates(self) -> Option<&'static [&'static str]> {
        match self {
            PrimitiveType::Point2d => Some(&["X", "Y"]),
            PrimitiveType::Point3d => Some(&["X", "Y", "Z"]),
            _ => None,
        }
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "PropertyId({})", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}
