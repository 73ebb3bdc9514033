use crate::schema::{
    db::{ColumnId, TableId},
    ec::{ClassId, End, PrimitiveType, PropertyId},
};

use indexmap::IndexMap;
use std::fmt;

/// Binding of one property (by access string) to its column(s).
///
/// Compound maps (points, inlined structs, navigation properties) have
/// children; only leaves bind a column.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMap {
    pub id: PropertyMapId,

    /// Class map that created the map. Subclasses sharing the table reuse it.
    pub class: ClassId,

    /// Root property, `None` for system maps.
    pub property: Option<PropertyId>,

    /// Dotted access string, e.g. `Location.X`.
    pub access_string: String,

    pub parent: Option<PropertyMapId>,

    pub children: Vec<PropertyMapId>,

    pub kind: PropertyMapKind,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct PropertyMapId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyMapKind {
    /// `ECInstanceId`
    InstanceId { column: ColumnId },

    /// `ECClassId`, read from the class-id column or, without one, the
    /// literal id of `class`.
    ClassId {
        column: Option<ColumnId>,
        class: ClassId,
    },

    /// Scalar primitive.
    Primitive { column: ColumnId, ty: PrimitiveType },

    /// Array of primitives encoded in one column.
    PrimitiveArray { column: ColumnId, ty: PrimitiveType },

    /// Compound point; children hold the coordinates.
    Point { ty: PrimitiveType },

    /// Inlined struct; children hold the members.
    Struct { class: ClassId },

    /// Struct or struct array stored in the struct class's own table.
    StructTable {
        class: ClassId,
        table: TableId,
        array: bool,
    },

    /// Navigation property; children are `Id` and optionally `RelECClassId`.
    Navigation { relationship: ClassId },

    /// `SourceECInstanceId` or `TargetECInstanceId` of a relationship.
    ConstraintId { end: End, column: ColumnId },

    /// `SourceECClassId` or `TargetECClassId` of a relationship.
    ConstraintClassId { end: End, source: ClassIdSource },
}

/// Where a relationship end's class id comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassIdSource {
    /// Exactly one class is eligible at the end.
    Literal(ClassId),

    /// A class-id column in the relationship's own table.
    Local(ColumnId),

    /// The class-id column of the end class's table, joined on the end's id.
    Join(TableId),
}

/// A class map's property maps, in order, keyed by case-insensitive access
/// string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMapCollection {
    maps: IndexMap<String, PropertyMapId>,
}

impl PropertyMap {
    /// Returns `true` for maps that produce one value. Struct-table maps are
    /// neither leaves nor compounds.
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self.kind,
            PropertyMapKind::Point { .. }
                | PropertyMapKind::Struct { .. }
                | PropertyMapKind::StructTable { .. }
                | PropertyMapKind::Navigation { .. }
        )
    }

    pub fn is_system(&self) -> bool {
        matches!(
            self.kind,
            PropertyMapKind::InstanceId { .. }
                | PropertyMapKind::ClassId { .. }
                | PropertyMapKind::ConstraintId { .. }
                | PropertyMapKind::ConstraintClassId { .. }
        )
    }

    /// The column bound by a leaf.
    pub fn column(&self) -> Option<ColumnId> {
        match self.kind {
            PropertyMapKind::InstanceId { column }
            | PropertyMapKind::Primitive { column, .. }
            | PropertyMapKind::PrimitiveArray { column, .. }
            | PropertyMapKind::ConstraintId { column, .. } => Some(column),
            PropertyMapKind::ClassId { column, .. } => column,
            PropertyMapKind::ConstraintClassId {
                source: ClassIdSource::Local(column),
                ..
            } => Some(column),
            _ => None,
        }
    }

    /// Name of the last access-string segment.
    pub fn name(&self) -> &str {
        self.access_string
            .rsplit('.')
            .next()
            .unwrap_or(&self.access_string)
    }
}

impl PropertyMapCollection {
    pub fn insert(&mut self, access_string: &str, id: PropertyMapId) {
        self.maps.insert(access_string.to_ascii_lowercase(), id);
    }

    pub fn get(&self, access_string: &str) -> Option<PropertyMapId> {
        self.maps.get(&access_string.to_ascii_lowercase()).copied()
    }

    pub fn contains(&self, access_string: &str) -> bool {
        self.maps.contains_key(&access_string.to_ascii_lowercase())
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = PropertyMapId> + '_ {
        self.maps.values().copied()
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl fmt::Debug for PropertyMapId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "PropertyMapId({})", self.0)
    }
}
