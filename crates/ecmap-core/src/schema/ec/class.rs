use super::{ClassMapHint, Property, Relationship};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A class in the [`ClassGraph`](super::ClassGraph).
#[derive(Debug, Clone)]
pub struct Class {
    /// Uniquely identifies the class. Stable across imports.
    pub id: ClassId,

    /// Name of the schema declaring the class.
    pub schema: String,

    /// Schema alias, used to prefix default table names.
    pub schema_alias: String,

    /// Class name, unique within its schema.
    pub name: String,

    pub kind: ClassKind,

    pub modifier: Modifier,

    /// Single base class. Mixins are listed separately.
    pub base: Option<ClassId>,

    /// Mixins applied to this class, in declaration order.
    pub mixins: Vec<ClassId>,

    /// Properties declared by this class (not inherited ones).
    pub properties: Vec<Property>,

    /// Constraint information, set for relationship classes only.
    pub relationship: Option<Relationship>,

    /// Mapping hints attached to the class.
    pub map: ClassMapHint,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct ClassId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Entity,
    Struct,
    Mixin,
    Relationship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    #[default]
    None,
    Abstract,
    Sealed,
}

impl Class {
    /// `Schema:Class`, used in diagnostics and by-name lookups.
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.schema, self.name)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifier == Modifier::Abstract
    }

    pub fn is_entity(&self) -> bool {
        self.kind == ClassKind::Entity
    }

    pub fn is_struct(&self) -> bool {
        self.kind == ClassKind::Struct
    }

    pub fn is_mixin(&self) -> bool {
        self.kind == ClassKind::Mixin
    }

    pub fn is_relationship(&self) -> bool {
        self.kind == ClassKind::Relationship
    }

    /// Finds a property declared by this class, ignoring ASCII case.
    pub fn own_property(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, fmt)
    }
}

impl From<&Class> for ClassId {
    fn from(value: &Class) -> Self {
        value.id
    }
}
