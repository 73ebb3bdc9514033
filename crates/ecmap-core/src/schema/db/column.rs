use super::{ColumnType, TableId};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Uniquely identifies the column in the schema.
    pub id: ColumnId,

    /// The name of the column in the database. Unique within the table,
    /// ignoring ASCII case.
    pub name: String,

    pub ty: ColumnType,

    /// System role(s) of the column.
    pub kind: ColumnKind,

    pub persistence: ColumnPersistence,

    pub nullable: bool,

    pub unique: bool,

    pub collation: Collation,

    /// Default value expression, without the surrounding parentheses.
    pub default: Option<String>,

    /// Check constraint expression.
    pub check: Option<String>,

    /// Created without a name and reusable by unrelated properties.
    pub shared: bool,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

bitflags! {
    /// Roles a column plays. Data columns carry only `DATA`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColumnKind: u32 {
        const INSTANCE_ID = 1;
        const CLASS_ID = 1 << 1;
        const PARENT_ID = 1 << 2;
        const PROPERTY_PATH_ID = 1 << 3;
        const ARRAY_INDEX = 1 << 4;
        const SOURCE_INSTANCE_ID = 1 << 5;
        const SOURCE_CLASS_ID = 1 << 6;
        const TARGET_INSTANCE_ID = 1 << 7;
        const TARGET_CLASS_ID = 1 << 8;
        const DATA = 1 << 9;

        /// Roles of the struct-array system columns.
        const STRUCT_ARRAY_ROLES = Self::PARENT_ID.bits()
            | Self::PROPERTY_PATH_ID.bits()
            | Self::ARRAY_INDEX.bits();

        /// Roles of the relationship system columns.
        const RELATIONSHIP_ROLES = Self::SOURCE_INSTANCE_ID.bits()
            | Self::SOURCE_CLASS_ID.bits()
            | Self::TARGET_INSTANCE_ID.bits()
            | Self::TARGET_CLASS_ID.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColumnPersistence {
    #[default]
    Persisted,

    /// Part of the model but never created in the database.
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Collation {
    /// Engine default; no `COLLATE` clause is emitted.
    #[default]
    Unset,
    Binary,
    NoCase,
    RTrim,
}

impl Column {
    pub fn is_persisted(&self) -> bool {
        self.persistence == ColumnPersistence::Persisted
    }

    pub fn is_system(&self) -> bool {
        !self.kind.is_empty() && !self.kind.contains(ColumnKind::DATA)
    }
}

impl ColumnKind {
    /// A column may carry roles of at most one system role group.
    pub fn is_valid(self) -> bool {
        let struct_roles = self.intersection(ColumnKind::STRUCT_ARRAY_ROLES);
        let rel_roles = self.intersection(ColumnKind::RELATIONSHIP_ROLES);

        struct_roles.bits().count_ones() <= 1
            && rel_roles.bits().count_ones() <= 1
            && (struct_roles.is_empty() || rel_roles.is_empty())
    }
}

impl Collation {
    /// Name used in `COLLATE` clauses, `None` when unset.
    pub fn sql_name(self) -> Option<&'static str> {
        match self {
            Collation::Unset => None,
            Collation::Binary => Some("Binary"),
            Collation::NoCase => Some("NoCase"),
            Collation::RTrim => Some("RTrim"),
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Collation {
        match code {
            1 => Collation::Binary,
            2 => Collation::NoCase,
            3 => Collation::RTrim,
            _ => Collation::Unset,
        }
    }
}

impl From<&Column> for ColumnId {
    fn from(value: &Column) -> Self {
        value.id
    }
}

impl fmt::Debug for ColumnId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ColumnId({}/{})", self.table.0, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_groups_are_exclusive() {
        assert!(ColumnKind::DATA.is_valid());
        assert!((ColumnKind::INSTANCE_ID | ColumnKind::SOURCE_INSTANCE_ID).is_valid());
        assert!(!(ColumnKind::PARENT_ID | ColumnKind::SOURCE_CLASS_ID).is_valid());
        assert!(!(ColumnKind::SOURCE_CLASS_ID | ColumnKind::TARGET_CLASS_ID).is_valid());
    }
}
