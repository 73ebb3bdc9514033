use super::{ColumnId, TableId};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub id: IndexId,

    /// Index name, unique across the database.
    pub name: String,

    pub columns: Vec<ColumnId>,

    pub unique: bool,

    /// Partial index predicate.
    pub where_clause: Option<String>,
}

/// Identifies an index within its table.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct IndexId {
    pub table: TableId,
    pub index: usize,
}

impl fmt::Debug for IndexId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "IndexId({}/{})", self.table.0, self.index)
    }
}
