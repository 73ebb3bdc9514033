use super::{Name, Statement};

use ecmap_core::schema::db::{ColumnId, Index, TableId};

#[derive(Debug, Clone)]
pub struct CreateIndex {
    /// Name of the index
    pub name: Name,

    /// Which table to index
    pub on: TableId,

    /// The columns to index
    pub columns: Vec<ColumnId>,

    /// When true, the index is unique
    pub unique: bool,

    /// Partial index predicate
    pub where_clause: Option<String>,
}

impl Statement {
    pub fn create_index(index: &Index) -> Self {
        CreateIndex {
            name: Name::from(&index.name[..]),
            on: index.id.table,
            columns: index.columns.clone(),
            unique: index.unique,
            where_clause: index.where_clause.clone(),
        }
        .into()
    }
}

impl From<CreateIndex> for Statement {
    fn from(value: CreateIndex) -> Self {
        Self::CreateIndex(value)
    }
}
