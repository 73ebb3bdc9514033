use ecmap_core::schema::db::{Collation, Column, ColumnType};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,

    /// Rendered as a column constraint: `INTEGER PRIMARY KEY`.
    pub primary_key: bool,

    pub not_null: bool,
    pub unique: bool,
    pub collation: Collation,

    /// Default expression, rendered in parentheses.
    pub default: Option<String>,

    /// Check expression, rendered in parentheses.
    pub check: Option<String>,
}

impl ColumnDef {
    pub(crate) fn from_schema(column: &Column, primary_key: bool) -> ColumnDef {
        ColumnDef {
            name: column.name.clone(),
            ty: column.ty,
            primary_key,
            not_null: !column.nullable,
            unique: column.unique,
            collation: column.collation,
            default: column.default.clone(),
            check: column.check.clone(),
        }
    }
}
