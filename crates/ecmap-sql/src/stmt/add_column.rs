use super::{ColumnDef, Statement};

use ecmap_core::schema::db::{Column, Table, TableId};

/// A statement to add a column to a table.
#[derive(Debug, Clone)]
pub struct AddColumn {
    /// ID of the table to add the column to.
    pub table: TableId,

    /// Column definition.
    pub column: ColumnDef,
}

impl Statement {
    /// Adds a column to a live table.
    ///
    /// The engine cannot add a `UNIQUE` column, nor a `NOT NULL` column
    /// without a default, to a table that may hold rows. Both clauses are
    /// dropped. Foreign keys on the column are not emitted.
    pub fn add_column(table: &Table, column: &Column) -> Self {
        let mut def = ColumnDef::from_schema(column, false);

        if def.unique {
            tracing::warn!(
                table = %table.name,
                column = %column.name,
                "UNIQUE dropped from added column"
            );
            def.unique = false;
        }

        if def.not_null && def.default.is_none() {
            tracing::warn!(
                table = %table.name,
                column = %column.name,
                "NOT NULL dropped from added column without a default"
            );
            def.not_null = false;
        }

        if table
            .foreign_keys
            .iter()
            .any(|fk| fk.columns.contains(&column.id))
        {
            tracing::debug!(
                table = %table.name,
                column = %column.name,
                "foreign key on added column not emitted"
            );
        }

        AddColumn {
            table: table.id,
            column: def,
        }
        .into()
    }
}

impl From<AddColumn> for Statement {
    fn from(value: AddColumn) -> Self {
        Self::AddColumn(value)
    }
}
