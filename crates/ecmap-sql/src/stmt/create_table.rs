use super::{ColumnDef, Statement};

use ecmap_core::schema::db::{ColumnId, ColumnType, ForeignKey, Table, TableId, TableKind};

#[derive(Debug, Clone)]
pub struct CreateTable {
    /// Table to create
    pub table: TableId,

    /// `CREATE TEMP TABLE`
    pub temp: bool,

    /// Column definitions, persisted columns only
    pub columns: Vec<ColumnDef>,

    /// Table-level primary key; empty when the key is a single integer column
    /// declared inline.
    pub primary_key: Vec<ColumnId>,

    pub foreign_keys: Vec<ForeignKey>,
}

impl Statement {
    pub fn create_table(table: &Table) -> Self {
        let key: Vec<ColumnId> = table
            .primary_key
            .as_ref()
            .map(|pk| pk.columns.clone())
            .unwrap_or_default();

        let inline = match key[..] {
            [column] if table.column(column).ty.is_compatible(ColumnType::Long) => Some(column),
            _ => None,
        };

        CreateTable {
            table: table.id,
            temp: table.kind == TableKind::Temp,
            columns: table
                .persisted_columns()
                .map(|column| ColumnDef::from_schema(column, Some(column.id) == inline))
                .collect(),
            primary_key: if inline.is_some() { vec![] } else { key },
            foreign_keys: table.foreign_keys.clone(),
        }
        .into()
    }
}

impl From<CreateTable> for Statement {
    fn from(value: CreateTable) -> Self {
        Self::CreateTable(value)
    }
}
