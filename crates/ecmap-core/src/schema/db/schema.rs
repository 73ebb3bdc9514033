use super::{
    Column, ColumnId, ColumnKind, ColumnType, ForeignKey, Index, IndexId, PrimaryKey, Table,
    TableEdit, TableId, TableKind,
};
use crate::{driver::LiveColumn, Error, Result};

use indexmap::IndexMap;

/// Name of the shared placeholder table of unmapped classes.
pub const NULL_TABLE_NAME: &str = "ec_NullTable";

/// Arena of every table known to a mapping session.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    tables: Vec<Table>,

    /// Lower-cased table name → id.
    by_name: IndexMap<String, TableId>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Creates a schema holding only the null table.
    pub fn new() -> Schema {
        let mut schema = Schema {
            tables: vec![],
            by_name: IndexMap::new(),
        };
        let null = schema.push(NULL_TABLE_NAME.to_string(), TableKind::Virtual);
        schema.tables[null.0].closed = true;
        schema
    }

    fn push(&mut self, name: String, kind: TableKind) -> TableId {
        let id = TableId(self.tables.len());
        self.by_name.insert(name.to_ascii_lowercase(), id);
        self.tables.push(Table::new(id, name, kind));
        id
    }

    /// Creates an empty table, open for edit.
    pub fn create_table(&mut self, name: &str, kind: TableKind) -> Result<TableId> {
        if kind == TableKind::Existing {
            return Err(err!(
                "existing table `{name}` must be created from its live columns"
            ));
        }
        if self.find_table(name).is_some() {
            return Err(Error::name_conflict("database", name));
        }

        tracing::debug!(table = %name, ?kind, "create table");
        Ok(self.push(name.to_string(), kind))
    }

    /// Registers a pre-existing table from its introspected columns.
    ///
    /// The table's edit scope is closed right away; the engine never alters
    /// existing tables.
    pub fn create_existing_table(&mut self, name: &str, live: &[LiveColumn]) -> Result<TableId> {
        if live.is_empty() {
            return Err(Error::missing_resolution(format!(
                "existing table `{name}` does not exist"
            )));
        }
        if self.find_table(name).is_some() {
            return Err(Error::name_conflict("database", name));
        }

        let id = self.push(name.to_string(), TableKind::Existing);

        {
            let mut edit = self.edit(id)?;
            let mut key: Vec<(i64, ColumnId)> = vec![];

            for column in live {
                let ty = ColumnType::from_declared(&column.declared_type);
                let kind = if column.primary_key > 0 {
                    ColumnKind::INSTANCE_ID
                } else {
                    ColumnKind::DATA
                };
                let column_id = edit.create_column(
                    Some(&column.name),
                    ty,
                    kind,
                    super::ColumnPersistence::Persisted,
                )?;

                let def = edit.column_mut(column_id);
                def.nullable = !column.not_null;
                def.default = column.default.clone();

                if column.primary_key > 0 {
                    key.push((column.primary_key, column_id));
                }
            }

            if !key.is_empty() {
                key.sort();
                if let Some(pk) = edit.primary_key(true) {
                    pk.columns = key.into_iter().map(|(_, id)| id).collect();
                }
            }
        }

        self.close_edit(id);
        Ok(id)
    }

    /// Opens the table for structural edits.
    pub fn edit(&mut self, id: TableId) -> Result<TableEdit<'_>> {
        TableEdit::open(&mut self.tables[id.0])
    }

    /// Closes the table's edit scope for good.
    pub fn close_edit(&mut self, id: TableId) {
        self.tables[id.0].closed = true;
    }

    pub fn null_table(&self) -> &Table {
        &self.tables[0]
    }

    pub fn null_table_id(&self) -> TableId {
        TableId(0)
    }

    pub fn table(&self, id: impl Into<TableId>) -> &Table {
        &self.tables[id.into().0]
    }

    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        let id = id.into();
        self.table(id.table).column(id)
    }

    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|id| &self.tables[id.0])
    }

    /// All tables, the null table first.
    pub fn tables(&self) -> impl ExactSizeIterator<Item = &Table> + '_ {
        self.tables.iter()
    }

    /// Looks up an index by name across all tables.
    pub fn find_index(&self, name: &str) -> Option<(&Table, &Index)> {
        self.tables
            .iter()
            .find_map(|table| table.index_by_name(name).map(|index| (table, index)))
    }

    /// Restores a table loaded from persisted metadata.
    ///
    /// Loaded tables stay open for edit (unless existing) and are flagged as
    /// persisted.
    pub fn load_table(
        &mut self,
        name: &str,
        kind: TableKind,
        columns: Vec<Column>,
        primary_key: Option<PrimaryKey>,
    ) -> Result<TableId> {
        if self.find_table(name).is_some() {
            return Err(Error::name_conflict("database", name));
        }

        let id = self.push(name.to_string(), kind);
        let table = &mut self.tables[id.0];
        table.order = (0..columns.len()).collect();
        table.columns = columns
            .into_iter()
            .enumerate()
            .map(|(index, mut column)| {
                column.id = ColumnId { table: id, index };
                column
            })
            .collect();
        table.primary_key = primary_key.map(|pk| PrimaryKey {
            columns: pk
                .columns
                .into_iter()
                .map(|column| ColumnId {
                    table: id,
                    index: column.index,
                })
                .collect(),
        });
        table.persisted = true;
        table.closed = kind == TableKind::Existing;

        Ok(id)
    }

    /// Restores a persisted foreign key. Bypasses the edit scope.
    pub fn restore_foreign_key(&mut self, table: TableId, foreign_key: ForeignKey) {
        self.tables[table.0].foreign_keys.push(foreign_key);
    }

    /// Restores a persisted index. Bypasses the edit scope.
    pub fn restore_index(
        &mut self,
        table: TableId,
        name: String,
        columns: Vec<ColumnId>,
        unique: bool,
        where_clause: Option<String>,
    ) -> Result<IndexId> {
        if self.find_index(&name).is_some() {
            return Err(Error::name_conflict("database", name));
        }

        let table = &mut self.tables[table.0];
        let id = IndexId {
            table: table.id,
            index: table.indexes.len(),
        };
        table.indexes.push(Index {
            id,
            name,
            columns,
            unique,
            where_clause,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::db::ColumnPersistence;

    #[test]
    fn null_table_is_closed_and_empty() {
        let mut schema = Schema::new();
        let null = schema.null_table_id();

        assert!(schema.null_table().is_virtual());
        assert_eq!(schema.null_table().column_count(), 0);
        assert!(schema.edit(null).unwrap_err().is_not_in_edit_mode());
    }

    #[test]
    fn edit_guard_scopes_mutation() {
        let mut schema = Schema::new();
        let id = schema.create_table("ts_Foo", TableKind::Physical).unwrap();

        {
            let mut edit = schema.edit(id).unwrap();
            assert!(edit.table().is_in_edit());
            edit.create_column(
                Some("Name"),
                ColumnType::String,
                ColumnKind::DATA,
                ColumnPersistence::Persisted,
            )
            .unwrap();

            let err = edit
                .create_column(
                    Some("NAME"),
                    ColumnType::Long,
                    ColumnKind::DATA,
                    ColumnPersistence::Persisted,
                )
                .unwrap_err();
            assert!(err.is_name_conflict());
        }

        assert!(!schema.table(id).is_in_edit());

        schema.close_edit(id);
        assert!(schema.edit(id).unwrap_err().is_not_in_edit_mode());
    }

    #[test]
    fn unnamed_columns_get_generated_names() {
        let mut schema = Schema::new();
        let id = schema.create_table("ts_Foo", TableKind::Physical).unwrap();
        let mut edit = schema.edit(id).unwrap();

        let first = edit
            .create_column(None, ColumnType::Any, ColumnKind::DATA, ColumnPersistence::Persisted)
            .unwrap();
        let second = edit
            .create_column(None, ColumnType::Any, ColumnKind::DATA, ColumnPersistence::Persisted)
            .unwrap();

        assert_eq!(edit.table().column(first).name, "sc01");
        assert_eq!(edit.table().column(second).name, "sc02");
        assert!(edit.table().column(second).shared);
    }

    #[test]
    fn virtual_tables_force_virtual_columns() {
        let mut schema = Schema::new();
        let id = schema.create_table("ts_Virtual", TableKind::Virtual).unwrap();
        let column = schema
            .edit(id)
            .unwrap()
            .create_column(
                Some("A"),
                ColumnType::Long,
                ColumnKind::DATA,
                ColumnPersistence::Persisted,
            )
            .unwrap();

        assert!(!schema.column(column).is_persisted());
        assert_eq!(schema.table(id).persisted_columns().count(), 0);
    }

    #[test]
    fn insert_at_position_keeps_ids_stable() {
        let mut schema = Schema::new();
        let id = schema.create_table("ts_Foo", TableKind::Physical).unwrap();
        let mut edit = schema.edit(id).unwrap();

        let a = edit
            .create_column(Some("A"), ColumnType::Long, ColumnKind::INSTANCE_ID, ColumnPersistence::Persisted)
            .unwrap();
        let b = edit
            .create_column(Some("B"), ColumnType::String, ColumnKind::DATA, ColumnPersistence::Persisted)
            .unwrap();
        let c = edit
            .create_column_at(1, Some("C"), ColumnType::Long, ColumnKind::CLASS_ID, ColumnPersistence::Persisted)
            .unwrap();
        drop(edit);

        let names: Vec<_> = schema.table(id).columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "C", "B"]);
        assert_eq!(schema.column(b).name, "B");
        assert_eq!(schema.table(id).position(c), Some(1));
        assert_eq!(schema.table(id).position(a), Some(0));
    }

    #[test]
    fn existing_table_is_sniffed_and_locked() {
        let mut schema = Schema::new();
        let live = vec![
            LiveColumn::new("Id", "INTEGER").primary_key(1),
            LiveColumn::new("Label", "VARCHAR(20)").not_null(),
            LiveColumn::new("Weight", "REAL"),
        ];

        let id = schema.create_existing_table("legacy", &live).unwrap();
        let table = schema.table(id);

        assert!(table.is_existing());
        assert!(table.is_edit_closed());
        assert_eq!(table.instance_id_column().unwrap().name, "Id");
        assert_eq!(table.column_by_name("label").unwrap().ty, ColumnType::String);
        assert!(!table.column_by_name("label").unwrap().nullable);
        assert_eq!(table.column_by_name("Weight").unwrap().ty, ColumnType::Double);
        assert_eq!(table.primary_key_columns().count(), 1);
    }
}
