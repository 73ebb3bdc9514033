use super::{
    Collation, Column, ColumnId, ColumnKind, ColumnPersistence, ColumnType, ForeignKey, Index,
    IndexId, PrimaryKey, Table, TableId, TableKind, Trigger, TriggerEvent, TriggerTiming,
};
use crate::{Error, Result};

/// Structural edit scope of one table.
///
/// Returned by [`Schema::edit`](super::Schema::edit). Every structural
/// mutator lives on the guard, so holding one is the capability to change the
/// table. Dropping the guard ends the edit.
#[derive(Debug)]
pub struct TableEdit<'a> {
    table: &'a mut Table,
}

impl<'a> TableEdit<'a> {
    pub(super) fn open(table: &'a mut Table) -> Result<TableEdit<'a>> {
        if table.closed {
            return Err(Error::not_in_edit_mode(&table.name));
        }
        table.in_edit = true;
        Ok(TableEdit { table })
    }

    pub fn id(&self) -> TableId {
        self.table.id
    }

    pub fn table(&self) -> &Table {
        self.table
    }

    /// Appends a column.
    ///
    /// `None` generates a name (`sc01`, `sc02`, ...). Fails with a name
    /// conflict if a column of that name exists already.
    pub fn create_column(
        &mut self,
        name: Option<&str>,
        ty: ColumnType,
        kind: ColumnKind,
        persistence: ColumnPersistence,
    ) -> Result<ColumnId> {
        let position = self.table.order.len();
        self.create_column_at(position, name, ty, kind, persistence)
    }

    /// Inserts a column at `position` in table order.
    pub fn create_column_at(
        &mut self,
        position: usize,
        name: Option<&str>,
        ty: ColumnType,
        kind: ColumnKind,
        persistence: ColumnPersistence,
    ) -> Result<ColumnId> {
        debug_assert!(kind.is_valid(), "invalid column kind {kind:?}");

        let (name, shared) = match name {
            Some(name) => {
                if self.table.column_by_name(name).is_some() {
                    return Err(Error::name_conflict(&self.table.name, name));
                }
                (name.to_string(), false)
            }
            None => (self.next_generated_name(), true),
        };

        let persistence = if self.table.kind == TableKind::Virtual {
            ColumnPersistence::Virtual
        } else {
            persistence
        };

        let id = ColumnId {
            table: self.table.id,
            index: self.table.columns.len(),
        };

        tracing::debug!(table = %self.table.name, column = %name, ?ty, "create column");

        self.table.columns.push(Column {
            id,
            name,
            ty,
            kind,
            persistence,
            nullable: true,
            unique: false,
            collation: Collation::Unset,
            default: None,
            check: None,
            shared,
        });

        let position = position.min(self.table.order.len());
        self.table.order.insert(position, id.index);

        Ok(id)
    }

    fn next_generated_name(&self) -> String {
        (1..)
            .map(|n| format!("sc{n:02}"))
            .find(|name| self.table.column_by_name(name).is_none())
            .unwrap_or_default()
    }

    /// Mutable access to a column's attributes.
    pub fn column_mut(&mut self, id: ColumnId) -> &mut Column {
        assert_eq!(id.table, self.table.id, "column {id:?} is not in this table");
        &mut self.table.columns[id.index]
    }

    /// The primary key, created empty when absent and `create_if_absent` is
    /// set.
    pub fn primary_key(&mut self, create_if_absent: bool) -> Option<&mut PrimaryKey> {
        if create_if_absent && self.table.primary_key.is_none() {
            self.table.primary_key = Some(PrimaryKey::default());
        }
        self.table.primary_key.as_mut()
    }

    /// Adds an empty foreign key referencing `referenced`. Columns are added
    /// through [`ForeignKey::add_column`].
    pub fn create_foreign_key(&mut self, referenced: TableId) -> &mut ForeignKey {
        self.table.foreign_keys.push(ForeignKey {
            columns: vec![],
            referenced_table: referenced,
            referenced_columns: vec![],
            on_delete: None,
            on_update: None,
        });
        let last = self.table.foreign_keys.len() - 1;
        &mut self.table.foreign_keys[last]
    }

    /// Adds an index. Index names are checked for uniqueness across the whole
    /// schema by the caller.
    pub fn create_index(
        &mut self,
        name: impl Into<String>,
        columns: Vec<ColumnId>,
        unique: bool,
        where_clause: Option<String>,
    ) -> Result<IndexId> {
        let name = name.into();
        if self.table.index_by_name(&name).is_some() {
            return Err(Error::name_conflict(&self.table.name, name));
        }

        let id = IndexId {
            table: self.table.id,
            index: self.table.indexes.len(),
        };
        self.table.indexes.push(Index {
            id,
            name,
            columns,
            unique,
            where_clause,
        });
        Ok(id)
    }

    pub fn create_trigger(
        &mut self,
        name: impl Into<String>,
        timing: TriggerTiming,
        event: TriggerEvent,
        condition: Option<String>,
        body: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        if self
            .table
            .triggers
            .iter()
            .any(|trigger| trigger.name.eq_ignore_ascii_case(&name))
        {
            return Err(Error::name_conflict(&self.table.name, name));
        }

        self.table.triggers.push(Trigger {
            name,
            timing,
            event,
            condition,
            body: body.into(),
        });
        Ok(())
    }
}

impl Drop for TableEdit<'_> {
    fn drop(&mut self) {
        self.table.in_edit = false;
    }
}
