use super::{Column, ColumnId, ColumnKind, ForeignKey, Index, PrimaryKey, Trigger};

use std::fmt;

/// A database table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Uniquely identifies a table
    pub id: TableId,

    /// Name of the table
    pub name: String,

    pub kind: TableKind,

    /// Column arena. `ColumnId::index` points here; the logical order is kept
    /// in `order`.
    pub(super) columns: Vec<Column>,

    /// Arena indices in column order.
    pub(super) order: Vec<usize>,

    pub primary_key: Option<PrimaryKey>,

    pub foreign_keys: Vec<ForeignKey>,

    pub indexes: Vec<Index>,

    pub triggers: Vec<Trigger>,

    /// `true` once the table's edit scope is closed for good.
    pub(super) closed: bool,

    /// `true` while a [`TableEdit`](super::TableEdit) guard is alive.
    pub(super) in_edit: bool,

    /// The table was loaded from the metadata of an earlier import, so it
    /// already exists in the database.
    pub persisted: bool,
}

/// Uniquely identifies a table
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct TableId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Created and owned by the engine.
    Physical,

    /// Never created in the database. Placeholder for unmapped classes.
    Virtual,

    /// Pre-existing table the engine maps onto but never alters.
    Existing,

    /// Created as a temporary table.
    Temp,
}

impl Table {
    pub(super) fn new(id: TableId, name: String, kind: TableKind) -> Table {
        Table {
            id,
            name,
            kind,
            columns: vec![],
            order: vec![],
            primary_key: None,
            foreign_keys: vec![],
            indexes: vec![],
            triggers: vec![],
            closed: false,
            in_edit: false,
            persisted: false,
        }
    }

    /// Columns in table order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &Column> + '_ {
        self.order.iter().map(|i| &self.columns[*i])
    }

    /// Columns that are created in the database, in table order.
    pub fn persisted_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns().filter(|column| column.is_persisted())
    }

    pub fn column(&self, id: impl Into<ColumnId>) -> &Column {
        let id = id.into();
        assert_eq!(id.table, self.id, "column {id:?} is not in table {:?}", self.id);
        &self.columns[id.index]
    }

    /// Finds a column by name, ignoring ASCII case.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// 0-based position of the column in table order.
    pub fn position(&self, id: ColumnId) -> Option<usize> {
        self.order.iter().position(|i| *i == id.index)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// First column carrying the given role.
    pub fn column_with_kind(&self, kind: ColumnKind) -> Option<&Column> {
        self.columns().find(|column| column.kind.contains(kind))
    }

    pub fn instance_id_column(&self) -> Option<&Column> {
        self.column_with_kind(ColumnKind::INSTANCE_ID)
    }

    pub fn class_id_column(&self) -> Option<&Column> {
        self.column_with_kind(ColumnKind::CLASS_ID)
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.primary_key
            .iter()
            .flat_map(|pk| pk.columns.iter())
            .map(|id| &self.columns[id.index])
    }

    pub fn index_by_name(&self, name: &str) -> Option<&Index> {
        self.indexes
            .iter()
            .find(|index| index.name.eq_ignore_ascii_case(name))
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == TableKind::Virtual
    }

    pub fn is_existing(&self) -> bool {
        self.kind == TableKind::Existing
    }

    /// Returns `true` if the engine creates and alters this table.
    pub fn is_owned(&self) -> bool {
        matches!(self.kind, TableKind::Physical | TableKind::Temp)
    }

    /// Returns `true` once structural changes are rejected for good.
    pub fn is_edit_closed(&self) -> bool {
        self.closed
    }

    /// Returns `true` while the table is open for structural edits.
    pub fn is_in_edit(&self) -> bool {
        self.in_edit
    }
}

impl TableKind {
    /// Owner code stored in the table metadata: 0 for owned tables, 1 for
    /// existing ones.
    pub fn owner_code(self) -> i64 {
        match self {
            TableKind::Existing => 1,
            _ => 0,
        }
    }

    /// Persistence code stored in the table metadata.
    pub fn persistence_code(self) -> i64 {
        match self {
            TableKind::Physical | TableKind::Existing => 0,
            TableKind::Virtual => 1,
            TableKind::Temp => 2,
        }
    }

    pub fn from_codes(owner: i64, persistence: i64) -> TableKind {
        match (owner, persistence) {
            (1, _) => TableKind::Existing,
            (_, 1) => TableKind::Virtual,
            (_, 2) => TableKind::Temp,
            _ => TableKind::Physical,
        }
    }
}

impl From<&Table> for TableId {
    fn from(value: &Table) -> Self {
        value.id
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "TableId({})", self.0)
    }
}
