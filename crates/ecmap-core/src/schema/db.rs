//! Physical tables, columns and constraints.

mod column;
pub use column::{Collation, Column, ColumnId, ColumnKind, ColumnPersistence};

mod constraint;
pub use constraint::{ForeignKey, ForeignKeyAction, PrimaryKey};

mod edit;
pub use edit::TableEdit;

mod index;
pub use index::{Index, IndexId};

mod schema;
pub use schema::{Schema, NULL_TABLE_NAME};

mod table;
pub use table::{Table, TableId, TableKind};

mod trigger;
pub use trigger::{Trigger, TriggerEvent, TriggerTiming};

mod ty;
pub use ty::ColumnType;
