use crate::{stmt::Value, Result};

use std::fmt::Debug;

/// A connection to the storage engine.
///
/// Calls are synchronous; a blocked call waits for the engine's own busy
/// timeout.
pub trait Connection: Debug + Send {
    /// Executes one statement, returning the number of changed rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Executes a batch of `;`-separated statements without parameters.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Runs a query and returns every row. Values come back as the engine
    /// stores them: integers as `I64`, reals as `F64`, text as `String`,
    /// blobs as `Bytes`.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>>;

    /// Lists the live columns of a table. Empty if the table does not exist.
    fn table_info(&mut self, table: &str) -> Result<Vec<LiveColumn>>;

    /// Kind of the schema object with the given name, if there is one.
    fn object_kind(&mut self, name: &str) -> Result<Option<ObjectKind>>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;
}

/// A column as reported by the engine's table introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    pub name: String,

    /// Declared type as written in the DDL. Possibly empty.
    pub declared_type: String,

    pub not_null: bool,

    /// Default value expression.
    pub default: Option<String>,

    /// 1-based position in the primary key, 0 if not part of it.
    pub primary_key: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    View,
    Index,
    Trigger,
}

impl LiveColumn {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> LiveColumn {
        LiveColumn {
            name: name.into(),
            declared_type: declared_type.into(),
            not_null: false,
            default: None,
            primary_key: 0,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn primary_key(mut self, ordinal: i64) -> Self {
        self.primary_key = ordinal;
        self
    }
}

impl ObjectKind {
    /// Parses the `type` column of the engine's schema catalog.
    pub fn from_catalog(kind: &str) -> Option<ObjectKind> {
        Some(match kind {
            "table" => ObjectKind::Table,
            "view" => ObjectKind::View,
            "index" => ObjectKind::Index,
            "trigger" => ObjectKind::Trigger,
            _ => return None,
        })
    }
}
