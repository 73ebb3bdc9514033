use super::{ColumnId, TableId};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryKey {
    /// Key columns, in key order.
    pub columns: Vec<ColumnId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    /// Referencing columns in the owning table.
    pub columns: Vec<ColumnId>,

    pub referenced_table: TableId,

    /// Referenced columns, pairwise with `columns`.
    pub referenced_columns: Vec<ColumnId>,

    pub on_delete: Option<ForeignKeyAction>,

    pub on_update: Option<ForeignKeyAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForeignKeyAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl PrimaryKey {
    /// 1-based position of the column in the key, if it is part of it.
    pub fn ordinal(&self, column: ColumnId) -> Option<usize> {
        self.columns
            .iter()
            .position(|id| *id == column)
            .map(|i| i + 1)
    }
}

impl ForeignKey {
    pub fn add_column(&mut self, column: ColumnId, referenced: ColumnId) {
        self.columns.push(column);
        self.referenced_columns.push(referenced);
    }
}

impl ForeignKeyAction {
    pub fn sql(self) -> &'static str {
        match self {
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::NoAction => "NO ACTION",
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ForeignKeyAction::Cascade => 1,
            ForeignKeyAction::SetNull => 2,
            ForeignKeyAction::SetDefault => 3,
            ForeignKeyAction::Restrict => 4,
            ForeignKeyAction::NoAction => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<ForeignKeyAction> {
        Some(match code {
            1 => ForeignKeyAction::Cascade,
            2 => ForeignKeyAction::SetNull,
            3 => ForeignKeyAction::SetDefault,
            4 => ForeignKeyAction::Restrict,
            5 => ForeignKeyAction::NoAction,
            _ => return None,
        })
    }
}
