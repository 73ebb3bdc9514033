use super::{Name, Statement};

/// A PRAGMA statement.
#[derive(Debug, Clone)]
pub struct Pragma {
    /// The pragma name (e.g. "foreign_keys").
    pub name: String,

    /// The value to set, if any.
    pub value: Option<String>,

    /// Argument of a table-valued pragma, e.g. `table_info([t])`.
    pub argument: Option<Name>,
}

impl Statement {
    /// Sets `PRAGMA foreign_keys = ON`.
    pub fn pragma_enable_foreign_keys() -> Self {
        Pragma {
            name: "foreign_keys".to_string(),
            value: Some("ON".to_string()),
            argument: None,
        }
        .into()
    }

    /// `PRAGMA table_info([table])`: one row per live column.
    pub fn pragma_table_info(table: &str) -> Self {
        Pragma {
            name: "table_info".to_string(),
            value: None,
            argument: Some(Name::from(table)),
        }
        .into()
    }
}

impl From<Pragma> for Statement {
    fn from(value: Pragma) -> Self {
        Self::Pragma(value)
    }
}
