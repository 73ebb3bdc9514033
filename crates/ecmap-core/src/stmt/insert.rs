use super::Value;

/// Single-row insert. Values are bound as parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,

    pub columns: Vec<String>,

    /// One value per column.
    pub values: Vec<Value>,
}

impl Insert {
    pub fn new(table: impl Into<String>) -> Insert {
        Insert {
            table: table.into(),
            columns: vec![],
            values: vec![],
        }
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }
}
