use serde::{Deserialize, Serialize};

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Untyped. Used by shared columns and by unrecognized existing columns.
    Any,
    Binary,
    Boolean,
    DateTime,
    Double,
    Integer,
    Long,
    String,
}

impl ColumnType {
    /// Guesses the column type from a declared type name, the way the engine
    /// assigns column affinity.
    pub fn from_declared(declared: &str) -> ColumnType {
        let declared = declared.to_ascii_lowercase();
        let has = |needle: &str| declared.contains(needle);

        if has("int") {
            ColumnType::Long
        } else if has("char") || has("clob") || has("text") {
            ColumnType::String
        } else if has("blob") {
            ColumnType::Binary
        } else if has("real") || has("floa") || has("doub") {
            ColumnType::Double
        } else if has("date") || has("time") {
            ColumnType::DateTime
        } else if has("bool") {
            ColumnType::Boolean
        } else {
            ColumnType::Any
        }
    }

    /// Returns `true` if a column of type `self` can store values requested as
    /// `requested`.
    pub fn is_compatible(self, requested: ColumnType) -> bool {
        use ColumnType::*;

        match (self, requested) {
            (Any, _) => true,
            (Integer | Long, Integer | Long) => true,
            (existing, requested) => existing == requested,
        }
    }

    /// Type name used in column definitions.
    pub fn ddl_name(self) -> &'static str {
        match self {
            ColumnType::Any => "NONE",
            ColumnType::Binary => "BINARY",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Double => "DOUBLE",
            ColumnType::Integer | ColumnType::Long => "INTEGER",
            ColumnType::String => "TEXT",
        }
    }

    /// Stable code stored in the column metadata table.
    pub fn code(self) -> i64 {
        match self {
            ColumnType::Any => 0,
            ColumnType::Binary => 1,
            ColumnType::Boolean => 2,
            ColumnType::DateTime => 3,
            ColumnType::Double => 4,
            ColumnType::Integer => 5,
            ColumnType::Long => 6,
            ColumnType::String => 7,
        }
    }

    pub fn from_code(code: i64) -> Option<ColumnType> {
        Some(match code {
            0 => ColumnType::Any,
            1 => ColumnType::Binary,
            2 => ColumnType::Boolean,
            3 => ColumnType::DateTime,
            4 => ColumnType::Double,
            5 => ColumnType::Integer,
            6 => ColumnType::Long,
            7 => ColumnType::String,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_declared_types() {
        let cases = [
            ("INTEGER", ColumnType::Long),
            ("int64", ColumnType::Long),
            ("VARCHAR(40)", ColumnType::String),
            ("nclob", ColumnType::String),
            ("BLOB", ColumnType::Binary),
            ("double precision", ColumnType::Double),
            ("FLOAT", ColumnType::Double),
            ("TIMESTAMP", ColumnType::DateTime),
            ("boolean", ColumnType::Boolean),
            ("", ColumnType::Any),
            ("NUMERIC", ColumnType::Any),
        ];

        for (declared, expected) in cases {
            assert_eq!(ColumnType::from_declared(declared), expected, "{declared}");
        }
    }

    #[test]
    fn compatibility() {
        assert!(ColumnType::Long.is_compatible(ColumnType::Integer));
        assert!(ColumnType::Any.is_compatible(ColumnType::Binary));
        assert!(!ColumnType::String.is_compatible(ColumnType::Any));
        assert!(!ColumnType::Double.is_compatible(ColumnType::Long));
    }
}
