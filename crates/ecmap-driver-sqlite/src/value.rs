use ecmap_core::stmt::Value as CoreValue;
use rusqlite::{
    types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef},
    Row,
};

#[derive(Debug)]
pub struct Value(CoreValue);

impl From<CoreValue> for Value {
    fn from(value: CoreValue) -> Self {
        Self(value)
    }
}

impl Value {
    /// Converts this SQLite driver value into the core value.
    pub fn into_inner(self) -> CoreValue {
        self.0
    }

    /// Reads a value within a row as the engine stores it. Typing is left to
    /// the caller, which knows the mapped property type.
    pub fn from_sql(row: &Row, index: usize) -> rusqlite::Result<Self> {
        let core_value = match row.get::<_, SqlValue>(index)? {
            SqlValue::Null => CoreValue::Null,
            SqlValue::Integer(value) => CoreValue::I64(value),
            SqlValue::Real(value) => CoreValue::F64(value),
            SqlValue::Text(value) => CoreValue::String(value),
            SqlValue::Blob(value) => CoreValue::Bytes(value),
        };

        Ok(Value(core_value))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use CoreValue::*;

        match &self.0 {
            Null => Ok(ToSqlOutput::Owned(SqlValue::Null)),
            Bool(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            I32(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v as i64))),
            I64(v) => Ok(ToSqlOutput::Owned(SqlValue::Integer(*v))),
            F64(v) => Ok(ToSqlOutput::Owned(SqlValue::Real(*v))),
            String(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes()))),
            Bytes(v) => Ok(ToSqlOutput::Borrowed(ValueRef::Blob(&v[..]))),
            DateTime(v) => Ok(ToSqlOutput::Owned(SqlValue::Text(
                CoreValue::date_time_text(v),
            ))),
            List(_) => Ok(ToSqlOutput::Owned(SqlValue::Text(self.0.to_json().to_string()))),
        }
    }
}
