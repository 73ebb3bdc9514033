use super::{Comma, Params, ToSql};

use crate::stmt;

/// Values inside queries are inlined as literals; only `INSERT` binds
/// parameters.
impl ToSql for &stmt::Value {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Value::*;

        match self {
            Null => fmt!(f, "NULL"),
            Bool(value) => {
                let digit = if *value { "1" } else { "0" };
                fmt!(f, digit);
            }
            I32(value) => fmt!(f, *value as i64),
            I64(value) => fmt!(f, *value),
            F64(value) => f.dst.push_str(&format!("{value:?}")),
            String(value) => string_literal(value, f),
            Bytes(value) => {
                fmt!(f, "X'");
                for byte in value {
                    f.dst.push_str(&format!("{byte:02X}"));
                }
                fmt!(f, "'");
            }
            DateTime(value) => string_literal(&stmt::Value::date_time_text(value), f),
            List(values) => fmt!(f, "(" Comma(values) ")"),
        }
    }
}

fn string_literal<P: Params>(value: &str, f: &mut super::Formatter<'_, P>) {
    f.dst.push('\'');
    f.dst.push_str(&value.replace('\'', "''"));
    f.dst.push('\'');
}
