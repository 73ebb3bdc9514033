use super::{Comma, Delimited, Ident, Params, ToSql};

use crate::stmt;

impl ToSql for &stmt::Expr {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        use stmt::Expr::*;

        match self {
            And(operands) => {
                fmt!(f, Delimited(operands, " AND "));
            }
            BinaryOp(expr) => {
                let (lhs, op, rhs) = (&*expr.lhs, expr.op.sql(), &*expr.rhs);
                fmt!(f, lhs " " op " " rhs);
            }
            Cast(expr) => {
                let (operand, ty) = (&*expr.expr, expr.ty.ddl_name());
                fmt!(f, "CAST(" operand " AS " ty ")");
            }
            Column(expr) => expr.to_sql(f),
            InList(expr) => {
                let operand = &*expr.expr;
                let not = if expr.negated { " NOT" } else { "" };
                let list = Comma(&expr.list);
                fmt!(f, operand not " IN (" list ")");
            }
            IsNull(expr) => {
                let operand = &*expr.expr;
                let not = if expr.negated { " NOT" } else { "" };
                fmt!(f, operand " IS" not " NULL");
            }
            Value(value) => value.to_sql(f),
        }
    }
}

impl ToSql for &stmt::ExprColumn {
    fn to_sql<P: Params>(self, f: &mut super::Formatter<'_, P>) {
        let (table, column) = (Ident(&self.table), Ident(&self.column));
        fmt!(f, table "." column);
    }
}
