use super::Value;
use crate::schema::db::ColumnType;

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// AND of several predicates
    And(Vec<Expr>),

    /// Binary comparison
    BinaryOp(ExprBinaryOp),

    /// `CAST(expr AS type)`
    Cast(ExprCast),

    /// Table-qualified column reference
    Column(ExprColumn),

    /// `expr [NOT] IN (list)`
    InList(ExprInList),

    /// `expr IS [NOT] NULL`
    IsNull(ExprIsNull),

    /// Literal value
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprColumn {
    /// Table name or join alias the column is read from.
    pub table: String,

    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprBinaryOp {
    pub lhs: Box<Expr>,
    pub op: BinaryOp,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprCast {
    pub expr: Box<Expr>,
    pub ty: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInList {
    pub expr: Box<Expr>,
    pub list: Vec<Expr>,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprIsNull {
    pub expr: Box<Expr>,
    pub negated: bool,
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
}

impl Expr {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Expr {
        Expr::Column(ExprColumn {
            table: table.into(),
            column: column.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Value(value.into())
    }

    pub fn null() -> Expr {
        Expr::Value(Value::Null)
    }

    pub fn eq(lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Expr {
        Expr::BinaryOp(ExprBinaryOp {
            lhs: Box::new(lhs.into()),
            op: BinaryOp::Eq,
            rhs: Box::new(rhs.into()),
        })
    }

    pub fn cast(expr: impl Into<Expr>, ty: ColumnType) -> Expr {
        Expr::Cast(ExprCast {
            expr: Box::new(expr.into()),
            ty,
        })
    }

    pub fn in_list(expr: impl Into<Expr>, list: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::InList(ExprInList {
            expr: Box::new(expr.into()),
            list: list.into_iter().collect(),
            negated: false,
        })
    }

    pub fn is_null(expr: impl Into<Expr>) -> Expr {
        Expr::IsNull(ExprIsNull {
            expr: Box::new(expr.into()),
            negated: false,
        })
    }

    pub fn is_not_null(expr: impl Into<Expr>) -> Expr {
        Expr::IsNull(ExprIsNull {
            expr: Box::new(expr.into()),
            negated: true,
        })
    }

    /// Conjunction of the operands. Nested conjunctions are flattened and a
    /// single operand is returned as is.
    pub fn and(operands: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = vec![];
        for operand in operands {
            match operand {
                Expr::And(inner) => flat.extend(inner),
                operand => flat.push(operand),
            }
        }

        if flat.len() == 1 {
            flat.pop().unwrap_or(Expr::Value(Value::Bool(true)))
        } else {
            Expr::And(flat)
        }
    }

    /// `1 = 0`, the predicate of empty results.
    pub fn always_false() -> Expr {
        Expr::eq(Value::I64(1), Value::I64(0))
    }

    pub fn as_column(&self) -> Option<&ExprColumn> {
        match self {
            Expr::Column(column) => Some(column),
            _ => None,
        }
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<ExprColumn> for Expr {
    fn from(value: ExprColumn) -> Self {
        Expr::Column(value)
    }
}

impl BinaryOp {
    pub fn sql(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
        }
    }
}

impl fmt::Debug for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}
