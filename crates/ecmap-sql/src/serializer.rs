#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited, Period};

mod ident;
use ident::Ident;

mod params;
pub use params::{Params, Placeholder};

// Fragment serializers
mod column_def;
mod expr;
mod name;
mod statement;
mod value;

use crate::stmt::{Expr, Query, Statement};

use ecmap_core::schema::db::{self, Table};

/// Serialize a statement to a SQL string
#[derive(Debug)]
pub struct Serializer<'a> {
    /// Schema against which the statement is to be serialized
    schema: &'a db::Schema,
}

struct Formatter<'a, T> {
    /// Handle to the serializer
    serializer: &'a Serializer<'a>,

    /// Where to write the serialized SQL
    dst: &'a mut String,

    /// Where to store parameters
    params: &'a mut T,
}

/// Discards parameters. For statements that bind none.
struct NoParams;

impl Params for NoParams {
    fn push(&mut self, _: &ecmap_core::stmt::Value) -> Placeholder {
        Placeholder(0)
    }
}

impl<'a> Serializer<'a> {
    pub fn sqlite(schema: &'a db::Schema) -> Serializer<'a> {
        Serializer { schema }
    }

    pub fn serialize(&self, stmt: &Statement, params: &mut impl Params) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params,
        };

        stmt.to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    /// Serializes a query without a terminator. Values are inlined as
    /// literals, so the text can serve as a view body.
    pub fn serialize_query(&self, query: &Query) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params: &mut NoParams,
        };

        query.to_sql(&mut fmt);
        ret
    }

    /// Serializes a standalone expression, e.g. a class-discrimination
    /// predicate to splice into a hand-written query.
    pub fn serialize_expr(&self, expr: &Expr) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
            params: &mut NoParams,
        };

        expr.to_sql(&mut fmt);
        ret
    }

    fn table(&self, id: impl Into<db::TableId>) -> &'a Table {
        self.schema.table(id.into())
    }

    fn table_name(&self, id: impl Into<db::TableId>) -> Ident<&'a str> {
        let table = self.schema.table(id.into());
        Ident(&table.name)
    }

    fn column_name(&self, id: impl Into<db::ColumnId>) -> Ident<&'a str> {
        let column = self.schema.column(id.into());
        Ident(&column.name)
    }
}
