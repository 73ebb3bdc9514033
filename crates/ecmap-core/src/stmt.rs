//! SQL query AST produced by the view generator and the insert binder.
//!
//! Table and column references are by name (or join alias) so a query can be
//! serialized without access to the table model.

mod expr;
pub use expr::{BinaryOp, Expr, ExprBinaryOp, ExprCast, ExprColumn, ExprInList, ExprIsNull};

mod insert;
pub use insert::Insert;

mod query;
pub use query::{Join, Query, Select, SelectItem, Source, TableRef};

mod value;
pub use value::Value;
