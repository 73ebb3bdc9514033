//! Select views reproducing the object shape of a class over its tables.

mod generate;
pub use generate::generate_select_view;

use crate::{
    schema::ec::{ClassId, PrimitiveType},
    stmt::Query,
};

/// A generated select view.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// `<alias>_<Class>_View`.
    pub name: String,

    pub class: ClassId,

    /// Output columns, in projection order. Every select of `query` projects
    /// them in this order.
    pub columns: Vec<ViewColumn>,

    pub query: Query,
}

/// One output column of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewColumn {
    /// Access string, e.g. `ECInstanceId` or `Location.X`.
    pub name: String,

    pub ty: PrimitiveType,

    /// The column holds a JSON-encoded primitive array.
    pub array: bool,
}

impl ViewColumn {
    pub(crate) fn new(name: impl Into<String>, ty: PrimitiveType, array: bool) -> ViewColumn {
        ViewColumn {
            name: name.into(),
            ty,
            array,
        }
    }

    pub(crate) fn system(name: impl Into<String>) -> ViewColumn {
        ViewColumn::new(name, PrimitiveType::Long, false)
    }
}

impl View {
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|column| column.name.as_str())
    }
}
