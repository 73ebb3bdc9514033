mod add_column;
pub use add_column::AddColumn;

mod column_def;
pub use column_def::ColumnDef;

mod create_index;
pub use create_index::CreateIndex;

mod create_table;
pub use create_table::CreateTable;

mod create_trigger;
pub use create_trigger::CreateTrigger;

mod create_view;
pub use create_view::CreateView;

mod drop_view;
pub use drop_view::DropView;

mod name;
pub use name::Name;

mod pragma;
pub use pragma::Pragma;

pub use ecmap_core::stmt::*;

#[derive(Debug, Clone)]
pub enum Statement {
    AddColumn(AddColumn),
    CreateIndex(CreateIndex),
    CreateTable(CreateTable),
    CreateTrigger(CreateTrigger),
    CreateView(CreateView),
    DropView(DropView),
    Insert(Insert),
    Pragma(Pragma),
    Query(Query),
}

impl Statement {
    /// Returns `true` for schema-changing statements.
    pub fn is_ddl(&self) -> bool {
        !matches!(
            self,
            Statement::Insert(_) | Statement::Pragma(_) | Statement::Query(_)
        )
    }
}

impl From<Insert> for Statement {
    fn from(value: Insert) -> Self {
        Self::Insert(value)
    }
}

impl From<Query> for Statement {
    fn from(value: Query) -> Self {
        Self::Query(value)
    }
}
