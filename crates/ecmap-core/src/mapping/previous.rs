use crate::schema::{
    db::{ColumnId, TableId},
    ec::ClassId,
};

use std::collections::{BTreeSet, HashMap};

/// Property-to-column bindings persisted by an earlier import.
///
/// Keyed by class and case-insensitive access string.
#[derive(Debug, Clone, Default)]
pub struct PreviousBindings {
    columns: HashMap<(ClassId, String), ColumnId>,
}

impl PreviousBindings {
    pub fn new() -> PreviousBindings {
        PreviousBindings::default()
    }

    pub fn insert(&mut self, class: ClassId, access_string: &str, column: ColumnId) {
        self.columns
            .insert((class, access_string.to_ascii_lowercase()), column);
    }

    pub fn column(&self, class: ClassId, access_string: &str) -> Option<ColumnId> {
        self.columns
            .get(&(class, access_string.to_ascii_lowercase()))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str, ColumnId)> + '_ {
        self.columns
            .iter()
            .map(|((class, access), column)| (*class, access.as_str(), *column))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Classes whose instances were stored in `table`, judged by their
    /// `ECInstanceId` binding.
    pub fn classes_in_table(&self, table: TableId) -> BTreeSet<ClassId> {
        self.columns
            .iter()
            .filter(|((_, access), column)| {
                column.table == table && access.eq_ignore_ascii_case(super::INSTANCE_ID)
            })
            .map(|((class, _), _)| *class)
            .collect()
    }
}
