use super::{Name, Statement};

#[derive(Debug, Clone)]
pub struct DropView {
    /// Name of the view.
    pub name: Name,

    /// Whether or not to add an `IF EXISTS` clause.
    pub if_exists: bool,
}

impl Statement {
    /// Drops a view if it exists.
    pub fn drop_view(name: &str) -> Self {
        DropView {
            name: Name::from(name),
            if_exists: true,
        }
        .into()
    }
}

impl From<DropView> for Statement {
    fn from(value: DropView) -> Self {
        Self::DropView(value)
    }
}
