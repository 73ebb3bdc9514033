use super::{Name, Query, Statement};

use ecmap_core::view::View;

#[derive(Debug, Clone)]
pub struct CreateView {
    pub name: Name,
    pub query: Query,
}

impl Statement {
    pub fn create_view(view: &View) -> Self {
        CreateView {
            name: Name::from(&view.name),
            query: view.query.clone(),
        }
        .into()
    }
}

impl From<CreateView> for Statement {
    fn from(value: CreateView) -> Self {
        Self::CreateView(value)
    }
}
