use super::Expr;

/// A query: one `SELECT` or a `UNION ALL` of several.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    Union(Vec<Select>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    /// Projected expressions, each with its output alias.
    pub projection: Vec<SelectItem>,

    /// `None` for selects without a `FROM` clause.
    pub from: Option<Source>,

    pub filter: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub table: TableRef,

    /// `LEFT JOIN`s, in order.
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

/// A `LEFT JOIN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

impl Query {
    /// Selects of the query, in order.
    pub fn selects(&self) -> &[Select] {
        match self {
            Query::Select(select) => std::slice::from_ref(select),
            Query::Union(selects) => selects,
        }
    }

    /// Builds a union, collapsing a single select.
    pub fn union(mut selects: Vec<Select>) -> Query {
        if selects.len() == 1 {
            Query::Select(selects.remove(0))
        } else {
            Query::Union(selects)
        }
    }
}

impl Select {
    pub fn new(from: Option<Source>) -> Select {
        Select {
            projection: vec![],
            from,
            filter: None,
        }
    }

    pub fn item(&mut self, expr: impl Into<Expr>, alias: impl Into<String>) {
        self.projection.push(SelectItem {
            expr: expr.into(),
            alias: alias.into(),
        });
    }

    /// ANDs `expr` into the filter.
    pub fn and_filter(&mut self, expr: Expr) {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and([existing, expr]),
            None => expr,
        });
    }
}

impl Source {
    pub fn table(name: impl Into<String>) -> Source {
        Source {
            table: TableRef {
                name: name.into(),
                alias: None,
            },
            joins: vec![],
        }
    }

    pub fn left_join(&mut self, name: impl Into<String>, alias: impl Into<String>, on: Expr) {
        self.joins.push(Join {
            table: TableRef {
                name: name.into(),
                alias: Some(alias.into()),
            },
            on,
        });
    }
}

impl TableRef {
    /// Name used to qualify column references: the alias if any.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}
