use crate::catalog::Catalog;

use ecmap_core::{
    driver::Connection,
    mapping::{ClassMap, Options},
    schema::{
        db::{self, Table},
        ec::{Class, ClassGraph},
    },
    view::{self, ViewColumn},
    Error, Result, SchemaMappingSession,
};
use ecmap_sql::{Serializer, Statement};

use std::sync::Arc;

/// A finalized mapping: the class graph, every class map and the table model.
///
/// Immutable once built. Classes are addressed by `Schema:Class` name,
/// ignoring ASCII case.
#[derive(Debug)]
pub struct Mapped {
    session: SchemaMappingSession,
}

/// A generated select view, serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectView {
    /// Name of the physical view, `<alias>_<Class>_View`.
    pub name: String,

    /// The view's query, without a terminator.
    pub sql: String,

    pub columns: Vec<ViewColumn>,
}

impl Mapped {
    /// Maps the catalog's definitions again, against its stored bindings.
    pub(super) fn build(
        catalog: &Catalog,
        options: &Options,
        connection: &mut dyn Connection,
    ) -> Result<Mapped> {
        let mut ids = catalog.ids.clone();
        let graph = ClassGraph::build(&catalog.defs, &mut ids)?;

        let mut session =
            SchemaMappingSession::new(Arc::new(graph), catalog.schema.clone(), options.clone())
                .with_previous(catalog.previous.clone());
        session.map_all(connection)?;

        Ok(Mapped { session })
    }

    pub(super) fn new(session: SchemaMappingSession) -> Mapped {
        Mapped { session }
    }

    pub fn session(&self) -> &SchemaMappingSession {
        &self.session
    }

    pub fn graph(&self) -> &ClassGraph {
        self.session.graph()
    }

    pub fn schema(&self) -> &db::Schema {
        self.session.schema()
    }

    pub fn class(&self, name: &str) -> Result<&Class> {
        self.graph()
            .find(name)
            .ok_or_else(|| Error::missing_resolution(format!("no class named `{name}`")))
    }

    pub fn class_map(&self, class: &str) -> Result<&ClassMap> {
        let class = self.class(class)?;
        self.session.class_map(class.id).ok_or_else(|| {
            Error::missing_resolution(format!("class {} has no class map", class.full_name()))
        })
    }

    pub fn select_view(&self, class: &str, polymorphic: bool) -> Result<SelectView> {
        let class = self.class(class)?;
        let view = view::generate_select_view(&self.session, class.id, polymorphic)?;

        Ok(SelectView {
            sql: Serializer::sqlite(self.schema()).serialize_query(&view.query),
            name: view.name,
            columns: view.columns,
        })
    }

    pub fn where_clause(
        &self,
        class: &str,
        polymorphic: bool,
        table_alias: &str,
    ) -> Result<Option<String>> {
        let class_map = self.class_map(class)?;
        let expr = class_map
            .native_sql_converter(&self.session)
            .where_clause(polymorphic, table_alias);

        Ok(expr.map(|expr| Serializer::sqlite(self.schema()).serialize_expr(&expr)))
    }

    /// `CREATE TABLE` statement of a table, `None` for tables the engine does
    /// not create.
    pub fn create_table_sql(&self, table: &str) -> Result<Option<String>> {
        let table = self.table(table)?;
        if !table.is_owned() || table.persisted_columns().next().is_none() {
            return Ok(None);
        }

        let mut params = vec![];
        Ok(Some(
            Serializer::sqlite(self.schema()).serialize(&Statement::create_table(table), &mut params),
        ))
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.schema()
            .find_table(name)
            .ok_or_else(|| Error::missing_resolution(format!("no table named `{name}`")))
    }
}

impl SelectView {
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|column| column.name.as_str())
    }
}
