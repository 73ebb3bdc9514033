use super::{Db, Mapped};
use crate::catalog::{self, Catalog, StoredView};

use ecmap_core::{
    driver::{Connection, ObjectKind},
    mapping::{ClassMapKind, Options},
    schema::{
        db::Table,
        ec::{ClassGraph, SchemaDef},
    },
    view::generate_select_view,
    Error, Result, SchemaMappingSession,
};
use ecmap_sql::{migrate_table, Serializer, Statement};

use std::sync::{Arc, PoisonError};

/// What an import changed in the database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Mapped classes, including unmapped ones and mixins.
    pub classes: usize,

    /// Tables of the mapping, excluding the null table.
    pub tables: usize,

    /// DDL executed against the database, in order. Catalog writes are not
    /// listed.
    pub statements: Vec<String>,

    /// Views created or recreated.
    pub views: Vec<String>,
}

struct Import<'a> {
    connection: &'a mut dyn Connection,
    catalog: &'a Catalog,
    report: ImportReport,
}

impl Db {
    /// Imports schema definitions and brings the database up to date.
    ///
    /// Definitions replace earlier ones with the same name. The whole import
    /// runs in one transaction: on failure nothing is changed and the cached
    /// class maps are dropped.
    pub fn import_schemas(&self, defs: impl IntoIterator<Item = SchemaDef>) -> Result<ImportReport> {
        let mut mapped = self.mapped.write().unwrap_or_else(PoisonError::into_inner);
        let mut connection = self.connection();
        let connection = &mut **connection;

        let catalog = self.schemas.snapshot();
        let defs = catalog.merge(defs);

        tracing::info!(schemas = defs.len(), "importing schemas");

        connection.begin()?;

        let mut import = Import {
            connection: &mut *connection,
            catalog: &catalog,
            report: ImportReport::default(),
        };

        let result = import
            .run(&defs, &self.options, self.create_views)
            .and_then(|session| {
                import.connection.commit()?;
                Ok(session)
            });

        let session = match result {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(error = %err, "schema import failed; rolling back");
                if let Err(rollback) = import.connection.rollback() {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                *mapped = None;
                return Err(err);
            }
        };
        let report = import.report;

        // Reload so the next import starts from persisted tables.
        match catalog::load(connection) {
            Ok(loaded) => self.schemas.replace(loaded),
            Err(err) => {
                *mapped = None;
                return Err(err);
            }
        }
        *mapped = Some(Arc::new(Mapped::new(session)));

        tracing::info!(
            classes = report.classes,
            tables = report.tables,
            statements = report.statements.len(),
            views = report.views.len(),
            "schemas imported"
        );
        Ok(report)
    }
}

impl Import<'_> {
    fn run(
        &mut self,
        defs: &[SchemaDef],
        options: &Options,
        create_views: bool,
    ) -> Result<SchemaMappingSession> {
        let mut ids = self.catalog.ids.clone();
        let graph = ClassGraph::build(defs, &mut ids)?;

        let mut session = SchemaMappingSession::new(
            Arc::new(graph),
            self.catalog.schema.clone(),
            options.clone(),
        )
        .with_previous(self.catalog.previous.clone());
        session.map_all(&mut *self.connection)?;

        self.report.classes = session.class_maps().len();
        self.report.tables = session.schema().tables().len() - 1;

        for table in session.schema().tables().filter(|table| table.is_owned()) {
            self.create_or_update(&session, table)?;
        }
        for table in session.schema().tables().filter(|table| table.is_owned()) {
            self.create_indexes_and_triggers(&session, table)?;
        }

        catalog::save(&mut *self.connection, defs, &session)?;

        if create_views {
            self.update_views(&session)?;
        }

        Ok(session)
    }

    /// Creates the table, or adds the columns it is missing.
    fn create_or_update(&mut self, session: &SchemaMappingSession, table: &Table) -> Result<()> {
        let live = self.connection.table_info(&table.name)?;

        if live.is_empty() {
            match self.connection.object_kind(&table.name)? {
                Some(ObjectKind::View) => {
                    self.execute(session, &Statement::drop_view(&table.name))?;
                }
                Some(kind @ (ObjectKind::Index | ObjectKind::Trigger)) => {
                    return Err(Error::name_conflict(
                        "database",
                        format!("{} (a {kind:?})", table.name),
                    ));
                }
                Some(ObjectKind::Table) | None => {}
            }
        }

        for stmt in migrate_table(table, &live)? {
            self.execute(session, &stmt)?;
        }

        Ok(())
    }

    fn create_indexes_and_triggers(
        &mut self,
        session: &SchemaMappingSession,
        table: &Table,
    ) -> Result<()> {
        for index in &table.indexes {
            if self.exists(&index.name, ObjectKind::Index)? {
                continue;
            }
            self.execute(session, &Statement::create_index(index))?;
        }

        for trigger in &table.triggers {
            if self.exists(&trigger.name, ObjectKind::Trigger)? {
                continue;
            }
            self.execute(session, &Statement::create_trigger(table.id, trigger))?;
        }

        Ok(())
    }

    /// Recreates the view of every stored class whose SQL changed.
    fn update_views(&mut self, session: &SchemaMappingSession) -> Result<()> {
        let serializer = Serializer::sqlite(session.schema());
        let catalog = self.catalog;

        for class_map in session.class_maps() {
            if matches!(class_map.kind, ClassMapKind::Unmapped | ClassMapKind::Struct) {
                continue;
            }

            let view = generate_select_view(session, class_map.class, true)?;
            let stored = StoredView {
                name: view.name.clone(),
                sql: serializer.serialize_query(&view.query),
            };

            let previous = catalog.views.get(&class_map.class);
            if previous == Some(&stored) {
                continue;
            }

            if let Some(previous) = previous.filter(|previous| previous.name != stored.name) {
                self.execute(session, &Statement::drop_view(&previous.name))?;
            }
            if self.exists(&view.name, ObjectKind::View)? {
                self.execute(session, &Statement::drop_view(&view.name))?;
            }
            self.execute(session, &Statement::create_view(&view))?;

            catalog::save_view(&mut *self.connection, class_map.class, &stored)?;
            tracing::debug!(view = %view.name, "view created");
            self.report.views.push(view.name);
        }

        Ok(())
    }

    /// Returns `true` if an object of `kind` named `name` exists. An object of
    /// another kind holding the name is a conflict.
    fn exists(&mut self, name: &str, kind: ObjectKind) -> Result<bool> {
        match self.connection.object_kind(name)? {
            None => Ok(false),
            Some(found) if found == kind => Ok(true),
            Some(found) => Err(Error::name_conflict(
                "database",
                format!("{name} (a {found:?}, expected a {kind:?})"),
            )),
        }
    }

    fn execute(&mut self, session: &SchemaMappingSession, stmt: &Statement) -> Result<()> {
        let mut params = vec![];
        let sql = Serializer::sqlite(session.schema()).serialize(stmt, &mut params);

        tracing::debug!(%sql, "executing");
        self.connection.execute_batch(&sql)?;

        self.report.statements.push(sql);
        Ok(())
    }
}
