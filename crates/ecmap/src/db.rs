mod builder;
pub use builder::Builder;

mod cache;
use cache::SchemaCache;

mod import;
pub use import::ImportReport;

mod mapped;
pub use mapped::{Mapped, SelectView};

mod row;
pub use row::Row;

use crate::catalog;

use ecmap_core::{
    driver::Connection,
    mapping::{ClassMap, InsertBinder, Options},
    schema::ec::SchemaDef,
    stmt::Value,
    Error, Result,
};
use ecmap_sql::{Serializer, Statement};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// A handle to a mapped database.
///
/// Query preparation takes a shared lock on the finalized class maps and may
/// run from several threads. Importing schemas takes the lock exclusively for
/// the whole import.
#[derive(Debug)]
pub struct Db {
    connection: Mutex<Box<dyn Connection>>,

    /// Finalized class maps, built lazily from the catalog.
    mapped: RwLock<Option<Arc<Mapped>>>,

    schemas: SchemaCache,

    options: Options,

    /// Create a physical view per class on import.
    create_views: bool,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Opens the catalog on `connection`, creating the system tables on first
    /// use.
    fn open(
        mut connection: Box<dyn Connection>,
        options: Options,
        create_views: bool,
    ) -> Result<Db> {
        catalog::create_system_tables(&mut *connection)?;
        let loaded = catalog::load(&mut *connection)?;

        Ok(Db {
            connection: Mutex::new(connection),
            mapped: RwLock::new(None),
            schemas: SchemaCache::new(loaded),
            options,
            create_views,
        })
    }

    /// Definitions of every imported schema, in import order.
    pub fn schemas(&self) -> Vec<SchemaDef> {
        self.schemas.definitions()
    }

    /// Definition of one imported schema, by case-insensitive name.
    pub fn schema(&self, name: &str) -> Option<SchemaDef> {
        self.schemas.definition(name)
    }

    /// The finalized mapping, built on first use after opening the database
    /// or clearing the cache.
    pub fn mapping(&self) -> Result<Arc<Mapped>> {
        if let Some(mapped) = self.mapped.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(mapped.clone());
        }

        let mut mapped = self.mapped.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(mapped) = mapped.as_ref() {
            return Ok(mapped.clone());
        }

        let catalog = self.schemas.snapshot();
        let mut connection = self.connection();
        let built = Arc::new(Mapped::build(&catalog, &self.options, &mut **connection)?);

        *mapped = Some(built.clone());
        Ok(built)
    }

    /// Drops the finalized class maps. They are rebuilt from the catalog on
    /// next use.
    pub fn clear_cache(&self) {
        *self.mapped.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Class map of a class named `Schema:Class`.
    pub fn class_map(&self, class: &str) -> Result<ClassMap> {
        self.mapping()?.class_map(class).cloned()
    }

    /// The select view of a class, without creating it in the database.
    pub fn select_view(&self, class: &str, polymorphic: bool) -> Result<SelectView> {
        self.mapping()?.select_view(class, polymorphic)
    }

    /// Class-discrimination predicate for a hand-written query over the
    /// class's table aliased as `table_alias`. `None` when every row of the
    /// table qualifies.
    pub fn where_clause(
        &self,
        class: &str,
        polymorphic: bool,
        table_alias: &str,
    ) -> Result<Option<String>> {
        self.mapping()?.where_clause(class, polymorphic, table_alias)
    }

    /// Inserts one instance of `class` and returns its instance id.
    ///
    /// `values` are keyed by access string, e.g. `Name` or `Location.X`.
    pub fn insert<K, I>(&self, class: &str, values: I) -> Result<i64>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mapped = self.mapping()?;
        let class = mapped.class(class)?.id;
        let binder = InsertBinder::new(mapped.session(), class)?;

        let mut connection = self.connection();
        let connection = &mut **connection;

        connection.begin()?;
        match insert_row(connection, &mapped, &binder, values) {
            Ok(id) => {
                connection.commit()?;
                Ok(id)
            }
            Err(err) => {
                if let Err(rollback) = connection.rollback() {
                    tracing::warn!(error = %rollback, "rollback after failed insert failed");
                }
                Err(err)
            }
        }
    }

    /// Reads every instance of `class` through its select view. With
    /// `polymorphic`, instances of subclasses are included.
    pub fn select(&self, class: &str, polymorphic: bool) -> Result<Vec<Row>> {
        let view = self.select_view(class, polymorphic)?;
        let rows = self.connection().query(&view.sql, &[])?;

        rows.into_iter()
            .map(|values| Row::decode(&view.columns, values))
            .collect()
    }

    fn connection(&self) -> MutexGuard<'_, Box<dyn Connection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn insert_row<K, I>(
    connection: &mut dyn Connection,
    mapped: &Mapped,
    binder: &InsertBinder<'_>,
    values: I,
) -> Result<i64>
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Value)>,
{
    let id = next_instance_id(connection)?;
    let insert = binder.bind(id, values)?;

    let mut params = vec![];
    let sql = Serializer::sqlite(mapped.schema()).serialize(&Statement::from(insert), &mut params);
    connection.execute(&sql, &params)?;

    tracing::trace!(table = %binder.table().name, id, "inserted instance");
    Ok(id)
}

fn next_instance_id(connection: &mut dyn Connection) -> Result<i64> {
    connection.execute(
        "UPDATE [ec_InstanceIdSequence] SET [Value] = [Value] + 1 WHERE [Id] = 1",
        &[],
    )?;

    connection
        .query("SELECT [Value] FROM [ec_InstanceIdSequence] WHERE [Id] = 1", &[])?
        .first()
        .and_then(|row| row.first())
        .ok_or_else(|| Error::missing_resolution("the instance-id sequence is missing"))?
        .to_i64()
}
