mod value;
pub(crate) use value::Value;

use ecmap_core::{
    driver::{Connection as _, LiveColumn, ObjectKind},
    schema::db::Schema,
    stmt, Error, Result,
};
use ecmap_sql::{self as sql, Statement};
use rusqlite::{Connection as RusqliteConnection, OptionalExtension};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// How long a statement waits on a locked database before failing, unless
/// overridden with [`Connection::set_busy_timeout`].
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    pub fn connect(&self) -> Result<Connection> {
        match self {
            Sqlite::File(path) => Connection::open(path),
            Sqlite::InMemory => Connection::in_memory(),
        }
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Self::init(connection)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Self::init(connection)
    }

    /// Overrides how long statements wait on a locked database.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.connection
            .busy_timeout(timeout)
            .map_err(Error::driver_operation_failed)
    }

    fn init(connection: RusqliteConnection) -> Result<Self> {
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(Error::driver_operation_failed)?;

        let mut sqlite = Self { connection };
        let pragma = serialize(&Statement::pragma_enable_foreign_keys());
        sqlite.execute_batch(&pragma)?;
        Ok(sqlite)
    }
}

/// Serializes a statement that references no schema tables.
fn serialize(stmt: &Statement) -> String {
    let schema = Schema::new();
    let mut params: Vec<stmt::Value> = vec![];
    sql::Serializer::sqlite(&schema).serialize(stmt, &mut params)
}

impl ecmap_core::Connection for Connection {
    fn execute(&mut self, sql: &str, params: &[stmt::Value]) -> Result<usize> {
        tracing::trace!(%sql, params = params.len(), "execute");

        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(Error::driver_operation_failed)?;

        let params: Vec<Value> = params.iter().cloned().map(Value::from).collect();
        stmt.execute(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        tracing::trace!(%sql, "execute batch");

        self.connection
            .execute_batch(sql)
            .map_err(Error::driver_operation_failed)
    }

    fn query(&mut self, sql: &str, params: &[stmt::Value]) -> Result<Vec<Vec<stmt::Value>>> {
        tracing::trace!(%sql, params = params.len(), "query");

        let mut stmt = self
            .connection
            .prepare_cached(sql)
            .map_err(Error::driver_operation_failed)?;
        let width = stmt.column_count();

        let params: Vec<Value> = params.iter().cloned().map(Value::from).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params.iter()))
            .map_err(Error::driver_operation_failed)?;

        let mut ret = vec![];

        loop {
            match rows.next() {
                Ok(Some(row)) => {
                    let mut items = Vec::with_capacity(width);

                    for index in 0..width {
                        let value =
                            Value::from_sql(row, index).map_err(Error::driver_operation_failed)?;
                        items.push(value.into_inner());
                    }

                    ret.push(items);
                }
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::driver_operation_failed(err));
                }
            }
        }

        Ok(ret)
    }

    fn table_info(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        let sql = serialize(&Statement::pragma_table_info(table));

        let mut stmt = self
            .connection
            .prepare(&sql)
            .map_err(Error::driver_operation_failed)?;

        // cid, name, type, notnull, dflt_value, pk
        let rows = stmt
            .query_map([], |row| {
                Ok(LiveColumn {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                    not_null: row.get::<_, i64>(3)? != 0,
                    default: row.get(4)?,
                    primary_key: row.get(5)?,
                })
            })
            .map_err(Error::driver_operation_failed)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::driver_operation_failed)
    }

    fn object_kind(&mut self, name: &str) -> Result<Option<ObjectKind>> {
        let kind: Option<String> = self
            .connection
            .query_row(
                "SELECT type FROM sqlite_master WHERE name = ?1 COLLATE NOCASE",
                [name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Error::driver_operation_failed)?;

        Ok(kind.as_deref().and_then(ObjectKind::from_catalog))
    }

    fn begin(&mut self) -> Result<()> {
        if !self.connection.is_autocommit() {
            return Err(Error::unsupported("nested transactions"));
        }
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }
}
