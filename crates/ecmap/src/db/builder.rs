use super::Db;
use crate::Result;

use ecmap_core::{driver::Connection, mapping::Options};
use ecmap_driver_sqlite::Sqlite;

use std::{path::Path, time::Duration};

/// Configures how a database is opened and mapped.
#[derive(Debug, Clone)]
pub struct Builder {
    options: Options,

    create_views: bool,

    /// Overrides the driver's busy timeout.
    busy_timeout: Option<Duration>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder {
            options: Options::default(),
            create_views: true,
            busy_timeout: None,
        }
    }
}

impl Builder {
    /// Structs nested deeper than `depth` are stored in a table of their own.
    pub fn max_inline_struct_depth(mut self, depth: usize) -> Self {
        self.options.max_inline_struct_depth = depth;
        self
    }

    /// Create a physical view per class on import.
    pub fn create_views(mut self, create_views: bool) -> Self {
        self.create_views = create_views;
        self
    }

    /// Index every relationship foreign-key column.
    pub fn index_foreign_keys(mut self, index_foreign_keys: bool) -> Self {
        self.options.index_foreign_keys = index_foreign_keys;
        self
    }

    /// How long statements wait on a database locked by another connection.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Opens (or creates) the database file at `path`.
    pub fn connect(self, path: impl AsRef<Path>) -> Result<Db> {
        let connection = Sqlite::open(path).connect()?;
        if let Some(timeout) = self.busy_timeout {
            connection.set_busy_timeout(timeout)?;
        }
        self.build(connection)
    }

    /// Opens a fresh in-memory database.
    pub fn connect_in_memory(self) -> Result<Db> {
        self.build(Sqlite::in_memory().connect()?)
    }

    /// Opens the catalog over an already established connection.
    pub fn build(self, connection: impl Connection + 'static) -> Result<Db> {
        Db::open(Box::new(connection), self.options, self.create_views)
    }
}
