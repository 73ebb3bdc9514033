//! System tables recording what earlier imports mapped.
//!
//! The catalog is rewritten as a whole at the end of every import and read
//! back when a database is opened. Column and table ids stored here are
//! catalog ids; they are translated to the ids of the freshly loaded
//! [`Schema`] on load.

mod load;
pub(crate) use load::load;

mod save;
pub(crate) use save::{save, save_view};

use ecmap_core::{
    driver::Connection,
    mapping::PreviousBindings,
    schema::{
        db::Schema,
        ec::{ClassId, Ids, SchemaDef},
    },
    Result,
};

use std::collections::HashMap;

const SYSTEM_TABLES: &str = "\
CREATE TABLE IF NOT EXISTS [ec_Schema] (\
[Name] TEXT PRIMARY KEY NOT NULL COLLATE NOCASE, \
[Definition] TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_Class] (\
[Id] INTEGER PRIMARY KEY, \
[SchemaName] TEXT NOT NULL, \
[Name] TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_Property] (\
[Id] INTEGER PRIMARY KEY, \
[ClassId] INTEGER NOT NULL, \
[Name] TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_Table] (\
[Id] INTEGER PRIMARY KEY, \
[Name] TEXT NOT NULL COLLATE NOCASE, \
[OwnerType] INTEGER NOT NULL, \
[PersistenceType] INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_Column] (\
[Id] INTEGER PRIMARY KEY, \
[TableId] INTEGER NOT NULL, \
[Name] TEXT NOT NULL COLLATE NOCASE, \
[Type] INTEGER NOT NULL, \
[PersistenceType] INTEGER NOT NULL, \
[Ordinal] INTEGER NOT NULL, \
[NotNull] BOOLEAN NOT NULL, \
[IsUnique] BOOLEAN NOT NULL, \
[Collation] INTEGER NOT NULL, \
[CheckExpr] TEXT, \
[DefaultExpr] TEXT, \
[PrimaryKeyOrdinal] INTEGER, \
[ColumnKind] INTEGER NOT NULL, \
[IsShared] BOOLEAN NOT NULL DEFAULT 0);
CREATE TABLE IF NOT EXISTS [ec_ForeignKey] (\
[Id] INTEGER PRIMARY KEY, \
[TableId] INTEGER NOT NULL, \
[ReferencedTableId] INTEGER NOT NULL, \
[OnDelete] INTEGER, \
[OnUpdate] INTEGER);
CREATE TABLE IF NOT EXISTS [ec_ForeignKeyColumn] (\
[ForeignKeyId] INTEGER NOT NULL, \
[ColumnId] INTEGER NOT NULL, \
[ReferencedColumnId] INTEGER NOT NULL, \
[Ordinal] INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_Index] (\
[Id] INTEGER PRIMARY KEY, \
[TableId] INTEGER NOT NULL, \
[Name] TEXT NOT NULL COLLATE NOCASE, \
[IsUnique] BOOLEAN NOT NULL, \
[WhereClause] TEXT);
CREATE TABLE IF NOT EXISTS [ec_IndexColumn] (\
[IndexId] INTEGER NOT NULL, \
[ColumnId] INTEGER NOT NULL, \
[Ordinal] INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_ClassMap] (\
[Id] INTEGER PRIMARY KEY, \
[ClassId] INTEGER NOT NULL UNIQUE, \
[BaseClassMapId] INTEGER, \
[MapStrategy] INTEGER NOT NULL, \
[MapStrategyOptions] INTEGER NOT NULL, \
[AppliesToSubclasses] BOOLEAN NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_PropertyPath] (\
[Id] INTEGER PRIMARY KEY, \
[RootPropertyId] INTEGER NOT NULL, \
[AccessString] TEXT NOT NULL COLLATE NOCASE, \
UNIQUE ([RootPropertyId], [AccessString]));
CREATE TABLE IF NOT EXISTS [ec_PropertyMap] (\
[ClassMapId] INTEGER NOT NULL, \
[PropertyPathId] INTEGER NOT NULL, \
[ColumnId] INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_View] (\
[ClassId] INTEGER PRIMARY KEY, \
[Name] TEXT NOT NULL, \
[Sql] TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS [ec_InstanceIdSequence] (\
[Id] INTEGER PRIMARY KEY, \
[Value] INTEGER NOT NULL);
INSERT OR IGNORE INTO [ec_InstanceIdSequence] ([Id], [Value]) VALUES (1, 0);";

/// Everything the catalog knows, in the shape the mapping session consumes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Catalog {
    /// Imported schema definitions, in import order.
    pub(crate) defs: Vec<SchemaDef>,

    pub(crate) ids: Ids,

    /// The table model of the last import, tables flagged persisted.
    pub(crate) schema: Schema,

    pub(crate) previous: PreviousBindings,

    pub(crate) views: HashMap<ClassId, StoredView>,
}

/// A view created by an earlier import.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredView {
    pub(crate) name: String,
    pub(crate) sql: String,
}

/// Creates the system tables if they are missing.
pub(crate) fn create_system_tables(connection: &mut dyn Connection) -> Result<()> {
    connection.execute_batch(SYSTEM_TABLES)
}

impl Catalog {
    /// Replaces the definition of a schema with the same name, or appends a
    /// new one.
    pub(crate) fn merge(&self, defs: impl IntoIterator<Item = SchemaDef>) -> Vec<SchemaDef> {
        let mut merged = self.defs.clone();

        for def in defs {
            match merged
                .iter_mut()
                .find(|existing| existing.name.eq_ignore_ascii_case(&def.name))
            {
                Some(existing) => *existing = def,
                None => merged.push(def),
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn merging_replaces_by_name() {
        let catalog = Catalog {
            defs: vec![SchemaDef::new("Zoo"), SchemaDef::new("Shop")],
            ..Default::default()
        };

        let merged = catalog.merge([SchemaDef::new("zoo").alias("z"), SchemaDef::new("Farm")]);
        let names: Vec<_> = merged.iter().map(|def| def.name.as_str()).collect();

        assert_eq!(names, ["zoo", "Shop", "Farm"]);
        assert_eq!(merged[0].alias.as_deref(), Some("z"));
    }
}
