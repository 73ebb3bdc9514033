use super::StoredView;

use ecmap_core::{
    driver::Connection,
    schema::{
        db::{ColumnId, ColumnPersistence, Schema},
        ec::{ClassId, SchemaDef},
    },
    stmt::{Insert, Value},
    Error, Result, SchemaMappingSession,
};
use ecmap_sql::{Serializer, Statement};

use std::collections::HashMap;

/// Rows written by [`save`], cleared before every rewrite. Views and the
/// instance-id sequence outlive imports.
const REWRITTEN: &[&str] = &[
    "ec_Schema",
    "ec_Class",
    "ec_Property",
    "ec_Table",
    "ec_Column",
    "ec_ForeignKey",
    "ec_ForeignKeyColumn",
    "ec_Index",
    "ec_IndexColumn",
    "ec_ClassMap",
    "ec_PropertyPath",
    "ec_PropertyMap",
];

/// Inserts catalog rows through the statement serializer.
struct Writer<'a> {
    connection: &'a mut dyn Connection,

    /// Inserts name their table directly; the serializer never consults it.
    schema: Schema,
}

/// Rewrites the catalog from a finalized mapping session.
pub(crate) fn save(
    connection: &mut dyn Connection,
    defs: &[SchemaDef],
    session: &SchemaMappingSession,
) -> Result<()> {
    let mut writer = Writer {
        connection,
        schema: Schema::new(),
    };

    let paths = writer.property_paths()?;

    for table in REWRITTEN {
        writer
            .connection
            .execute_batch(&format!("DELETE FROM [{table}];"))?;
    }

    writer.definitions(defs)?;
    writer.classes(session)?;
    let columns = writer.tables(session.schema())?;
    writer.class_maps(session, &columns, paths)?;

    tracing::debug!(
        schemas = defs.len(),
        tables = session.schema().tables().len() - 1,
        columns = columns.len(),
        "catalog saved"
    );
    Ok(())
}

/// Records the view created for a class, replacing an earlier one.
pub(crate) fn save_view(
    connection: &mut dyn Connection,
    class: ClassId,
    view: &StoredView,
) -> Result<()> {
    connection.execute(
        "INSERT OR REPLACE INTO [ec_View] ([ClassId], [Name], [Sql]) VALUES (?1, ?2, ?3)",
        &[
            Value::I64(class.0 as i64),
            Value::from(view.name.as_str()),
            Value::from(view.sql.as_str()),
        ],
    )?;
    Ok(())
}

impl Writer<'_> {
    fn insert<'c>(
        &mut self,
        table: &str,
        row: impl IntoIterator<Item = (&'c str, Value)>,
    ) -> Result<()> {
        let mut insert = Insert::new(table);
        for (column, value) in row {
            insert.set(column, value);
        }

        let mut params = vec![];
        let sql = Serializer::sqlite(&self.schema).serialize(&Statement::from(insert), &mut params);
        self.connection.execute(&sql, &params)?;
        Ok(())
    }

    fn definitions(&mut self, defs: &[SchemaDef]) -> Result<()> {
        for def in defs {
            let definition = serde_json::to_string(def)?;
            self.insert(
                "ec_Schema",
                [
                    ("Name", Value::from(def.name.as_str())),
                    ("Definition", Value::from(definition)),
                ],
            )?;
        }
        Ok(())
    }

    fn classes(&mut self, session: &SchemaMappingSession) -> Result<()> {
        for class in session.graph().classes() {
            self.insert(
                "ec_Class",
                [
                    ("Id", Value::I64(class.id.0 as i64)),
                    ("SchemaName", Value::from(class.schema.as_str())),
                    ("Name", Value::from(class.name.as_str())),
                ],
            )?;

            for property in &class.properties {
                self.insert(
                    "ec_Property",
                    [
                        ("Id", Value::I64(property.id.0 as i64)),
                        ("ClassId", Value::I64(class.id.0 as i64)),
                        ("Name", Value::from(property.name.as_str())),
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// Writes tables, columns, foreign keys and indexes. Returns the catalog
    /// id assigned to every column.
    fn tables(&mut self, schema: &Schema) -> Result<HashMap<ColumnId, i64>> {
        let mut columns = HashMap::new();

        // The null table is rebuilt by every `Schema`.
        for table in schema.tables().skip(1) {
            self.insert(
                "ec_Table",
                [
                    ("Id", Value::I64(table.id.0 as i64)),
                    ("Name", Value::from(table.name.as_str())),
                    ("OwnerType", Value::I64(table.kind.owner_code())),
                    ("PersistenceType", Value::I64(table.kind.persistence_code())),
                ],
            )?;

            for (ordinal, column) in table.columns().enumerate() {
                let id = columns.len() as i64 + 1;
                columns.insert(column.id, id);

                let primary_key = table
                    .primary_key
                    .as_ref()
                    .and_then(|pk| pk.ordinal(column.id))
                    .map(|ordinal| Value::I64(ordinal as i64))
                    .unwrap_or(Value::Null);

                self.insert(
                    "ec_Column",
                    [
                        ("Id", Value::I64(id)),
                        ("TableId", Value::I64(table.id.0 as i64)),
                        ("Name", Value::from(column.name.as_str())),
                        ("Type", Value::I64(column.ty.code())),
                        ("PersistenceType", Value::I64(persistence_code(column.persistence))),
                        ("Ordinal", Value::I64(ordinal as i64)),
                        ("NotNull", Value::Bool(!column.nullable)),
                        ("IsUnique", Value::Bool(column.unique)),
                        ("Collation", Value::I64(column.collation.code())),
                        ("CheckExpr", text(column.check.as_deref())),
                        ("DefaultExpr", text(column.default.as_deref())),
                        ("PrimaryKeyOrdinal", primary_key),
                        ("ColumnKind", Value::I64(column.kind.bits() as i64)),
                        ("IsShared", Value::Bool(column.shared)),
                    ],
                )?;
            }
        }

        let column_id = |id: &ColumnId| {
            columns.get(id).copied().ok_or_else(|| {
                Error::missing_resolution(format!("column {id:?} is not part of its table"))
            })
        };

        let mut rows = vec![];
        let mut foreign_keys = 0;
        let mut indexes = 0;

        for table in schema.tables().skip(1) {
            for foreign_key in &table.foreign_keys {
                foreign_keys += 1;
                rows.push((
                    "ec_ForeignKey",
                    vec![
                        ("Id", Value::I64(foreign_keys)),
                        ("TableId", Value::I64(table.id.0 as i64)),
                        ("ReferencedTableId", Value::I64(foreign_key.referenced_table.0 as i64)),
                        ("OnDelete", action(foreign_key.on_delete.map(|a| a.code()))),
                        ("OnUpdate", action(foreign_key.on_update.map(|a| a.code()))),
                    ],
                ));

                let pairs = foreign_key
                    .columns
                    .iter()
                    .zip(&foreign_key.referenced_columns);
                for (ordinal, (column, referenced)) in pairs.enumerate() {
                    rows.push((
                        "ec_ForeignKeyColumn",
                        vec![
                            ("ForeignKeyId", Value::I64(foreign_keys)),
                            ("ColumnId", Value::I64(column_id(column)?)),
                            ("ReferencedColumnId", Value::I64(column_id(referenced)?)),
                            ("Ordinal", Value::I64(ordinal as i64)),
                        ],
                    ));
                }
            }

            for index in &table.indexes {
                indexes += 1;
                rows.push((
                    "ec_Index",
                    vec![
                        ("Id", Value::I64(indexes)),
                        ("TableId", Value::I64(table.id.0 as i64)),
                        ("Name", Value::from(index.name.as_str())),
                        ("IsUnique", Value::Bool(index.unique)),
                        ("WhereClause", text(index.where_clause.as_deref())),
                    ],
                ));

                for (ordinal, column) in index.columns.iter().enumerate() {
                    rows.push((
                        "ec_IndexColumn",
                        vec![
                            ("IndexId", Value::I64(indexes)),
                            ("ColumnId", Value::I64(column_id(column)?)),
                            ("Ordinal", Value::I64(ordinal as i64)),
                        ],
                    ));
                }
            }
        }

        for (table, row) in rows {
            self.insert(table, row)?;
        }

        Ok(columns)
    }

    /// Property paths written by the previous import, keyed by root property
    /// and lowercased access string. Struct-array rows store these ids.
    fn property_paths(&mut self) -> Result<HashMap<(i64, String), i64>> {
        let rows = self.connection.query(
            "SELECT [Id], [RootPropertyId], [AccessString] FROM [ec_PropertyPath]",
            &[],
        )?;

        rows.iter()
            .map(|row| {
                let key = (row[1].to_i64()?, row[2].to_string_value()?.to_ascii_lowercase());
                Ok((key, row[0].to_i64()?))
            })
            .collect()
    }

    /// Writes class maps and their property maps. Paths keep the id in
    /// `previous`; new paths are numbered after the highest id ever stored.
    fn class_maps(
        &mut self,
        session: &SchemaMappingSession,
        columns: &HashMap<ColumnId, i64>,
        previous: HashMap<(i64, String), i64>,
    ) -> Result<()> {
        let ids: HashMap<ClassId, i64> = session
            .class_maps()
            .enumerate()
            .map(|(i, class_map)| (class_map.class, i as i64 + 1))
            .collect();

        let mut next_path = previous.values().copied().max().unwrap_or(0) + 1;
        let mut paths: HashMap<(i64, String), i64> = HashMap::new();

        for class_map in session.class_maps() {
            let id = ids[&class_map.class];
            let base = class_map
                .base
                .and_then(|base| ids.get(&base))
                .map(|id| Value::I64(*id))
                .unwrap_or(Value::Null);

            self.insert(
                "ec_ClassMap",
                [
                    ("Id", Value::I64(id)),
                    ("ClassId", Value::I64(class_map.class.0 as i64)),
                    ("BaseClassMapId", base),
                    ("MapStrategy", Value::I64(class_map.strategy.strategy.code())),
                    ("MapStrategyOptions", Value::I64(class_map.strategy.options_code())),
                    (
                        "AppliesToSubclasses",
                        Value::Bool(class_map.strategy.applies_to_subclasses),
                    ),
                ],
            )?;

            for leaf in session.leaves(class_map) {
                let Some(column) = leaf.column() else {
                    continue;
                };
                let column = columns.get(&column).copied().ok_or_else(|| {
                    Error::missing_resolution(format!(
                        "`{}` of class {} is bound to an unknown column",
                        leaf.access_string,
                        session.graph().class(class_map.class).full_name()
                    ))
                })?;

                // System maps have no root property.
                let root = leaf.property.map(|id| id.0 as i64).unwrap_or(0);
                let key = (root, leaf.access_string.to_ascii_lowercase());

                let path = match paths.get(&key) {
                    Some(path) => *path,
                    None => {
                        let path = previous.get(&key).copied().unwrap_or_else(|| {
                            let path = next_path;
                            next_path += 1;
                            path
                        });
                        self.insert(
                            "ec_PropertyPath",
                            [
                                ("Id", Value::I64(path)),
                                ("RootPropertyId", Value::I64(root)),
                                ("AccessString", Value::from(leaf.access_string.as_str())),
                            ],
                        )?;
                        paths.insert(key, path);
                        path
                    }
                };

                self.insert(
                    "ec_PropertyMap",
                    [
                        ("ClassMapId", Value::I64(id)),
                        ("PropertyPathId", Value::I64(path)),
                        ("ColumnId", Value::I64(column)),
                    ],
                )?;
            }
        }

        Ok(())
    }
}

fn persistence_code(persistence: ColumnPersistence) -> i64 {
    match persistence {
        ColumnPersistence::Persisted => 0,
        ColumnPersistence::Virtual => 1,
    }
}

fn text(value: Option<&str>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn action(code: Option<i64>) -> Value {
    code.map(Value::I64).unwrap_or(Value::Null)
}
