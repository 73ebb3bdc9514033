use super::{Catalog, StoredView};

use ecmap_core::{
    driver::Connection,
    mapping::PreviousBindings,
    schema::{
        db::{
            Collation, Column, ColumnId, ColumnKind, ColumnPersistence, ColumnType, ForeignKey,
            ForeignKeyAction, PrimaryKey, Schema, TableId, TableKind,
        },
        ec::{ClassId, Ids, PropertyId, SchemaDef},
    },
    stmt::Value,
    Error, Result,
};

use std::collections::HashMap;

/// Catalog ids of tables and columns, translated to schema ids.
#[derive(Debug, Default)]
struct Translation {
    tables: HashMap<i64, TableId>,
    columns: HashMap<i64, ColumnId>,
}

/// Reads the whole catalog.
pub(crate) fn load(connection: &mut dyn Connection) -> Result<Catalog> {
    let defs = definitions(connection)?;
    let ids = ids(connection)?;

    let mut schema = Schema::new();
    let translation = tables(connection, &mut schema)?;
    foreign_keys(connection, &mut schema, &translation)?;
    indexes(connection, &mut schema, &translation)?;

    let previous = bindings(connection, &translation)?;
    let views = views(connection)?;

    tracing::debug!(
        schemas = defs.len(),
        tables = schema.tables().len() - 1,
        views = views.len(),
        "catalog loaded"
    );

    Ok(Catalog {
        defs,
        ids,
        schema,
        previous,
        views,
    })
}

fn definitions(connection: &mut dyn Connection) -> Result<Vec<SchemaDef>> {
    let rows = connection.query(
        "SELECT [Name], [Definition] FROM [ec_Schema] ORDER BY rowid",
        &[],
    )?;

    rows.iter()
        .map(|row| {
            let name = row[0].to_string_value()?;
            serde_json::from_str(&row[1].to_string_value()?).map_err(|err| {
                Error::invalid_schema(format!("stored definition of schema `{name}`: {err}"))
            })
        })
        .collect()
}

fn ids(connection: &mut dyn Connection) -> Result<Ids> {
    let mut ids = Ids::new();

    for row in connection.query("SELECT [Id], [SchemaName], [Name] FROM [ec_Class]", &[])? {
        ids.insert_class(
            &row[1].to_string_value()?,
            &row[2].to_string_value()?,
            ClassId(row[0].to_i64()? as u64),
        );
    }

    for row in connection.query("SELECT [Id], [ClassId], [Name] FROM [ec_Property]", &[])? {
        ids.insert_property(
            ClassId(row[1].to_i64()? as u64),
            &row[2].to_string_value()?,
            PropertyId(row[0].to_i64()? as u64),
        );
    }

    Ok(ids)
}

fn tables(connection: &mut dyn Connection, schema: &mut Schema) -> Result<Translation> {
    let tables = connection.query(
        "SELECT [Id], [Name], [OwnerType], [PersistenceType] FROM [ec_Table] ORDER BY [Id]",
        &[],
    )?;
    let columns = connection.query(
        "SELECT [Id], [TableId], [Name], [Type], [PersistenceType], [NotNull], [IsUnique], \
         [Collation], [CheckExpr], [DefaultExpr], [PrimaryKeyOrdinal], [ColumnKind], [IsShared] \
         FROM [ec_Column] ORDER BY [TableId], [Ordinal]",
        &[],
    )?;

    let mut by_table: HashMap<i64, Vec<&Vec<Value>>> = HashMap::new();
    for row in &columns {
        by_table.entry(row[1].to_i64()?).or_default().push(row);
    }

    let mut translation = Translation::default();

    for row in &tables {
        let catalog_id = row[0].to_i64()?;
        let name = row[1].to_string_value()?;
        let kind = TableKind::from_codes(row[2].to_i64()?, row[3].to_i64()?);

        let rows = by_table.remove(&catalog_id).unwrap_or_default();
        let mut defs = Vec::with_capacity(rows.len());
        let mut key = vec![];

        for (position, row) in rows.iter().enumerate() {
            let column_name = row[2].to_string_value()?;
            let ty = ColumnType::from_code(row[3].to_i64()?).ok_or_else(|| {
                Error::invalid_schema(format!(
                    "column `{name}`.`{column_name}` has unknown type code {:?}",
                    row[3]
                ))
            })?;

            if let Some(ordinal) = row[10].to_opt_i64()? {
                key.push((ordinal, position));
            }

            defs.push(Column {
                // Renumbered by `load_table`.
                id: ColumnId {
                    table: TableId(0),
                    index: position,
                },
                name: column_name,
                ty,
                kind: ColumnKind::from_bits_truncate(row[11].to_i64()? as u32),
                persistence: match row[4].to_i64()? {
                    1 => ColumnPersistence::Virtual,
                    _ => ColumnPersistence::Persisted,
                },
                nullable: !row[5].to_bool()?,
                unique: row[6].to_bool()?,
                collation: Collation::from_code(row[7].to_i64()?),
                check: row[8].to_opt_string()?,
                default: row[9].to_opt_string()?,
                shared: row[12].to_bool()?,
            });
        }

        key.sort();
        let primary_key = (!key.is_empty()).then(|| PrimaryKey {
            columns: key
                .iter()
                .map(|(_, position)| ColumnId {
                    table: TableId(0),
                    index: *position,
                })
                .collect(),
        });

        let id = schema.load_table(&name, kind, defs, primary_key)?;
        translation.tables.insert(catalog_id, id);

        for (position, row) in rows.iter().enumerate() {
            translation.columns.insert(
                row[0].to_i64()?,
                ColumnId {
                    table: id,
                    index: position,
                },
            );
        }
    }

    if let Some(orphan) = by_table.keys().next() {
        return Err(Error::missing_resolution(format!(
            "catalog columns reference unknown table {orphan}"
        )));
    }

    Ok(translation)
}

fn foreign_keys(
    connection: &mut dyn Connection,
    schema: &mut Schema,
    translation: &Translation,
) -> Result<()> {
    let keys = connection.query(
        "SELECT [Id], [TableId], [ReferencedTableId], [OnDelete], [OnUpdate] \
         FROM [ec_ForeignKey] ORDER BY [Id]",
        &[],
    )?;
    let pairs = connection.query(
        "SELECT [ForeignKeyId], [ColumnId], [ReferencedColumnId] \
         FROM [ec_ForeignKeyColumn] ORDER BY [ForeignKeyId], [Ordinal]",
        &[],
    )?;

    for row in &keys {
        let id = row[0].to_i64()?;

        let mut foreign_key = ForeignKey {
            columns: vec![],
            referenced_table: translation.table(row[2].to_i64()?)?,
            referenced_columns: vec![],
            on_delete: action(&row[3])?,
            on_update: action(&row[4])?,
        };

        for pair in pairs.iter().filter(|pair| pair[0].as_i64() == Some(id)) {
            foreign_key.add_column(
                translation.column(pair[1].to_i64()?)?,
                translation.column(pair[2].to_i64()?)?,
            );
        }

        schema.restore_foreign_key(translation.table(row[1].to_i64()?)?, foreign_key);
    }

    Ok(())
}

fn indexes(
    connection: &mut dyn Connection,
    schema: &mut Schema,
    translation: &Translation,
) -> Result<()> {
    let indexes = connection.query(
        "SELECT [Id], [TableId], [Name], [IsUnique], [WhereClause] FROM [ec_Index] ORDER BY [Id]",
        &[],
    )?;
    let columns = connection.query(
        "SELECT [IndexId], [ColumnId] FROM [ec_IndexColumn] ORDER BY [IndexId], [Ordinal]",
        &[],
    )?;

    for row in &indexes {
        let id = row[0].to_i64()?;

        let index_columns = columns
            .iter()
            .filter(|column| column[0].as_i64() == Some(id))
            .map(|column| translation.column(column[1].to_i64()?))
            .collect::<Result<Vec<_>>>()?;

        schema.restore_index(
            translation.table(row[1].to_i64()?)?,
            row[2].to_string_value()?,
            index_columns,
            row[3].to_bool()?,
            row[4].to_opt_string()?,
        )?;
    }

    Ok(())
}

fn bindings(connection: &mut dyn Connection, translation: &Translation) -> Result<PreviousBindings> {
    let rows = connection.query(
        "SELECT [ec_ClassMap].[ClassId], [ec_PropertyPath].[AccessString], [ec_PropertyMap].[ColumnId] \
         FROM [ec_PropertyMap] \
         JOIN [ec_ClassMap] ON [ec_ClassMap].[Id] = [ec_PropertyMap].[ClassMapId] \
         JOIN [ec_PropertyPath] ON [ec_PropertyPath].[Id] = [ec_PropertyMap].[PropertyPathId]",
        &[],
    )?;

    let mut previous = PreviousBindings::new();
    for row in &rows {
        previous.insert(
            ClassId(row[0].to_i64()? as u64),
            &row[1].to_string_value()?,
            translation.column(row[2].to_i64()?)?,
        );
    }

    Ok(previous)
}

fn views(connection: &mut dyn Connection) -> Result<HashMap<ClassId, StoredView>> {
    connection
        .query("SELECT [ClassId], [Name], [Sql] FROM [ec_View]", &[])?
        .iter()
        .map(|row| {
            Ok((
                ClassId(row[0].to_i64()? as u64),
                StoredView {
                    name: row[1].to_string_value()?,
                    sql: row[2].to_string_value()?,
                },
            ))
        })
        .collect()
}

fn action(value: &Value) -> Result<Option<ForeignKeyAction>> {
    Ok(value.to_opt_i64()?.and_then(ForeignKeyAction::from_code))
}

impl Translation {
    fn table(&self, id: i64) -> Result<TableId> {
        self.tables
            .get(&id)
            .copied()
            .ok_or_else(|| Error::missing_resolution(format!("catalog table {id} does not exist")))
    }

    fn column(&self, id: i64) -> Result<ColumnId> {
        self.columns
            .get(&id)
            .copied()
            .ok_or_else(|| Error::missing_resolution(format!("catalog column {id} does not exist")))
    }
}
