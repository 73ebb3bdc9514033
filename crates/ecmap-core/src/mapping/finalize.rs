use super::{
    ClassMapKind, MapStrategy, PropertyMap, PropertyMapKind, SchemaMappingSession, CLASS_ID,
};
use crate::{
    schema::db::{
        ColumnId, ColumnKind, ColumnPersistence, ColumnType, TableId, TriggerEvent, TriggerTiming,
    },
    Error, Result,
};

/// Completes the tables once every class is mapped: class-id columns,
/// automatic and declared indexes, struct-array cleanup triggers. Closes
/// every table's edit scope.
pub(super) fn finalize(session: &mut SchemaMappingSession) -> Result<()> {
    let tables: Vec<TableId> = session.schema.tables().skip(1).map(|table| table.id).collect();

    for table in &tables {
        add_class_id_column(session, *table)?;
    }

    create_automatic_indexes(session)?;
    create_declared_indexes(session)?;

    for table in &tables {
        create_struct_array_trigger(session, *table)?;
    }

    for table in tables {
        session.schema.close_edit(table);
    }

    Ok(())
}

/// A table shared by several classes, or by a hierarchy, discriminates rows by
/// class id.
fn add_class_id_column(session: &mut SchemaMappingSession, table_id: TableId) -> Result<()> {
    let owners = session.table_owners(table_id);
    if owners.is_empty() {
        return Ok(());
    }

    let table = session.schema.table(table_id);
    let column = match table.class_id_column() {
        Some(column) => column.id,
        None => {
            let hierarchy = owners.iter().any(|owner| {
                session.class_maps[owner].strategy.strategy == MapStrategy::TablePerHierarchy
            });
            if owners.len() < 2 && !hierarchy {
                return Ok(());
            }

            if table.is_existing() {
                return Err(Error::map_failure(format!(
                    "existing table `{}` stores several classes but has no class-id column",
                    table.name
                )));
            }

            // Rows written before the column existed belong to the table's
            // previous sole owner.
            let default = if table.persisted {
                let previous = session.previous.classes_in_table(table_id);
                match previous.len() {
                    1 => previous.first().map(|class| class.to_string()),
                    _ => None,
                }
            } else {
                None
            };
            let persisted = table.persisted;
            let name = table.name.clone();

            let mut edit = session.schema.edit(table_id)?;
            let column = if persisted {
                edit.create_column(
                    Some(CLASS_ID),
                    ColumnType::Long,
                    ColumnKind::CLASS_ID,
                    ColumnPersistence::Persisted,
                )?
            } else {
                edit.create_column_at(
                    1,
                    Some(CLASS_ID),
                    ColumnType::Long,
                    ColumnKind::CLASS_ID,
                    ColumnPersistence::Persisted,
                )?
            };

            let def = edit.column_mut(column);
            def.nullable = persisted && default.is_none();
            def.default = default;

            tracing::debug!(table = %name, owners = owners.len(), "added class-id column");
            column
        }
    };

    for owner in owners {
        let Some(id) = session.class_maps[&owner].property_maps.get(CLASS_ID) else {
            continue;
        };
        if let PropertyMapKind::ClassId { column: bound, .. } = &mut session.property_maps[id.0].kind {
            *bound = Some(column);
        }
    }

    Ok(())
}

fn create_automatic_indexes(session: &mut SchemaMappingSession) -> Result<()> {
    let mut wanted: Vec<(TableId, String, ColumnId)> = vec![];

    for table in session.schema.tables().skip(1).filter(|table| table.is_owned()) {
        if let Some(column) = table.class_id_column() {
            wanted.push((table.id, format!("ix_{}_ecclassid", table.name), column.id));
        }
    }

    if session.options.index_foreign_keys {
        for class_map in session.class_maps.values() {
            let columns = match &class_map.kind {
                ClassMapKind::RelationshipEndTable(info) if class_map.base.is_none() => {
                    vec![info.foreign_key_column]
                }
                ClassMapKind::RelationshipLinkTable(info) if class_map.base.is_none() => {
                    vec![info.source_column, info.target_column]
                }
                _ => continue,
            };

            let table = session.schema.table(class_map.table);
            if !table.is_owned() {
                continue;
            }
            for column in columns {
                let name = format!("ix_{}_fk_{}", table.name, table.column(column).name);
                wanted.push((table.id, name, column));
            }
        }
    }

    for (table, name, column) in wanted {
        create_index(session, table, name, vec![column], false, None)?;
    }

    Ok(())
}

fn create_declared_indexes(session: &mut SchemaMappingSession) -> Result<()> {
    let mut wanted = vec![];

    for class_map in session.class_maps.values().filter(|map| map.stores_rows()) {
        let class = session.graph.class(class_map.class);
        let table = session.schema.table(class_map.table);

        for hint in &class.map.indexes {
            if !table.is_owned() {
                tracing::warn!(
                    class = %class.full_name(),
                    index = %hint.name,
                    "index declared on a table the engine does not own; skipped"
                );
                continue;
            }

            let mut columns = vec![];
            for access in &hint.properties {
                let Some(map) = session.find_property_map(class.id, access) else {
                    return Err(Error::missing_resolution(format!(
                        "index `{}` of class {} names unknown property `{access}`",
                        hint.name,
                        class.full_name()
                    )));
                };
                for leaf in session.leaves_of(map.id) {
                    if let Some(column) = leaf.column().filter(|column| column.table == table.id) {
                        columns.push(column);
                    }
                }
            }

            if columns.is_empty() {
                return Err(Error::map_failure(format!(
                    "index `{}` of class {} covers no column of `{}`",
                    hint.name,
                    class.full_name(),
                    table.name
                )));
            }

            wanted.push((
                table.id,
                hint.name.clone(),
                columns,
                hint.unique,
                hint.where_clause.clone(),
            ));
        }
    }

    for (table, name, columns, unique, where_clause) in wanted {
        create_index(session, table, name, columns, unique, where_clause)?;
    }

    Ok(())
}

/// Index names are unique across the database. Re-declaring an identical
/// index is a no-op.
fn create_index(
    session: &mut SchemaMappingSession,
    table: TableId,
    name: String,
    columns: Vec<ColumnId>,
    unique: bool,
    where_clause: Option<String>,
) -> Result<()> {
    if let Some((owner, index)) = session.schema.find_index(&name) {
        if owner.id == table
            && index.columns == columns
            && index.unique == unique
            && index.where_clause == where_clause
        {
            return Ok(());
        }
        return Err(Error::name_conflict("database", name));
    }

    session
        .schema
        .edit(table)?
        .create_index(name, columns, unique, where_clause)?;
    Ok(())
}

/// Deleting a row of `table_id` deletes the struct-array rows it owns.
fn create_struct_array_trigger(session: &mut SchemaMappingSession, table_id: TableId) -> Result<()> {
    let table = session.schema.table(table_id);
    if !table.is_owned() {
        return Ok(());
    }

    let owners = session.table_owners(table_id);
    let mut struct_tables: Vec<TableId> = vec![];
    for owner in &owners {
        for id in session.class_maps[owner].property_maps.ids() {
            collect_struct_tables(session, session.property_map(id), &mut struct_tables);
        }
    }
    if struct_tables.is_empty() {
        return Ok(());
    }
    struct_tables.sort();

    let Some(instance_id) = table.instance_id_column() else {
        return Ok(());
    };

    let mut body = vec![];
    for struct_table in &struct_tables {
        let struct_table = session.schema.table(*struct_table);
        let Some(parent) = struct_table.column_with_kind(ColumnKind::PARENT_ID) else {
            continue;
        };
        body.push(format!(
            "DELETE FROM [{0}] WHERE [{0}].[{1}] = OLD.[{2}];",
            struct_table.name, parent.name, instance_id.name
        ));
    }

    let name = format!("{}_DeleteStructArrays", table.name);
    let body = body.join(" ");

    if let Some(existing) = table.triggers.iter().find(|trigger| trigger.name == name) {
        if existing.body == body {
            return Ok(());
        }
        return Err(Error::name_conflict(&table.name, name));
    }

    session.schema.edit(table_id)?.create_trigger(
        name,
        TriggerTiming::After,
        TriggerEvent::Delete,
        None,
        body,
    )
}

fn collect_struct_tables(session: &SchemaMappingSession, map: &PropertyMap, out: &mut Vec<TableId>) {
    if let PropertyMapKind::StructTable { table, .. } = map.kind {
        if !out.contains(&table) {
            out.push(table);
        }
    }
    for child in &map.children {
        collect_struct_tables(session, session.property_map(*child), out);
    }
}
