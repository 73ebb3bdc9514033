use super::{
    builder::{has_rel_class_id, Builder},
    ClassIdSource, ClassMap, ClassMapKind, EndTableInfo, LinkTableInfo, MapStrategyInfo,
    PropertyMapKind, SchemaMappingSession, CLASS_ID, INSTANCE_ID,
};
use crate::{
    schema::{
        db::{ColumnId, ColumnKind, ColumnPersistence, ColumnType, ForeignKeyAction, TableId},
        ec::{Class, ClassGraph, ClassId, End, Strength},
    },
    Error, Result,
};

/// Concrete classes eligible at one end, mapped, and their distinct tables.
struct EndClasses {
    end: End,
    classes: Vec<ClassId>,
    tables: Vec<TableId>,
}

/// Maps a relationship stored as a foreign key in one end's table.
pub(super) fn map_end_table(
    session: &mut SchemaMappingSession,
    graph: &ClassGraph,
    class: &Class,
    info: MapStrategyInfo,
    base: Option<&ClassMap>,
) -> Result<ClassMap> {
    let Some(fk_end) = info.strategy.foreign_key_end() else {
        return Err(err!(
            "relationship {} is not stored in an end table",
            class.full_name()
        ));
    };

    let fk = end_classes(session, graph, class, fk_end)?;
    let referenced = end_classes(session, graph, class, fk_end.other())?;

    let fk_table = single_table(session, class, &fk)?;
    let referenced_table = single_table(session, class, &referenced)?;

    let (fk_column, rel_class_id_column) = match base.and_then(ClassMap::end_table) {
        Some(base) => (base.foreign_key_column, base.rel_class_id_column),
        None => {
            let columns = foreign_key_columns(session, graph, class, fk_table, &fk)?;
            add_foreign_key(session, class, fk_table, columns.0, referenced_table, fk_end)?;
            columns
        }
    };

    let instance_id = session
        .schema
        .table(fk_table)
        .instance_id_column()
        .map(|column| column.id)
        .ok_or_else(|| {
            Error::missing_resolution(format!(
                "table `{}` has no instance-id column",
                session.schema.table(fk_table).name
            ))
        })?;

    let fk_class_id = session
        .schema
        .table(fk_table)
        .class_id_column()
        .map(|column| column.id);

    let mut builder = Builder::new(session, graph, class, fk_table, false);
    builder.push_root(
        INSTANCE_ID,
        PropertyMapKind::InstanceId {
            column: instance_id,
        },
    );
    builder.push_root(
        CLASS_ID,
        PropertyMapKind::ClassId {
            column: rel_class_id_column,
            class: class.id,
        },
    );

    for end in [End::Source, End::Target] {
        let (column, source) = if end == fk_end {
            (instance_id, class_id_source(class, &fk, fk_class_id)?)
        } else {
            (fk_column, class_id_source(class, &referenced, None)?)
        };
        constraint_maps(&mut builder, end, column, source);
    }

    Ok(ClassMap {
        class: class.id,
        strategy: info,
        kind: ClassMapKind::RelationshipEndTable(EndTableInfo {
            foreign_key_end: fk_end,
            foreign_key_column: fk_column,
            rel_class_id_column,
        }),
        table: fk_table,
        base: base.map(|base| base.class),
        property_maps: builder.finish(),
        dirty: true,
    })
}

/// Maps a relationship stored in its own link table.
pub(super) fn map_link_table(
    session: &mut SchemaMappingSession,
    graph: &ClassGraph,
    class: &Class,
    info: MapStrategyInfo,
    table: TableId,
    base: Option<&ClassMap>,
) -> Result<ClassMap> {
    let source = end_classes(session, graph, class, End::Source)?;
    let target = end_classes(session, graph, class, End::Target)?;

    let link = session.schema.table(table);
    let column = |kind: ColumnKind| {
        link.column_with_kind(kind).map(|column| column.id).ok_or_else(|| {
            Error::missing_resolution(format!(
                "link table `{}` has no {kind:?} column",
                link.name
            ))
        })
    };
    let source_column = column(ColumnKind::SOURCE_INSTANCE_ID)?;
    let target_column = column(ColumnKind::TARGET_INSTANCE_ID)?;

    if base.is_none() && link.is_owned() {
        for (ends, column) in [(&source, source_column), (&target, target_column)] {
            if let [referenced] = ends.tables[..] {
                link_foreign_key(session, table, column, referenced)?;
            }
        }
    }

    // An end stored in several tables keeps its class ids in the link table.
    let mut origins = vec![];
    for ends in [&source, &target] {
        let local = if ends.tables.len() > 1 {
            Some(link_class_id_column(session, table, ends.end)?)
        } else {
            None
        };
        origins.push(class_id_source(class, ends, local)?);
    }

    let shares_base_table = base.filter(|base| base.table == table);

    let mut builder = Builder::new(session, graph, class, table, info.shared_columns);
    builder.system_maps()?;
    for ((ends, column), origin) in [(&source, source_column), (&target, target_column)]
        .into_iter()
        .zip(origins)
    {
        constraint_maps(&mut builder, ends.end, column, origin);
    }
    builder.properties(shares_base_table)?;

    Ok(ClassMap {
        class: class.id,
        strategy: info,
        kind: ClassMapKind::RelationshipLinkTable(LinkTableInfo {
            source_column,
            target_column,
        }),
        table,
        base: base.map(|base| base.class),
        property_maps: builder.finish(),
        dirty: true,
    })
}

fn constraint_maps(builder: &mut Builder<'_>, end: End, column: ColumnId, source: ClassIdSource) {
    builder.push_root(
        &format!("{}ECInstanceId", end.prefix()),
        PropertyMapKind::ConstraintId { end, column },
    );
    builder.push_root(
        &format!("{}ECClassId", end.prefix()),
        PropertyMapKind::ConstraintClassId { end, source },
    );
}

fn end_classes(
    session: &SchemaMappingSession,
    graph: &ClassGraph,
    class: &Class,
    end: End,
) -> Result<EndClasses> {
    let mut classes = vec![];
    let mut tables = vec![];

    for id in graph.constraint_classes(class.id, end) {
        let Some(class_map) = session.class_maps.get(&id).filter(|map| map.stores_rows()) else {
            continue;
        };
        classes.push(id);
        if !tables.contains(&class_map.table) {
            tables.push(class_map.table);
        }
    }

    if classes.is_empty() {
        return Err(Error::missing_resolution(format!(
            "no mapped class is eligible at the {} end of relationship {}",
            end.prefix().to_ascii_lowercase(),
            class.full_name()
        )));
    }

    Ok(EndClasses {
        end,
        classes,
        tables,
    })
}

fn single_table(session: &SchemaMappingSession, class: &Class, ends: &EndClasses) -> Result<TableId> {
    match ends.tables[..] {
        [table] => Ok(table),
        _ => {
            let names: Vec<&str> = ends
                .tables
                .iter()
                .map(|table| session.schema.table(*table).name.as_str())
                .collect();
            Err(Error::map_failure(format!(
                "the {} end of relationship {} spans several tables ({}); map it as a link table",
                ends.end.prefix().to_ascii_lowercase(),
                class.full_name(),
                names.join(", ")
            )))
        }
    }
}

/// Returns `true` when an end-table relationship has to be stored in a link
/// table instead: one of its ends spans several tables, and neither a
/// navigation property nor a hint asks for a foreign key.
pub(super) fn needs_link_table(
    session: &SchemaMappingSession,
    graph: &ClassGraph,
    class: &Class,
    base: Option<&ClassMap>,
) -> Result<bool> {
    if base.is_some()
        || class.map.relationship.is_some()
        || !graph.navigation_properties(class.id).is_empty()
    {
        return Ok(false);
    }

    for end in [End::Source, End::Target] {
        if end_classes(session, graph, class, end)?.tables.len() > 1 {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Literal for a single eligible class, otherwise the `local` class-id column
/// or a join to the end's table.
fn class_id_source(class: &Class, ends: &EndClasses, local: Option<ColumnId>) -> Result<ClassIdSource> {
    if let [only] = ends.classes[..] {
        return Ok(ClassIdSource::Literal(only));
    }
    if let Some(column) = local {
        return Ok(ClassIdSource::Local(column));
    }
    match ends.tables[..] {
        [table] => Ok(ClassIdSource::Join(table)),
        _ => Err(Error::map_failure(format!(
            "the {} classes of relationship {} are stored in several tables",
            ends.end.prefix().to_ascii_lowercase(),
            class.full_name()
        ))),
    }
}

/// The foreign-key column and relationship class-id column. A navigation
/// property's columns are reused; otherwise columns named after the
/// relationship are created in the foreign-key end's table.
fn foreign_key_columns(
    session: &mut SchemaMappingSession,
    graph: &ClassGraph,
    class: &Class,
    fk_table: TableId,
    fk: &EndClasses,
) -> Result<(ColumnId, Option<ColumnId>)> {
    for navigation in graph.navigation_properties(class.id) {
        for owner in &fk.classes {
            let column = |leaf: &str| {
                session
                    .find_property_map(*owner, &format!("{}.{leaf}", navigation.name))
                    .and_then(|map| map.column())
                    .filter(|column| column.table == fk_table)
            };
            if let Some(id) = column("Id") {
                return Ok((id, column("RelECClassId")));
            }
        }
    }

    let id = find_or_create_column(session, fk_table, &format!("ForeignECInstanceId_{}", class.name))?;
    let rel_class_id = if has_rel_class_id(graph, class.id) {
        Some(find_or_create_column(session, fk_table, &format!("RelECClassId_{}", class.name))?)
    } else {
        None
    };

    Ok((id, rel_class_id))
}

/// The `SourceECClassId` or `TargetECClassId` column of a link table.
fn link_class_id_column(session: &mut SchemaMappingSession, table: TableId, end: End) -> Result<ColumnId> {
    let kind = match end {
        End::Source => ColumnKind::SOURCE_CLASS_ID,
        End::Target => ColumnKind::TARGET_CLASS_ID,
    };

    let link = session.schema.table(table);
    if let Some(column) = link.column_with_kind(kind) {
        return Ok(column.id);
    }

    let name = format!("{}{CLASS_ID}", end.prefix());
    if !link.is_owned() {
        return Err(Error::missing_resolution(format!(
            "link table `{}` has no {name} column",
            link.name
        )));
    }

    let mut edit = session.schema.edit(table)?;
    let column = edit.create_column(Some(name.as_str()), ColumnType::Long, kind, ColumnPersistence::Persisted)?;
    edit.column_mut(column).nullable = false;

    tracing::debug!(table = %edit.table().name, column = %name, "stored relationship end class ids locally");
    Ok(column)
}

fn find_or_create_column(session: &mut SchemaMappingSession, table: TableId, name: &str) -> Result<ColumnId> {
    if let Some(column) = session.schema.table(table).column_by_name(name) {
        if column.ty.is_compatible(ColumnType::Long) && !column.is_system() {
            return Ok(column.id);
        }
        return Err(Error::name_conflict(&session.schema.table(table).name, name));
    }

    session.schema.edit(table)?.create_column(
        Some(name),
        ColumnType::Long,
        ColumnKind::DATA,
        ColumnPersistence::Persisted,
    )
}

fn add_foreign_key(
    session: &mut SchemaMappingSession,
    class: &Class,
    fk_table: TableId,
    fk_column: ColumnId,
    referenced_table: TableId,
    fk_end: End,
) -> Result<()> {
    let table = session.schema.table(fk_table);
    if !table.is_owned()
        || table
            .foreign_keys
            .iter()
            .any(|fk| fk.columns == [fk_column])
    {
        return Ok(());
    }

    let Some(referenced) = session
        .schema
        .table(referenced_table)
        .instance_id_column()
        .map(|column| column.id)
    else {
        return Err(Error::missing_resolution(format!(
            "table `{}` referenced by relationship {} has no instance-id column",
            session.schema.table(referenced_table).name,
            class.full_name()
        )));
    };

    let embedding = class
        .relationship
        .as_ref()
        .map(|rel| rel.strength == Strength::Embedding)
        .unwrap_or(false);
    // An embedding source owns its targets.
    let on_delete = class.map.on_delete.or_else(|| {
        (embedding && fk_end == End::Target).then_some(ForeignKeyAction::Cascade)
    });

    let mut edit = session.schema.edit(fk_table)?;
    let fk = edit.create_foreign_key(referenced_table);
    fk.add_column(fk_column, referenced);
    fk.on_delete = on_delete;
    fk.on_update = class.map.on_update;

    tracing::debug!(
        relationship = %class.full_name(),
        table = %edit.table().name,
        "created foreign key"
    );
    Ok(())
}

fn link_foreign_key(
    session: &mut SchemaMappingSession,
    table: TableId,
    column: ColumnId,
    referenced_table: TableId,
) -> Result<()> {
    if session
        .schema
        .table(table)
        .foreign_keys
        .iter()
        .any(|fk| fk.columns == [column])
    {
        return Ok(());
    }

    let Some(referenced) = session
        .schema
        .table(referenced_table)
        .instance_id_column()
        .map(|column| column.id)
    else {
        tracing::warn!(
            table = %session.schema.table(table).name,
            referenced = %session.schema.table(referenced_table).name,
            "referenced table has no instance-id column; foreign key not created"
        );
        return Ok(());
    };

    let mut edit = session.schema.edit(table)?;
    let fk = edit.create_foreign_key(referenced_table);
    fk.add_column(column, referenced);
    fk.on_delete = Some(ForeignKeyAction::Cascade);
    Ok(())
}
