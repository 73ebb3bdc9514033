use super::{
    builder::{self, Builder},
    finalize, relationship,
    strategy::{self, TableTarget},
    ClassMap, ClassMapKind, MapStrategy, MapStrategyInfo, Options, PreviousBindings, PropertyMap,
    PropertyMapId, CLASS_ID, INSTANCE_ID,
};
use crate::{
    driver::{Connection, LiveColumn},
    schema::{
        db::{ColumnId, ColumnKind, ColumnPersistence, ColumnType, Schema, TableId, TableKind},
        ec::{Class, ClassGraph, ClassId, End},
    },
    Error, Result,
};

use indexmap::IndexMap;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

/// Source of live table definitions, consulted when a class maps onto an
/// existing table.
pub trait Introspect {
    /// Live columns of `table`. Empty if the table does not exist.
    fn table_info(&mut self, table: &str) -> Result<Vec<LiveColumn>>;
}

impl Introspect for dyn Connection + '_ {
    fn table_info(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        Connection::table_info(self, table)
    }
}

/// Live tables known up front, keyed by exact table name.
impl Introspect for HashMap<String, Vec<LiveColumn>> {
    fn table_info(&mut self, table: &str) -> Result<Vec<LiveColumn>> {
        Ok(self.get(table).cloned().unwrap_or_default())
    }
}

/// No live tables.
impl Introspect for () {
    fn table_info(&mut self, _table: &str) -> Result<Vec<LiveColumn>> {
        Ok(vec![])
    }
}

/// Every table, class map and property map of one import.
///
/// Class maps are created lazily and cached by class id. A failed top-level
/// [`map_class`](Self::map_class) or [`map_all`](Self::map_all) restores the
/// session to the state it had before the call.
#[derive(Debug, Clone)]
pub struct SchemaMappingSession {
    pub(super) graph: Arc<ClassGraph>,

    pub(super) options: Options,

    pub(super) schema: Schema,

    /// The schema the session started from, restored by `clear`.
    loaded: Schema,

    pub(super) previous: PreviousBindings,

    pub(super) class_maps: IndexMap<ClassId, ClassMap>,

    pub(super) property_maps: Vec<PropertyMap>,

    /// Classes whose mapping is under way, innermost last.
    in_progress: Vec<ClassId>,
}

struct Snapshot {
    schema: Schema,
    class_maps: usize,
    property_maps: usize,
}

/// System columns a freshly created primary table starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableShape {
    Entity { class_id: bool },
    Struct,
    Link,
}

impl SchemaMappingSession {
    pub fn new(graph: Arc<ClassGraph>, schema: Schema, options: Options) -> SchemaMappingSession {
        SchemaMappingSession {
            graph,
            options,
            loaded: schema.clone(),
            schema,
            previous: PreviousBindings::default(),
            class_maps: IndexMap::new(),
            property_maps: vec![],
            in_progress: vec![],
        }
    }

    /// Bindings of an earlier import that mapping must stay compatible with.
    pub fn with_previous(mut self, previous: PreviousBindings) -> SchemaMappingSession {
        self.previous = previous;
        self
    }

    pub fn graph(&self) -> &ClassGraph {
        &self.graph
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn previous(&self) -> &PreviousBindings {
        &self.previous
    }

    pub fn class_map(&self, class: ClassId) -> Option<&ClassMap> {
        self.class_maps.get(&class)
    }

    /// Class maps in the order they were created.
    pub fn class_maps(&self) -> impl ExactSizeIterator<Item = &ClassMap> + '_ {
        self.class_maps.values()
    }

    pub fn property_map(&self, id: PropertyMapId) -> &PropertyMap {
        &self.property_maps[id.0]
    }

    /// Resolves a dotted access string against a class map.
    pub fn find_property_map(&self, class: ClassId, access_string: &str) -> Option<&PropertyMap> {
        let class_map = self.class_maps.get(&class)?;
        let mut segments = access_string.split('.');

        let root = class_map.property_maps.get(segments.next()?)?;
        let mut map = self.property_map(root);

        for segment in segments {
            map = map
                .children
                .iter()
                .map(|id| self.property_map(*id))
                .find(|child| child.name().eq_ignore_ascii_case(segment))?;
        }

        Some(map)
    }

    /// Leaf property maps of a class map, depth first in property order.
    /// Struct-table maps are skipped.
    pub fn leaves(&self, class_map: &ClassMap) -> Vec<&PropertyMap> {
        let mut out = vec![];
        for id in class_map.property_maps.ids() {
            self.collect_leaves(id, &mut out);
        }
        out
    }

    /// Leaves below (or at) one property map.
    pub fn leaves_of(&self, id: PropertyMapId) -> Vec<&PropertyMap> {
        let mut out = vec![];
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, id: PropertyMapId, out: &mut Vec<&'a PropertyMap>) {
        let map = self.property_map(id);
        if map.is_leaf() {
            out.push(map);
        }
        for child in &map.children {
            self.collect_leaves(*child, out);
        }
    }

    /// Mapped class maps of the class's direct subclasses.
    pub fn derived_class_maps(&self, class: ClassId) -> Vec<&ClassMap> {
        self.graph
            .derived(class)
            .iter()
            .filter_map(|id| self.class_maps.get(id))
            .filter(|map| !map.is_unmapped())
            .collect()
    }

    /// Classes whose instances are rows of `table`, ordered by id.
    pub fn table_owners(&self, table: TableId) -> Vec<ClassId> {
        let mut owners: Vec<ClassId> = self
            .class_maps
            .values()
            .filter(|map| map.stores_rows() && map.table == table)
            .map(|map| map.class)
            .collect();
        owners.sort();
        owners
    }

    /// Maps one class and everything it depends on.
    pub fn map_class<I>(&mut self, class: ClassId, live: &mut I) -> Result<&ClassMap>
    where
        I: Introspect + ?Sized,
    {
        if !self.class_maps.contains_key(&class) {
            let snapshot = self.snapshot();
            if let Err(err) = self.map_class_inner(class, live) {
                self.restore(snapshot);
                return Err(err);
            }
        }

        self.class_maps
            .get(&class)
            .ok_or_else(|| Error::missing_resolution(format!("class {class} has no class map")))
    }

    /// Maps every class of the graph, checks the previous bindings and
    /// finalizes the tables. The session is final afterwards: every table's
    /// edit scope is closed.
    pub fn map_all<I>(&mut self, live: &mut I) -> Result<()>
    where
        I: Introspect + ?Sized,
    {
        let snapshot = self.snapshot();
        let result = self.map_all_inner(live);
        if result.is_err() {
            self.restore(snapshot);
        }
        result
    }

    fn map_all_inner<I>(&mut self, live: &mut I) -> Result<()>
    where
        I: Introspect + ?Sized,
    {
        let graph = self.graph.clone();

        // Struct classes are mapped on demand, or when an earlier import
        // stored them.
        let ids: Vec<ClassId> = graph
            .classes()
            .filter(|class| {
                !class.is_struct() || self.previous.column(class.id, INSTANCE_ID).is_some()
            })
            .map(|class| class.id)
            .collect();

        for id in ids {
            self.map_class_inner(id, live)?;
        }

        self.verify_previous()?;
        finalize::finalize(self)?;

        tracing::debug!(
            classes = self.class_maps.len(),
            tables = self.schema.tables().len() - 1,
            "mapping finalized"
        );
        Ok(())
    }

    /// Drops every class map and restores the schema the session started
    /// from.
    pub fn clear(&mut self) {
        self.schema = self.loaded.clone();
        self.class_maps.clear();
        self.property_maps.clear();
        self.in_progress.clear();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            schema: self.schema.clone(),
            class_maps: self.class_maps.len(),
            property_maps: self.property_maps.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.schema = snapshot.schema;
        self.class_maps.truncate(snapshot.class_maps);
        self.property_maps.truncate(snapshot.property_maps);
        self.in_progress.clear();
    }

    pub(super) fn map_class_inner<I>(&mut self, id: ClassId, live: &mut I) -> Result<()>
    where
        I: Introspect + ?Sized,
    {
        if self.class_maps.contains_key(&id) {
            return Ok(());
        }

        let graph = self.graph.clone();
        let Some(class) = graph.get(id) else {
            return Err(Error::missing_resolution(format!("no class with id {id}")));
        };

        if self.in_progress.contains(&id) {
            return Err(Error::map_failure(format!(
                "class {} depends on itself",
                class.full_name()
            )));
        }

        self.in_progress.push(id);
        let result = self.map_uncached(&graph, class, live);
        self.in_progress.pop();

        let class_map =
            result.map_err(|err| err.context(format!("mapping class {}", class.full_name())))?;

        tracing::debug!(
            class = %class.full_name(),
            table = %self.schema.table(class_map.table).name,
            properties = class_map.property_maps.len(),
            "mapped class"
        );

        self.class_maps.insert(id, class_map);
        Ok(())
    }

    fn map_uncached<I>(&mut self, graph: &ClassGraph, class: &Class, live: &mut I) -> Result<ClassMap>
    where
        I: Introspect + ?Sized,
    {
        // Nothing is touched before the struct layout is known to be finite.
        builder::validate_struct_nesting(graph, class)?;

        if let Some(base) = class.base {
            self.map_class_inner(base, live)?;
        }

        let base = class
            .base
            .and_then(|base| self.class_maps.get(&base))
            .cloned();

        let base_instance_id = base
            .as_ref()
            .filter(|base| base.stores_rows())
            .and_then(|base| self.schema.table(base.table).instance_id_column())
            .map(|column| column.name.clone());

        let resolution = strategy::resolve(graph, class, base.as_ref(), base_instance_id.as_deref())?;
        let info = resolution.info;

        if info.strategy.is_not_mapped() || resolution.target == TableTarget::Null {
            return Ok(self.unmapped(class, info, base.as_ref()));
        }

        if class.is_mixin() {
            return Ok(ClassMap {
                class: class.id,
                strategy: info,
                kind: ClassMapKind::Mixin,
                table: self.schema.null_table_id(),
                base: None,
                property_maps: Default::default(),
                dirty: false,
            });
        }

        if class.is_relationship() {
            for end in [End::Source, End::Target] {
                for dep in graph.constraint_classes(class.id, end) {
                    self.map_class_inner(dep, live)?;
                }
            }

            let resolution = if info.strategy.is_end_table()
                && relationship::needs_link_table(self, graph, class, base.as_ref())?
            {
                tracing::debug!(
                    class = %class.full_name(),
                    "relationship end spans several tables; storing it in a link table"
                );
                strategy::link_table(class)
            } else {
                resolution
            };
            let info = resolution.info;

            if info.strategy.is_end_table() {
                return relationship::map_end_table(self, graph, class, info, base.as_ref());
            }

            let table = self.primary_table(class, info, &resolution.target, base.as_ref(), live, TableShape::Link)?;
            return relationship::map_link_table(self, graph, class, info, table, base.as_ref());
        }

        for dep in builder::out_of_line_structs(graph, class, &self.options) {
            self.map_class_inner(dep, live)?;
        }

        let shape = if class.is_struct() {
            TableShape::Struct
        } else {
            TableShape::Entity {
                class_id: info.strategy == MapStrategy::TablePerHierarchy,
            }
        };
        let table = self.primary_table(class, info, &resolution.target, base.as_ref(), live, shape)?;

        let dirty = self.previous.column(class.id, INSTANCE_ID).is_none();
        let shares_base_table = base.as_ref().filter(|base| base.table == table);

        let mut builder = Builder::new(self, graph, class, table, info.shared_columns);
        builder.system_maps()?;
        builder.properties(shares_base_table)?;
        let property_maps = builder.finish();

        Ok(ClassMap {
            class: class.id,
            strategy: info,
            kind: if class.is_struct() {
                ClassMapKind::Struct
            } else {
                ClassMapKind::Entity
            },
            table,
            base: mapped_base(base.as_ref()),
            property_maps,
            dirty,
        })
    }

    fn unmapped(&self, class: &Class, info: MapStrategyInfo, base: Option<&ClassMap>) -> ClassMap {
        ClassMap {
            class: class.id,
            strategy: info,
            kind: ClassMapKind::Unmapped,
            table: self.schema.null_table_id(),
            base: mapped_base(base),
            property_maps: Default::default(),
            dirty: false,
        }
    }

    fn primary_table<I>(
        &mut self,
        class: &Class,
        info: MapStrategyInfo,
        target: &TableTarget,
        base: Option<&ClassMap>,
        live: &mut I,
        shape: TableShape,
    ) -> Result<TableId>
    where
        I: Introspect + ?Sized,
    {
        match target {
            TableTarget::Null => Ok(self.schema.null_table_id()),
            TableTarget::Base => base
                .filter(|base| base.stores_rows())
                .map(|base| base.table)
                .ok_or_else(|| {
                    Error::missing_resolution(format!(
                        "the base class of {} has no table to share",
                        class.full_name()
                    ))
                }),
            TableTarget::Own {
                name,
                existing: true,
            } => self.existing_table(name, live),
            TableTarget::Own {
                name,
                existing: false,
            } => self.owned_table(class, info, name, shape),
            TableTarget::None => Err(err!(
                "class {} has no table of its own",
                class.full_name()
            )),
        }
    }

    fn existing_table<I>(&mut self, name: &str, live: &mut I) -> Result<TableId>
    where
        I: Introspect + ?Sized,
    {
        if let Some(table) = self.schema.find_table(name) {
            if !table.is_existing() {
                return Err(Error::name_conflict("database", name));
            }
            return Ok(table.id);
        }

        let columns = live.table_info(name)?;
        let id = self.schema.create_existing_table(name, &columns)?;

        if self.schema.table(id).instance_id_column().is_none() {
            return Err(Error::missing_resolution(format!(
                "existing table `{name}` has no primary key"
            )));
        }

        tracing::debug!(table = %name, columns = columns.len(), "registered existing table");
        Ok(id)
    }

    fn owned_table(
        &mut self,
        class: &Class,
        info: MapStrategyInfo,
        name: &str,
        shape: TableShape,
    ) -> Result<TableId> {
        let id = match self.schema.find_table(name) {
            Some(table) => {
                if !table.is_owned() {
                    return Err(Error::name_conflict("database", name));
                }

                let owners = self.table_owners(table.id);
                let shareable = |strategy: MapStrategy| {
                    matches!(
                        strategy,
                        MapStrategy::SharedTableForThisClass | MapStrategy::InParentTable
                    )
                };
                let shared = owners.is_empty()
                    || (shareable(info.strategy)
                        && owners
                            .iter()
                            .all(|owner| shareable(self.class_maps[owner].strategy.strategy)));

                if !shared {
                    return Err(Error::name_conflict("database", name));
                }
                table.id
            }
            None => self.schema.create_table(name, TableKind::Physical)?,
        };

        self.ensure_system_columns(id, class, shape)?;
        Ok(id)
    }

    /// Adds the system columns the table's shape requires, unless present.
    fn ensure_system_columns(&mut self, id: TableId, class: &Class, shape: TableShape) -> Result<()> {
        let table = self.schema.table(id);

        let instance_id = table.instance_id_column().is_none();
        let class_id = matches!(shape, TableShape::Entity { class_id: true })
            && table.class_id_column().is_none()
            && !table.persisted;

        let roles: &[(&str, ColumnKind)] = match shape {
            TableShape::Entity { .. } => &[],
            TableShape::Struct => &[
                ("ParentECInstanceId", ColumnKind::PARENT_ID),
                ("ECPropertyPathId", ColumnKind::PROPERTY_PATH_ID),
                ("ECArrayIndex", ColumnKind::ARRAY_INDEX),
            ],
            TableShape::Link => &[
                ("SourceECInstanceId", ColumnKind::SOURCE_INSTANCE_ID),
                ("TargetECInstanceId", ColumnKind::TARGET_INSTANCE_ID),
            ],
        };
        let roles: Vec<(&str, ColumnKind)> = roles
            .iter()
            .copied()
            .filter(|(_, kind)| table.column_with_kind(*kind).is_none())
            .collect();

        if !instance_id && !class_id && roles.is_empty() {
            return Ok(());
        }

        let mut edit = self.schema.edit(id)?;

        if instance_id {
            let name = class
                .map
                .instance_id_column
                .as_deref()
                .unwrap_or(INSTANCE_ID);
            let column = edit.create_column(
                Some(name),
                ColumnType::Long,
                ColumnKind::INSTANCE_ID,
                ColumnPersistence::Persisted,
            )?;
            edit.column_mut(column).nullable = false;
            if let Some(pk) = edit.primary_key(true) {
                pk.columns = vec![column];
            }
        }

        if class_id {
            let column = edit.create_column_at(
                1,
                Some(CLASS_ID),
                ColumnType::Long,
                ColumnKind::CLASS_ID,
                ColumnPersistence::Persisted,
            )?;
            edit.column_mut(column).nullable = false;
        }

        for (name, kind) in roles {
            let column = edit.create_column(
                Some(name),
                ColumnType::Long,
                kind,
                ColumnPersistence::Persisted,
            )?;
            // Out-of-line structs store no property path or array index.
            edit.column_mut(column).nullable = !kind.intersects(
                ColumnKind::PARENT_ID
                    | ColumnKind::SOURCE_INSTANCE_ID
                    | ColumnKind::TARGET_INSTANCE_ID,
            );
        }

        Ok(())
    }

    /// Every previously bound column must still be bound by some class map.
    fn verify_previous(&self) -> Result<()> {
        if self.previous.is_empty() {
            return Ok(());
        }

        let bound: HashSet<ColumnId> = self
            .class_maps
            .values()
            .flat_map(|class_map| self.leaves(class_map))
            .filter_map(PropertyMap::column)
            .collect();

        for (class, access_string, column) in self.previous.iter() {
            let column = self.schema.column(column);
            if column.kind.contains(ColumnKind::CLASS_ID) || bound.contains(&column.id) {
                continue;
            }

            let class = self
                .graph
                .get(class)
                .map(Class::full_name)
                .unwrap_or_else(|| class.to_string());
            let table = self.schema.table(column.id.table);

            return Err(Error::schema_downgrade(format!(
                "`{access_string}` of class {class} was stored in `{}`.`{}` and is no longer mapped",
                table.name, column.name
            )));
        }

        Ok(())
    }
}

fn mapped_base(base: Option<&ClassMap>) -> Option<ClassId> {
    base.filter(|base| !base.is_unmapped()).map(|base| base.class)
}
