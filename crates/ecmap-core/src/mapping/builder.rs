use super::{
    ClassMap, Options, PropertyMap, PropertyMapCollection, PropertyMapId, PropertyMapKind,
    SchemaMappingSession, CLASS_ID, INSTANCE_ID,
};
use crate::{
    schema::{
        db::{ColumnId, ColumnKind, ColumnPersistence, ColumnType, TableId},
        ec::{
            Class, ClassGraph, ClassId, Direction, End, PrimitiveType, Property, PropertyId,
            PropertyKind, PropertyMapHint,
        },
    },
    Error, Result,
};

use std::collections::HashSet;

/// Builds the property maps of one class map, creating columns in its table
/// as it goes.
pub(super) struct Builder<'a> {
    session: &'a mut SchemaMappingSession,
    graph: &'a ClassGraph,
    class: &'a Class,
    table: TableId,
    shared_columns: bool,

    /// Columns bound by the class map being built.
    bound: HashSet<ColumnId>,

    maps: PropertyMapCollection,
}

/// Shape of one leaf, computed from the class graph alone.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LeafShape {
    pub(crate) access_string: String,
    pub(crate) ty: PrimitiveType,
    pub(crate) array: bool,
}

impl<'a> Builder<'a> {
    pub(super) fn new(
        session: &'a mut SchemaMappingSession,
        graph: &'a ClassGraph,
        class: &'a Class,
        table: TableId,
        shared_columns: bool,
    ) -> Builder<'a> {
        Builder {
            session,
            graph,
            class,
            table,
            shared_columns,
            bound: HashSet::new(),
            maps: PropertyMapCollection::default(),
        }
    }

    /// `ECInstanceId` and `ECClassId`, bound to the table's system columns.
    pub(super) fn system_maps(&mut self) -> Result<()> {
        let table = self.session.schema.table(self.table);

        let Some(instance_id) = table.instance_id_column().map(|column| column.id) else {
            return Err(Error::missing_resolution(format!(
                "table `{}` has no instance-id column",
                table.name
            )));
        };
        let class_id = table.class_id_column().map(|column| column.id);

        self.bound.insert(instance_id);
        self.bound.extend(class_id);

        self.push_root(
            INSTANCE_ID,
            PropertyMapKind::InstanceId {
                column: instance_id,
            },
        );
        self.push_root(
            CLASS_ID,
            PropertyMapKind::ClassId {
                column: class_id,
                class: self.class.id,
            },
        );
        Ok(())
    }

    /// Adds a top-level system map.
    pub(super) fn push_root(&mut self, access_string: &str, kind: PropertyMapKind) -> PropertyMapId {
        if let Some(column) = kind_column(&kind) {
            self.bound.insert(column);
        }
        let id = self.push(None, access_string.to_string(), None, kind);
        self.maps.insert(access_string, id);
        id
    }

    /// Maps every property of the class, base-first. Maps of `base` (which
    /// must share this builder's table) are reused as they are.
    pub(super) fn properties(&mut self, base: Option<&ClassMap>) -> Result<()> {
        let graph = self.graph;

        for property in graph.properties(self.class.id) {
            if let Some(inherited) = base.and_then(|base| base.property_maps.get(&property.name)) {
                let columns: Vec<ColumnId> = self
                    .session
                    .leaves_of(inherited)
                    .into_iter()
                    .filter_map(PropertyMap::column)
                    .collect();
                self.bound.extend(columns);
                self.maps.insert(&property.name, inherited);
                continue;
            }

            let id = self.map_property(property, property.id, None, "", "", 0)?;
            self.maps.insert(&property.name, id);
        }

        Ok(())
    }

    pub(super) fn finish(self) -> PropertyMapCollection {
        self.maps
    }

    fn push(
        &mut self,
        property: Option<PropertyId>,
        access_string: String,
        parent: Option<PropertyMapId>,
        kind: PropertyMapKind,
    ) -> PropertyMapId {
        let id = PropertyMapId(self.session.property_maps.len());
        self.session.property_maps.push(PropertyMap {
            id,
            class: self.class.id,
            property,
            access_string,
            parent,
            children: vec![],
            kind,
        });
        if let Some(parent) = parent {
            self.session.property_maps[parent.0].children.push(id);
        }
        id
    }

    fn map_property(
        &mut self,
        property: &Property,
        root: PropertyId,
        parent: Option<PropertyMapId>,
        access_prefix: &str,
        column_prefix: &str,
        depth: usize,
    ) -> Result<PropertyMapId> {
        let access = join(access_prefix, &property.name, '.');
        let column_base = join(column_prefix, &property.name, '_');

        match &property.kind {
            PropertyKind::Primitive(ty) => match ty.point_coordinates() {
                Some(coordinates) => {
                    let id = self.push(Some(root), access.clone(), parent, PropertyMapKind::Point { ty: *ty });
                    for coordinate in coordinates {
                        let leaf = format!("{access}.{coordinate}");
                        let column = self.resolve_column(
                            &format!("{column_base}_{coordinate}"),
                            ColumnType::Double,
                            &property.map,
                            property.id,
                            &leaf,
                        )?;
                        self.push(
                            Some(root),
                            leaf,
                            Some(id),
                            PropertyMapKind::Primitive {
                                column,
                                ty: PrimitiveType::Double,
                            },
                        );
                    }
                    Ok(id)
                }
                None => {
                    let name = leaf_column_name(column_prefix, property);
                    let column =
                        self.resolve_column(&name, ty.column_type(), &property.map, property.id, &access)?;
                    Ok(self.push(
                        Some(root),
                        access,
                        parent,
                        PropertyMapKind::Primitive { column, ty: *ty },
                    ))
                }
            },
            PropertyKind::PrimitiveArray(ty) => {
                let name = leaf_column_name(column_prefix, property);
                let column =
                    self.resolve_column(&name, ColumnType::Binary, &property.map, property.id, &access)?;
                Ok(self.push(
                    Some(root),
                    access,
                    parent,
                    PropertyMapKind::PrimitiveArray { column, ty: *ty },
                ))
            }
            PropertyKind::Struct(struct_class)
                if depth < self.session.options.max_inline_struct_depth =>
            {
                let id = self.push(
                    Some(root),
                    access.clone(),
                    parent,
                    PropertyMapKind::Struct {
                        class: *struct_class,
                    },
                );
                let graph = self.graph;
                for member in graph.properties(*struct_class) {
                    self.map_property(member, root, Some(id), &access, &column_base, depth + 1)?;
                }
                Ok(id)
            }
            PropertyKind::Struct(struct_class) | PropertyKind::StructArray(struct_class) => {
                let Some(table) = self
                    .session
                    .class_maps
                    .get(struct_class)
                    .map(|class_map| class_map.table)
                else {
                    return Err(Error::missing_resolution(format!(
                        "struct class {} of property `{access}` is not mapped",
                        self.graph.class(*struct_class).full_name()
                    )));
                };

                Ok(self.push(
                    Some(root),
                    access,
                    parent,
                    PropertyMapKind::StructTable {
                        class: *struct_class,
                        table,
                        array: matches!(property.kind, PropertyKind::StructArray(_)),
                    },
                ))
            }
            PropertyKind::Navigation {
                relationship,
                direction,
            } => self.map_navigation(property, root, parent, *relationship, *direction, access, column_base),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn map_navigation(
        &mut self,
        property: &Property,
        root: PropertyId,
        parent: Option<PropertyMapId>,
        relationship: ClassId,
        direction: Direction,
        access: String,
        column_base: String,
    ) -> Result<PropertyMapId> {
        let graph = self.graph;
        let rel_class = graph.class(relationship);
        let Some(rel) = &rel_class.relationship else {
            return Err(Error::invalid_schema(format!(
                "navigation property `{access}` names {} which is not a relationship",
                rel_class.full_name()
            )));
        };

        let referenced = match direction {
            Direction::Forward => End::Target,
            Direction::Backward => End::Source,
        };
        let multiplicity = rel.constraint(referenced).multiplicity;
        if multiplicity.is_many() {
            return Err(Error::map_failure(format!(
                "navigation property `{access}` of class {} points to the {} end of {}, which has multiplicity {multiplicity}",
                self.class.full_name(),
                referenced.prefix().to_ascii_lowercase(),
                rel_class.full_name()
            )));
        }

        let id = self.push(
            Some(root),
            access.clone(),
            parent,
            PropertyMapKind::Navigation { relationship },
        );

        let hint = PropertyMapHint::default();
        let leaf = format!("{access}.Id");
        let column = self.resolve_column(&format!("{column_base}_Id"), ColumnType::Long, &hint, property.id, &leaf)?;
        self.push(
            Some(root),
            leaf,
            Some(id),
            PropertyMapKind::Primitive {
                column,
                ty: PrimitiveType::Long,
            },
        );

        if has_rel_class_id(graph, relationship) {
            let leaf = format!("{access}.RelECClassId");
            let column = self.resolve_column(
                &format!("{column_base}_RelECClassId"),
                ColumnType::Long,
                &hint,
                property.id,
                &leaf,
            )?;
            self.push(
                Some(root),
                leaf,
                Some(id),
                PropertyMapKind::Primitive {
                    column,
                    ty: PrimitiveType::Long,
                },
            );
        }

        Ok(id)
    }

    /// Finds or creates the column of one leaf.
    fn resolve_column(
        &mut self,
        requested: &str,
        ty: ColumnType,
        hint: &PropertyMapHint,
        property: PropertyId,
        access: &str,
    ) -> Result<ColumnId> {
        if let Some(previous) = self.session.previous.column(self.class.id, access) {
            if previous.table == self.table {
                let column = self.session.schema.column(previous);
                if !column.ty.is_compatible(ty) {
                    return Err(Error::schema_downgrade(format!(
                        "`{access}` of class {} is stored in `{}` as {:?} and cannot become {ty:?}",
                        self.class.full_name(),
                        column.name,
                        column.ty
                    )));
                }
                self.bound.insert(previous);
                return Ok(previous);
            }
        }

        let table = self.session.schema.table(self.table);

        if table.is_existing() {
            return match table.column_by_name(requested) {
                Some(column) if column.ty.is_compatible(ty) && !self.bound.contains(&column.id) => {
                    let id = column.id;
                    self.bound.insert(id);
                    Ok(id)
                }
                _ => Err(Error::missing_resolution(format!(
                    "existing table `{}` has no free column `{requested}` of type {ty:?} for `{access}`",
                    table.name
                ))),
            };
        }

        if self.shared_columns {
            return self.shared_column();
        }

        let class_prefixed = format!("{}_{requested}", self.class.name);
        let with_id = format!("{requested}_{property}");
        let mut name = requested.to_string();

        loop {
            let table = self.session.schema.table(self.table);
            let Some(column) = table.column_by_name(&name) else {
                return self.create_column(&name, ty, hint);
            };

            let compatible = !column.is_system() && column.ty.is_compatible(ty);

            if !compatible {
                if name.eq_ignore_ascii_case(&with_id) {
                    return Err(Error::name_conflict(&table.name, requested));
                }
                name = with_id.clone();
            } else if self.bound.contains(&column.id) {
                if name.eq_ignore_ascii_case(requested) {
                    name = class_prefixed.clone();
                } else if name.eq_ignore_ascii_case(&class_prefixed) {
                    name = with_id.clone();
                } else {
                    return Err(Error::name_conflict(&table.name, requested));
                }
            } else {
                let id = column.id;
                self.warn_attribute_mismatch(id, hint, access);
                self.bound.insert(id);
                return Ok(id);
            }
        }
    }

    /// The first shared column not yet bound by this class map, or a new one.
    fn shared_column(&mut self) -> Result<ColumnId> {
        let free = self
            .session
            .schema
            .table(self.table)
            .columns()
            .find(|column| column.shared && !self.bound.contains(&column.id))
            .map(|column| column.id);

        let id = match free {
            Some(id) => id,
            None => self.session.schema.edit(self.table)?.create_column(
                None,
                ColumnType::Any,
                ColumnKind::DATA,
                ColumnPersistence::Persisted,
            )?,
        };

        self.bound.insert(id);
        Ok(id)
    }

    fn create_column(&mut self, name: &str, ty: ColumnType, hint: &PropertyMapHint) -> Result<ColumnId> {
        let mut edit = self.session.schema.edit(self.table)?;
        let id = edit.create_column(Some(name), ty, ColumnKind::DATA, ColumnPersistence::Persisted)?;

        let column = edit.column_mut(id);
        column.nullable = hint.nullable.unwrap_or(true);
        column.unique = hint.unique;
        column.collation = hint.collation.unwrap_or_default();
        column.default = hint.default.clone();
        column.check = hint.check.clone();

        self.bound.insert(id);
        Ok(id)
    }

    /// The first writer's attributes win.
    fn warn_attribute_mismatch(&self, id: ColumnId, hint: &PropertyMapHint, access: &str) {
        let column = self.session.schema.column(id);

        let nullable = hint.nullable.unwrap_or(true) != column.nullable;
        let unique = hint.unique != column.unique;
        let collation = hint
            .collation
            .map(|collation| collation != column.collation)
            .unwrap_or(false);

        if nullable || unique || collation {
            tracing::warn!(
                class = %self.class.full_name(),
                property = %access,
                column = %column.name,
                nullable,
                unique,
                collation,
                "shared column keeps its own attributes"
            );
        }
    }
}

fn kind_column(kind: &PropertyMapKind) -> Option<ColumnId> {
    match *kind {
        PropertyMapKind::InstanceId { column } | PropertyMapKind::ConstraintId { column, .. } => {
            Some(column)
        }
        PropertyMapKind::ClassId { column, .. } => column,
        _ => None,
    }
}

fn join(prefix: &str, name: &str, separator: char) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{separator}{name}")
    }
}

fn leaf_column_name(column_prefix: &str, property: &Property) -> String {
    let name = property.map.column_name.as_deref().unwrap_or(&property.name);
    join(column_prefix, name, '_')
}

/// A relationship stores its class id when it is abstract or has subclasses.
pub(super) fn has_rel_class_id(graph: &ClassGraph, relationship: ClassId) -> bool {
    graph.class(relationship).is_abstract() || !graph.derived(relationship).is_empty()
}

/// Rejects struct properties that (transitively) embed themselves.
pub(super) fn validate_struct_nesting(graph: &ClassGraph, class: &Class) -> Result<()> {
    for property in graph.properties(class.id) {
        let Some(struct_class) = property.struct_class() else {
            continue;
        };

        if graph.is_subclass_of(struct_class, class.id) {
            return Err(Error::map_failure(format!(
                "struct property `{}` of class {} has type {}, which is or derives from the declaring class",
                property.name,
                class.full_name(),
                graph.class(struct_class).full_name()
            )));
        }

        let mut path = vec![struct_class];
        check_members(graph, struct_class, &mut path)?;
    }

    Ok(())
}

fn check_members(graph: &ClassGraph, struct_class: ClassId, path: &mut Vec<ClassId>) -> Result<()> {
    for member in graph.properties(struct_class) {
        let Some(nested) = member.struct_class() else {
            continue;
        };

        if path.iter().any(|outer| graph.is_subclass_of(nested, *outer)) {
            return Err(Error::map_failure(format!(
                "struct {} contains itself through property `{}`",
                graph.class(nested).full_name(),
                member.name
            )));
        }

        path.push(nested);
        check_members(graph, nested, path)?;
        path.pop();
    }

    Ok(())
}

/// Struct classes the class stores in their own table: struct arrays, and
/// structs nested deeper than the inline limit.
pub(super) fn out_of_line_structs(graph: &ClassGraph, class: &Class, options: &Options) -> Vec<ClassId> {
    let mut out = vec![];
    collect_out_of_line(graph, class.id, 0, options.max_inline_struct_depth, &mut out);
    out
}

fn collect_out_of_line(graph: &ClassGraph, class: ClassId, depth: usize, max: usize, out: &mut Vec<ClassId>) {
    for property in graph.properties(class) {
        match property.kind {
            PropertyKind::Struct(nested) if depth < max => {
                collect_out_of_line(graph, nested, depth + 1, max, out)
            }
            PropertyKind::Struct(nested) | PropertyKind::StructArray(nested) => {
                if !out.contains(&nested) {
                    out.push(nested);
                }
            }
            _ => {}
        }
    }
}

/// Leaves a class would have if it were mapped, used for views of classes
/// without storage of their own. Struct tables contribute nothing.
pub(crate) fn leaf_shapes(graph: &ClassGraph, class: ClassId, options: &Options) -> Vec<LeafShape> {
    let mut out = vec![];
    for property in graph.properties(class) {
        collect_shapes(graph, property, "", 0, options.max_inline_struct_depth, &mut out);
    }
    out
}

fn collect_shapes(
    graph: &ClassGraph,
    property: &Property,
    prefix: &str,
    depth: usize,
    max: usize,
    out: &mut Vec<LeafShape>,
) {
    let access = join(prefix, &property.name, '.');
    let leaf = |access_string: String, ty: PrimitiveType, array: bool| LeafShape {
        access_string,
        ty,
        array,
    };

    match &property.kind {
        PropertyKind::Primitive(ty) => match ty.point_coordinates() {
            Some(coordinates) => out.extend(
                coordinates
                    .iter()
                    .map(|coordinate| leaf(format!("{access}.{coordinate}"), PrimitiveType::Double, false)),
            ),
            None => out.push(leaf(access, *ty, false)),
        },
        PropertyKind::PrimitiveArray(ty) => out.push(leaf(access, *ty, true)),
        PropertyKind::Struct(nested) if depth < max => {
            for member in graph.properties(*nested) {
                collect_shapes(graph, member, &access, depth + 1, max, out);
            }
        }
        PropertyKind::Struct(_) | PropertyKind::StructArray(_) => {}
        PropertyKind::Navigation { relationship, .. } => {
            out.push(leaf(format!("{access}.Id"), PrimitiveType::Long, false));
            if has_rel_class_id(graph, *relationship) {
                out.push(leaf(format!("{access}.RelECClassId"), PrimitiveType::Long, false));
            }
        }
    }
}
