use super::{View, ViewColumn};
use crate::{
    mapping::{
        leaf_shapes, ClassIdSource, ClassMap, ClassMapKind, PropertyMap, PropertyMapKind,
        SchemaMappingSession, CLASS_ID, INSTANCE_ID,
    },
    schema::{
        db::{ColumnId, ColumnType, TableId},
        ec::{Class, ClassId, End},
    },
    stmt::{Expr, Query, Select, Source, Value},
    Error, Result,
};

/// Builds the select view of a class. With `polymorphic`, rows of subclasses
/// are included.
///
/// The output is deterministic: unchanged mapping metadata produces an equal
/// view.
pub fn generate_select_view(
    session: &SchemaMappingSession,
    class: ClassId,
    polymorphic: bool,
) -> Result<View> {
    let class_map = session
        .class_map(class)
        .ok_or_else(|| Error::view_generation(format!("class {class} is not mapped")))?;
    let definition = session.graph().class(class);

    let generator = Generator {
        session,
        class: definition,
    };

    let (columns, query) = match &class_map.kind {
        ClassMapKind::Unmapped => generator.null_view(),
        ClassMapKind::Mixin => generator.mixin_view()?,
        ClassMapKind::RelationshipEndTable(_) => generator.end_table_view(class_map, polymorphic)?,
        ClassMapKind::Entity | ClassMapKind::Struct | ClassMapKind::RelationshipLinkTable(_) => {
            generator.table_view(class_map, polymorphic)?
        }
    };

    tracing::trace!(class = %definition.full_name(), polymorphic, "generated view");

    Ok(View {
        name: format!("{}_{}_View", definition.schema_alias, definition.name),
        class,
        columns,
        query,
    })
}

struct Generator<'a> {
    session: &'a SchemaMappingSession,
    class: &'a Class,
}

impl Generator<'_> {
    /// Zero rows with the class's column shape.
    fn null_view(&self) -> (Vec<ViewColumn>, Query) {
        let mut columns = self.system_columns();
        columns.extend(self.declared_columns());

        let mut select = Select::new(None);
        for column in &columns {
            select.item(Expr::null(), &column.name);
        }
        select.and_filter(Expr::always_false());

        (columns, Query::Select(select))
    }

    /// `UNION ALL` of the mixin's implementers, one select each.
    fn mixin_view(&self) -> Result<(Vec<ViewColumn>, Query)> {
        let session = self.session;
        let implementers: Vec<&ClassMap> = session
            .graph()
            .implementers(self.class.id)
            .into_iter()
            .filter_map(|id| session.class_map(id))
            .filter(|map| map.stores_rows())
            .collect();

        if implementers.is_empty() {
            return Ok(self.null_view());
        }

        let mut columns = self.system_columns();
        columns.extend(self.declared_columns());

        let mut selects = vec![];
        for implementer in implementers {
            let table = session.schema().table(implementer.table);
            let mut source = Source::table(&table.name);
            let mut select = Select::new(None);

            for column in &columns {
                let expr = if column.name == CLASS_ID {
                    Expr::cast(class_id_value(implementer.class), ColumnType::Integer)
                } else {
                    let map = self.member(implementer, &column.name)?;
                    self.project(implementer, map, &mut source)?
                };
                select.item(expr, &column.name);
            }

            if let Some(filter) = implementer
                .native_sql_converter(session)
                .class_filter(&[implementer.class], &table.name)
            {
                select.and_filter(filter);
            }
            select.from = Some(source);
            selects.push(select);
        }

        Ok((columns, Query::union(selects)))
    }

    /// Relationship stored as a foreign key: rows of the foreign-key end's
    /// table whose foreign key is set.
    fn end_table_view(
        &self,
        class_map: &ClassMap,
        polymorphic: bool,
    ) -> Result<(Vec<ViewColumn>, Query)> {
        let session = self.session;
        let columns = self.leaf_columns(class_map);
        let table = session.schema().table(class_map.table);

        let mut source = Source::table(&table.name);
        let mut select = Select::new(None);
        for column in &columns {
            let map = self.member(class_map, &column.name)?;
            let expr = self.project(class_map, map, &mut source)?;
            select.item(expr, &column.name);
        }

        if let Some(filter) = class_map
            .native_sql_converter(session)
            .where_clause(polymorphic, &table.name)
        {
            select.and_filter(filter);
        }
        select.from = Some(source);

        Ok((columns, Query::Select(select)))
    }

    /// Entities, structs and link-table relationships: one select per table
    /// holding rows of the class (or, if `polymorphic`, of its subclasses).
    fn table_view(
        &self,
        class_map: &ClassMap,
        polymorphic: bool,
    ) -> Result<(Vec<ViewColumn>, Query)> {
        let session = self.session;
        let columns = self.leaf_columns(class_map);

        let mut groups: Vec<(TableId, Vec<&ClassMap>)> = vec![];
        for member in self.members(class_map, polymorphic) {
            match groups.iter_mut().find(|(table, _)| *table == member.table) {
                Some((_, maps)) => maps.push(member),
                None => groups.push((member.table, vec![member])),
            }
        }

        let mut selects = vec![];
        for (table, maps) in groups {
            let table = session.schema().table(table);
            let branch = maps[0];

            let mut source = Source::table(&table.name);
            let mut select = Select::new(None);
            for column in &columns {
                let map = self.member(branch, &column.name)?;
                let expr = self.project(branch, map, &mut source)?;
                select.item(expr, &column.name);
            }

            let skip_filter = polymorphic && matches!(class_map.kind, ClassMapKind::Struct);
            if !skip_filter {
                let wanted: Vec<ClassId> = maps.iter().map(|map| map.class).collect();
                if let Some(filter) = branch
                    .native_sql_converter(session)
                    .class_filter(&wanted, &table.name)
                {
                    select.and_filter(filter);
                }
            }

            select.from = Some(source);
            selects.push(select);
        }

        Ok((columns, Query::union(selects)))
    }

    /// Class maps contributing rows, ordered by class id.
    fn members<'a>(&'a self, class_map: &'a ClassMap, polymorphic: bool) -> Vec<&'a ClassMap> {
        if !polymorphic {
            return vec![class_map];
        }

        self.session
            .graph()
            .hierarchy(class_map.class)
            .into_iter()
            .filter_map(|id| self.session.class_map(id))
            .filter(|map| map.stores_rows())
            .collect()
    }

    fn member<'a>(&'a self, class_map: &ClassMap, access: &str) -> Result<&'a PropertyMap> {
        self.session
            .find_property_map(class_map.class, access)
            .ok_or_else(|| {
                Error::view_generation(format!(
                    "class {} has no property map for `{access}`",
                    self.session.graph().class(class_map.class).full_name()
                ))
            })
    }

    /// Expression producing a leaf's value from the rows of `class_map`'s
    /// table. Constraint class ids stored in another table add a join to
    /// `source`.
    fn project(&self, class_map: &ClassMap, map: &PropertyMap, source: &mut Source) -> Result<Expr> {
        let session = self.session;

        match &map.kind {
            PropertyMapKind::InstanceId { column }
            | PropertyMapKind::Primitive { column, .. }
            | PropertyMapKind::PrimitiveArray { column, .. }
            | PropertyMapKind::ConstraintId { column, .. } => Ok(self.column(*column)),
            PropertyMapKind::ClassId { column, .. } => Ok(match column {
                Some(column) => self.column(*column),
                None => Expr::value(class_id_value(class_map.class)),
            }),
            PropertyMapKind::ConstraintClassId { end, source: origin } => match origin {
                ClassIdSource::Literal(class) => Ok(Expr::value(class_id_value(*class))),
                ClassIdSource::Local(column) => Ok(self.column(*column)),
                ClassIdSource::Join(table) => self.join_class_id(class_map, *end, *table, source),
            },
            _ => Err(Error::view_generation(format!(
                "`{}` is not a column-bound property map",
                map.access_string
            ))),
        }
    }

    /// `LEFT JOIN [T] [<End>ECClassPrimaryTable] ON [..].[ECInstanceId] = <end id>`
    fn join_class_id(
        &self,
        class_map: &ClassMap,
        end: End,
        table: TableId,
        source: &mut Source,
    ) -> Result<Expr> {
        let session = self.session;
        let joined = session.schema().table(table);
        let alias = format!("{}ECClassPrimaryTable", end.prefix());

        let (Some(instance_id), Some(class_id)) =
            (joined.instance_id_column(), joined.class_id_column())
        else {
            return Err(Error::view_generation(format!(
                "the {} classes of {} are resolved through table `{}`, which has no class-id column",
                end.prefix().to_ascii_lowercase(),
                self.class.full_name(),
                joined.name
            )));
        };

        let end_id = self.member(class_map, &format!("{}{INSTANCE_ID}", end.prefix()))?;
        let Some(end_column) = end_id.column() else {
            return Err(Error::view_generation(format!(
                "`{}` binds no column",
                end_id.access_string
            )));
        };

        if !source.joins.iter().any(|join| join.table.alias.as_deref() == Some(alias.as_str())) {
            source.left_join(
                &joined.name,
                &alias,
                Expr::eq(
                    Expr::column(&alias, &instance_id.name),
                    self.column(end_column),
                ),
            );
        }

        Ok(Expr::column(alias, &class_id.name))
    }

    fn column(&self, column: ColumnId) -> Expr {
        let table = self.session.schema().table(column.table);
        Expr::column(&table.name, &table.column(column).name)
    }

    /// View columns of a mapped class: its leaves, in property order.
    fn leaf_columns(&self, class_map: &ClassMap) -> Vec<ViewColumn> {
        self.session
            .leaves(class_map)
            .into_iter()
            .map(|leaf| match &leaf.kind {
                PropertyMapKind::Primitive { ty, .. } => {
                    ViewColumn::new(&leaf.access_string, *ty, false)
                }
                PropertyMapKind::PrimitiveArray { ty, .. } => {
                    ViewColumn::new(&leaf.access_string, *ty, true)
                }
                _ => ViewColumn::system(&leaf.access_string),
            })
            .collect()
    }

    fn system_columns(&self) -> Vec<ViewColumn> {
        let mut columns = vec![ViewColumn::system(INSTANCE_ID), ViewColumn::system(CLASS_ID)];
        if self.class.is_relationship() {
            for end in [End::Source, End::Target] {
                columns.push(ViewColumn::system(format!("{}{INSTANCE_ID}", end.prefix())));
                columns.push(ViewColumn::system(format!("{}{CLASS_ID}", end.prefix())));
            }
        }
        columns
    }

    /// Columns derived from the class definition, for classes without
    /// property maps of their own.
    fn declared_columns(&self) -> Vec<ViewColumn> {
        leaf_shapes(self.session.graph(), self.class.id, self.session.options())
            .into_iter()
            .map(|shape| ViewColumn::new(shape.access_string, shape.ty, shape.array))
            .collect()
    }
}

fn class_id_value(class: ClassId) -> Value {
    Value::I64(class.0 as i64)
}
