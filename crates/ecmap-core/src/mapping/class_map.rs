use super::{MapStrategyInfo, PropertyMapCollection, SchemaMappingSession};
use crate::{
    schema::{
        db::{ColumnId, TableId},
        ec::{ClassId, End},
    },
    stmt::{Expr, Value},
};

/// The persistence binding of one class: strategy, primary table and
/// property maps.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMap {
    pub class: ClassId,

    pub strategy: MapStrategyInfo,

    pub kind: ClassMapKind,

    /// Primary table. The null table for unmapped classes and mixins; the
    /// foreign-key end's table for end-table relationships.
    pub table: TableId,

    /// Class map of the base class, if the base is mapped.
    pub base: Option<ClassId>,

    pub property_maps: PropertyMapCollection,

    /// Created or changed since the metadata was last saved.
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMapKind {
    Entity,
    Struct,
    Mixin,
    RelationshipEndTable(EndTableInfo),
    RelationshipLinkTable(LinkTableInfo),
    Unmapped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndTableInfo {
    /// End whose table stores the foreign key.
    pub foreign_key_end: End,

    /// Column holding the referenced end's instance id.
    pub foreign_key_column: ColumnId,

    /// Column holding the relationship's class id, when the relationship has
    /// subclasses or is abstract.
    pub rel_class_id_column: Option<ColumnId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkTableInfo {
    pub source_column: ColumnId,
    pub target_column: ColumnId,
}

/// Builds class-discrimination predicates for hand-written queries over a
/// class map's table.
#[derive(Debug)]
pub struct NativeSqlConverter<'a> {
    session: &'a SchemaMappingSession,
    class_map: &'a ClassMap,
}

impl ClassMap {
    pub fn is_unmapped(&self) -> bool {
        matches!(self.kind, ClassMapKind::Unmapped)
    }

    pub fn is_mixin(&self) -> bool {
        matches!(self.kind, ClassMapKind::Mixin)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(
            self.kind,
            ClassMapKind::RelationshipEndTable(_) | ClassMapKind::RelationshipLinkTable(_)
        )
    }

    /// Returns `true` if instances of the class are rows of its primary table.
    pub fn stores_rows(&self) -> bool {
        matches!(
            self.kind,
            ClassMapKind::Entity | ClassMapKind::Struct | ClassMapKind::RelationshipLinkTable(_)
        )
    }

    pub fn end_table(&self) -> Option<&EndTableInfo> {
        match &self.kind {
            ClassMapKind::RelationshipEndTable(info) => Some(info),
            _ => None,
        }
    }

    pub fn link_table(&self) -> Option<&LinkTableInfo> {
        match &self.kind {
            ClassMapKind::RelationshipLinkTable(info) => Some(info),
            _ => None,
        }
    }

    pub fn native_sql_converter<'a>(
        &'a self,
        session: &'a SchemaMappingSession,
    ) -> NativeSqlConverter<'a> {
        NativeSqlConverter {
            session,
            class_map: self,
        }
    }
}

impl NativeSqlConverter<'_> {
    /// Predicate restricting rows of the class map's table to the class (and,
    /// if `polymorphic`, its subclasses). `None` when every row qualifies.
    pub fn where_clause(&self, polymorphic: bool, table_alias: &str) -> Option<Expr> {
        let class_map = self.class_map;
        let session = self.session;

        match &class_map.kind {
            ClassMapKind::Unmapped => Some(Expr::always_false()),
            ClassMapKind::Mixin => None,
            ClassMapKind::RelationshipEndTable(info) => {
                let table = session.schema().table(class_map.table);
                let fk = table.column(info.foreign_key_column);
                let mut operands = vec![Expr::is_not_null(Expr::column(table_alias, &fk.name))];
                operands.extend(self.relationship_class_filter(info, polymorphic, table_alias));
                Some(Expr::and(operands))
            }
            ClassMapKind::Struct => {
                let table = session.schema().table(class_map.table);
                let mut operands = vec![];
                for name in ["ECPropertyPathId", "ECArrayIndex"] {
                    if table.column_by_name(name).is_some() {
                        operands.push(Expr::is_null(Expr::column(table_alias, name)));
                    }
                }
                operands.extend(self.class_filter(&self.wanted(polymorphic), table_alias));
                if operands.is_empty() {
                    None
                } else {
                    Some(Expr::and(operands))
                }
            }
            ClassMapKind::Entity | ClassMapKind::RelationshipLinkTable(_) => {
                self.class_filter(&self.wanted(polymorphic), table_alias)
            }
        }
    }

    /// The class, or its hierarchy, restricted to classes stored in the same
    /// table.
    fn wanted(&self, polymorphic: bool) -> Vec<ClassId> {
        let class = self.class_map.class;
        if !polymorphic {
            return vec![class];
        }

        self.session
            .graph()
            .hierarchy(class)
            .into_iter()
            .filter(|id| {
                self.session
                    .class_map(*id)
                    .map(|map| map.stores_rows() && map.table == self.class_map.table)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// `[alias].[ECClassId] IN (..)` over `wanted`, omitted when the table
    /// stores no other class.
    pub(crate) fn class_filter(&self, wanted: &[ClassId], table_alias: &str) -> Option<Expr> {
        let table = self.session.schema().table(self.class_map.table);
        let column = table.class_id_column()?;

        let stored = self.session.table_owners(table.id);
        if stored.iter().all(|owner| wanted.contains(owner)) {
            return None;
        }

        Some(class_id_in(table_alias, &column.name, wanted))
    }

    fn relationship_class_filter(
        &self,
        info: &EndTableInfo,
        polymorphic: bool,
        table_alias: &str,
    ) -> Option<Expr> {
        let column_id = info.rel_class_id_column?;
        let table = self.session.schema().table(self.class_map.table);
        let column = table.column(column_id);

        let sharing: Vec<ClassId> = self
            .session
            .class_maps()
            .filter(|map| {
                map.end_table()
                    .map(|other| other.rel_class_id_column == Some(column_id))
                    .unwrap_or(false)
            })
            .map(|map| map.class)
            .collect();

        let wanted: Vec<ClassId> = if polymorphic {
            self.session
                .graph()
                .hierarchy(self.class_map.class)
                .into_iter()
                .filter(|id| sharing.contains(id))
                .collect()
        } else {
            vec![self.class_map.class]
        };

        if sharing.iter().all(|id| wanted.contains(id)) {
            return None;
        }

        Some(class_id_in(table_alias, &column.name, &wanted))
    }
}

fn class_id_in(table_alias: &str, column: &str, classes: &[ClassId]) -> Expr {
    let mut classes = classes.to_vec();
    classes.sort();
    Expr::in_list(
        Expr::column(table_alias, column),
        classes.into_iter().map(|id| Expr::value(Value::I64(id.0 as i64))),
    )
}
