use super::ClassMap;
use crate::{
    schema::ec::{
        Class, ClassGraph, Direction, End, MapStrategyHint, PropertyKind, RelationshipMapHint,
    },
    Error, Result,
};

/// Policy governing which table(s) a class's instances occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapStrategy {
    /// Not mapped. Subclasses resolve on their own.
    DoNotMap,

    /// Not mapped, together with every subclass.
    DoNotMapHierarchy,

    /// The class and its subclasses share one table, discriminated by a
    /// class-id column.
    TablePerHierarchy,

    /// Own table, not inherited by subclasses.
    TableForThisClass,

    /// Own table for the class and for each of its subclasses.
    TablePerClass,

    /// Stored in the base class's table.
    InParentTable,

    /// A named table shared with unrelated classes.
    SharedTableForThisClass,

    /// A pre-existing table the engine maps onto but never alters.
    ExistingTable,

    /// Relationship stored as a foreign key in the source end's table.
    RelationshipSourceTable,

    /// Relationship stored as a foreign key in the target end's table.
    RelationshipTargetTable,

    /// Relationship stored in its own link table.
    LinkTable,

    /// Mixin. No storage of its own.
    Mixin,
}

/// A resolved strategy with its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapStrategyInfo {
    pub strategy: MapStrategy,

    /// Subclasses without a strategy of their own inherit this one.
    pub applies_to_subclasses: bool,

    /// Data properties are stored in untyped shared columns.
    pub shared_columns: bool,
}

/// Table a class should be stored in, as decided by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum TableTarget {
    /// The null table.
    Null,

    /// No table of its own (mixins, end-table relationships).
    None,

    /// The base class map's primary table.
    Base,

    /// A table found or created by name.
    Own { name: String, existing: bool },
}

#[derive(Debug)]
pub(super) struct Resolution {
    pub(super) info: MapStrategyInfo,
    pub(super) target: TableTarget,
}

impl MapStrategy {
    /// Stable code stored in the class-map metadata table.
    pub fn code(self) -> i64 {
        match self {
            MapStrategy::DoNotMap => 0,
            MapStrategy::DoNotMapHierarchy => 1,
            MapStrategy::TablePerHierarchy => 2,
            MapStrategy::TableForThisClass => 3,
            MapStrategy::TablePerClass => 4,
            MapStrategy::InParentTable => 5,
            MapStrategy::SharedTableForThisClass => 6,
            MapStrategy::ExistingTable => 7,
            MapStrategy::RelationshipSourceTable => 8,
            MapStrategy::RelationshipTargetTable => 9,
            MapStrategy::LinkTable => 10,
            MapStrategy::Mixin => 11,
        }
    }

    pub fn is_not_mapped(self) -> bool {
        matches!(self, MapStrategy::DoNotMap | MapStrategy::DoNotMapHierarchy)
    }

    /// Returns `true` for the foreign-key relationship strategies.
    pub fn is_end_table(self) -> bool {
        matches!(
            self,
            MapStrategy::RelationshipSourceTable | MapStrategy::RelationshipTargetTable
        )
    }

    /// For end-table strategies, the end whose table stores the foreign key.
    pub fn foreign_key_end(self) -> Option<End> {
        match self {
            MapStrategy::RelationshipSourceTable => Some(End::Source),
            MapStrategy::RelationshipTargetTable => Some(End::Target),
            _ => None,
        }
    }

    /// Strategies whose table is shared between a class and its subclasses.
    fn shares_table_with_subclasses(self) -> bool {
        matches!(
            self,
            MapStrategy::TablePerHierarchy
                | MapStrategy::SharedTableForThisClass
                | MapStrategy::InParentTable
        )
    }
}

impl MapStrategyInfo {
    fn new(strategy: MapStrategy) -> MapStrategyInfo {
        MapStrategyInfo {
            strategy,
            applies_to_subclasses: false,
            shared_columns: false,
        }
    }

    fn applies(mut self, applies: bool) -> MapStrategyInfo {
        self.applies_to_subclasses = applies;
        self
    }

    /// Option bits stored next to the strategy code.
    pub fn options_code(&self) -> i64 {
        self.shared_columns as i64
    }
}

/// Decides the strategy of a class.
///
/// `base` is the class map of the class's base class, already mapped. Does not
/// touch any table.
pub(super) fn resolve(
    graph: &ClassGraph,
    class: &Class,
    base: Option<&ClassMap>,
    base_instance_id: Option<&str>,
) -> Result<Resolution> {
    let resolution = if class.is_mixin() {
        Resolution {
            info: MapStrategyInfo::new(MapStrategy::Mixin),
            target: TableTarget::None,
        }
    } else if class.is_relationship() {
        resolve_relationship(graph, class, base)?
    } else if class.is_struct() {
        resolve_struct(class, base)
    } else {
        resolve_entity(graph, class, base, base_instance_id)?
    };

    tracing::debug!(
        class = %class.full_name(),
        strategy = ?resolution.info.strategy,
        target = ?resolution.target,
        "resolved map strategy"
    );

    Ok(resolution)
}

fn default_table_name(class: &Class) -> String {
    format!("{}_{}", class.schema_alias, class.name)
}

fn own_table(class: &Class) -> TableTarget {
    TableTarget::Own {
        name: class
            .map
            .table_name
            .clone()
            .unwrap_or_else(|| default_table_name(class)),
        existing: false,
    }
}

fn resolve_struct(class: &Class, base: Option<&ClassMap>) -> Resolution {
    let info = MapStrategyInfo::new(MapStrategy::TableForThisClass).applies(true);

    let target = match base {
        Some(base) if !base.strategy.strategy.is_not_mapped() => TableTarget::Base,
        _ => TableTarget::Own {
            name: format!("{}_ArrayOf{}", class.schema_alias, class.name),
            existing: false,
        },
    };

    Resolution { info, target }
}

fn resolve_entity(
    graph: &ClassGraph,
    class: &Class,
    base: Option<&ClassMap>,
    base_instance_id: Option<&str>,
) -> Result<Resolution> {
    let hint = &class.map;

    // Inherited strategy, if the base's applies to this class.
    let inherited = base.filter(|base| base.strategy.applies_to_subclasses);

    if let Some(base) = inherited {
        if base.strategy.strategy == MapStrategy::DoNotMapHierarchy {
            return Ok(Resolution {
                info: base.strategy,
                target: TableTarget::Null,
            });
        }
    }

    if hint.existing_table {
        let Some(name) = &hint.table_name else {
            return Err(Error::map_failure(format!(
                "class {} requests an existing table but names none",
                class.full_name()
            )));
        };
        return Ok(Resolution {
            info: MapStrategyInfo::new(MapStrategy::ExistingTable),
            target: TableTarget::Own {
                name: name.clone(),
                existing: true,
            },
        });
    }

    let base_shares_table = inherited
        .map(|base| base.strategy.strategy.shares_table_with_subclasses())
        .unwrap_or(false);

    // A redefined key column would split the shared table's primary key.
    if base_shares_table {
        if let (Some(own), Some(base)) = (&hint.instance_id_column, base_instance_id) {
            if !own.eq_ignore_ascii_case(base) && hint.table_name.is_none() {
                return Err(Error::map_failure(format!(
                    "class {} redefines the instance-id column `{own}` of its base's table (`{base}`)",
                    class.full_name()
                )));
            }
        }
    }

    let explicit = hint.strategy;

    if let Some(requested) = explicit {
        if base_shares_table
            && hint.table_name.is_none()
            && matches!(
                requested,
                MapStrategyHint::TablePerHierarchy
                    | MapStrategyHint::TablePerClass
                    | MapStrategyHint::TableForThisClass
            )
        {
            return Err(Error::map_failure(format!(
                "class {} requests {requested:?} but inherits the shared table of its base; \
                 give it a table name of its own",
                class.full_name()
            )));
        }

        return resolve_explicit(graph, class, base, requested);
    }

    if let Some(base) = inherited {
        let info = base.strategy;
        let resolution = match info.strategy {
            MapStrategy::TablePerHierarchy | MapStrategy::SharedTableForThisClass
                if hint.table_name.is_none() =>
            {
                Resolution {
                    info,
                    target: TableTarget::Base,
                }
            }
            MapStrategy::InParentTable if hint.table_name.is_none() => Resolution {
                info,
                target: TableTarget::Base,
            },
            MapStrategy::TablePerClass => Resolution {
                info: MapStrategyInfo {
                    shared_columns: info.shared_columns || hint.shared_columns,
                    ..info
                },
                target: own_table(class),
            },
            _ => Resolution {
                info: MapStrategyInfo::new(MapStrategy::TableForThisClass),
                target: own_table(class),
            },
        };
        return Ok(resolution);
    }

    // No hint: own table.
    let mut info = MapStrategyInfo::new(MapStrategy::TableForThisClass);
    info.shared_columns = hint.shared_columns;
    if let Some(applies) = hint.apply_to_subclasses {
        info.applies_to_subclasses = applies;
    }
    Ok(Resolution {
        info,
        target: own_table(class),
    })
}

fn resolve_explicit(
    graph: &ClassGraph,
    class: &Class,
    base: Option<&ClassMap>,
    requested: MapStrategyHint,
) -> Result<Resolution> {
    let hint = &class.map;

    let (strategy, applies, target) = match requested {
        MapStrategyHint::DoNotMap => {
            let has_mapped_subclasses = graph.derived(class.id).iter().any(|derived| {
                graph.class(*derived).map.strategy != Some(MapStrategyHint::DoNotMapHierarchy)
            });

            if !class.is_abstract() && has_mapped_subclasses {
                return Err(Error::map_failure(format!(
                    "DoNotMap on class {} which is not abstract and has mapped subclasses",
                    class.full_name()
                )));
            }
            (MapStrategy::DoNotMap, false, TableTarget::Null)
        }
        MapStrategyHint::DoNotMapHierarchy => {
            (MapStrategy::DoNotMapHierarchy, true, TableTarget::Null)
        }
        MapStrategyHint::TablePerHierarchy => {
            (MapStrategy::TablePerHierarchy, true, own_table(class))
        }
        MapStrategyHint::TablePerClass => (MapStrategy::TablePerClass, true, own_table(class)),
        MapStrategyHint::TableForThisClass => {
            (MapStrategy::TableForThisClass, false, own_table(class))
        }
        MapStrategyHint::InParentTable => {
            let mapped_base = base.filter(|base| {
                !base.strategy.strategy.is_not_mapped()
                    && base.strategy.strategy != MapStrategy::Mixin
            });
            if mapped_base.is_none() {
                return Err(Error::map_failure(format!(
                    "InParentTable on class {} requires a mapped base class",
                    class.full_name()
                )));
            }
            (MapStrategy::InParentTable, false, TableTarget::Base)
        }
        MapStrategyHint::SharedTableForThisClass => {
            let Some(name) = &hint.table_name else {
                return Err(Error::map_failure(format!(
                    "SharedTableForThisClass on class {} requires a table name",
                    class.full_name()
                )));
            };
            (
                MapStrategy::SharedTableForThisClass,
                true,
                TableTarget::Own {
                    name: name.clone(),
                    existing: false,
                },
            )
        }
    };

    let info = MapStrategyInfo {
        strategy,
        applies_to_subclasses: hint.apply_to_subclasses.unwrap_or(applies),
        shared_columns: hint.shared_columns,
    };

    Ok(Resolution { info, target })
}

fn resolve_relationship(
    graph: &ClassGraph,
    class: &Class,
    base: Option<&ClassMap>,
) -> Result<Resolution> {
    let hint = &class.map;
    let Some(relationship) = &class.relationship else {
        return Err(Error::invalid_schema(format!(
            "relationship class {} has no constraints",
            class.full_name()
        )));
    };

    if let Some(base) = base {
        let strategy = base.strategy.strategy;
        if strategy == MapStrategy::DoNotMapHierarchy {
            return Ok(Resolution {
                info: base.strategy,
                target: TableTarget::Null,
            });
        }
        if strategy == MapStrategy::LinkTable {
            return Ok(Resolution {
                info: base.strategy,
                target: TableTarget::Base,
            });
        }
        if strategy.is_end_table() {
            return Ok(Resolution {
                info: base.strategy,
                target: TableTarget::None,
            });
        }
    }

    match hint.strategy {
        Some(MapStrategyHint::DoNotMap) => {
            return Ok(Resolution {
                info: MapStrategyInfo::new(MapStrategy::DoNotMap),
                target: TableTarget::Null,
            })
        }
        Some(MapStrategyHint::DoNotMapHierarchy) => {
            return Ok(Resolution {
                info: MapStrategyInfo::new(MapStrategy::DoNotMapHierarchy).applies(true),
                target: TableTarget::Null,
            })
        }
        _ => {}
    }

    let navigation_end = graph
        .navigation_properties(class.id)
        .first()
        .map(|property| match property.kind {
            PropertyKind::Navigation {
                direction: Direction::Backward,
                ..
            } => End::Target,
            _ => End::Source,
        });

    let strategy = match hint.relationship {
        Some(RelationshipMapHint::ForeignKeyOnSource) => MapStrategy::RelationshipTargetTable,
        Some(RelationshipMapHint::ForeignKeyOnTarget) => MapStrategy::RelationshipSourceTable,
        Some(RelationshipMapHint::LinkTable) => MapStrategy::LinkTable,
        None => match navigation_end {
            Some(End::Source) => MapStrategy::RelationshipSourceTable,
            Some(End::Target) => MapStrategy::RelationshipTargetTable,
            None => {
                let source_many = relationship.source.multiplicity.is_many();
                let target_many = relationship.target.multiplicity.is_many();
                match (source_many, target_many) {
                    (true, true) => MapStrategy::LinkTable,
                    (_, true) => MapStrategy::RelationshipTargetTable,
                    _ => MapStrategy::RelationshipSourceTable,
                }
            }
        },
    };

    if let Some(fk_end) = strategy.foreign_key_end() {
        if !class.properties.is_empty() {
            return Err(Error::map_failure(format!(
                "relationship {} is stored as a foreign key and cannot have properties",
                class.full_name()
            )));
        }

        let referenced = relationship.constraint(fk_end.other());
        if referenced.multiplicity.is_many() {
            return Err(Error::map_failure(format!(
                "relationship {} stores a foreign key in the {} table, but the {} end has \
                 multiplicity {}",
                class.full_name(),
                fk_end.prefix().to_ascii_lowercase(),
                fk_end.other().prefix().to_ascii_lowercase(),
                referenced.multiplicity
            )));
        }

        if let Some(nav_end) = navigation_end {
            if nav_end != fk_end {
                return Err(Error::map_failure(format!(
                    "navigation property of relationship {} is declared on the referenced end",
                    class.full_name()
                )));
            }
        }

        return Ok(Resolution {
            info: MapStrategyInfo::new(strategy).applies(true),
            target: TableTarget::None,
        });
    }

    Ok(link_table(class))
}

/// A relationship stored in its own link table.
pub(super) fn link_table(class: &Class) -> Resolution {
    Resolution {
        info: MapStrategyInfo::new(MapStrategy::LinkTable).applies(true),
        target: own_table(class),
    }
}
