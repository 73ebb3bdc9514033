use super::{
    def::ConstraintDef, Class, ClassDef, ClassId, ClassKind, Constraint, End, Ids, Property,
    PropertyKind, PropertyKindDef, Relationship, SchemaDef,
};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// Resolved class model: every class of every imported schema, addressed by
/// [`ClassId`].
#[derive(Debug, Clone, Default)]
pub struct ClassGraph {
    /// Classes ordered by id.
    classes: IndexMap<ClassId, Class>,

    /// Lower-cased `schema:class` → id.
    by_name: HashMap<String, ClassId>,

    /// Lower-cased schema name → alias.
    schemas: IndexMap<String, String>,

    /// Direct subclasses (through `base`), ordered by id.
    derived: HashMap<ClassId, Vec<ClassId>>,
}

impl ClassGraph {
    /// Resolves a set of schema definitions into a graph.
    pub fn build(defs: &[SchemaDef], ids: &mut Ids) -> Result<ClassGraph> {
        let mut graph = ClassGraph::default();

        for def in defs {
            let key = def.name.to_ascii_lowercase();
            if graph.schemas.contains_key(&key) {
                return Err(Error::invalid_schema(format!(
                    "schema `{}` is defined more than once",
                    def.name
                )));
            }
            graph
                .schemas
                .insert(key, def.effective_alias().to_string());
        }

        // First pass: allocate ids so references can point anywhere.
        let mut pending = vec![];
        for def in defs {
            for class in &def.classes {
                let id = ids.class_id(&def.name, &class.name);
                let key = format!("{}:{}", def.name, class.name).to_ascii_lowercase();
                if graph.by_name.insert(key, id).is_some() {
                    return Err(Error::invalid_schema(format!(
                        "class `{}:{}` is defined more than once",
                        def.name, class.name
                    )));
                }
                pending.push((def, class, id));
            }
        }

        for (schema, def, id) in pending {
            let class = graph.resolve_class(schema, def, id, ids)?;
            graph.classes.insert(id, class);
        }

        graph.classes.sort_keys();

        for class in graph.classes.values() {
            if let Some(base) = class.base {
                graph.derived.entry(base).or_default().push(class.id);
            }
        }

        graph.verify()?;

        Ok(graph)
    }

    fn resolve_class(
        &self,
        schema: &SchemaDef,
        def: &ClassDef,
        id: ClassId,
        ids: &mut Ids,
    ) -> Result<Class> {
        let full_name = format!("{}:{}", schema.name, def.name);
        let resolve = |reference: &str| self.resolve_reference(&schema.name, reference, &full_name);

        let base = def.base.as_deref().map(resolve).transpose()?;
        let mixins = def
            .mixins
            .iter()
            .map(|mixin| resolve(mixin))
            .collect::<Result<Vec<_>>>()?;

        let mut properties = Vec::with_capacity(def.properties.len());
        let mut seen = HashSet::new();
        for property in &def.properties {
            if !seen.insert(property.name.to_ascii_lowercase()) {
                return Err(Error::invalid_schema(format!(
                    "property `{}` is declared twice on `{full_name}`",
                    property.name
                )));
            }

            let kind = match &property.kind {
                PropertyKindDef::Primitive { ty } => PropertyKind::Primitive(*ty),
                PropertyKindDef::PrimitiveArray { ty } => {
                    if ty.point_coordinates().is_some() {
                        return Err(Error::invalid_schema(format!(
                            "`{full_name}.{}`: arrays of points are not supported",
                            property.name
                        )));
                    }
                    PropertyKind::PrimitiveArray(*ty)
                }
                PropertyKindDef::Struct { class } => PropertyKind::Struct(resolve(class)?),
                PropertyKindDef::StructArray { class } => {
                    PropertyKind::StructArray(resolve(class)?)
                }
                PropertyKindDef::Navigation {
                    relationship,
                    direction,
                } => PropertyKind::Navigation {
                    relationship: resolve(relationship)?,
                    direction: *direction,
                },
            };

            properties.push(Property {
                id: ids.property_id(id, &property.name),
                class: id,
                name: property.name.clone(),
                kind,
                map: property.map.clone(),
            });
        }

        let relationship = match (&def.relationship, def.kind) {
            (Some(rel), ClassKind::Relationship) => {
                let constraint = |c: &ConstraintDef| -> Result<Constraint> {
                    Ok(Constraint {
                        classes: c
                            .classes
                            .iter()
                            .map(|class| resolve(class))
                            .collect::<Result<_>>()?,
                        multiplicity: c.multiplicity,
                        polymorphic: c.polymorphic,
                    })
                };
                Some(Relationship {
                    strength: rel.strength,
                    source: constraint(&rel.source)?,
                    target: constraint(&rel.target)?,
                })
            }
            (None, ClassKind::Relationship) if def.base.is_none() => {
                return Err(Error::invalid_schema(format!(
                    "relationship class `{full_name}` declares no constraints"
                )))
            }
            (Some(_), _) => {
                return Err(Error::invalid_schema(format!(
                    "`{full_name}` declares relationship constraints but is not a relationship class"
                )))
            }
            (None, _) => None,
        };

        Ok(Class {
            id,
            schema: schema.name.clone(),
            schema_alias: schema.effective_alias().to_string(),
            name: def.name.clone(),
            kind: def.kind,
            modifier: def.modifier,
            base,
            mixins,
            properties,
            relationship,
            map: def.map.clone(),
        })
    }

    fn resolve_reference(&self, schema: &str, reference: &str, from: &str) -> Result<ClassId> {
        let key = match reference.split_once(':') {
            Some(_) => reference.to_ascii_lowercase(),
            None => format!("{schema}:{reference}").to_ascii_lowercase(),
        };

        self.by_name.get(&key).copied().ok_or_else(|| {
            Error::invalid_schema(format!(
                "`{from}` references unknown class `{reference}`"
            ))
        })
    }

    /// Checks the invariants that can only be verified once every class is
    /// resolved.
    fn verify(&mut self) -> Result<()> {
        for class in self.classes.values() {
            // Base chains must terminate and stay within one class kind.
            let mut visited = HashSet::from([class.id]);
            let mut current = class;
            while let Some(base) = current.base {
                if !visited.insert(base) {
                    return Err(Error::invalid_schema(format!(
                        "class `{}` derives from itself",
                        class.full_name()
                    )));
                }
                current = &self.classes[&base];
                if current.kind != class.kind {
                    return Err(Error::invalid_schema(format!(
                        "`{}` cannot derive from `{}`: class kinds differ",
                        class.full_name(),
                        current.full_name()
                    )));
                }
            }

            for mixin in &class.mixins {
                if !self.classes[mixin].is_mixin() {
                    return Err(Error::invalid_schema(format!(
                        "`{}` lists `{}` as a mixin, but it is not a mixin class",
                        class.full_name(),
                        self.classes[mixin].full_name()
                    )));
                }
            }

            for property in &class.properties {
                match property.kind {
                    PropertyKind::Struct(target) | PropertyKind::StructArray(target)
                        if !self.classes[&target].is_struct() =>
                    {
                        return Err(Error::invalid_schema(format!(
                            "`{}.{}` uses `{}` as a struct, but it is not a struct class",
                            class.full_name(),
                            property.name,
                            self.classes[&target].full_name()
                        )));
                    }
                    PropertyKind::Navigation { relationship, .. }
                        if !self.classes[&relationship].is_relationship() =>
                    {
                        return Err(Error::invalid_schema(format!(
                            "navigation property `{}.{}` references `{}`, which is not a relationship class",
                            class.full_name(),
                            property.name,
                            self.classes[&relationship].full_name()
                        )));
                    }
                    _ => {}
                }
            }
        }

        let mut explored = HashSet::new();
        for id in self.classes.keys() {
            self.visit_parents(*id, &mut vec![], &mut explored)?;
        }

        // Derived relationship classes without own constraints inherit them.
        let inherited: Vec<(ClassId, Relationship)> = self
            .classes
            .values()
            .filter(|class| class.is_relationship() && class.relationship.is_none())
            .filter_map(|class| {
                self.ancestors(class.id)
                    .find_map(|base| self.classes[&base].relationship.clone())
                    .map(|rel| (class.id, rel))
            })
            .collect();

        for (id, relationship) in inherited {
            self.classes[&id].relationship = Some(relationship);
        }

        Ok(())
    }

    pub fn class(&self, id: impl Into<ClassId>) -> &Class {
        let id = id.into();
        self.classes
            .get(&id)
            .unwrap_or_else(|| panic!("no class with id {id:?}"))
    }

    pub fn get(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(&id)
    }

    /// Classes ordered by id.
    pub fn classes(&self) -> impl ExactSizeIterator<Item = &Class> + '_ {
        self.classes.values()
    }

    /// Finds a class by `Schema:Class` name, ignoring ASCII case.
    pub fn find(&self, full_name: &str) -> Option<&Class> {
        self.by_name
            .get(&full_name.to_ascii_lowercase())
            .map(|id| &self.classes[id])
    }

    /// The alias of a schema, if the schema is part of the graph.
    pub fn schema_alias(&self, schema: &str) -> Option<&str> {
        self.schemas
            .get(&schema.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Base class chain, nearest first. Mixins are not included.
    pub fn ancestors(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        let mut current = self.class(id).base;
        std::iter::from_fn(move || {
            let next = current?;
            current = self.class(next).base;
            Some(next)
        })
    }

    /// The topmost class of the base chain (the class itself if it has no base).
    pub fn root(&self, id: ClassId) -> ClassId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Direct subclasses, ordered by id.
    pub fn derived(&self, id: ClassId) -> &[ClassId] {
        self.derived.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The class and all of its subclasses, ordered by id.
    pub fn hierarchy(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            out.extend_from_slice(self.derived(out[i]));
            i += 1;
        }
        out.sort();
        out
    }

    /// Depth-first walk over base and mixin edges. `path` holds the classes
    /// being visited; `explored` those whose ancestry is known to be acyclic.
    fn visit_parents(
        &self,
        id: ClassId,
        path: &mut Vec<ClassId>,
        explored: &mut HashSet<ClassId>,
    ) -> Result<()> {
        if explored.contains(&id) {
            return Ok(());
        }

        if let Some(start) = path.iter().position(|visiting| *visiting == id) {
            let cycle: Vec<String> = path[start..]
                .iter()
                .chain([&id])
                .map(|class| self.classes[class].full_name())
                .collect();
            return Err(Error::invalid_schema(format!(
                "class `{}` inherits from itself: {}",
                self.classes[&id].full_name(),
                cycle.join(" -> ")
            )));
        }

        path.push(id);
        let class = &self.classes[&id];
        for parent in class.base.iter().chain(class.mixins.iter()) {
            self.visit_parents(*parent, path, explored)?;
        }
        path.pop();

        explored.insert(id);
        Ok(())
    }

    /// Returns `true` if `id` is `ancestor` or derives from it, through base
    /// classes or mixins.
    pub fn is_subclass_of(&self, id: ClassId, ancestor: ClassId) -> bool {
        if id == ancestor {
            return true;
        }

        let class = self.class(id);
        class
            .base
            .iter()
            .chain(class.mixins.iter())
            .any(|parent| self.is_subclass_of(*parent, ancestor))
    }

    /// Every property of the class, inherited ones first.
    ///
    /// Order: the base class's properties (recursively), then each mixin's
    /// properties, then the class's own. A property whose name is already
    /// present is skipped, so an override keeps its inherited position.
    pub fn properties(&self, id: ClassId) -> Vec<&Property> {
        let mut out: Vec<&Property> = vec![];
        self.collect_properties(id, &mut out);
        out
    }

    fn collect_properties<'a>(&'a self, id: ClassId, out: &mut Vec<&'a Property>) {
        let class = self.class(id);
        for parent in class.base.iter().chain(class.mixins.iter()) {
            self.collect_properties(*parent, out);
        }
        for property in &class.properties {
            if !out
                .iter()
                .any(|existing| existing.name.eq_ignore_ascii_case(&property.name))
            {
                out.push(property);
            }
        }
    }

    /// Concrete entity classes that apply the given mixin, ordered by id.
    pub fn implementers(&self, mixin: ClassId) -> Vec<ClassId> {
        self.classes
            .values()
            .filter(|class| class.is_entity() && !class.is_abstract())
            .filter(|class| self.is_subclass_of(class.id, mixin))
            .map(|class| class.id)
            .collect()
    }

    /// Concrete classes eligible at one end of a relationship, ordered by id.
    ///
    /// Polymorphic constraints include every subclass of the declared classes.
    /// Constraints naming mixins expand to the mixin's implementers.
    pub fn constraint_classes(&self, relationship: ClassId, end: End) -> Vec<ClassId> {
        let Some(rel) = &self.class(relationship).relationship else {
            return vec![];
        };
        let constraint = rel.constraint(end);

        let mut out = vec![];
        for class in &constraint.classes {
            let candidates = if self.class(*class).is_mixin() {
                self.implementers(*class)
            } else if constraint.polymorphic {
                self.hierarchy(*class)
            } else {
                vec![*class]
            };

            for candidate in candidates {
                if !self.class(candidate).is_abstract() && !out.contains(&candidate) {
                    out.push(candidate);
                }
            }
        }
        out.sort();
        out
    }

    /// Navigation properties declared in the graph for the given relationship
    /// (or one of its base relationships).
    pub fn navigation_properties(&self, relationship: ClassId) -> Vec<&Property> {
        self.classes
            .values()
            .flat_map(|class| class.properties.iter())
            .filter(|property| match property.kind {
                PropertyKind::Navigation {
                    relationship: target,
                    ..
                } => self.is_subclass_of(relationship, target),
                _ => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ec::{ClassDef, MapStrategyHint, ClassMapHint, PrimitiveType, PropertyDef};

    fn zoo() -> SchemaDef {
        SchemaDef::new("Zoo")
            .alias("zoo")
            .class(ClassDef::mixin("Named").property(PropertyDef::primitive(
                "Label",
                PrimitiveType::String,
            )))
            .class(
                ClassDef::entity("Animal")
                    .abstract_class()
                    .map(ClassMapHint::default().strategy(MapStrategyHint::TablePerHierarchy))
                    .property(PropertyDef::primitive("Name", PrimitiveType::String)),
            )
            .class(
                ClassDef::entity("Dog")
                    .base("Animal")
                    .mixin_of("Named")
                    .property(PropertyDef::primitive("Breed", PrimitiveType::String)),
            )
    }

    #[test]
    fn properties_are_base_first() {
        let graph = ClassGraph::build(&[zoo()], &mut Ids::new()).unwrap();
        let dog = graph.find("zoo:dog").unwrap();

        let names: Vec<_> = graph
            .properties(dog.id)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["Name", "Label", "Breed"]);
    }

    #[test]
    fn mixin_implementers() {
        let graph = ClassGraph::build(&[zoo()], &mut Ids::new()).unwrap();
        let named = graph.find("Zoo:Named").unwrap().id;
        let dog = graph.find("Zoo:Dog").unwrap().id;

        assert_eq!(graph.implementers(named), vec![dog]);
    }

    #[test]
    fn mixin_cycles_are_rejected() {
        let schema = SchemaDef::new("Zoo")
            .class(ClassDef::mixin("Named").mixin_of("Tagged"))
            .class(ClassDef::mixin("Tagged").mixin_of("Named"))
            .class(ClassDef::entity("Cat").mixin_of("Named"));

        let err = ClassGraph::build(&[schema], &mut Ids::new()).unwrap_err();
        assert!(err.is_invalid_schema(), "{err}");
        assert!(err.to_string().contains("inherits from itself"), "{err}");
    }

    #[test]
    fn a_mixin_on_a_base_chain_cycle_is_rejected() {
        let schema = SchemaDef::new("Zoo")
            .class(ClassDef::mixin("Named").mixin_of("Walker"))
            .class(ClassDef::mixin("Walker").base("Named"));

        let err = ClassGraph::build(&[schema], &mut Ids::new()).unwrap_err();
        assert!(err.is_invalid_schema(), "{err}");
    }

    #[test]
    fn shared_mixins_are_not_cycles() {
        let schema = SchemaDef::new("Zoo")
            .class(ClassDef::mixin("Named"))
            .class(ClassDef::mixin("Tagged").mixin_of("Named"))
            .class(ClassDef::entity("Cat").mixin_of("Named").mixin_of("Tagged"));

        let graph = ClassGraph::build(&[schema], &mut Ids::new()).unwrap();
        let cat = graph.find("Zoo:Cat").unwrap().id;
        let named = graph.find("Zoo:Named").unwrap().id;
        assert!(graph.is_subclass_of(cat, named));
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let schema = SchemaDef::new("Zoo").class(ClassDef::entity("Cat").base("Feline"));
        let err = ClassGraph::build(&[schema], &mut Ids::new()).unwrap_err();
        assert!(err.is_invalid_schema());
    }
}
