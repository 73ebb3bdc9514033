use super::{ClassId, PropertyId};

use std::collections::HashMap;

/// Allocates class and property ids.
///
/// Ids handed out once are remembered by qualified name, so resolving the same
/// definitions twice yields the same ids. Previously persisted ids are seeded
/// through [`Ids::insert_class`] and [`Ids::insert_property`].
#[derive(Debug, Default, Clone)]
pub struct Ids {
    classes: HashMap<String, ClassId>,
    properties: HashMap<(ClassId, String), PropertyId>,
    next_class: u64,
    next_property: u64,
}

impl Ids {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already allocated class id.
    pub fn insert_class(&mut self, schema: &str, class: &str, id: ClassId) {
        self.next_class = self.next_class.max(id.0);
        self.classes.insert(class_key(schema, class), id);
    }

    /// Registers an already allocated property id.
    pub fn insert_property(&mut self, class: ClassId, property: &str, id: PropertyId) {
        self.next_property = self.next_property.max(id.0);
        self.properties
            .insert((class, property.to_ascii_lowercase()), id);
    }

    pub fn class_id(&mut self, schema: &str, class: &str) -> ClassId {
        let next = &mut self.next_class;
        *self
            .classes
            .entry(class_key(schema, class))
            .or_insert_with(|| {
                *next += 1;
                ClassId(*next)
            })
    }

    pub fn property_id(&mut self, class: ClassId, property: &str) -> PropertyId {
        let next = &mut self.next_property;
        *self
            .properties
            .entry((class, property.to_ascii_lowercase()))
            .or_insert_with(|| {
                *next += 1;
                PropertyId(*next)
            })
    }

    /// All known class ids, keyed by lower-cased `schema:class`.
    pub fn classes(&self) -> impl Iterator<Item = (&str, ClassId)> + '_ {
        self.classes.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

fn class_key(schema: &str, class: &str) -> String {
    format!("{}:{}", schema, class).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_seeded() {
        let mut ids = Ids::new();
        ids.insert_class("Zoo", "Animal", ClassId(7));

        assert_eq!(ids.class_id("zoo", "ANIMAL"), ClassId(7));
        assert_eq!(ids.class_id("Zoo", "Dog"), ClassId(8));
        assert_eq!(ids.class_id("Zoo", "Dog"), ClassId(8));

        let name = ids.property_id(ClassId(7), "Name");
        assert_eq!(ids.property_id(ClassId(7), "name"), name);
        assert_ne!(ids.property_id(ClassId(8), "Name"), name);
    }
}
