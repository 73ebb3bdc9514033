//! The object-oriented class model being mapped.
//!
//! Definitions ([`SchemaDef`] and friends) are plain serde documents. They are
//! resolved into a [`ClassGraph`], an arena of classes with stable ids and
//! resolved references, which is what the mapping code works against.

mod class;
pub use class::{Class, ClassId, ClassKind, Modifier};

mod def;
pub use def::{ClassDef, ConstraintDef, PropertyDef, PropertyKindDef, RelationshipDef, SchemaDef};

mod graph;
pub use graph::ClassGraph;

mod hint;
pub use hint::{ClassMapHint, IndexHint, MapStrategyHint, PropertyMapHint, RelationshipMapHint};

mod ids;
pub use ids::Ids;

mod property;
pub use property::{PrimitiveType, Property, PropertyId, PropertyKind};

mod relationship;
pub use relationship::{Constraint, Direction, End, Multiplicity, Relationship, Strength};
