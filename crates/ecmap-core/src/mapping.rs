//! Class-to-table mapping.
//!
//! A [`SchemaMappingSession`] owns every table and class map of one import.
//! Classes are mapped lazily in dependency order: a class's base, the struct
//! classes it stores out of line and, for relationships, the constraint
//! classes are mapped before the class itself.

mod binder;
pub use binder::InsertBinder;

mod builder;
pub(crate) use builder::leaf_shapes;

mod class_map;
pub use class_map::{ClassMap, ClassMapKind, EndTableInfo, LinkTableInfo, NativeSqlConverter};

mod finalize;

mod options;
pub use options::Options;

mod previous;
pub use previous::PreviousBindings;

mod property_map;
pub use property_map::{
    ClassIdSource, PropertyMap, PropertyMapCollection, PropertyMapId, PropertyMapKind,
};

mod relationship;

mod session;
pub use session::{Introspect, SchemaMappingSession};

mod strategy;
pub use strategy::{MapStrategy, MapStrategyInfo};

/// Name of the instance-id column and system property.
pub const INSTANCE_ID: &str = "ECInstanceId";

/// Name of the class-id column and system property.
pub const CLASS_ID: &str = "ECClassId";
