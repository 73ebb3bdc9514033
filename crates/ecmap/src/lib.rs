mod catalog;

pub mod db;
pub use db::{Builder, Db, ImportReport, Mapped, Row, SelectView};

pub use ecmap_core::{
    mapping::{self, ClassMap, SchemaMappingSession},
    schema::{
        self,
        ec::{ClassDef, PrimitiveType, PropertyDef, SchemaDef},
    },
    stmt::Value,
    view, Error, Result,
};
