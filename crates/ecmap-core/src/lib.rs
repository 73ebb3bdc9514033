#[macro_use]
mod macros;

pub mod driver;
pub use driver::Connection;

mod error;
pub use error::Error;

pub mod mapping;
pub use mapping::{ClassMap, SchemaMappingSession};

pub mod schema;

pub mod stmt;

pub mod view;

/// A Result type alias that uses ecmap's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
