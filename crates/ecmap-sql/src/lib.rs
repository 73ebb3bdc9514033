pub mod migration;
pub use migration::migrate_table;

pub mod serializer;
pub use serializer::{Params, Serializer};

pub mod stmt;
pub use stmt::Statement;
