mod ddl;
mod import;
mod tables;
mod view;

pub use ddl::DdlCommand;
pub use import::{read_schema_file, ImportCommand};
pub use tables::TablesCommand;
pub use view::ViewCommand;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import schema definition files (.toml or .json) and update the database
    Import(ImportCommand),

    /// Print the select view of a class
    View(ViewCommand),

    /// Print the CREATE TABLE statement of a table
    Ddl(DdlCommand),

    /// List the mapped tables
    Tables(TablesCommand),
}
