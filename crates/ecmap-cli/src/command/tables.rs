use crate::theme;
use anyhow::Result;
use clap::Parser;
use ecmap::Db;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct TablesCommand {}

impl TablesCommand {
    pub(crate) fn run(self, db: &Db, out: &mut dyn Write) -> Result<()> {
        let mapping = db.mapping()?;

        // The first table is the shared null table of unmapped classes.
        let tables: Vec<_> = mapping.schema().tables().skip(1).collect();
        if tables.is_empty() {
            writeln!(out, "  {}", theme::note("No tables mapped."))?;
            return Ok(());
        }

        for table in tables {
            writeln!(
                out,
                "  {} {} ({:?}, {} columns)",
                theme::arrow(),
                table.name,
                table.kind,
                table.persisted_columns().count()
            )?;
        }

        Ok(())
    }
}
