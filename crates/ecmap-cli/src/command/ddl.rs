use crate::theme;
use anyhow::Result;
use clap::Parser;
use ecmap::Db;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct DdlCommand {
    /// Table name
    table: String,
}

impl DdlCommand {
    pub(crate) fn run(self, db: &Db, out: &mut dyn Write) -> Result<()> {
        match db.mapping()?.create_table_sql(&self.table)? {
            Some(sql) => writeln!(out, "{sql}")?,
            None => writeln!(out, "{}", theme::note("(no DDL)"))?,
        }
        Ok(())
    }
}
