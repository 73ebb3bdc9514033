use crate::theme;
use anyhow::Result;
use clap::Parser;
use ecmap::Db;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ViewCommand {
    /// Class name, `Schema:Class`
    class: String,

    /// Only instances of the class itself, not of its subclasses
    #[arg(long)]
    exact: bool,
}

impl ViewCommand {
    pub(crate) fn run(self, db: &Db, out: &mut dyn Write) -> Result<()> {
        let view = db.select_view(&self.class, !self.exact)?;

        writeln!(out)?;
        writeln!(out, "  {}", theme::heading(&view.name))?;
        writeln!(out)?;
        writeln!(out, "{};", view.sql)?;
        writeln!(out)?;

        for column in &view.columns {
            let array = if column.array { "[]" } else { "" };
            writeln!(out, "  {} {} {:?}{array}", theme::arrow(), column.name, column.ty)?;
        }

        Ok(())
    }
}
