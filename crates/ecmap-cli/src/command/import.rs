use crate::theme;
use anyhow::{bail, Context, Result};
use clap::Parser;
use ecmap::{Db, SchemaDef};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
pub struct ImportCommand {
    /// Schema definition files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

impl ImportCommand {
    pub(crate) fn run(self, db: &Db, out: &mut dyn Write) -> Result<()> {
        let defs = self
            .files
            .iter()
            .map(read_schema_file)
            .collect::<Result<Vec<_>>>()?;

        writeln!(out)?;
        writeln!(out, "  {}", theme::heading("Import Schemas"))?;
        writeln!(out)?;

        let names: Vec<_> = defs.iter().map(|def| def.name.clone()).collect();
        let report = db
            .import_schemas(defs)
            .with_context(|| format!("failed to import {}", names.join(", ")))?;

        if report.statements.is_empty() {
            writeln!(out, "  {}", theme::note("Database is up to date."))?;
        }
        for sql in &report.statements {
            writeln!(out, "  {} {sql}", theme::arrow())?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "  {} Imported {} ({} classes, {} tables, {} views updated)",
            theme::check(),
            names.join(", "),
            report.classes,
            report.tables,
            report.views.len()
        )?;
        writeln!(out)?;

        Ok(())
    }
}

/// Reads a schema definition, choosing the format by file extension.
pub fn read_schema_file(path: impl AsRef<Path>) -> Result<SchemaDef> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let def = match extension.as_deref() {
        Some("toml") => toml::from_str(&contents)
            .with_context(|| format!("invalid schema file {}", path.display()))?,
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("invalid schema file {}", path.display()))?,
        _ => bail!(
            "unsupported schema file {}; expected .toml or .json",
            path.display()
        ),
    };

    Ok(def)
}
