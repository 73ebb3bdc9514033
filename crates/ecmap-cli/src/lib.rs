mod command;
mod config;
mod theme;

pub use command::*;
pub use config::*;

use anyhow::{bail, Result};
use clap::Parser;
use ecmap::Db;
use std::io::Write;
use std::path::PathBuf;

/// ecmap CLI library for building custom command-line tools
pub struct EcmapCli {
    db: Db,
    config: Config,
}

impl EcmapCli {
    /// Create a new EcmapCli instance over an open database
    pub fn new(db: Db) -> Self {
        Self {
            db,
            config: Config::default(),
        }
    }

    /// Create a new EcmapCli instance with a custom configuration
    pub fn with_config(db: Db, config: Config) -> Self {
        Self { db, config }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Execute one command, writing its report to `out`
    pub fn run(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Import(cmd) => cmd.run(&self.db, out),
            Command::View(cmd) => cmd.run(&self.db, out),
            Command::Ddl(cmd) => cmd.run(&self.db, out),
            Command::Tables(cmd) => cmd.run(&self.db, out),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ecmap")]
#[command(about = "ecmap CLI - Map class schemas onto SQLite tables and views")]
#[command(version)]
pub struct Cli {
    /// Database file, overriding the config file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Config file; ignored when missing
    #[arg(long, global = true, default_value = "ecmap.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads the config, applies command-line overrides and opens the
    /// database.
    pub fn open(&self) -> Result<EcmapCli> {
        let mut config = Config::load_or_default(&self.config)?;
        if let Some(path) = &self.database {
            config = config.database_path(path);
        }

        let Some(path) = &config.database.path else {
            bail!(
                "no database given; pass --database or set [database] path in {}",
                self.config.display()
            );
        };

        tracing::debug!(database = %path.display(), "opening database");
        let db = config.builder().connect(path)?;
        Ok(EcmapCli::with_config(db, config))
    }
}
