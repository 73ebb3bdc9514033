use anyhow::Result;
use clap::Parser;
use ecmap_cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ecmap=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let app = cli.open()?;
    app.run(cli.command, &mut std::io::stdout().lock())
}
