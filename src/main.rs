use apidocgen::cli::{run_cli, Cli};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    apidocgen::logging::init_logging()?;
    run_cli(cli)
}
