use anyhow::Result;
use clap::Parser;
use rl::cli::{self, Cli};
use rl::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let out = cli::run(&cli)?;
    println!("{out}");
    Ok(())
}
