mod cli;
mod input;
mod run;
mod settings;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing(cli.log_level.as_deref());
    run::run(cli)
}
