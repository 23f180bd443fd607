use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    novelbookify::logging::init().context("init logging")?;

    let cli = novelbookify::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        novelbookify::cli::Command::Build(args) => {
            novelbookify::build::run(args).context("build")?;
        }
        novelbookify::cli::Command::List(args) => {
            novelbookify::listing::run(args).context("list")?;
        }
    }

    Ok(())
}
