//! fieldparse — parse log timestamps and normalize NDJSON events.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod logging;

use crate::cli::{Cli, Command};
use crate::commands::{run_aliases, run_apply, run_parse};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let config = cli.config.as_deref();

    let ok = match &cli.command {
        Command::Parse(args) => run_parse(config, args, &mut out)?,
        Command::Apply(args) => {
            run_apply(config, args, io::stdin().lock(), &mut out)?;
            true
        }
        Command::Aliases => {
            run_aliases(&mut out)?;
            true
        }
    };
    out.flush()?;
    Ok(ok)
}
