//! nsconfig
//!
//! Loads namespaced configuration from files and directories, resolves
//! placeholders, and answers dotted-path queries.

use anyhow::{Result, bail};
use clap::Parser;
use nsconfig::cli::{Cli, Command, DumpArgs, GetArgs, HasArgs, parse_default};
use nsconfig::config::ConfigLoader;
use nsconfig::format::{render, render_bindings, render_value};
use nsconfig::logging::{self, LogTarget};
use serde_json::Value;
use std::process::ExitCode;
use tracing::debug;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let loader = cli.build_loader()?;
    debug!(?loader, "loader ready");

    match &cli.command {
        Command::Get(args) => run_get(&loader, args),
        Command::Has(args) => Ok(run_has(&loader, args)),
        Command::Dump(args) => run_dump(&loader, args),
        Command::Bindings => {
            print!("{}", render_bindings("readers", loader.readers()));
            print!("{}", render_bindings("resolvers", loader.resolvers()));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_get(loader: &ConfigLoader, args: &GetArgs) -> Result<ExitCode> {
    let value = match (&args.default, loader.get(&args.path)) {
        (_, Some(value)) => value,
        (Some(default), None) => parse_default(default),
        (None, None) => bail!("no value at \"{}\"", args.path),
    };
    println!("{}", render_value(&value));
    Ok(ExitCode::SUCCESS)
}

fn run_has(loader: &ConfigLoader, args: &HasArgs) -> ExitCode {
    if loader.has(&args.path) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_dump(loader: &ConfigLoader, args: &DumpArgs) -> Result<ExitCode> {
    let value = match &args.path {
        None => Value::Object(loader.items().clone()),
        Some(path) => match loader.get(path) {
            Some(value) => value,
            None => bail!("no value at \"{path}\""),
        },
    };
    print!("{}", render(&value, args.format)?);
    Ok(ExitCode::SUCCESS)
}
