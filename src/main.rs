mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };
    log::trace!("verbosity {}", ctx.verbose);

    let result = match cli.command {
        Command::Get(args) => commands::resource::get(&ctx, &args),
        Command::List(args) => commands::resource::list(&ctx, &args),
        Command::Save(args) => commands::resource::save(&ctx, &args),
        Command::Create { path } => commands::resource::create(&ctx, &path),
        Command::Update { path } => commands::resource::update(&ctx, &path),
        Command::Delete { path } => commands::resource::delete(&ctx, &path),
        Command::Path { path } => commands::inspect::path(&ctx, &path),
        Command::Metadata { path, raw } => commands::inspect::metadata(&ctx, &path, raw),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "declarest", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result
        && let Some(err) = e.downcast_ref::<declarative::Error>()
    {
        ui::dim(err.category().advice());
    }
    result
}
