//! subst - render kustomize overlays with a layered substitution context

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod exit_codes;
mod logging;
mod output;

use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "subst")]
#[command(version)]
#[command(about = "Render kustomize overlays with subst.yaml values and ejson secrets", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level: trace, debug, info, warn or error
    #[arg(short = 'v', long = "verbosity", global = true, value_name = "LEVEL")]
    verbosity: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the overlay and render it with the resolved context
    Render(RenderArgs),

    /// Print `subst` when the directory contains subst.yaml files
    Discover {
        /// Directory to search
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print the version
    Version,
}

fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init(cli.verbosity.as_deref());

    let result = match cli.command {
        Commands::Render(args) => commands::render::run(&args),
        Commands::Discover { dir } => commands::discover::run(&dir),
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
