use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "wrunner")]
#[command(about = "Launch Windows applications in isolated Wine prefixes")]
#[command(version)]
struct Cli {
    /// Path to the application profile
    #[arg(short, long, global = true, default_value = "profile.yaml")]
    profile: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch an executable from the profile
    Run {
        /// Executable alias or path, followed by its arguments
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Create the application prefix
    Init,
    /// Terminate every process attached to the prefix
    Kill,
    /// Install a component into the prefix
    Install {
        /// Component to install
        component: cli::install::ComponentArg,
    },
    /// Remove a component from the prefix
    Uninstall {
        /// Component to remove
        component: cli::install::ComponentArg,
    },
    /// Run wine configuration
    Winecfg,
    /// Run winetricks
    Winetricks {
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Remove the prefix and everything in it
    Destroy,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { args } => cli::launch::run(&cli.profile, args),
        Commands::Init => cli::prefix::init(&cli.profile),
        Commands::Kill => cli::prefix::kill(&cli.profile),
        Commands::Install { component } => cli::install::install(&cli.profile, component),
        Commands::Uninstall { component } => cli::install::uninstall(&cli.profile, component),
        Commands::Winecfg => cli::prefix::winecfg(&cli.profile),
        Commands::Winetricks { args } => cli::prefix::winetricks(&cli.profile, args),
        Commands::Destroy => cli::prefix::destroy(&cli.profile),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
