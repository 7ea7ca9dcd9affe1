mod cli;

use clap::{Parser, Subcommand};

use cli::build::BuildArgs;
use cli::check::CheckArgs;
use cli::run::RunArgs;

#[derive(Parser)]
#[command(
    name = "grishex",
    version,
    about = "Grishex compiler and virtual machine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .grx file to a JSON bytecode artifact
    Build(BuildArgs),
    /// Parse and compile without writing an artifact
    Check(CheckArgs),
    /// Compile, deploy, and execute a contract function
    Run(RunArgs),
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Run(args) => cli::run::cmd_run(args),
    }
}
