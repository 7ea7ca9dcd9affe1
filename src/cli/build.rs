use std::path::PathBuf;
use std::process;

use clap::Args;

use super::compile_or_exit;

#[derive(Args)]
pub struct BuildArgs {
    /// Input .grx source file
    pub input: PathBuf,
    /// Output artifact path (default: <input>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

pub fn cmd_build(args: BuildArgs) {
    let bytecode = compile_or_exit(&args.input);

    let output = args
        .output
        .unwrap_or_else(|| args.input.with_extension("json"));
    let json = if args.compact {
        serde_json::to_string(&bytecode).expect("bytecode is always serializable")
    } else {
        bytecode.to_json()
    };

    if let Err(e) = std::fs::write(&output, json) {
        eprintln!("error: cannot write '{}': {}", output.display(), e);
        process::exit(1);
    }
    println!(
        "compiled {} contract(s) to {}",
        bytecode.contracts.len(),
        output.display()
    );
}
