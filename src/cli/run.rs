use std::path::PathBuf;
use std::process;

use clap::Args;

use grishex::Vm;

use super::{coerce_arguments, compile_or_exit};

#[derive(Args)]
pub struct RunArgs {
    /// Input .grx source file
    pub input: PathBuf,
    /// Contract to deploy (default: the file's only contract)
    #[arg(long, short)]
    pub contract: Option<String>,
    /// Function to execute
    #[arg(long, short)]
    pub function: String,
    /// Constructor arguments, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub deploy_args: Option<Vec<String>>,
    /// Function arguments, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub args: Option<Vec<String>>,
    /// Print the instance's storage after execution
    #[arg(long)]
    pub storage: bool,
    /// Print the event log after execution
    #[arg(long)]
    pub logs: bool,
    /// Print execution statistics
    #[arg(long)]
    pub stats: bool,
}

pub fn cmd_run(args: RunArgs) {
    let bytecode = compile_or_exit(&args.input);

    let contract = match args.contract {
        Some(name) => name,
        None => {
            if bytecode.contracts.len() == 1 {
                bytecode.contracts.keys().next().cloned().unwrap_or_default()
            } else {
                eprintln!(
                    "error: '{}' defines {} contracts; pick one with --contract",
                    args.input.display(),
                    bytecode.contracts.len()
                );
                process::exit(1);
            }
        }
    };

    let mut vm = Vm::new();
    vm.load_contract(&bytecode);

    let address = match vm.deploy_contract(&contract, coerce_arguments(args.deploy_args)) {
        Ok(address) => address,
        Err(e) => {
            eprintln!("deployment error: {}", e);
            process::exit(1);
        }
    };
    println!("deployed {} at {}", contract, address);

    match vm.execute_function(&contract, &args.function, coerce_arguments(args.args), Some(&address))
    {
        Ok(result) => println!("{} -> {}", args.function, result),
        Err(e) => {
            eprintln!("execution error: {}", e);
            process::exit(1);
        }
    }

    if args.storage {
        if let Some(storage) = vm.get_storage(None, Some(&address)) {
            println!(
                "storage: {}",
                serde_json::to_string_pretty(storage).expect("storage is always serializable")
            );
        }
    }
    if args.logs {
        println!(
            "logs: {}",
            serde_json::to_string_pretty(vm.get_logs()).expect("logs are always serializable")
        );
    }
    if args.stats {
        println!(
            "stats: {}",
            serde_json::to_string_pretty(vm.get_stats()).expect("stats are always serializable")
        );
    }
}
