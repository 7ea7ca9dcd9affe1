use std::path::PathBuf;

use clap::Args;

use super::compile_or_exit;

#[derive(Args)]
pub struct CheckArgs {
    /// Input .grx source file
    pub input: PathBuf,
}

pub fn cmd_check(args: CheckArgs) {
    let bytecode = compile_or_exit(&args.input);
    for (name, contract) in &bytecode.contracts {
        println!(
            "{}: {} state variable(s), {} function(s), {} event(s)",
            name,
            contract.state_variables.len(),
            contract.functions.len(),
            contract.events.len()
        );
    }
    println!("ok");
}
