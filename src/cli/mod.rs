pub mod build;
pub mod check;
pub mod run;

use std::path::Path;
use std::process;

use grishex::{render_diagnostics, Bytecode, Value};

pub(crate) fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

/// Compile the file or render its diagnostics and exit nonzero.
pub(crate) fn compile_or_exit(path: &Path) -> Bytecode {
    let source = read_source(path);
    let filename = path.display().to_string();
    match grishex::compile_source(&source) {
        Ok(bytecode) => bytecode,
        Err(diagnostics) => {
            render_diagnostics(&diagnostics, &filename, &source);
            eprintln!("error: could not compile '{}' ({} errors)", filename, diagnostics.len());
            process::exit(1);
        }
    }
}

/// Coerce a string-typed CLI argument by the obvious rules:
/// integer, then boolean, then float, then string.
pub(crate) fn coerce_argument(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Int(n);
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::Str(raw.to_string())
}

pub(crate) fn coerce_arguments(raw: Option<Vec<String>>) -> Vec<Value> {
    raw.unwrap_or_default()
        .iter()
        .map(|s| coerce_argument(s))
        .collect()
}
