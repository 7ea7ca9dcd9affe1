//! Grishex: a small statically-typed smart-contract language.
//!
//! Source text flows through four engines: the [`lexer`] scans it into
//! positioned tokens, the [`parser`] builds an AST, the [`compiler`]
//! lowers the AST into a contract-keyed bytecode artifact, and the
//! [`vm`] executes that artifact with per-contract persistent storage,
//! event logging, and gas accounting. Each stage consumes only the
//! previous stage's output and never mutates it.

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod symbol;
pub mod token;
pub mod value;
pub mod vm;

pub use bytecode::Bytecode;
pub use compiler::Compiler;
pub use diagnostic::{render_diagnostics, Diagnostic};
pub use lexer::tokenize;
pub use parser::parse;
pub use token::{Token, TokenKind};
pub use value::Value;
pub use vm::{LogEntry, Vm, VmError, VmStats};

/// Run the frontend pipeline on a source string: tokenize, parse, and
/// compile. Returns the artifact, or the parse/compile diagnostics.
pub fn compile_source(source: &str) -> Result<Bytecode, Vec<Diagnostic>> {
    let tokens = lexer::tokenize(source);
    let (program, parse_errors) = parser::parse(tokens);
    if !parse_errors.is_empty() {
        return Err(parse_errors);
    }
    let mut compiler = Compiler::new();
    let (bytecode, errors) = compiler.compile(&program);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(bytecode)
}
