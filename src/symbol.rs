//! Symbol tables for compilation.
//!
//! Tables form a chain of frames (global → contract → function →
//! block). `define` touches only the innermost frame, `resolve` walks
//! the chain outward. Tables are scoped to one `compile` invocation and
//! discarded afterwards, so two compilations cannot cross-contaminate.

use std::collections::HashMap;

use crate::bytecode::Param;

/// A named entry in a symbol table.
#[derive(Clone, Debug, PartialEq)]
pub enum Symbol {
    Contract,
    Interface,
    Struct,
    Enum,
    EnumValue {
        enum_name: String,
        value: i64,
    },
    Function {
        return_type: Option<String>,
        is_view: bool,
        is_private: bool,
    },
    Param {
        ty: String,
        index: usize,
    },
    Local {
        ty: String,
        index: usize,
    },
    StateVar {
        ty: String,
        offset: usize,
    },
    Event {
        params: Vec<Param>,
    },
}

/// A chain of name → symbol frames.
pub struct SymbolTable {
    frames: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    /// A fresh table with only the global frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the global frame");
        self.frames.pop();
    }

    /// Define `name` in the innermost frame. Names are unique within a
    /// frame; redefinition is rejected.
    pub fn define(&mut self, name: &str, symbol: Symbol) -> bool {
        let frame = self.frames.last_mut().expect("at least the global frame");
        if frame.contains_key(name) {
            return false;
        }
        frame.insert(name.to_string(), symbol);
        true
    }

    /// Walk the chain from the innermost frame outward.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Look only in the innermost frame.
    pub fn contains_local(&self, name: &str) -> bool {
        self.frames
            .last()
            .map(|frame| frame.contains_key(name))
            .unwrap_or(false)
    }

    /// Look only in the global frame (top-level declarations).
    pub fn resolve_global(&self, name: &str) -> Option<&Symbol> {
        self.frames[0].get(name)
    }

    pub fn contains_global(&self, name: &str) -> bool {
        self.frames[0].contains_key(name)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
