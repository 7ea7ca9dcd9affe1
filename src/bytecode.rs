//! The bytecode artifact: the compiler's output and the VM's input.
//!
//! The artifact is a versioned, contract-keyed document that round-trips
//! through JSON as its canonical serialized form. Maps preserve
//! declaration order. An instruction serializes as an object tagged by
//! its opcode, e.g. `{"op": "PUSH", "value": 1}` or
//! `{"op": "JUMP_IF_FALSE", "offset": 3}`; jump offsets are relative
//! displacements from the instruction following the jump.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Value;

pub const BYTECODE_VERSION: &str = "1.0";

/// A compiled program: every contract of one compilation unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bytecode {
    pub version: String,
    pub contracts: IndexMap<String, ContractCode>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self {
            version: BYTECODE_VERSION.to_string(),
            contracts: IndexMap::new(),
        }
    }

    /// Serialize to the canonical pretty-printed JSON form.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("bytecode is always serializable")
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for Bytecode {
    fn default() -> Self {
        Self::new()
    }
}

/// One contract's compiled form.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ContractCode {
    pub state_variables: IndexMap<String, StateVariable>,
    pub functions: IndexMap<String, FunctionCode>,
    pub events: IndexMap<String, EventAbi>,
}

/// A persistent contract field. Offsets are dense, zero-based, in
/// declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVariable {
    #[serde(rename = "type")]
    pub ty: String,
    pub offset: usize,
}

/// A named, typed parameter of a function or event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A compiled function. `params` preserve declaration order; `code` is
/// a linear instruction sequence ending in `RETURN`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCode {
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_view: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_private: bool,
    pub code: Vec<Instruction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventAbi {
    pub params: Vec<Param>,
}

/// Where `RETURN` takes its result from: the stack top, or a value
/// embedded in the instruction (the compiler uses the embedded form for
/// `return;` and implicit defaults).
#[derive(Clone, Debug, PartialEq)]
pub enum ReturnSource {
    Stack,
    Const(Value),
}

impl Serialize for ReturnSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReturnSource::Stack => serializer.serialize_str("stack"),
            ReturnSource::Const(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ReturnSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Str(s) if s == "stack" => Ok(ReturnSource::Stack),
            value => Ok(ReturnSource::Const(value)),
        }
    }
}

/// The complete instruction set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Push { value: Value },
    Pop,
    Dup,
    LoadLocal { index: usize },
    StoreLocal { index: usize },
    LoadState { offset: usize },
    StoreState { offset: usize },
    LoadMember { member: String },
    StoreMember { member: String },
    LoadIndex,
    StoreIndex,
    Call { function: String, args_count: usize },
    Return { value: ReturnSource },
    Jump { offset: i64 },
    JumpIfFalse { offset: i64 },
    Require { message: String },
    Emit { event: String, args_count: usize },
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
    Neg,
    Not,
}

impl Instruction {
    /// Overwrite a jump's displacement. Only meaningful for `JUMP` and
    /// `JUMP_IF_FALSE`; the compiler's patching goes through here.
    pub fn set_offset(&mut self, new_offset: i64) -> bool {
        match self {
            Instruction::Jump { offset } | Instruction::JumpIfFalse { offset } => {
                *offset = new_offset;
                true
            }
            _ => false,
        }
    }
}
