//! Stack-based virtual machine for Grishex bytecode.
//!
//! A VM owns loaded contracts, deployed instances, per-address storage,
//! an append-only event log, and cumulative statistics. Execution is
//! single-threaded and synchronous; function calls nest on the VM's
//! call stack. VM errors are fatal to the current invocation and unwind
//! its frames, but the VM itself stays usable. Storage writes performed
//! before a failed `REQUIRE` are not rolled back.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::bytecode::{Bytecode, ContractCode, Instruction, ReturnSource};
use crate::value::{Value, ValueError};

const MAX_CALL_DEPTH: usize = 256;

/// Fatal execution errors. The VM remains usable afterwards; state
/// mutated before the error stays mutated.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum VmError {
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("Contract {0} not found")]
    ContractNotFound(String),
    #[error("Function {function} not found in contract {contract}")]
    FunctionNotFound { contract: String, function: String },
    #[error("Expected {expected} arguments, got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },
    #[error("Local variable at index {0} not found")]
    LocalNotFound(usize),
    #[error("State variable {0} not found")]
    StateVarNotFound(String),
    #[error("{0}")]
    RequireFailed(String),
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Cannot load member {member} from {kind} value")]
    MemberLoadOnNonObject { member: String, kind: &'static str },
    #[error("Cannot store member {member} in {kind} value")]
    MemberStoreOnNonObject { member: String, kind: &'static str },
    #[error("Cannot index {kind} value with {index}")]
    BadIndex { kind: &'static str, index: String },
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("Cannot take length of {0} value")]
    NoLength(&'static str),
    #[error("Jump out of code bounds")]
    JumpOutOfBounds,
    #[error("Call depth exceeded (maximum 256 frames)")]
    CallDepthExceeded,
}

/// One entry in the VM's event log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogEntry {
    pub contract: String,
    pub address: String,
    pub event: String,
    pub topics: Vec<Value>,
    pub data: Vec<Value>,
}

/// Cumulative execution statistics, cleared only by `reset`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VmStats {
    pub gas_used: u64,
    pub instructions_executed: u64,
    pub function_calls: u64,
    pub storage_reads: u64,
    pub storage_writes: u64,
}

/// A deployed contract instance.
#[derive(Clone, Debug)]
struct Instance {
    name: String,
}

/// Per-invocation frame: operand stack plus integer-indexed local
/// slots (parameters occupy slots 0..N-1, locals follow).
#[derive(Debug)]
struct Frame {
    contract: String,
    address: String,
    #[allow(dead_code)]
    function: String,
    stack: Vec<Value>,
    locals: HashMap<usize, Value>,
}

/// The Grishex virtual machine.
pub struct Vm {
    contracts: HashMap<String, ContractCode>,
    /// address → instance, in deployment order.
    instances: IndexMap<String, Instance>,
    /// address → offset → value.
    storage: BTreeMap<String, BTreeMap<usize, Value>>,
    logs: Vec<LogEntry>,
    /// contract name → last deployed address.
    addresses: HashMap<String, String>,
    call_stack: Vec<Frame>,
    stats: VmStats,
    deploy_nonce: u64,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            contracts: HashMap::new(),
            instances: IndexMap::new(),
            storage: BTreeMap::new(),
            logs: Vec::new(),
            addresses: HashMap::new(),
            call_stack: Vec::new(),
            stats: VmStats::default(),
            deploy_nonce: 0,
        }
    }

    /// Drop all contracts, instances, storage, logs, and statistics.
    pub fn reset(&mut self) {
        *self = Vm::new();
    }

    /// Load every contract of a compiled artifact. Later loads with the
    /// same contract name replace earlier ones.
    pub fn load_contract(&mut self, bytecode: &Bytecode) {
        for (name, contract) in &bytecode.contracts {
            self.contracts.insert(name.clone(), contract.clone());
        }
    }

    /// Derive a fresh deployment address: `0x` + 40 lowercase hex
    /// digits from a domain-separated hash of the contract name and a
    /// per-VM nonce. Deterministic per VM, unique across deployments.
    fn generate_address(&mut self, name: &str) -> String {
        loop {
            let mut hasher = blake3::Hasher::new();
            hasher.update(b"grishex-deploy-v1");
            hasher.update(name.as_bytes());
            hasher.update(&self.deploy_nonce.to_le_bytes());
            self.deploy_nonce += 1;
            let digest = hasher.finalize();
            let address = format!("0x{}", &digest.to_hex().as_str()[..40]);
            if !self.instances.contains_key(&address) {
                return address;
            }
        }
    }

    /// Deploy a loaded contract: materialize an address, create empty
    /// storage, record the name → address shortcut (latest wins), and
    /// run the constructor if one exists.
    pub fn deploy_contract(&mut self, name: &str, args: Vec<Value>) -> Result<String, VmError> {
        if !self.contracts.contains_key(name) {
            return Err(VmError::ContractNotFound(name.to_string()));
        }

        let address = self.generate_address(name);
        self.instances.insert(
            address.clone(),
            Instance {
                name: name.to_string(),
            },
        );
        self.storage.insert(address.clone(), BTreeMap::new());
        self.addresses.insert(name.to_string(), address.clone());

        let has_constructor = self.contracts[name].functions.contains_key("constructor");
        if has_constructor {
            self.execute_function(name, "constructor", args, Some(&address))?;
        }

        Ok(address)
    }

    /// Execute a contract function.
    ///
    /// The target address resolves as: explicit argument, then the
    /// name → address shortcut, then the first deployed instance of the
    /// contract, and finally (as a convenience) a fresh deployment
    /// with empty constructor arguments.
    pub fn execute_function(
        &mut self,
        contract: &str,
        function: &str,
        args: Vec<Value>,
        address: Option<&str>,
    ) -> Result<Value, VmError> {
        if !self.contracts.contains_key(contract) {
            return Err(VmError::ContractNotFound(contract.to_string()));
        }
        let function_data = self.contracts[contract]
            .functions
            .get(function)
            .cloned()
            .ok_or_else(|| VmError::FunctionNotFound {
                contract: contract.to_string(),
                function: function.to_string(),
            })?;

        let address = match address {
            Some(a) => a.to_string(),
            None => self.resolve_address(contract)?,
        };

        if args.len() != function_data.params.len() {
            return Err(VmError::ArgumentCountMismatch {
                expected: function_data.params.len(),
                got: args.len(),
            });
        }
        if self.call_stack.len() >= MAX_CALL_DEPTH {
            return Err(VmError::CallDepthExceeded);
        }

        let mut locals = HashMap::new();
        for (i, (arg, param)) in args.iter().zip(&function_data.params).enumerate() {
            locals.insert(i, arg.coerce_to(&param.ty));
        }

        self.call_stack.push(Frame {
            contract: contract.to_string(),
            address,
            function: function.to_string(),
            stack: Vec::new(),
            locals,
        });
        self.stats.function_calls += 1;

        let result = self.run(&function_data.code);
        self.call_stack.pop();
        result
    }

    fn resolve_address(&mut self, contract: &str) -> Result<String, VmError> {
        if let Some(address) = self.addresses.get(contract) {
            return Ok(address.clone());
        }
        if let Some((address, _)) = self
            .instances
            .iter()
            .find(|(_, instance)| instance.name == contract)
        {
            return Ok(address.clone());
        }
        self.deploy_contract(contract, Vec::new())
    }

    // ─── Execution loop ────────────────────────────────────────────

    fn frame_mut(&mut self) -> &mut Frame {
        self.call_stack.last_mut().expect("an active frame")
    }

    fn pop_value(&mut self) -> Result<Value, VmError> {
        self.frame_mut().stack.pop().ok_or(VmError::StackUnderflow)
    }

    /// Pop `count` values, restoring argument order.
    fn pop_args(&mut self, count: usize) -> Result<Vec<Value>, VmError> {
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(self.pop_value()?);
        }
        args.reverse();
        Ok(args)
    }

    fn state_offset(&self, contract: &str, member: &str) -> Result<usize, VmError> {
        self.contracts
            .get(contract)
            .and_then(|c| c.state_variables.get(member))
            .map(|var| var.offset)
            .ok_or_else(|| VmError::StateVarNotFound(member.to_string()))
    }

    fn storage_read(&mut self, address: &str, offset: usize) -> Value {
        self.stats.storage_reads += 1;
        self.storage
            .get(address)
            .and_then(|slots| slots.get(&offset))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn storage_write(&mut self, address: &str, offset: usize, value: Value) {
        self.stats.storage_writes += 1;
        self.storage
            .entry(address.to_string())
            .or_default()
            .insert(offset, value);
    }

    fn run(&mut self, code: &[Instruction]) -> Result<Value, VmError> {
        let mut pc: usize = 0;

        while pc < code.len() {
            self.stats.instructions_executed += 1;
            self.stats.gas_used += 1;

            match &code[pc] {
                Instruction::Push { value } => {
                    self.frame_mut().stack.push(value.clone());
                }
                Instruction::Pop => {
                    self.pop_value()?;
                }
                Instruction::Dup => {
                    let top = self
                        .frame_mut()
                        .stack
                        .last()
                        .cloned()
                        .ok_or(VmError::StackUnderflow)?;
                    self.frame_mut().stack.push(top);
                }
                Instruction::LoadLocal { index } => {
                    let value = self
                        .frame_mut()
                        .locals
                        .get(index)
                        .cloned()
                        .ok_or(VmError::LocalNotFound(*index))?;
                    self.frame_mut().stack.push(value);
                }
                Instruction::StoreLocal { index } => {
                    let value = self.pop_value()?;
                    self.frame_mut().locals.insert(*index, value);
                }
                Instruction::LoadState { offset } => {
                    let address = self.frame_mut().address.clone();
                    let value = self.storage_read(&address, *offset);
                    self.frame_mut().stack.push(value);
                }
                Instruction::StoreState { offset } => {
                    let value = self.pop_value()?;
                    let address = self.frame_mut().address.clone();
                    self.storage_write(&address, *offset, value);
                }
                Instruction::LoadMember { member } => {
                    let object = self.pop_value()?;
                    let value = match object {
                        Value::SelfRef => {
                            let (contract, address) = {
                                let frame = self.frame_mut();
                                (frame.contract.clone(), frame.address.clone())
                            };
                            let offset = self.state_offset(&contract, member)?;
                            self.storage_read(&address, offset)
                        }
                        Value::Map(entries) => entries.get(member).cloned().unwrap_or(Value::Null),
                        other => {
                            return Err(VmError::MemberLoadOnNonObject {
                                member: member.clone(),
                                kind: other.type_name(),
                            });
                        }
                    };
                    self.frame_mut().stack.push(value);
                }
                Instruction::StoreMember { member } => {
                    let object = self.pop_value()?;
                    let value = self.pop_value()?;
                    match object {
                        Value::SelfRef => {
                            let (contract, address) = {
                                let frame = self.frame_mut();
                                (frame.contract.clone(), frame.address.clone())
                            };
                            let offset = self.state_offset(&contract, member)?;
                            self.storage_write(&address, offset, value);
                        }
                        Value::Map(mut entries) => {
                            // value semantics: the mutated copy is dropped
                            entries.insert(member.clone(), value);
                        }
                        other => {
                            return Err(VmError::MemberStoreOnNonObject {
                                member: member.clone(),
                                kind: other.type_name(),
                            });
                        }
                    }
                }
                Instruction::LoadIndex => {
                    let index = self.pop_value()?;
                    let object = self.pop_value()?;
                    let value = index_read(&object, &index)?;
                    self.frame_mut().stack.push(value);
                }
                Instruction::StoreIndex => {
                    let index = self.pop_value()?;
                    let object = self.pop_value()?;
                    let value = self.pop_value()?;
                    index_write(object, &index, value)?;
                }
                Instruction::Call {
                    function,
                    args_count,
                } => {
                    let args = self.pop_args(*args_count)?;
                    let result = self.call(function, args)?;
                    self.frame_mut().stack.push(result);
                }
                Instruction::Return { value } => {
                    return Ok(match value {
                        ReturnSource::Stack => self
                            .frame_mut()
                            .stack
                            .last()
                            .cloned()
                            .unwrap_or(Value::Null),
                        ReturnSource::Const(v) => v.clone(),
                    });
                }
                Instruction::Jump { offset } => {
                    pc = jump_target(pc, *offset, code.len())?;
                    continue;
                }
                Instruction::JumpIfFalse { offset } => {
                    let condition = self.pop_value()?;
                    if !condition.is_truthy() {
                        pc = jump_target(pc, *offset, code.len())?;
                        continue;
                    }
                }
                Instruction::Require { message } => {
                    let condition = self.pop_value()?;
                    if !condition.is_truthy() {
                        return Err(VmError::RequireFailed(message.clone()));
                    }
                }
                Instruction::Emit { event, args_count } => {
                    let data = self.pop_args(*args_count)?;
                    let (contract, address) = {
                        let frame = self.frame_mut();
                        (frame.contract.clone(), frame.address.clone())
                    };
                    self.logs.push(LogEntry {
                        contract,
                        address,
                        event: event.clone(),
                        topics: Vec::new(),
                        data,
                    });
                }
                Instruction::Add => self.binary_op(|a, b| a.add(b))?,
                Instruction::Sub => self.binary_op(|a, b| a.sub(b))?,
                Instruction::Mul => self.binary_op(|a, b| a.mul(b))?,
                Instruction::Div => self.binary_op(|a, b| a.div(b))?,
                Instruction::Mod => self.binary_op(|a, b| a.rem(b))?,
                Instruction::Eq => self.binary_op(|a, b| Ok(Value::Bool(a == b)))?,
                Instruction::Neq => self.binary_op(|a, b| Ok(Value::Bool(a != b)))?,
                Instruction::Lt => self.comparison_op("<", |o| o.is_lt())?,
                Instruction::Gt => self.comparison_op(">", |o| o.is_gt())?,
                Instruction::Lte => self.comparison_op("<=", |o| o.is_le())?,
                Instruction::Gte => self.comparison_op(">=", |o| o.is_ge())?,
                Instruction::And => self.binary_op(|a, b| Ok(a.and(b)))?,
                Instruction::Or => self.binary_op(|a, b| Ok(a.or(b)))?,
                Instruction::Neg => {
                    let a = self.pop_value()?;
                    let result = a.neg()?;
                    self.frame_mut().stack.push(result);
                }
                Instruction::Not => {
                    let a = self.pop_value()?;
                    let result = a.not();
                    self.frame_mut().stack.push(result);
                }
            }

            pc += 1;
        }

        // Fell off the end without RETURN (hand-written bytecode):
        // the stack top, or null.
        Ok(self
            .frame_mut()
            .stack
            .last()
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn binary_op(
        &mut self,
        op: impl FnOnce(&Value, &Value) -> Result<Value, ValueError>,
    ) -> Result<(), VmError> {
        let b = self.pop_value()?;
        let a = self.pop_value()?;
        let result = op(&a, &b)?;
        self.frame_mut().stack.push(result);
        Ok(())
    }

    fn comparison_op(
        &mut self,
        op: &'static str,
        test: impl FnOnce(std::cmp::Ordering) -> bool,
    ) -> Result<(), VmError> {
        let b = self.pop_value()?;
        let a = self.pop_value()?;
        let ordering = a.compare(op, &b)?;
        self.frame_mut().stack.push(Value::Bool(test(ordering)));
        Ok(())
    }

    /// Dispatch a `CALL`: the `print` builtin, then the current
    /// contract's functions, then the `len` builtin.
    fn call(&mut self, function: &str, args: Vec<Value>) -> Result<Value, VmError> {
        if function == "print" {
            let text: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            println!("{}", text.join(" "));
            return Ok(Value::Null);
        }

        let (contract, address) = {
            let frame = self.frame_mut();
            (frame.contract.clone(), frame.address.clone())
        };
        let is_contract_function = self
            .contracts
            .get(&contract)
            .map(|c| c.functions.contains_key(function))
            .unwrap_or(false);
        if is_contract_function {
            return self.execute_function(&contract, function, args, Some(&address));
        }

        if function == "len" {
            if args.len() != 1 {
                return Err(VmError::ArgumentCountMismatch {
                    expected: 1,
                    got: args.len(),
                });
            }
            let length = args[0]
                .length()
                .ok_or_else(|| VmError::NoLength(args[0].type_name()))?;
            return Ok(Value::Uint(length as u64));
        }

        Err(VmError::FunctionNotFound {
            contract,
            function: function.to_string(),
        })
    }

    // ─── Observability ─────────────────────────────────────────────

    /// Storage of one contract instance, resolved by address or by
    /// contract name (shortcut first, then first deployed instance).
    pub fn get_storage(
        &self,
        contract: Option<&str>,
        address: Option<&str>,
    ) -> Option<&BTreeMap<usize, Value>> {
        if let Some(address) = address {
            return self.storage.get(address);
        }
        let name = contract?;
        if let Some(address) = self.addresses.get(name) {
            return self.storage.get(address);
        }
        self.instances
            .iter()
            .find(|(_, instance)| instance.name == name)
            .and_then(|(address, _)| self.storage.get(address))
    }

    /// All storages, keyed by address.
    pub fn storages(&self) -> &BTreeMap<String, BTreeMap<usize, Value>> {
        &self.storage
    }

    pub fn get_logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn get_stats(&self) -> &VmStats {
        &self.stats
    }

    /// The last deployed address of a contract, if any.
    pub fn address_of(&self, contract: &str) -> Option<&str> {
        self.addresses.get(contract).map(|s| s.as_str())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

fn jump_target(pc: usize, offset: i64, code_len: usize) -> Result<usize, VmError> {
    let target = pc as i64 + offset;
    if target < 0 || target > code_len as i64 {
        return Err(VmError::JumpOutOfBounds);
    }
    Ok(target as usize)
}

fn list_index(index: &Value, len: usize) -> Result<usize, VmError> {
    let i = match index {
        Value::Int(n) => *n,
        Value::Uint(n) if *n <= i64::MAX as u64 => *n as i64,
        other => {
            return Err(VmError::BadIndex {
                kind: "array",
                index: other.to_string(),
            });
        }
    };
    if i < 0 || i as usize >= len {
        return Err(VmError::IndexOutOfRange { index: i, len });
    }
    Ok(i as usize)
}

fn index_read(object: &Value, index: &Value) -> Result<Value, VmError> {
    match object {
        Value::List(items) => {
            let i = list_index(index, items.len())?;
            Ok(items[i].clone())
        }
        Value::Map(entries) => {
            let key = index.as_map_key();
            entries.get(&key).cloned().ok_or_else(|| VmError::BadIndex {
                kind: "map",
                index: key,
            })
        }
        other => Err(VmError::BadIndex {
            kind: other.type_name(),
            index: index.to_string(),
        }),
    }
}

fn index_write(object: Value, index: &Value, value: Value) -> Result<(), VmError> {
    match object {
        Value::List(mut items) => {
            let i = list_index(index, items.len())?;
            // value semantics: the mutated copy is dropped
            items[i] = value;
            Ok(())
        }
        Value::Map(mut entries) => {
            entries.insert(index.as_map_key(), value);
            Ok(())
        }
        other => Err(VmError::BadIndex {
            kind: other.type_name(),
            index: index.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn compile(source: &str) -> Bytecode {
        let (program, parse_errors) = parse(tokenize(source));
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
        let mut compiler = Compiler::new();
        let (bytecode, errors) = compiler.compile(&program);
        assert!(errors.is_empty(), "compile errors: {:?}", errors);
        bytecode
    }

    fn vm_with(source: &str) -> Vm {
        let mut vm = Vm::new();
        vm.load_contract(&compile(source));
        vm
    }

    const SIMPLE_TOKEN: &str = r#"
contract SimpleToken {
    state {
        name: string;
        symbol: string;
        decimals: uint;
    }

    constructor(name: string, symbol: string, decimals: uint) {
        self.name = name;
        self.symbol = symbol;
        self.decimals = decimals;
    }

    function getName() view returns string {
        return self.name;
    }

    function getSymbol() view returns string {
        return self.symbol;
    }

    function getDecimals() view returns uint {
        return self.decimals;
    }
}
"#;

    fn deploy_simple_token(vm: &mut Vm) -> String {
        vm.deploy_contract(
            "SimpleToken",
            vec![
                Value::Str("Grishinium Token".into()),
                Value::Str("GRISH".into()),
                Value::Uint(18),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_simple_token_getters() {
        let mut vm = vm_with(SIMPLE_TOKEN);
        deploy_simple_token(&mut vm);

        assert_eq!(
            vm.execute_function("SimpleToken", "getName", vec![], None).unwrap(),
            Value::Str("Grishinium Token".into())
        );
        assert_eq!(
            vm.execute_function("SimpleToken", "getSymbol", vec![], None).unwrap(),
            Value::Str("GRISH".into())
        );
        assert_eq!(
            vm.execute_function("SimpleToken", "getDecimals", vec![], None).unwrap(),
            Value::Uint(18)
        );
    }

    #[test]
    fn test_constructor_populates_storage_by_offset() {
        let mut vm = vm_with(SIMPLE_TOKEN);
        let address = deploy_simple_token(&mut vm);

        let storage = vm.get_storage(None, Some(&address)).unwrap();
        assert_eq!(storage[&0], Value::Str("Grishinium Token".into()));
        assert_eq!(storage[&1], Value::Str("GRISH".into()));
        assert_eq!(storage[&2], Value::Uint(18));
    }

    #[test]
    fn test_address_shape() {
        let mut vm = vm_with(SIMPLE_TOKEN);
        let address = deploy_simple_token(&mut vm);
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
        assert!(address[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_deployment_addresses_are_unique() {
        let mut vm = vm_with("contract A {}");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let address = vm.deploy_contract("A", vec![]).unwrap();
            assert!(seen.insert(address), "duplicate deployment address");
        }
    }

    #[test]
    fn test_deploy_unknown_contract() {
        let mut vm = Vm::new();
        assert_eq!(
            vm.deploy_contract("Ghost", vec![]),
            Err(VmError::ContractNotFound("Ghost".into()))
        );
    }

    #[test]
    fn test_division_by_zero() {
        let mut vm = vm_with("contract C { function f() returns int { return 1 / 0; } }");
        let err = vm.execute_function("C", "f", vec![], None).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero");
    }

    #[test]
    fn test_require_failure_carries_message() {
        let mut vm = vm_with("contract C { function f() { require(false, \"nope\"); } }");
        let err = vm.execute_function("C", "f", vec![], None).unwrap_err();
        assert_eq!(err, VmError::RequireFailed("nope".into()));
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_require_passing_condition() {
        let mut vm = vm_with(
            "contract C { function f(x: int) returns int { require(x > 0, \"positive\"); return x; } }",
        );
        assert_eq!(
            vm.execute_function("C", "f", vec![Value::Int(5)], None).unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn test_event_log() {
        let mut vm = vm_with(
            "contract C { event E(x: uint); function f() { emit E(42); } }",
        );
        let address = vm.deploy_contract("C", vec![]).unwrap();
        vm.execute_function("C", "f", vec![], None).unwrap();

        let logs = vm.get_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].event, "E");
        assert_eq!(logs[0].contract, "C");
        assert_eq!(logs[0].address, address);
        assert_eq!(logs[0].data, vec![Value::Int(42)]);
        assert!(logs[0].topics.is_empty());
    }

    #[test]
    fn test_event_log_preserves_emission_order() {
        let mut vm = vm_with(
            "contract C { event E(x: uint); function f(n: uint) { emit E(n); emit E(n + 1); } }",
        );
        vm.execute_function("C", "f", vec![Value::Uint(1)], None).unwrap();
        vm.execute_function("C", "f", vec![Value::Uint(10)], None).unwrap();
        let emitted: Vec<&Value> = vm.get_logs().iter().map(|l| &l.data[0]).collect();
        assert_eq!(
            emitted,
            [&Value::Uint(1), &Value::Uint(2), &Value::Uint(10), &Value::Uint(11)]
        );
    }

    #[test]
    fn test_state_round_trip() {
        let mut vm = vm_with(
            "contract C { state { x: uint; } function set(v: uint) { x = v; } function get() view returns uint { return x; } }",
        );
        vm.execute_function("C", "set", vec![Value::Uint(7)], None).unwrap();
        assert_eq!(
            vm.execute_function("C", "get", vec![], None).unwrap(),
            Value::Uint(7)
        );
    }

    #[test]
    fn test_unset_state_reads_null() {
        let mut vm = vm_with(
            "contract C { state { x: uint; } function get() view returns uint { return x; } }",
        );
        assert_eq!(vm.execute_function("C", "get", vec![], None).unwrap(), Value::Null);
    }

    #[test]
    fn test_auto_deploy_on_first_execute() {
        let mut vm = vm_with("contract C { function f() returns int { return 1; } }");
        assert!(vm.address_of("C").is_none());
        assert_eq!(vm.execute_function("C", "f", vec![], None).unwrap(), Value::Int(1));
        assert!(vm.address_of("C").is_some());
    }

    #[test]
    fn test_explicit_address_targets_instance() {
        let mut vm = vm_with(
            "contract C { state { x: uint; } constructor(v: uint) { x = v; } function get() view returns uint { return x; } }",
        );
        let first = vm.deploy_contract("C", vec![Value::Uint(1)]).unwrap();
        let second = vm.deploy_contract("C", vec![Value::Uint(2)]).unwrap();

        assert_eq!(
            vm.execute_function("C", "get", vec![], Some(&first)).unwrap(),
            Value::Uint(1)
        );
        assert_eq!(
            vm.execute_function("C", "get", vec![], Some(&second)).unwrap(),
            Value::Uint(2)
        );
        // shortcut points at the latest deployment
        assert_eq!(
            vm.execute_function("C", "get", vec![], None).unwrap(),
            Value::Uint(2)
        );
    }

    #[test]
    fn test_argument_count_mismatch() {
        let mut vm = vm_with("contract C { function f(x: int) { } }");
        assert_eq!(
            vm.execute_function("C", "f", vec![], None).unwrap_err(),
            VmError::ArgumentCountMismatch { expected: 1, got: 0 }
        );
    }

    #[test]
    fn test_unknown_function() {
        let mut vm = vm_with("contract C {}");
        assert!(matches!(
            vm.execute_function("C", "ghost", vec![], None).unwrap_err(),
            VmError::FunctionNotFound { .. }
        ));
    }

    #[test]
    fn test_cross_function_call() {
        let mut vm = vm_with(
            "contract C { function double(x: int) returns int { return x * 2; } function quad(x: int) returns int { return double(double(x)); } }",
        );
        assert_eq!(
            vm.execute_function("C", "quad", vec![Value::Int(3)], None).unwrap(),
            Value::Int(12)
        );
    }

    #[test]
    fn test_recursion_hits_depth_limit() {
        let mut vm = vm_with("contract C { function f() { f(); } }");
        assert_eq!(
            vm.execute_function("C", "f", vec![], None).unwrap_err(),
            VmError::CallDepthExceeded
        );
        // frames unwound, VM still usable
        let mut other = vm_with("contract D { function g() returns int { return 1; } }");
        assert_eq!(other.execute_function("D", "g", vec![], None).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_while_loop_executes() {
        let mut vm = vm_with(
            "contract C { function sum(n: int) returns int { let total: int = 0; let i: int = 1; while (i <= n) { total = total + i; i = i + 1; } return total; } }",
        );
        assert_eq!(
            vm.execute_function("C", "sum", vec![Value::Int(10)], None).unwrap(),
            Value::Int(55)
        );
    }

    #[test]
    fn test_for_loop_executes() {
        let mut vm = vm_with(
            "contract C { function f() returns int { let total: int = 0; for (let i: int = 0; i < 5; i = i + 1) { total = total + i; } return total; } }",
        );
        assert_eq!(vm.execute_function("C", "f", vec![], None).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_if_else_branches() {
        let source =
            "contract C { function sign(x: int) returns int { if (x > 0) { return 1; } else if (x < 0) { return -1; } else { return 0; } } }";
        let mut vm = vm_with(source);
        for (input, expected) in [(5, 1), (-5, -1), (0, 0)] {
            assert_eq!(
                vm.execute_function("C", "sign", vec![Value::Int(input)], None).unwrap(),
                Value::Int(expected),
                "sign({input})"
            );
        }
    }

    #[test]
    fn test_print_builtin_returns_null() {
        let mut vm = vm_with("contract C { function f() { print(\"hi\", 1); } }");
        assert_eq!(vm.execute_function("C", "f", vec![], None).unwrap(), Value::Null);
    }

    #[test]
    fn test_len_builtin_via_foreach() {
        let mut vm = vm_with(
            "contract C { function count(xs: array<int>) returns int { let n: int = 0; foreach (x in xs) { n = n + x; } return n; } }",
        );
        let xs = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            vm.execute_function("C", "count", vec![xs], None).unwrap(),
            Value::Int(6)
        );
    }

    #[test]
    fn test_stats_accumulate_and_reset() {
        let mut vm = vm_with(SIMPLE_TOKEN);
        deploy_simple_token(&mut vm);
        vm.execute_function("SimpleToken", "getName", vec![], None).unwrap();

        let stats = *vm.get_stats();
        assert_eq!(stats.function_calls, 2); // constructor + getName
        assert_eq!(stats.storage_writes, 3);
        assert_eq!(stats.storage_reads, 1);
        assert!(stats.instructions_executed > 0);
        assert_eq!(stats.gas_used, stats.instructions_executed);

        vm.execute_function("SimpleToken", "getSymbol", vec![], None).unwrap();
        assert_eq!(vm.get_stats().function_calls, 3);

        vm.reset();
        assert_eq!(*vm.get_stats(), VmStats::default());
        assert!(vm.get_logs().is_empty());
        assert!(vm.storages().is_empty());
        assert_eq!(
            vm.deploy_contract("SimpleToken", vec![]),
            Err(VmError::ContractNotFound("SimpleToken".into()))
        );
    }

    #[test]
    fn test_storage_not_rolled_back_on_require_failure() {
        let mut vm = vm_with(
            "contract C { state { x: uint; } function f() { x = 5; require(false, \"late\"); } function get() view returns uint { return x; } }",
        );
        let err = vm.execute_function("C", "f", vec![], None).unwrap_err();
        assert_eq!(err, VmError::RequireFailed("late".into()));
        assert_eq!(vm.execute_function("C", "get", vec![], None).unwrap(), Value::Uint(5));
    }

    #[test]
    fn test_member_access_on_non_object_fails() {
        let mut vm = vm_with("contract C { function f(x: int) returns int { return x.y; } }");
        assert!(matches!(
            vm.execute_function("C", "f", vec![Value::Int(1)], None).unwrap_err(),
            VmError::MemberLoadOnNonObject { .. }
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut vm = vm_with(
            "contract C { function f(xs: array<int>) returns int { return xs[9]; } }",
        );
        let xs = Value::List(vec![Value::Int(1)]);
        assert_eq!(
            vm.execute_function("C", "f", vec![xs], None).unwrap_err(),
            VmError::IndexOutOfRange { index: 9, len: 1 }
        );
    }

    #[test]
    fn test_load_replaces_contract() {
        let mut vm = vm_with("contract C { function f() returns int { return 1; } }");
        vm.load_contract(&compile("contract C { function f() returns int { return 2; } }"));
        assert_eq!(vm.execute_function("C", "f", vec![], None).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_arg_coercion_to_param_types() {
        let mut vm = vm_with(
            "contract C { state { owner: address; } constructor(owner: address) { self.owner = owner; } function get() view returns address { return self.owner; } }",
        );
        vm.deploy_contract("C", vec![Value::Str("0xabc".into())]).unwrap();
        assert_eq!(
            vm.execute_function("C", "get", vec![], None).unwrap(),
            Value::Address("0xabc".into())
        );
    }
}
