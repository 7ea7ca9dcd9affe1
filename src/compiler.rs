//! Two-pass compiler from the AST to the bytecode artifact.
//!
//! Pass 1 registers top-level declarations (contracts, interfaces,
//! structs, enums, enum values) in the global symbol frame. Pass 2
//! walks each contract: state variables receive dense offsets and
//! events are registered first, then constructors and functions are
//! lowered to instructions.
//!
//! Errors accumulate; the artifact is best-effort and callers must
//! check the error list before using it. Identical ASTs compile to
//! identical bytecode.

use crate::ast::*;
use crate::bytecode::{
    Bytecode, ContractCode, EventAbi, FunctionCode, Instruction, Param as CodeParam, ReturnSource,
    StateVariable,
};
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

const REQUIRE_DEFAULT_MESSAGE: &str = "Requirement failed";
const ASSERT_MESSAGE: &str = "Assertion failed";
const REVERT_DEFAULT_MESSAGE: &str = "Reverted";

/// A pending jump whose displacement is patched once the dependent
/// region has been emitted. Offsets are relative to the instruction
/// following the jump, so fragments stay position-independent.
struct PatchPoint(usize);

fn emit_jump(code: &mut Vec<Instruction>, jump: Instruction) -> PatchPoint {
    debug_assert!(matches!(
        jump,
        Instruction::Jump { .. } | Instruction::JumpIfFalse { .. }
    ));
    code.push(jump);
    PatchPoint(code.len() - 1)
}

/// Point `patch` at the current end of `code`.
fn patch_to_here(code: &mut Vec<Instruction>, patch: PatchPoint) {
    let offset = code.len() as i64 - patch.0 as i64;
    let patched = code[patch.0].set_offset(offset);
    debug_assert!(patched, "patch point must be a jump");
}

/// Compiler for Grishex programs.
///
/// Reusable across sources: `reset` restores the initial state. Symbol
/// tables are scoped to a single `compile` invocation.
pub struct Compiler {
    bytecode: Bytecode,
    errors: Vec<Diagnostic>,
    symbols: SymbolTable,
    in_view_function: bool,
    state_var_count: usize,
    local_var_count: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            bytecode: Bytecode::new(),
            errors: Vec::new(),
            symbols: SymbolTable::new(),
            in_view_function: false,
            state_var_count: 0,
            local_var_count: 0,
        }
    }

    /// Clear all accumulated state (bytecode and errors).
    pub fn reset(&mut self) {
        *self = Compiler::new();
    }

    /// Compile a program, returning the accumulated artifact and error
    /// list. The artifact may be partially populated when errors are
    /// present.
    pub fn compile(&mut self, program: &Program) -> (Bytecode, Vec<Diagnostic>) {
        // Tables never outlive one invocation.
        self.symbols = SymbolTable::new();

        self.gather_declarations(program);
        if self.errors.is_empty() {
            self.compile_program(program);
        }

        (self.bytecode.clone(), self.errors.clone())
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    fn error(&mut self, message: String, span: Span) {
        self.errors.push(Diagnostic::error(message, span));
    }

    // ─── Pass 1: declaration gathering ─────────────────────────────

    fn gather_declarations(&mut self, program: &Program) {
        for decl in &program.declarations {
            match &decl.node {
                Declaration::Contract(contract) => {
                    let name = contract.name.node.clone();
                    if self.symbols.contains_global(&name) {
                        self.error(format!("Contract {} already defined", name), contract.name.span);
                        continue;
                    }
                    self.symbols.define(&name, Symbol::Contract);
                    self.bytecode.contracts.insert(name, ContractCode::default());
                }
                Declaration::Interface(interface) => {
                    let name = interface.name.node.clone();
                    if self.symbols.contains_global(&name) {
                        self.error(
                            format!("Interface {} already defined", name),
                            interface.name.span,
                        );
                        continue;
                    }
                    self.symbols.define(&name, Symbol::Interface);
                }
                Declaration::Struct(strukt) => {
                    let name = strukt.name.node.clone();
                    if self.symbols.contains_global(&name) {
                        self.error(format!("Struct {} already defined", name), strukt.name.span);
                        continue;
                    }
                    self.symbols.define(&name, Symbol::Struct);
                }
                Declaration::Enum(enumeration) => {
                    let name = enumeration.name.node.clone();
                    if self.symbols.contains_global(&name) {
                        self.error(format!("Enum {} already defined", name), enumeration.name.span);
                        continue;
                    }
                    self.symbols.define(&name, Symbol::Enum);
                    for (i, value) in enumeration.values.iter().enumerate() {
                        if self.symbols.contains_global(&value.node) {
                            self.error(
                                format!("Enum value {} already defined", value.node),
                                value.span,
                            );
                            continue;
                        }
                        self.symbols.define(
                            &value.node,
                            Symbol::EnumValue {
                                enum_name: name.clone(),
                                value: i as i64,
                            },
                        );
                    }
                }
            }
        }
    }

    // ─── Pass 2: code generation ───────────────────────────────────

    fn compile_program(&mut self, program: &Program) {
        for decl in &program.declarations {
            if let Declaration::Contract(contract) = &decl.node {
                self.compile_contract(contract);
            }
            // Interfaces, structs, and enums are registered only; they
            // have no code in bytecode v1.
        }
    }

    fn compile_contract(&mut self, contract: &ContractDecl) {
        let name = contract.name.node.clone();
        self.symbols.push_frame();
        self.state_var_count = 0;

        let mut code = self.bytecode.contracts.get(&name).cloned().unwrap_or_default();

        // State variables and events first, so bodies can use them
        // regardless of where they are declared in the contract.
        for item in &contract.items {
            match &item.node {
                ContractItem::State(vars) => self.compile_state_variables(vars, &mut code),
                ContractItem::Event(event) => self.compile_event(event, &mut code),
                _ => {}
            }
        }

        for item in &contract.items {
            match &item.node {
                ContractItem::Constructor(ctor) => self.compile_constructor(ctor, &mut code),
                ContractItem::Function(function) => self.compile_function(function, &mut code),
                _ => {}
            }
        }

        self.bytecode.contracts.insert(name, code);
        self.symbols.pop_frame();
    }

    fn compile_state_variables(&mut self, vars: &[StateVarDecl], code: &mut ContractCode) {
        for var in vars {
            if self.symbols.contains_local(&var.name.node) {
                self.error(
                    format!("Variable {} already defined", var.name.node),
                    var.name.span,
                );
                continue;
            }
            if !self.is_valid_type(&var.ty.node) {
                self.error(format!("Unknown type {}", var.ty.node), var.ty.span);
                continue;
            }
            let ty = var.ty.node.to_string();
            self.symbols.define(
                &var.name.node,
                Symbol::StateVar {
                    ty: ty.clone(),
                    offset: self.state_var_count,
                },
            );
            code.state_variables.insert(
                var.name.node.clone(),
                StateVariable {
                    ty,
                    offset: self.state_var_count,
                },
            );
            self.state_var_count += 1;
        }
    }

    fn compile_event(&mut self, event: &EventDecl, code: &mut ContractCode) {
        if self.symbols.contains_local(&event.name.node) {
            self.error(
                format!("Event {} already defined", event.name.node),
                event.name.span,
            );
            return;
        }
        let mut params = Vec::new();
        for param in &event.params {
            if !self.is_valid_type(&param.ty.node) {
                self.error(format!("Unknown type {}", param.ty.node), param.ty.span);
                continue;
            }
            params.push(CodeParam {
                name: param.name.node.clone(),
                ty: param.ty.node.to_string(),
            });
        }
        code.events.insert(
            event.name.node.clone(),
            EventAbi {
                params: params.clone(),
            },
        );
        self.symbols.define(&event.name.node, Symbol::Event { params });
    }

    /// Register parameters at their declaration indices and return the
    /// artifact's parameter list.
    fn compile_params(&mut self, params: &[Param]) -> Vec<CodeParam> {
        let mut compiled = Vec::new();
        for (i, param) in params.iter().enumerate() {
            if self.symbols.contains_local(&param.name.node) {
                self.error(
                    format!("Parameter {} already defined", param.name.node),
                    param.name.span,
                );
                continue;
            }
            if !self.is_valid_type(&param.ty.node) {
                self.error(format!("Unknown type {}", param.ty.node), param.ty.span);
                continue;
            }
            let ty = param.ty.node.to_string();
            self.symbols.define(
                &param.name.node,
                Symbol::Param {
                    ty: ty.clone(),
                    index: i,
                },
            );
            compiled.push(CodeParam {
                name: param.name.node.clone(),
                ty,
            });
        }
        compiled
    }

    fn compile_constructor(&mut self, ctor: &ConstructorDecl, contract_code: &mut ContractCode) {
        self.symbols.push_frame();
        self.in_view_function = false;

        let params = self.compile_params(&ctor.params);
        // Parameters occupy slots 0..N-1; locals follow.
        self.local_var_count = ctor.params.len();
        let mut code = self.compile_block(&ctor.body.node);
        code.push(Instruction::Return {
            value: ReturnSource::Const(Value::Null),
        });

        contract_code.functions.insert(
            "constructor".to_string(),
            FunctionCode {
                params,
                return_type: None,
                is_view: false,
                is_private: false,
                code,
            },
        );

        self.symbols.pop_frame();
    }

    fn compile_function(&mut self, function: &FunctionDecl, contract_code: &mut ContractCode) {
        let name = function.name.node.clone();
        if self.symbols.contains_local(&name) {
            self.error(format!("Function {} already defined", name), function.name.span);
            return;
        }

        self.symbols.push_frame();
        self.in_view_function = function.is_view;

        let params = self.compile_params(&function.params);
        self.local_var_count = function.params.len();

        let mut return_type = None;
        if let Some(rt) = &function.return_type {
            if self.is_valid_type(&rt.node) {
                return_type = Some(rt.node.to_string());
            } else {
                self.error(format!("Unknown return type {}", rt.node), rt.span);
            }
        }

        let mut code = match &function.body {
            Some(body) => self.compile_block(&body.node),
            None => Vec::new(),
        };

        // Every function terminates in RETURN; typed functions falling
        // off the end return their type's default value.
        if !matches!(code.last(), Some(Instruction::Return { .. })) {
            let value = match &return_type {
                Some(ty) => default_value_for_type(ty),
                None => Value::Null,
            };
            code.push(Instruction::Return {
                value: ReturnSource::Const(value),
            });
        }

        contract_code.functions.insert(
            name.clone(),
            FunctionCode {
                params,
                return_type: return_type.clone(),
                is_view: function.is_view,
                is_private: function.is_private,
                code,
            },
        );

        self.symbols.pop_frame();
        // The function's symbol lives in the contract's scope.
        self.symbols.define(
            &name,
            Symbol::Function {
                return_type,
                is_view: function.is_view,
                is_private: function.is_private,
            },
        );
        self.in_view_function = false;
    }

    // ─── Statements ────────────────────────────────────────────────

    fn compile_block(&mut self, block: &Block) -> Vec<Instruction> {
        self.symbols.push_frame();
        let mut code = Vec::new();
        for stmt in &block.statements {
            code.extend(self.compile_statement(stmt));
        }
        self.symbols.pop_frame();
        code
    }

    fn compile_statement(&mut self, stmt: &Spanned<Stmt>) -> Vec<Instruction> {
        match &stmt.node {
            Stmt::Let { name, ty, init } => self.compile_let(name, ty, init.as_ref()),
            Stmt::Assign { target, value } => self.compile_assignment(target, value),
            Stmt::If {
                condition,
                then_block,
                else_branch,
            } => self.compile_if(condition, then_block, else_branch.as_deref()),
            Stmt::While { condition, body } => self.compile_while(condition, body),
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.compile_for(init.as_deref(), condition.as_ref(), update.as_deref(), body),
            Stmt::Foreach {
                var,
                collection,
                body,
            } => self.compile_foreach(var, collection, body),
            Stmt::Return(value) => match value {
                Some(expr) => {
                    let mut code = self.compile_expression(expr);
                    code.push(Instruction::Return {
                        value: ReturnSource::Stack,
                    });
                    code
                }
                None => vec![Instruction::Return {
                    value: ReturnSource::Const(Value::Null),
                }],
            },
            Stmt::Require { condition, message } => {
                let mut code = self.compile_expression(condition);
                code.push(Instruction::Require {
                    message: message
                        .clone()
                        .unwrap_or_else(|| REQUIRE_DEFAULT_MESSAGE.to_string()),
                });
                code
            }
            Stmt::Assert { condition } => {
                let mut code = self.compile_expression(condition);
                code.push(Instruction::Require {
                    message: ASSERT_MESSAGE.to_string(),
                });
                code
            }
            Stmt::Revert { message } => vec![
                Instruction::Push {
                    value: Value::Bool(false),
                },
                Instruction::Require {
                    message: message
                        .clone()
                        .unwrap_or_else(|| REVERT_DEFAULT_MESSAGE.to_string()),
                },
            ],
            Stmt::Emit { event, args } => self.compile_emit(event, args),
            Stmt::TryCatch { .. } => {
                self.error(
                    "try/catch is not supported by bytecode v1".to_string(),
                    stmt.span,
                );
                Vec::new()
            }
            Stmt::Block(block) => self.compile_block(block),
            Stmt::Expr(expr) => {
                let mut code = self.compile_expression(expr);
                code.push(Instruction::Pop);
                code
            }
        }
    }

    fn compile_let(
        &mut self,
        name: &Spanned<String>,
        ty: &Spanned<TypeExpr>,
        init: Option<&Spanned<Expr>>,
    ) -> Vec<Instruction> {
        if self.symbols.contains_local(&name.node) {
            self.error(format!("Variable {} already defined", name.node), name.span);
            return Vec::new();
        }
        if !self.is_valid_type(&ty.node) {
            self.error(format!("Unknown type {}", ty.node), ty.span);
            return Vec::new();
        }

        let type_name = ty.node.to_string();
        let mut code = match init {
            Some(expr) => self.compile_expression(expr),
            None => vec![Instruction::Push {
                value: default_value_for_type(&type_name),
            }],
        };

        self.symbols.define(
            &name.node,
            Symbol::Local {
                ty: type_name,
                index: self.local_var_count,
            },
        );
        code.push(Instruction::StoreLocal {
            index: self.local_var_count,
        });
        self.local_var_count += 1;
        code
    }

    fn compile_assignment(&mut self, target: &Spanned<Expr>, value: &Spanned<Expr>) -> Vec<Instruction> {
        let mut code = self.compile_expression(value);

        match &target.node {
            Expr::Identifier(name) => {
                let symbol = self.symbols.resolve(name).cloned();
                match symbol {
                    Some(Symbol::Local { index, .. }) | Some(Symbol::Param { index, .. }) => {
                        code.push(Instruction::StoreLocal { index });
                    }
                    Some(Symbol::StateVar { offset, .. }) => {
                        if self.in_view_function {
                            self.error(
                                format!("Cannot assign to state variable {} in a view function", name),
                                target.span,
                            );
                            return Vec::new();
                        }
                        code.push(Instruction::StoreState { offset });
                    }
                    Some(_) => {
                        self.error(format!("Cannot assign to {}", name), target.span);
                        return Vec::new();
                    }
                    None => {
                        self.error(format!("Undefined identifier: {}", name), target.span);
                        return Vec::new();
                    }
                }
            }
            Expr::Member { object, member } => {
                if matches!(object.node, Expr::SelfRef) && self.in_view_function {
                    self.error(
                        format!(
                            "Cannot assign to state variable {} in a view function",
                            member.node
                        ),
                        target.span,
                    );
                    return Vec::new();
                }
                // The stored value stays on the stack: the assignment
                // itself evaluates to it.
                code.push(Instruction::Dup);
                code.extend(self.compile_expression(object));
                code.push(Instruction::StoreMember {
                    member: member.node.clone(),
                });
            }
            Expr::Index { object, index } => {
                code.push(Instruction::Dup);
                code.extend(self.compile_expression(object));
                code.extend(self.compile_expression(index));
                code.push(Instruction::StoreIndex);
            }
            _ => {
                self.error("Invalid assignment target".to_string(), target.span);
                return Vec::new();
            }
        }

        code
    }

    fn compile_if(
        &mut self,
        condition: &Spanned<Expr>,
        then_block: &Spanned<Block>,
        else_branch: Option<&Spanned<Stmt>>,
    ) -> Vec<Instruction> {
        let mut code = self.compile_expression(condition);
        let skip_then = emit_jump(&mut code, Instruction::JumpIfFalse { offset: 0 });

        code.extend(self.compile_block(&then_block.node));

        match else_branch {
            Some(else_stmt) => {
                let skip_else = emit_jump(&mut code, Instruction::Jump { offset: 0 });
                patch_to_here(&mut code, skip_then);
                code.extend(self.compile_statement(else_stmt));
                patch_to_here(&mut code, skip_else);
            }
            None => {
                patch_to_here(&mut code, skip_then);
            }
        }

        code
    }

    fn compile_while(&mut self, condition: &Spanned<Expr>, body: &Spanned<Block>) -> Vec<Instruction> {
        let mut code = Vec::new();
        let loop_start = code.len();
        code.extend(self.compile_expression(condition));
        let exit = emit_jump(&mut code, Instruction::JumpIfFalse { offset: 0 });

        code.extend(self.compile_block(&body.node));

        let back = code.len();
        code.push(Instruction::Jump {
            offset: loop_start as i64 - back as i64,
        });
        patch_to_here(&mut code, exit);
        code
    }

    fn compile_for(
        &mut self,
        init: Option<&Spanned<Stmt>>,
        condition: Option<&Spanned<Expr>>,
        update: Option<&Spanned<Stmt>>,
        body: &Spanned<Block>,
    ) -> Vec<Instruction> {
        // The induction variable lives in its own frame around the loop.
        self.symbols.push_frame();

        let mut code = match init {
            Some(stmt) => self.compile_statement(stmt),
            None => Vec::new(),
        };

        let loop_start = code.len();
        match condition {
            Some(expr) => code.extend(self.compile_expression(expr)),
            None => code.push(Instruction::Push {
                value: Value::Bool(true),
            }),
        }
        let exit = emit_jump(&mut code, Instruction::JumpIfFalse { offset: 0 });

        code.extend(self.compile_block(&body.node));
        if let Some(stmt) = update {
            code.extend(self.compile_statement(stmt));
        }

        let back = code.len();
        code.push(Instruction::Jump {
            offset: loop_start as i64 - back as i64,
        });
        patch_to_here(&mut code, exit);

        self.symbols.pop_frame();
        code
    }

    /// Lower `foreach (x in e)` to an index loop over hidden collection
    /// and cursor slots, using the VM's `len` builtin for the bound.
    fn compile_foreach(
        &mut self,
        var: &Spanned<String>,
        collection: &Spanned<Expr>,
        body: &Spanned<Block>,
    ) -> Vec<Instruction> {
        self.symbols.push_frame();

        let mut code = self.compile_expression(collection);
        let coll_slot = self.local_var_count;
        let cursor_slot = self.local_var_count + 1;
        let var_slot = self.local_var_count + 2;
        self.local_var_count += 3;

        code.push(Instruction::StoreLocal { index: coll_slot });
        code.push(Instruction::Push { value: Value::Int(0) });
        code.push(Instruction::StoreLocal { index: cursor_slot });

        let loop_start = code.len();
        code.push(Instruction::LoadLocal { index: cursor_slot });
        code.push(Instruction::LoadLocal { index: coll_slot });
        code.push(Instruction::Call {
            function: "len".to_string(),
            args_count: 1,
        });
        code.push(Instruction::Lt);
        let exit = emit_jump(&mut code, Instruction::JumpIfFalse { offset: 0 });

        self.symbols.define(
            &var.node,
            Symbol::Local {
                ty: "any".to_string(),
                index: var_slot,
            },
        );
        code.push(Instruction::LoadLocal { index: coll_slot });
        code.push(Instruction::LoadLocal { index: cursor_slot });
        code.push(Instruction::LoadIndex);
        code.push(Instruction::StoreLocal { index: var_slot });

        code.extend(self.compile_block(&body.node));

        code.push(Instruction::LoadLocal { index: cursor_slot });
        code.push(Instruction::Push { value: Value::Int(1) });
        code.push(Instruction::Add);
        code.push(Instruction::StoreLocal { index: cursor_slot });

        let back = code.len();
        code.push(Instruction::Jump {
            offset: loop_start as i64 - back as i64,
        });
        patch_to_here(&mut code, exit);

        self.symbols.pop_frame();
        code
    }

    fn compile_emit(&mut self, event: &Spanned<String>, args: &[Spanned<Expr>]) -> Vec<Instruction> {
        let params = match self.symbols.resolve(&event.node).cloned() {
            Some(Symbol::Event { params }) => params,
            _ => {
                self.error(format!("Undefined event: {}", event.node), event.span);
                return Vec::new();
            }
        };
        if args.len() != params.len() {
            self.error(
                format!(
                    "Event {} expects {} arguments, got {}",
                    event.node,
                    params.len(),
                    args.len()
                ),
                event.span,
            );
            return Vec::new();
        }

        let mut code = Vec::new();
        for arg in args {
            code.extend(self.compile_expression(arg));
        }
        code.push(Instruction::Emit {
            event: event.node.clone(),
            args_count: args.len(),
        });
        code
    }

    // ─── Expressions ───────────────────────────────────────────────

    fn compile_expression(&mut self, expr: &Spanned<Expr>) -> Vec<Instruction> {
        match &expr.node {
            Expr::Literal(literal) => vec![Instruction::Push {
                value: literal_value(literal),
            }],
            Expr::Identifier(name) => self.compile_identifier(name, expr.span),
            Expr::SelfRef => vec![Instruction::Push {
                value: Value::SelfRef,
            }],
            Expr::Member { object, member } => {
                let mut code = self.compile_expression(object);
                code.push(Instruction::LoadMember {
                    member: member.node.clone(),
                });
                code
            }
            Expr::Index { object, index } => {
                let mut code = self.compile_expression(object);
                code.extend(self.compile_expression(index));
                code.push(Instruction::LoadIndex);
                code
            }
            Expr::Call { function, args } => {
                let mut code = Vec::new();
                for arg in args {
                    code.extend(self.compile_expression(arg));
                }
                code.push(Instruction::Call {
                    function: function.node.clone(),
                    args_count: args.len(),
                });
                code
            }
            Expr::Binary { op, lhs, rhs } => {
                let mut code = self.compile_expression(lhs);
                code.extend(self.compile_expression(rhs));
                code.push(binary_instruction(*op));
                code
            }
            Expr::Unary { op, operand } => {
                let mut code = self.compile_expression(operand);
                code.push(match op {
                    UnaryOp::Neg => Instruction::Neg,
                    UnaryOp::Not => Instruction::Not,
                });
                code
            }
        }
    }

    fn compile_identifier(&mut self, name: &str, span: Span) -> Vec<Instruction> {
        match self.symbols.resolve(name).cloned() {
            Some(Symbol::Local { index, .. }) | Some(Symbol::Param { index, .. }) => {
                vec![Instruction::LoadLocal { index }]
            }
            Some(Symbol::StateVar { offset, .. }) => vec![Instruction::LoadState { offset }],
            Some(Symbol::EnumValue { value, .. }) => vec![Instruction::Push {
                value: Value::Int(value),
            }],
            Some(_) => {
                self.error(format!("Cannot use {} as an expression", name), span);
                Vec::new()
            }
            None => {
                self.error(format!("Undefined identifier: {}", name), span);
                Vec::new()
            }
        }
    }

    // ─── Types ─────────────────────────────────────────────────────

    fn is_valid_type(&self, ty: &TypeExpr) -> bool {
        match ty {
            TypeExpr::Named(name) => {
                matches!(
                    name.as_str(),
                    "int" | "uint" | "bool" | "address" | "string" | "bytes" | "hash" | "float"
                ) || matches!(
                    self.symbols.resolve_global(name),
                    Some(Symbol::Struct) | Some(Symbol::Enum)
                )
            }
            TypeExpr::Array(elem) => self.is_valid_type(&elem.node),
            TypeExpr::Map(key, value) => {
                self.is_valid_type(&key.node) && self.is_valid_type(&value.node)
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

fn binary_instruction(op: BinOp) -> Instruction {
    match op {
        BinOp::Add => Instruction::Add,
        BinOp::Sub => Instruction::Sub,
        BinOp::Mul => Instruction::Mul,
        BinOp::Div => Instruction::Div,
        BinOp::Mod => Instruction::Mod,
        BinOp::Eq => Instruction::Eq,
        BinOp::Neq => Instruction::Neq,
        BinOp::Lt => Instruction::Lt,
        BinOp::Gt => Instruction::Gt,
        BinOp::Lte => Instruction::Lte,
        BinOp::Gte => Instruction::Gte,
        BinOp::And => Instruction::And,
        BinOp::Or => Instruction::Or,
    }
}

/// Default values per type; user-defined and container types default to
/// the null sentinel.
pub fn default_value_for_type(type_name: &str) -> Value {
    match type_name {
        "int" => Value::Int(0),
        "uint" => Value::Uint(0),
        "bool" => Value::Bool(false),
        "float" => Value::Float(0.0),
        "address" => Value::Address(format!("0x{}", "0".repeat(40))),
        "string" => Value::Str(String::new()),
        "bytes" => Value::Bytes(Vec::new()),
        "hash" => Value::Hash(format!("0x{}", "0".repeat(64))),
        _ => Value::Null,
    }
}
