use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};
use crate::token::{Token, TokenKind};

const MAX_NESTING_DEPTH: u32 = 256;

type PResult<T> = Result<T, Diagnostic>;

/// Recursive-descent parser for Grishex token streams.
///
/// Parsing fails soft: a mismatch anywhere unwinds to [`parse`], which
/// records the diagnostic and returns an empty program. The parser never
/// panics and never propagates errors across the API boundary.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: u32,
}

/// Parse a token stream into a program plus accumulated errors.
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    Parser::new(tokens).run()
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        // The lexer always terminates streams with Eof; tolerate
        // hand-built streams that don't.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, "", 1, 1, Span::dummy()));
        }
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    fn run(mut self) -> (Program, Vec<Diagnostic>) {
        match self.parse_program() {
            Ok(program) => (program, self.diagnostics),
            Err(diag) => {
                self.diagnostics.push(diag);
                (Program::empty(), self.diagnostics)
            }
        }
    }

    // ─── Token helpers ─────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.peek().span
        }
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn consume_ident(&mut self, message: &str) -> PResult<Spanned<String>> {
        let token = self.consume(TokenKind::Ident, message)?;
        Ok(Spanned::new(token.lexeme, token.span))
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn error_at_current(&self, message: &str) -> Diagnostic {
        let token = self.peek();
        Diagnostic::error(
            format!("{}, found {}", message, token.kind.description()),
            token.span,
        )
        .at(token.line, token.column)
    }

    fn error_at(&self, token: &Token, message: String) -> Diagnostic {
        Diagnostic::error(message, token.span).at(token.line, token.column)
    }

    fn enter_nesting(&mut self) -> PResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self
                .error_at_current("nesting depth exceeded (maximum 256 levels)")
                .with_help("split deeply nested code into helper functions".to_string()));
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    // ─── Program structure ─────────────────────────────────────────

    fn parse_program(&mut self) -> PResult<Program> {
        let mut program = Program::empty();

        if self.check(TokenKind::Pragma) {
            program.pragma = Some(self.parse_pragma()?);
        }

        while !self.is_at_end() {
            let start = self.peek().span;
            let declaration = if self.eat(TokenKind::Contract) {
                Declaration::Contract(self.parse_contract()?)
            } else if self.eat(TokenKind::Interface) {
                Declaration::Interface(self.parse_interface()?)
            } else if self.eat(TokenKind::Struct) {
                Declaration::Struct(self.parse_struct()?)
            } else if self.eat(TokenKind::Enum) {
                Declaration::Enum(self.parse_enum()?)
            } else {
                let token = self.peek().clone();
                return Err(self.error_at(&token, format!("Unexpected token: {}", token.lexeme)));
            };
            program
                .declarations
                .push(Spanned::new(declaration, start.merge(self.prev_span())));
        }

        Ok(program)
    }

    fn parse_pragma(&mut self) -> PResult<Spanned<Pragma>> {
        let start = self.advance().span; // 'pragma'
        let name = self.consume_ident("Expected 'grishex' after 'pragma'")?;
        if name.node != "grishex" {
            let token = self.tokens[self.pos - 1].clone();
            return Err(self.error_at(&token, format!("Expected 'grishex', got '{}'", name.node)));
        }
        let version = if self.check(TokenKind::Int) || self.check(TokenKind::Float) {
            self.advance().lexeme
        } else {
            return Err(self.error_at_current("Expected version number after 'grishex'"));
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after pragma declaration")?;
        Ok(Spanned::new(
            Pragma {
                name: name.node,
                version,
            },
            start.merge(self.prev_span()),
        ))
    }

    fn parse_contract(&mut self) -> PResult<ContractDecl> {
        let name = self.consume_ident("Expected contract name")?;
        self.consume(TokenKind::LBrace, "Expected '{' after contract name")?;

        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let start = self.peek().span;
            let item = if self.eat(TokenKind::State) {
                ContractItem::State(self.parse_state_block()?)
            } else if self.eat(TokenKind::Constructor) {
                ContractItem::Constructor(self.parse_constructor()?)
            } else if self.eat(TokenKind::Function) {
                ContractItem::Function(self.parse_function(false, false)?)
            } else if self.eat(TokenKind::View) {
                self.consume(TokenKind::Function, "Expected 'function' after 'view'")?;
                ContractItem::Function(self.parse_function(true, false)?)
            } else if self.eat(TokenKind::Private) {
                self.consume(TokenKind::Function, "Expected 'function' after 'private'")?;
                ContractItem::Function(self.parse_function(false, true)?)
            } else if self.eat(TokenKind::Event) {
                ContractItem::Event(self.parse_event()?)
            } else {
                let token = self.peek().clone();
                return Err(
                    self.error_at(&token, format!("Unexpected token in contract: {}", token.lexeme))
                );
            };
            items.push(Spanned::new(item, start.merge(self.prev_span())));
        }

        self.consume(TokenKind::RBrace, "Expected '}' after contract definition")?;
        Ok(ContractDecl { name, items })
    }

    fn parse_interface(&mut self) -> PResult<InterfaceDecl> {
        let name = self.consume_ident("Expected interface name")?;
        self.consume(TokenKind::LBrace, "Expected '{' after interface name")?;

        let mut functions = Vec::new();
        let mut events = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(TokenKind::Function) {
                functions.push(self.parse_function_signature(false)?);
            } else if self.eat(TokenKind::View) {
                self.consume(TokenKind::Function, "Expected 'function' after 'view'")?;
                functions.push(self.parse_function_signature(true)?);
            } else if self.eat(TokenKind::Event) {
                events.push(self.parse_event()?);
            } else {
                let token = self.peek().clone();
                return Err(self.error_at(
                    &token,
                    format!("Unexpected token in interface: {}", token.lexeme),
                ));
            }
        }

        self.consume(TokenKind::RBrace, "Expected '}' after interface definition")?;
        Ok(InterfaceDecl {
            name,
            functions,
            events,
        })
    }

    fn parse_state_block(&mut self) -> PResult<Vec<StateVarDecl>> {
        self.consume(TokenKind::LBrace, "Expected '{' after 'state'")?;
        let mut vars = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let name = self.consume_ident("Expected variable name")?;
            self.consume(TokenKind::Colon, "Expected ':' after variable name")?;
            let ty = self.parse_type()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration")?;
            vars.push(StateVarDecl { name, ty });
        }
        self.consume(TokenKind::RBrace, "Expected '}' after state definition")?;
        Ok(vars)
    }

    fn parse_constructor(&mut self) -> PResult<ConstructorDecl> {
        self.consume(TokenKind::LParen, "Expected '(' after 'constructor'")?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::RParen, "Expected ')' after constructor parameters")?;
        let body = self.parse_block()?;
        Ok(ConstructorDecl { params, body })
    }

    /// Parse a function after its `function` keyword. Modifiers are
    /// accepted both prefixed (`view function f()`) and postfixed
    /// (`function f() view returns T`).
    fn parse_function(&mut self, is_view: bool, is_private: bool) -> PResult<FunctionDecl> {
        let (name, params, is_view, is_private, return_type) =
            self.parse_function_header(is_view, is_private)?;
        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            is_view,
            is_private,
            params,
            return_type,
            body: Some(body),
        })
    }

    fn parse_function_signature(&mut self, is_view: bool) -> PResult<FunctionDecl> {
        let (name, params, is_view, is_private, return_type) =
            self.parse_function_header(is_view, false)?;
        self.consume(TokenKind::Semicolon, "Expected ';' after function signature")?;
        Ok(FunctionDecl {
            name,
            is_view,
            is_private,
            params,
            return_type,
            body: None,
        })
    }

    #[allow(clippy::type_complexity)]
    fn parse_function_header(
        &mut self,
        mut is_view: bool,
        mut is_private: bool,
    ) -> PResult<(
        Spanned<String>,
        Vec<Param>,
        bool,
        bool,
        Option<Spanned<TypeExpr>>,
    )> {
        let name = self.consume_ident("Expected function name")?;
        self.consume(TokenKind::LParen, "Expected '(' after function name")?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::RParen, "Expected ')' after function parameters")?;

        loop {
            if self.eat(TokenKind::View) {
                is_view = true;
            } else if self.eat(TokenKind::Private) {
                is_private = true;
            } else {
                break;
            }
        }

        let return_type = if self.eat(TokenKind::Returns) {
            Some(self.parse_type()?)
        } else {
            None
        };

        Ok((name, params, is_view, is_private, return_type))
    }

    fn parse_parameters(&mut self) -> PResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(params);
        }
        params.push(self.parse_parameter()?);
        while self.eat(TokenKind::Comma) {
            params.push(self.parse_parameter()?);
        }
        Ok(params)
    }

    fn parse_parameter(&mut self) -> PResult<Param> {
        let name = self.consume_ident("Expected parameter name")?;
        self.consume(TokenKind::Colon, "Expected ':' after parameter name")?;
        let ty = self.parse_type()?;
        Ok(Param { name, ty })
    }

    fn parse_event(&mut self) -> PResult<EventDecl> {
        let name = self.consume_ident("Expected event name")?;
        self.consume(TokenKind::LParen, "Expected '(' after event name")?;
        let params = self.parse_parameters()?;
        self.consume(TokenKind::RParen, "Expected ')' after event parameters")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after event declaration")?;
        Ok(EventDecl { name, params })
    }

    fn parse_struct(&mut self) -> PResult<StructDecl> {
        let name = self.consume_ident("Expected struct name")?;
        self.consume(TokenKind::LBrace, "Expected '{' after struct name")?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let field_name = self.consume_ident("Expected field name")?;
            self.consume(TokenKind::Colon, "Expected ':' after field name")?;
            let ty = self.parse_type()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after field declaration")?;
            fields.push(StateVarDecl {
                name: field_name,
                ty,
            });
        }
        self.consume(TokenKind::RBrace, "Expected '}' after struct definition")?;
        Ok(StructDecl { name, fields })
    }

    fn parse_enum(&mut self) -> PResult<EnumDecl> {
        let name = self.consume_ident("Expected enum name")?;
        self.consume(TokenKind::LBrace, "Expected '{' after enum name")?;
        let mut values = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            values.push(self.consume_ident("Expected enum value name")?);
            self.eat(TokenKind::Comma);
        }
        self.consume(TokenKind::RBrace, "Expected '}' after enum definition")?;
        Ok(EnumDecl { name, values })
    }

    // ─── Types ─────────────────────────────────────────────────────

    fn parse_type(&mut self) -> PResult<Spanned<TypeExpr>> {
        let start = self.peek().span;

        if self.peek().kind.is_primitive_type() {
            let token = self.advance();
            return Ok(Spanned::new(TypeExpr::Named(token.lexeme), token.span));
        }

        if self.eat(TokenKind::ArrayType) {
            self.consume(TokenKind::Lt, "Expected '<' after 'array'")?;
            let element = self.parse_type()?;
            self.consume(TokenKind::Gt, "Expected '>' after element type")?;
            return Ok(Spanned::new(
                TypeExpr::Array(Box::new(element)),
                start.merge(self.prev_span()),
            ));
        }

        if self.eat(TokenKind::MapType) {
            self.consume(TokenKind::Lt, "Expected '<' after 'map'")?;
            let key = self.parse_type()?;
            self.consume(TokenKind::Comma, "Expected ',' after key type")?;
            let value = self.parse_type()?;
            self.consume(TokenKind::Gt, "Expected '>' after value type")?;
            return Ok(Spanned::new(
                TypeExpr::Map(Box::new(key), Box::new(value)),
                start.merge(self.prev_span()),
            ));
        }

        let name = self.consume_ident("Expected type name")?;
        Ok(Spanned::new(TypeExpr::Named(name.node), name.span))
    }

    // ─── Statements ────────────────────────────────────────────────

    fn parse_block(&mut self) -> PResult<Spanned<Block>> {
        self.enter_nesting()?;
        let start = self
            .consume(TokenKind::LBrace, "Expected '{' at the beginning of a block")?
            .span;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace, "Expected '}' at the end of a block")?;
        self.exit_nesting();
        Ok(Spanned::new(
            Block { statements },
            start.merge(self.prev_span()),
        ))
    }

    fn parse_statement(&mut self) -> PResult<Spanned<Stmt>> {
        let start = self.peek().span;
        let stmt = if self.eat(TokenKind::If) {
            self.parse_if_statement()?
        } else if self.eat(TokenKind::While) {
            self.parse_while_statement()?
        } else if self.eat(TokenKind::For) {
            self.parse_for_statement()?
        } else if self.eat(TokenKind::Foreach) {
            self.parse_foreach_statement()?
        } else if self.eat(TokenKind::Return) {
            self.parse_return_statement()?
        } else if self.eat(TokenKind::Require) {
            self.parse_require_statement()?
        } else if self.eat(TokenKind::Assert) {
            self.parse_assert_statement()?
        } else if self.eat(TokenKind::Revert) {
            self.parse_revert_statement()?
        } else if self.eat(TokenKind::Emit) {
            self.parse_emit_statement()?
        } else if self.eat(TokenKind::Try) {
            self.parse_try_catch_statement()?
        } else if self.eat(TokenKind::Let) {
            self.parse_let_statement()?
        } else if self.check(TokenKind::LBrace) {
            Stmt::Block(self.parse_block()?.node)
        } else {
            self.parse_expression_statement()?
        };
        Ok(Spanned::new(stmt, start.merge(self.prev_span())))
    }

    fn parse_if_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "Expected ')' after if condition")?;
        let then_block = self.parse_block()?;

        let else_branch = if self.eat(TokenKind::Else) {
            let start = self.peek().span;
            let stmt = if self.eat(TokenKind::If) {
                self.parse_if_statement()?
            } else {
                Stmt::Block(self.parse_block()?.node)
            };
            Some(Box::new(Spanned::new(stmt, start.merge(self.prev_span()))))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_block,
            else_branch,
        })
    }

    fn parse_while_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "Expected ')' after while condition")?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_for_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'for'")?;

        let init = if self.eat(TokenKind::Semicolon) {
            None
        } else {
            let start = self.peek().span;
            let stmt = if self.eat(TokenKind::Let) {
                self.parse_let_statement()?
            } else {
                self.parse_expression_statement()?
            };
            Some(Box::new(Spanned::new(stmt, start.merge(self.prev_span()))))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            let start = self.peek().span;
            let stmt = self.parse_assign_or_expr()?;
            Some(Box::new(Spanned::new(stmt, start.merge(self.prev_span()))))
        };
        self.consume(TokenKind::RParen, "Expected ')' after for clauses")?;

        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_foreach_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'foreach'")?;
        let var = self.consume_ident("Expected loop variable name")?;
        self.consume(TokenKind::In, "Expected 'in' after loop variable")?;
        let collection = self.parse_expression()?;
        self.consume(TokenKind::RParen, "Expected ')' after foreach collection")?;
        let body = self.parse_block()?;
        Ok(Stmt::Foreach {
            var,
            collection,
            body,
        })
    }

    fn parse_return_statement(&mut self) -> PResult<Stmt> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return statement")?;
        Ok(Stmt::Return(value))
    }

    fn parse_require_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'require'")?;
        let condition = self.parse_expression()?;
        let message = if self.eat(TokenKind::Comma) {
            let token = self.consume(TokenKind::Str, "Expected message string in 'require'")?;
            Some(unescape(&token.lexeme))
        } else {
            None
        };
        self.consume(TokenKind::RParen, "Expected ')' after require arguments")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after require statement")?;
        Ok(Stmt::Require { condition, message })
    }

    fn parse_assert_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'assert'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "Expected ')' after assert condition")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after assert statement")?;
        Ok(Stmt::Assert { condition })
    }

    fn parse_revert_statement(&mut self) -> PResult<Stmt> {
        self.consume(TokenKind::LParen, "Expected '(' after 'revert'")?;
        let message = if self.check(TokenKind::Str) {
            Some(unescape(&self.advance().lexeme))
        } else {
            None
        };
        self.consume(TokenKind::RParen, "Expected ')' after revert message")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after revert statement")?;
        Ok(Stmt::Revert { message })
    }

    fn parse_emit_statement(&mut self) -> PResult<Stmt> {
        let event = self.consume_ident("Expected event name after 'emit'")?;
        self.consume(TokenKind::LParen, "Expected '(' after event name")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.eat(TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        self.consume(TokenKind::RParen, "Expected ')' after event arguments")?;
        self.consume(TokenKind::Semicolon, "Expected ';' after emit statement")?;
        Ok(Stmt::Emit { event, args })
    }

    fn parse_try_catch_statement(&mut self) -> PResult<Stmt> {
        let try_block = self.parse_block()?;
        self.consume(TokenKind::Catch, "Expected 'catch' after try block")?;
        let catch_var = if self.eat(TokenKind::LParen) {
            let var = self.consume_ident("Expected identifier in catch clause")?;
            self.consume(TokenKind::RParen, "Expected ')' after catch variable")?;
            Some(var)
        } else {
            None
        };
        let catch_block = self.parse_block()?;
        Ok(Stmt::TryCatch {
            try_block,
            catch_var,
            catch_block,
        })
    }

    fn parse_let_statement(&mut self) -> PResult<Stmt> {
        let name = self.consume_ident("Expected variable name after 'let'")?;
        self.consume(TokenKind::Colon, "Expected ':' after variable name")?;
        let ty = self.parse_type()?;
        let init = if self.eat(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after variable declaration")?;
        Ok(Stmt::Let { name, ty, init })
    }

    fn parse_expression_statement(&mut self) -> PResult<Stmt> {
        let stmt = self.parse_assign_or_expr()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after expression statement")?;
        Ok(stmt)
    }

    /// An expression optionally followed by `= value`, shared by
    /// expression statements and `for` clauses.
    fn parse_assign_or_expr(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expression()?;
        if self.eat(TokenKind::Assign) {
            let value = self.parse_expression()?;
            Ok(Stmt::Assign {
                target: expr,
                value,
            })
        } else {
            Ok(Stmt::Expr(expr))
        }
    }

    // ─── Expressions ───────────────────────────────────────────────

    fn parse_expression(&mut self) -> PResult<Spanned<Expr>> {
        self.parse_binary_expr(0)
    }

    fn peek_binop(&self) -> Option<BinOp> {
        match self.peek().kind {
            TokenKind::OrOr => Some(BinOp::Or),
            TokenKind::AndAnd => Some(BinOp::And),
            TokenKind::Eq => Some(BinOp::Eq),
            TokenKind::Neq => Some(BinOp::Neq),
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::Lte => Some(BinOp::Lte),
            TokenKind::Gte => Some(BinOp::Gte),
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Asterisk => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Mod),
            _ => None,
        }
    }

    fn parse_binary_expr(&mut self, min_bp: u8) -> PResult<Spanned<Expr>> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = self.peek_binop() {
            let (left_bp, right_bp) = op_binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary_expr(right_bp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> PResult<Spanned<Expr>> {
        self.enter_nesting()?;
        let result = if self.check(TokenKind::Minus) || self.check(TokenKind::Bang) {
            let token = self.advance();
            let op = if token.kind == TokenKind::Minus {
                UnaryOp::Neg
            } else {
                UnaryOp::Not
            };
            let operand = self.parse_unary()?;
            let span = token.span.merge(operand.span);
            Ok(Spanned::new(
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ))
        } else {
            self.parse_postfix()
        };
        self.exit_nesting();
        result
    }

    fn parse_postfix(&mut self) -> PResult<Spanned<Expr>> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(TokenKind::LParen) {
                let function = match &expr.node {
                    Expr::Identifier(name) => Spanned::new(name.clone(), expr.span),
                    _ => {
                        return Err(self
                            .error_at_current("Only named functions can be called")
                            .with_help("call targets must be bare identifiers".to_string()));
                    }
                };
                self.advance(); // '('
                let mut args = Vec::new();
                if !self.check(TokenKind::RParen) {
                    args.push(self.parse_expression()?);
                    while self.eat(TokenKind::Comma) {
                        args.push(self.parse_expression()?);
                    }
                }
                self.consume(TokenKind::RParen, "Expected ')' after call arguments")?;
                let span = expr.span.merge(self.prev_span());
                expr = Spanned::new(Expr::Call { function, args }, span);
            } else if self.eat(TokenKind::Dot) {
                let member = self.consume_ident("Expected member name after '.'")?;
                let span = expr.span.merge(member.span);
                expr = Spanned::new(
                    Expr::Member {
                        object: Box::new(expr),
                        member,
                    },
                    span,
                );
            } else if self.eat(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.consume(TokenKind::RBracket, "Expected ']' after index expression")?;
                let span = expr.span.merge(self.prev_span());
                expr = Spanned::new(
                    Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Spanned<Expr>> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int => {
                self.advance();
                let value: i64 = token
                    .lexeme
                    .parse()
                    .map_err(|_| self.error_at(&token, "Integer literal too large".to_string()))?;
                Ok(Spanned::new(Expr::Literal(Literal::Int(value)), token.span))
            }
            TokenKind::Float => {
                self.advance();
                let value: f64 = token
                    .lexeme
                    .parse()
                    .map_err(|_| self.error_at(&token, "Invalid float literal".to_string()))?;
                Ok(Spanned::new(Expr::Literal(Literal::Float(value)), token.span))
            }
            TokenKind::Str => {
                self.advance();
                Ok(Spanned::new(
                    Expr::Literal(Literal::Str(unescape(&token.lexeme))),
                    token.span,
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(Spanned::new(Expr::Literal(Literal::Bool(true)), token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Spanned::new(Expr::Literal(Literal::Bool(false)), token.span))
            }
            TokenKind::SelfKw => {
                self.advance();
                Ok(Spanned::new(Expr::SelfRef, token.span))
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Spanned::new(Expr::Identifier(token.lexeme), token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            _ => Err(self.error_at_current("Expected expression")),
        }
    }
}

/// Returns (left, right) binding power for a binary operator; higher
/// binds tighter. All Grishex binary operators are left-associative.
fn op_binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Or => (1, 2),
        BinOp::And => (3, 4),
        BinOp::Eq | BinOp::Neq => (5, 6),
        BinOp::Lt | BinOp::Gt | BinOp::Lte | BinOp::Gte => (7, 8),
        BinOp::Add | BinOp::Sub => (9, 10),
        BinOp::Mul | BinOp::Div | BinOp::Mod => (11, 12),
    }
}

/// Interpret the escape sequences the lexer scans through: `\"`, `\\`,
/// `\n`, `\t`, `\r`. Any other backslash is kept verbatim.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(tokenize(source));
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        program
    }

    fn parse_err(source: &str) -> Vec<Diagnostic> {
        let (program, errors) = parse(tokenize(source));
        assert!(!errors.is_empty(), "expected parse errors");
        assert!(program.declarations.is_empty(), "failed parse must yield an empty program");
        errors
    }

    fn first_contract(program: &Program) -> &ContractDecl {
        match &program.declarations[0].node {
            Declaration::Contract(c) => c,
            other => panic!("expected contract, got {:?}", other),
        }
    }

    fn only_function(program: &Program) -> &FunctionDecl {
        for item in &first_contract(program).items {
            if let ContractItem::Function(f) = &item.node {
                return f;
            }
        }
        panic!("no function found");
    }

    fn body_statement(source_body: &str) -> Stmt {
        let source = format!("contract T {{ function f() {{ {} }} }}", source_body);
        let program = parse_ok(&source);
        let function = only_function(&program);
        function.body.as_ref().unwrap().node.statements[0].node.clone()
    }

    fn expression(source_expr: &str) -> Expr {
        match body_statement(&format!("{};", source_expr)) {
            Stmt::Expr(e) => e.node,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_pragma_and_empty_contract() {
        let program = parse_ok("pragma grishex 1;\ncontract Empty {}");
        let pragma = program.pragma.as_ref().unwrap();
        assert_eq!(pragma.node.name, "grishex");
        assert_eq!(pragma.node.version, "1");
        assert_eq!(first_contract(&program).name.node, "Empty");
        assert!(first_contract(&program).items.is_empty());
    }

    #[test]
    fn test_pragma_float_version() {
        let program = parse_ok("pragma grishex 1.0;");
        assert_eq!(program.pragma.unwrap().node.version, "1.0");
    }

    #[test]
    fn test_pragma_wrong_name() {
        let errors = parse_err("pragma solidity 1;");
        assert!(errors[0].message.contains("Expected 'grishex'"));
    }

    #[test]
    fn test_same_tokens_same_ast() {
        let source = "contract C { state { x: uint; } function f() returns uint { return x + 1; } }";
        let (a, _) = parse(tokenize(source));
        let (b, _) = parse(tokenize(source));
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_block() {
        let program = parse_ok(
            "contract Token { state { name: string; balances: map<address, uint>; tags: array<string>; } }",
        );
        let contract = first_contract(&program);
        match &contract.items[0].node {
            ContractItem::State(vars) => {
                assert_eq!(vars.len(), 3);
                assert_eq!(vars[0].name.node, "name");
                assert_eq!(vars[1].ty.node.to_string(), "map<address, uint>");
                assert_eq!(vars[2].ty.node.to_string(), "array<string>");
            }
            other => panic!("expected state block, got {:?}", other),
        }
    }

    #[test]
    fn test_function_modifiers_prefix_and_postfix() {
        let program = parse_ok(
            "contract C {\n view function a() returns uint { return 1; }\n function b() view returns uint { return 2; }\n private function c() { }\n}",
        );
        let contract = first_contract(&program);
        let funcs: Vec<&FunctionDecl> = contract
            .items
            .iter()
            .filter_map(|i| match &i.node {
                ContractItem::Function(f) => Some(f),
                _ => None,
            })
            .collect();
        assert!(funcs[0].is_view && !funcs[0].is_private);
        assert!(funcs[1].is_view);
        assert!(funcs[2].is_private);
        assert!(funcs[2].return_type.is_none());
    }

    #[test]
    fn test_constructor_params() {
        let program =
            parse_ok("contract C { constructor(a: uint, b: string) { self.x = a; } }");
        match &first_contract(&program).items[0].node {
            ContractItem::Constructor(ctor) => {
                assert_eq!(ctor.params.len(), 2);
                assert_eq!(ctor.params[0].name.node, "a");
                assert_eq!(ctor.params[1].ty.node.to_string(), "string");
            }
            other => panic!("expected constructor, got {:?}", other),
        }
    }

    #[test]
    fn test_interface_signatures() {
        let program = parse_ok(
            "interface IToken { function transfer(to: address, amount: uint) returns bool; view function total() returns uint; event Moved(amount: uint); }",
        );
        match &program.declarations[0].node {
            Declaration::Interface(interface) => {
                assert_eq!(interface.functions.len(), 2);
                assert!(interface.functions.iter().all(|f| f.body.is_none()));
                assert!(interface.functions[1].is_view);
                assert_eq!(interface.events.len(), 1);
            }
            other => panic!("expected interface, got {:?}", other),
        }
    }

    #[test]
    fn test_struct_and_enum() {
        let program = parse_ok("struct Point { x: int; y: int; }\nenum Color { Red, Green, Blue }");
        match &program.declarations[0].node {
            Declaration::Struct(s) => assert_eq!(s.fields.len(), 2),
            other => panic!("expected struct, got {:?}", other),
        }
        match &program.declarations[1].node {
            Declaration::Enum(e) => {
                let names: Vec<&str> = e.values.iter().map(|v| v.node.as_str()).collect();
                assert_eq!(names, ["Red", "Green", "Blue"]);
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_mul_over_add() {
        match expression("1 + 2 * 3") {
            Expr::Binary { op: BinOp::Add, rhs, .. } => match rhs.node {
                Expr::Binary { op: BinOp::Mul, .. } => {}
                other => panic!("expected mul on the right, got {:?}", other),
            },
            other => panic!("expected add at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_comparison_over_logical() {
        // a < b && c >= d  →  (a < b) && (c >= d)
        match expression("a < b && c >= d") {
            Expr::Binary { op: BinOp::And, lhs, rhs } => {
                assert!(matches!(lhs.node, Expr::Binary { op: BinOp::Lt, .. }));
                assert!(matches!(rhs.node, Expr::Binary { op: BinOp::Gte, .. }));
            }
            other => panic!("expected && at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_or_binds_loosest() {
        match expression("a && b || c == d") {
            Expr::Binary { op: BinOp::Or, lhs, rhs } => {
                assert!(matches!(lhs.node, Expr::Binary { op: BinOp::And, .. }));
                assert!(matches!(rhs.node, Expr::Binary { op: BinOp::Eq, .. }));
            }
            other => panic!("expected || at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // 10 - 4 - 3  →  (10 - 4) - 3
        match expression("10 - 4 - 3") {
            Expr::Binary { op: BinOp::Sub, lhs, rhs } => {
                assert!(matches!(lhs.node, Expr::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(rhs.node, Expr::Literal(Literal::Int(3))));
            }
            other => panic!("expected sub at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        // -a * b  →  (-a) * b
        match expression("-a * b") {
            Expr::Binary { op: BinOp::Mul, lhs, .. } => {
                assert!(matches!(lhs.node, Expr::Unary { op: UnaryOp::Neg, .. }));
            }
            other => panic!("expected mul at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_expression() {
        match expression("(1 + 2) * 3") {
            Expr::Binary { op: BinOp::Mul, lhs, .. } => {
                assert!(matches!(lhs.node, Expr::Binary { op: BinOp::Add, .. }));
            }
            other => panic!("expected mul at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        // self.owners[0] → Index(Member(Self, owners), 0)
        match expression("self.owners[0]") {
            Expr::Index { object, index } => {
                assert!(matches!(index.node, Expr::Literal(Literal::Int(0))));
                match object.node {
                    Expr::Member { object, member } => {
                        assert!(matches!(object.node, Expr::SelfRef));
                        assert_eq!(member.node, "owners");
                    }
                    other => panic!("expected member access, got {:?}", other),
                }
            }
            other => panic!("expected index access, got {:?}", other),
        }
    }

    #[test]
    fn test_call_with_arguments() {
        match expression("transfer(to, amount + 1)") {
            Expr::Call { function, args } => {
                assert_eq!(function.node, "transfer");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_call_on_non_identifier_is_error() {
        let errors = parse_err("contract C { function f() { self.g(); } }");
        assert!(errors[0].message.contains("Only named functions"));
    }

    #[test]
    fn test_string_escapes_interpreted() {
        match expression(r#""a\n\"b\"""#) {
            Expr::Literal(Literal::Str(s)) => assert_eq!(s, "a\n\"b\""),
            other => panic!("expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_chain() {
        let stmt = body_statement("if (a) { return 1; } else if (b) { return 2; } else { return 3; }");
        match stmt {
            Stmt::If { else_branch, .. } => {
                let else_stmt = else_branch.expect("missing else");
                assert!(matches!(else_stmt.node, Stmt::If { .. }));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_while_statement() {
        let stmt = body_statement("while (i < 10) { i = i + 1; }");
        assert!(matches!(stmt, Stmt::While { .. }));
    }

    #[test]
    fn test_for_statement_full_header() {
        let stmt = body_statement("for (let i: int = 0; i < 10; i = i + 1) { total = total + i; }");
        match stmt {
            Stmt::For {
                init,
                condition,
                update,
                ..
            } => {
                assert!(matches!(init.unwrap().node, Stmt::Let { .. }));
                assert!(condition.is_some());
                assert!(matches!(update.unwrap().node, Stmt::Assign { .. }));
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_for_statement_empty_header() {
        let stmt = body_statement("for (;;) { }");
        match stmt {
            Stmt::For {
                init,
                condition,
                update,
                ..
            } => {
                assert!(init.is_none());
                assert!(condition.is_none());
                assert!(update.is_none());
            }
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn test_foreach_statement() {
        let stmt = body_statement("foreach (owner in owners) { count = count + 1; }");
        match stmt {
            Stmt::Foreach { var, .. } => assert_eq!(var.node, "owner"),
            other => panic!("expected foreach, got {:?}", other),
        }
    }

    #[test]
    fn test_require_with_and_without_message() {
        match body_statement("require(x > 0, \"must be positive\");") {
            Stmt::Require { message, .. } => assert_eq!(message.as_deref(), Some("must be positive")),
            other => panic!("expected require, got {:?}", other),
        }
        match body_statement("require(x > 0);") {
            Stmt::Require { message, .. } => assert!(message.is_none()),
            other => panic!("expected require, got {:?}", other),
        }
    }

    #[test]
    fn test_revert_and_assert() {
        assert!(matches!(
            body_statement("revert(\"bad state\");"),
            Stmt::Revert { message: Some(_) }
        ));
        assert!(matches!(body_statement("assert(x == 1);"), Stmt::Assert { .. }));
    }

    #[test]
    fn test_emit_statement() {
        match body_statement("emit Transfer(from, to, 10);") {
            Stmt::Emit { event, args } => {
                assert_eq!(event.node, "Transfer");
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected emit, got {:?}", other),
        }
    }

    #[test]
    fn test_try_catch_statement() {
        match body_statement("try { risky(); } catch (err) { handled = true; }") {
            Stmt::TryCatch { catch_var, .. } => assert_eq!(catch_var.unwrap().node, "err"),
            other => panic!("expected try/catch, got {:?}", other),
        }
    }

    #[test]
    fn test_let_with_and_without_initializer() {
        match body_statement("let x: uint = 5;") {
            Stmt::Let { name, ty, init } => {
                assert_eq!(name.node, "x");
                assert_eq!(ty.node.to_string(), "uint");
                assert!(init.is_some());
            }
            other => panic!("expected let, got {:?}", other),
        }
        match body_statement("let y: string;") {
            Stmt::Let { init, .. } => assert!(init.is_none()),
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_statement() {
        match body_statement("self.total = self.total + 1;") {
            Stmt::Assign { target, .. } => {
                assert!(matches!(target.node, Expr::Member { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_bare_block() {
        assert!(matches!(body_statement("{ let x: int; }"), Stmt::Block(_)));
    }

    #[test]
    fn test_missing_semicolon_reports_position() {
        let errors = parse_err("contract C { function f() { return 1 } }");
        let error = &errors[0];
        assert!(error.message.contains("Expected ';'"), "message: {}", error.message);
        assert!(error.line >= 1 && error.column >= 1);
    }

    #[test]
    fn test_unexpected_top_level_token() {
        let errors = parse_err("42");
        assert!(errors[0].message.contains("Unexpected token"));
    }

    #[test]
    fn test_illegal_token_rejected() {
        let errors = parse_err("contract C { function f() { let x: int = 1 @ 2; } }");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_error_recovery_returns_empty_program() {
        let (program, errors) = parse(tokenize("contract C { state }"));
        assert_eq!(program, Program::empty());
        assert_eq!(errors.len(), 1);
    }
}
