//! Recursive-descent parser for the reference script language
//!
//! Errors are collected as parse problems. After an error the parser skips
//! to the next statement boundary and carries on, so one pass reports every
//! independent problem.

use crate::core::module::ParseProblem;
use crate::engine::lexer::{tokenize, Spanned, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    Real(f64),
    String(String),
    Boolean(bool),
    Null,
    Ident(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var(String, Option<Expr>),
    Assign(String, Expr),
    Return(Option<Expr>),
    If(Expr, Vec<Stmt>, Vec<Stmt>),
    While(Expr, Vec<Stmt>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub operations: Vec<Operation>,
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}

/// Parse a whole program, or every problem found
pub fn parse(source: &str) -> Result<Program, Vec<ParseProblem>> {
    let tokens = tokenize(source).map_err(|problem| vec![problem])?;
    Parser::new(tokens).program()
}

type ParseResult<T> = std::result::Result<T, ParseProblem>;

/// Deepest bracket, unary, call or block nesting accepted, and the tallest
/// expression tree. The parser and the interpreter both recurse on it.
pub const MAX_NESTING: usize = 128;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Spanned {
        // tokenize always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn advance(&mut self) -> Token {
        let token = self.current().token.clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error<T>(&self, expected: &str) -> ParseResult<T> {
        let here = self.current();
        let found = match &here.token {
            Token::Eof => "end of input".to_string(),
            other => format!("{:?}", other),
        };
        Err(ParseProblem::error(
            here.line,
            here.column,
            format!("expected {} but found {}", expected, found),
        ))
    }

    fn too_deep<T>(&self, what: &str) -> ParseResult<T> {
        let here = self.current();
        Err(ParseProblem::error(
            here.line,
            here.column,
            format!("{} nested too deeply", what),
        ))
    }

    /// Run `f` one nesting level down, failing past `MAX_NESTING`
    fn nested<T>(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return self.too_deep(what);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Build a node over `children`, rejecting trees taller than `MAX_NESTING`
    fn node<'e>(&self, children: impl IntoIterator<Item = &'e Expr>) -> ParseResult<()> {
        let tallest = children.into_iter().map(height).max().unwrap_or(0);
        if tallest + 1 > MAX_NESTING {
            return self.too_deep("expression");
        }
        Ok(())
    }

    fn binary(&self, op: BinaryOp, lhs: Expr, rhs: Expr) -> ParseResult<Expr> {
        self.node([&lhs, &rhs])?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn expect(&mut self, token: Token, expected: &str) -> ParseResult<()> {
        if self.eat(&token) {
            Ok(())
        } else {
            self.error(expected)
        }
    }

    fn ident(&mut self, expected: &str) -> ParseResult<String> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => self.error(expected),
        }
    }

    fn program(mut self) -> Result<Program, Vec<ParseProblem>> {
        let mut program = Program::default();
        let mut problems = Vec::new();

        while !self.check(&Token::Eof) {
            let item = if self.check(&Token::Operation) {
                self.operation().map(|op| program.operations.push(op))
            } else {
                self.statement().map(|stmt| program.statements.push(stmt))
            };

            if let Err(problem) = item {
                problems.push(problem);
                self.depth = 0;
                self.synchronize();
            }
        }

        if problems.is_empty() {
            Ok(program)
        } else {
            Err(problems)
        }
    }

    /// Skip past the next `;` or closing `}` of the current nesting level
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::Eof => return,
                Token::Semicolon if depth == 0 => return,
                Token::LBrace => depth += 1,
                Token::RBrace => {
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    fn operation(&mut self) -> ParseResult<Operation> {
        self.expect(Token::Operation, "'operation'")?;
        let name = self.ident("operation name")?;
        self.expect(Token::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.ident("parameter name")?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        let body = self.block()?;
        Ok(Operation { name, params, body })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect(Token::LBrace, "'{'")?;
        self.nested("block", |p| {
            let mut statements = Vec::new();
            while !p.check(&Token::RBrace) {
                if p.check(&Token::Eof) {
                    return p.error("'}'");
                }
                statements.push(p.statement()?);
            }
            p.advance();
            Ok(statements)
        })
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().clone() {
            Token::Var => {
                self.advance();
                let name = self.ident("variable name")?;
                let init = if self.eat(&Token::Assign) {
                    Some(self.expression()?)
                } else {
                    None
                };
                self.expect(Token::Semicolon, "';'")?;
                Ok(Stmt::Var(name, init))
            }
            Token::Return => {
                self.advance();
                let value = if self.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(Token::Semicolon, "';'")?;
                Ok(Stmt::Return(value))
            }
            Token::If => {
                self.advance();
                self.expect(Token::LParen, "'('")?;
                let condition = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                let then = self.block()?;
                let otherwise = if self.eat(&Token::Else) {
                    if self.check(&Token::If) {
                        vec![self.statement()?]
                    } else {
                        self.block()?
                    }
                } else {
                    Vec::new()
                };
                Ok(Stmt::If(condition, then, otherwise))
            }
            Token::While => {
                self.advance();
                self.expect(Token::LParen, "'('")?;
                let condition = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                let body = self.block()?;
                Ok(Stmt::While(condition, body))
            }
            Token::Operation => self.error("statement (operations are declared at top level)"),
            Token::Ident(name)
                if self
                    .tokens
                    .get(self.pos + 1)
                    .is_some_and(|next| next.token == Token::Assign) =>
            {
                self.advance();
                self.advance();
                let value = self.expression()?;
                self.expect(Token::Semicolon, "';'")?;
                Ok(Stmt::Assign(name, value))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(Token::Semicolon, "';'")?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.or()
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = self.binary(BinaryOp::Or, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.equality()?;
        while self.eat(&Token::And) {
            let rhs = self.equality()?;
            lhs = self.binary(BinaryOp::And, lhs, rhs)?;
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.comparison()?;
        loop {
            let op = match self.peek() {
                Token::Eq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::NotEq,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.comparison()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.additive()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = self.binary(op, lhs, rhs)?;
        }
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = if self.eat(&Token::Minus) {
            UnaryOp::Neg
        } else if self.eat(&Token::Not) {
            UnaryOp::Not
        } else {
            return self.primary();
        };
        let operand = self.nested("expression", Self::unary)?;
        self.node([&operand])?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let expr = match self.peek().clone() {
            Token::Integer(i) => Expr::Integer(i),
            Token::Real(r) => Expr::Real(r),
            Token::String(s) => Expr::String(s),
            Token::True => Expr::Boolean(true),
            Token::False => Expr::Boolean(false),
            Token::Null => Expr::Null,
            Token::LParen => {
                self.advance();
                let inner = self.nested("expression", Self::expression)?;
                self.expect(Token::RParen, "')'")?;
                return Ok(inner);
            }
            Token::Ident(name) => {
                self.advance();
                if self.eat(&Token::LParen) {
                    let arguments = self.nested("expression", Self::arguments)?;
                    self.node(&arguments)?;
                    return Ok(Expr::Call(name, arguments));
                }
                return Ok(Expr::Ident(name));
            }
            _ => return self.error("expression"),
        };
        self.advance();
        Ok(expr)
    }

    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut arguments = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(arguments)
    }
}

/// Height of an expression tree; bounded by `MAX_NESTING` once parsed
fn height(expr: &Expr) -> usize {
    match expr {
        Expr::Unary(_, operand) => 1 + height(operand),
        Expr::Binary(_, lhs, rhs) => 1 + height(lhs).max(height(rhs)),
        Expr::Call(_, arguments) => 1 + arguments.iter().map(height).max().unwrap_or(0),
        _ => 1,
    }
}
