//! Tokenizer for the reference script language

use crate::core::module::ParseProblem;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    String(String),
    Ident(String),

    // keywords
    Operation,
    Var,
    Return,
    If,
    Else,
    While,
    True,
    False,
    Null,
    And,
    Or,
    Not,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    Eof,
}

impl Token {
    fn keyword(word: &str) -> Option<Token> {
        let token = match word {
            "operation" | "function" => Token::Operation,
            "var" => Token::Var,
            "return" => Token::Return,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            _ => return None,
        };
        Some(token)
    }
}

/// A token and where it starts (1-based)
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn problem(&self, line: usize, column: usize, reason: String) -> ParseProblem {
        ParseProblem::error(line, column, reason)
    }

    /// Skip whitespace, `//` line comments and `/* */` block comments
    fn skip_trivia(&mut self) -> Result<(), ParseProblem> {
        loop {
            match (self.peek(), self.peek_next()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(self.problem(
                                    line,
                                    column,
                                    "unterminated block comment".to_string(),
                                ))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, ParseProblem> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let Some(c) = self.advance() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let token = match c {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '=' => self.either('=', Token::Eq, Token::Assign),
                '<' => self.either('=', Token::Le, Token::Lt),
                '>' => self.either('=', Token::Ge, Token::Gt),
                '!' if self.peek() == Some('=') => {
                    self.advance();
                    Token::NotEq
                }
                '"' | '\'' => self.string(c, line, column)?,
                c if c.is_ascii_digit() => self.number(c, line, column)?,
                c if c.is_alphabetic() || c == '_' => self.word(c),
                other => {
                    return Err(self.problem(
                        line,
                        column,
                        format!("unexpected character '{}'", other),
                    ))
                }
            };
            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }
    }

    fn either(&mut self, next: char, matched: Token, otherwise: Token) -> Token {
        if self.peek() == Some(next) {
            self.advance();
            matched
        } else {
            otherwise
        }
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> Result<Token, ParseProblem> {
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => return Ok(Token::String(text)),
                Some('\\') => match self.advance() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(self.problem(line, column, "unterminated string literal".to_string()))
    }

    fn number(&mut self, first: char, line: usize, column: usize) -> Result<Token, ParseProblem> {
        let mut text = String::from(first);
        let mut real = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !real && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                real = true;
                text.push(c);
            } else {
                break;
            }
            self.advance();
        }

        if real {
            text.parse::<f64>()
                .map(Token::Real)
                .map_err(|e| self.problem(line, column, format!("invalid real {}: {}", text, e)))
        } else {
            text.parse::<i64>().map(Token::Integer).map_err(|e| {
                self.problem(line, column, format!("invalid integer {}: {}", text, e))
            })
        }
    }

    fn word(&mut self, first: char) -> Token {
        let mut text = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::keyword(&text).unwrap_or(Token::Ident(text))
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseProblem> {
    Lexer::new(input).tokenize()
}
