use super::{BinaryOp, Expr, Func, UnaryOp};
use crate::{Error, Result};

/// Parses a formula expression.
///
/// Function names are resolved against the closed [`Func`] set and their
/// arity is checked; anything else is an `invalid_formula` error.
pub fn parse(src: &str) -> Result<Expr> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr(0)?;

    match parser.peek() {
        Token::Eof => Ok(expr),
        token => Err(Error::invalid_formula(format!(
            "unexpected {} after end of expression",
            token.describe()
        ))),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    String(String),
    Field(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(BinaryOp),
    Minus,
    Bang,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(v) => format!("number `{v}`"),
            Token::String(v) => format!("string {v:?}"),
            Token::Field(v) => format!("field reference `{{{v}}}`"),
            Token::Ident(v) => format!("identifier `{v}`"),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Op(op) => format!("operator `{}`", op.as_str()),
            Token::Minus => "operator `-`".to_string(),
            Token::Bang => "operator `!`".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = vec![];

        while let Some(&(start, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
                continue;
            }

            let token = match c {
                '0'..='9' | '.' => self.number(start)?,
                '"' | '\'' => self.string(c)?,
                '{' => self.field()?,
                c if c.is_alphabetic() || c == '_' => self.ident(start),
                _ => self.punct(c)?,
            };

            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn number(&mut self, start: usize) -> Result<Token> {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_ascii_digit() || c == '.' {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }

        let text = &self.src[start..end];
        text.parse()
            .map(Token::Number)
            .map_err(|_| Error::invalid_formula(format!("invalid number `{text}`")))
    }

    fn string(&mut self, quote: char) -> Result<Token> {
        self.chars.next();
        let mut value = String::new();

        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c)) => value.push(c),
                    None => break,
                },
                Some((_, c)) if c == quote => return Ok(Token::String(value)),
                Some((_, c)) => value.push(c),
                None => break,
            }
        }

        Err(Error::invalid_formula("unterminated string literal"))
    }

    fn field(&mut self) -> Result<Token> {
        self.chars.next();
        let mut id = String::new();

        for (_, c) in self.chars.by_ref() {
            if c == '}' {
                let id = id.trim();
                if id.is_empty() {
                    return Err(Error::invalid_formula("empty field reference `{}`"));
                }
                return Ok(Token::Field(id.to_string()));
            }
            id.push(c);
        }

        Err(Error::invalid_formula("unterminated field reference"))
    }

    fn ident(&mut self, start: usize) -> Token {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        Token::Ident(self.src[start..end].to_string())
    }

    fn punct(&mut self, c: char) -> Result<Token> {
        self.chars.next();

        let next = self.chars.peek().map(|&(_, c)| c);
        let mut two = |token: Token| {
            self.chars.next();
            token
        };

        Ok(match (c, next) {
            ('(', _) => Token::LParen,
            (')', _) => Token::RParen,
            (',', _) => Token::Comma,
            ('+', _) => Token::Op(BinaryOp::Add),
            ('-', _) => Token::Minus,
            ('*', _) => Token::Op(BinaryOp::Mul),
            ('/', _) => Token::Op(BinaryOp::Div),
            ('%', _) => Token::Op(BinaryOp::Mod),
            ('&', Some('&')) => two(Token::Op(BinaryOp::And)),
            ('&', _) => Token::Op(BinaryOp::Concat),
            ('|', Some('|')) => two(Token::Op(BinaryOp::Or)),
            ('=', Some('=')) => two(Token::Op(BinaryOp::Eq)),
            ('=', _) => Token::Op(BinaryOp::Eq),
            ('!', Some('=')) => two(Token::Op(BinaryOp::Ne)),
            ('!', _) => Token::Bang,
            ('<', Some('>')) => two(Token::Op(BinaryOp::Ne)),
            ('<', Some('=')) => two(Token::Op(BinaryOp::Le)),
            ('<', _) => Token::Op(BinaryOp::Lt),
            ('>', Some('=')) => two(Token::Op(BinaryOp::Ge)),
            ('>', _) => Token::Op(BinaryOp::Gt),
            (c, _) => {
                return Err(Error::invalid_formula(format!(
                    "unexpected character `{c}`"
                )))
            }
        })
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let token = self.next();
        if token == expected {
            Ok(())
        } else {
            Err(Error::invalid_formula(format!(
                "expected {}, found {}",
                expected.describe(),
                token.describe()
            )))
        }
    }

    /// Precedence climbing over binary operators.
    fn parse_expr(&mut self, min_prec: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Token::Op(op) => *op,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };

            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }

            self.next();
            let rhs = self.parse_expr(prec)?;
            lhs = Expr::binary_op(lhs, op, rhs);
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Token::Minus => {
                self.next();
                Ok(Expr::unary_op(UnaryOp::Neg, self.parse_unary()?))
            }
            Token::Bang => {
                self.next();
                Ok(Expr::unary_op(UnaryOp::Not, self.parse_unary()?))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.next() {
            Token::Number(v) => Ok(Expr::number(v)),
            Token::String(v) => Ok(Expr::string(v)),
            Token::Field(id) => Ok(Expr::field(id)),
            Token::LParen => {
                let expr = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                Ok(Expr::group(expr))
            }
            Token::Ident(name) => self.parse_ident(name),
            token => Err(Error::invalid_formula(format!(
                "unexpected {}",
                token.describe()
            ))),
        }
    }

    fn parse_ident(&mut self, name: String) -> Result<Expr> {
        if *self.peek() != Token::LParen {
            return match name.to_ascii_uppercase().as_str() {
                "TRUE" => Ok(Expr::bool(true)),
                "FALSE" => Ok(Expr::bool(false)),
                _ => Err(Error::invalid_formula(format!(
                    "unexpected identifier `{name}`"
                ))),
            };
        }

        let func = Func::from_name(&name)
            .ok_or_else(|| Error::invalid_formula(format!("unknown function `{name}`")))?;

        self.next();
        let mut args = vec![];

        if *self.peek() != Token::RParen {
            loop {
                args.push(self.parse_expr(0)?);
                match self.next() {
                    Token::Comma => continue,
                    Token::RParen => break,
                    token => {
                        return Err(Error::invalid_formula(format!(
                            "expected `,` or `)` in call to {}, found {}",
                            func.name(),
                            token.describe()
                        )))
                    }
                }
            }
        } else {
            self.next();
        }

        func.check_arity(args.len())?;
        Ok(Expr::func(func, args))
    }
}
