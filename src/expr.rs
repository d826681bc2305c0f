//! A small expression language for conditions over integer counts, such as
//! `i == j && k >= 1` or `j == max(i, k)`.
//!
//! Supported: integer literals, `true`/`false`, variables, `+ - * / %`, unary
//! `-` and `!`, the comparisons `== != < <= > >=` (`===` and `!==` are read as
//! `==` and `!=`), `&&`/`and`, `||`/`or`, parentheses and the functions
//! `max`, `min` and `abs` (also spelled `Math.max`, ...). Division truncates.

use std::fmt;
use thiserror::Error;

/// Deepest nesting of parentheses, calls and unary operators.
pub const MAX_DEPTH: usize = 64;
/// Longest accepted expression, in tokens.
pub const MAX_TOKENS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("Unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Unbound variable '{0}'")]
    UnboundVariable(String),
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Integer overflow")]
    Overflow,
    #[error("Expression nests deeper than {0} levels")]
    TooDeep(usize),
    #[error("Expression is longer than {0} tokens")]
    TooLong(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Zero is false, everything else is true.
    pub fn truthy(self) -> bool {
        match self {
            Value::Int(n) => n != 0,
            Value::Bool(b) => b,
        }
    }

    fn int(self) -> Result<i64, ExprError> {
        match self {
            Value::Int(n) => Ok(n),
            Value::Bool(b) => Err(ExprError::TypeMismatch(format!("expected a number, found {b}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Max,
    Min,
    Abs,
}

impl Func {
    fn from_name(name: &str) -> Option<Self> {
        match name.strip_prefix("Math.").unwrap_or(name) {
            "max" => Some(Func::Max),
            "min" => Some(Func::Min),
            "abs" => Some(Func::Abs),
            _ => None,
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Bool(bool),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{n}"),
            Token::Ident(name) => f.write_str(name),
            Token::Op(op) => f.write_str(op),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

/// Longest spellings first so `<=` wins over `<`.
const OPERATORS: [(&str, &str); 17] = [
    ("===", "=="),
    ("!==", "!="),
    ("==", "=="),
    ("!=", "!="),
    ("<=", "<="),
    (">=", ">="),
    ("&&", "&&"),
    ("||", "||"),
    ("<", "<"),
    (">", ">"),
    ("+", "+"),
    ("-", "-"),
    ("*", "*"),
    ("/", "/"),
    ("%", "%"),
    ("!", "!"),
    ("=", "=="),
];

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        if c.is_ascii_digit() {
            let end = rest.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(rest.len());
            let value = rest[..end].parse().map_err(|_| ExprError::Overflow)?;
            tokens.push(Token::Int(value));
            rest = &rest[end..];
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let end = rest
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '.'))
                .unwrap_or(rest.len());
            tokens.push(Token::Ident(rest[..end].to_string()));
            rest = &rest[end..];
            continue;
        }

        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(token);
            rest = &rest[1..];
            continue;
        }

        let (spelling, op) = OPERATORS
            .iter()
            .find(|(spelling, _)| rest.starts_with(spelling))
            .ok_or(ExprError::UnexpectedChar(c))?;
        tokens.push(Token::Op(*op));
        rest = &rest[spelling.len()..];
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Runs `parse` one nesting level deeper.
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ExprError> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ExprError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(ExprError::UnexpectedToken(token.to_string()))
        }
    }

    /// Consumes the next token if it is one of the listed binary operators.
    fn binary_op(&mut self, ops: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        let found = match self.peek()? {
            Token::Op(op) => ops.iter().find(|(s, _)| s == op),
            Token::Ident(word) => ops.iter().find(|(s, _)| *s == word.as_str()),
            _ => None,
        };
        let (_, op) = found?;
        self.pos += 1;
        Some(*op)
    }

    fn left_assoc(
        &mut self,
        ops: &[(&str, BinaryOp)],
        operand: fn(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        let mut lhs = operand(self)?;
        while let Some(op) = self.binary_op(ops) {
            let rhs = operand(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        self.left_assoc(&[("||", BinaryOp::Or), ("or", BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        self.left_assoc(&[("&&", BinaryOp::And), ("and", BinaryOp::And)], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        self.left_assoc(
            &[
                ("==", BinaryOp::Eq),
                ("!=", BinaryOp::Ne),
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        self.left_assoc(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        self.left_assoc(
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            Some(Token::Op("-")) => Some(UnaryOp::Neg),
            Some(Token::Op("!")) => Some(UnaryOp::Not),
            Some(Token::Ident(word)) if word == "not" => Some(UnaryOp::Not),
            _ => None,
        };

        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.nested(Self::unary)?;
                Ok(Expr::Unary(op, Box::new(operand)))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.next()? {
            Token::Int(n) => Ok(Expr::Int(n)),
            Token::LParen => {
                let inner = self.nested(Self::or)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) if name == "true" => Ok(Expr::Bool(true)),
            Token::Ident(name) if name == "false" => Ok(Expr::Bool(false)),
            Token::Ident(name) if self.peek() == Some(&Token::LParen) => {
                let func = Func::from_name(&name).ok_or(ExprError::UnknownFunction(name))?;
                self.pos += 1;

                let mut args = Vec::new();
                if self.peek() != Some(&Token::RParen) {
                    args.push(self.nested(Self::or)?);
                    while self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                        args.push(self.nested(Self::or)?);
                    }
                }
                self.expect(Token::RParen)?;
                Ok(Expr::Call(func, args))
            }
            Token::Ident(name) => Ok(Expr::Var(name)),
            token => Err(ExprError::UnexpectedToken(token.to_string())),
        }
    }
}

impl Expr {
    /// Parses a complete expression.
    pub fn parse(source: &str) -> Result<Expr, ExprError> {
        let tokens = tokenize(source)?;
        if tokens.len() > MAX_TOKENS {
            return Err(ExprError::TooLong(MAX_TOKENS));
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };

        let expr = parser.or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(token) => Err(ExprError::UnexpectedToken(token.to_string())),
        }
    }

    /// Evaluates the expression, resolving variables through `lookup`.
    pub fn eval(&self, lookup: &dyn Fn(&str) -> Option<i64>) -> Result<Value, ExprError> {
        match self {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(name) => lookup(name)
                .map(Value::Int)
                .ok_or_else(|| ExprError::UnboundVariable(name.clone())),
            Expr::Unary(UnaryOp::Not, operand) => Ok(Value::Bool(!operand.eval(lookup)?.truthy())),
            Expr::Unary(UnaryOp::Neg, operand) => operand
                .eval(lookup)?
                .int()?
                .checked_neg()
                .map(Value::Int)
                .ok_or(ExprError::Overflow),
            Expr::Binary(BinaryOp::Or, lhs, rhs) => Ok(Value::Bool(
                lhs.eval(lookup)?.truthy() || rhs.eval(lookup)?.truthy(),
            )),
            Expr::Binary(BinaryOp::And, lhs, rhs) => Ok(Value::Bool(
                lhs.eval(lookup)?.truthy() && rhs.eval(lookup)?.truthy(),
            )),
            Expr::Binary(op, lhs, rhs) => binary(*op, lhs.eval(lookup)?, rhs.eval(lookup)?),
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(lookup)?.int())
                    .collect::<Result<Vec<i64>, ExprError>>()?;
                call(*func, &values)
            }
        }
    }

    /// Evaluates to a truth value; any evaluation error counts as false.
    pub fn holds(&self, lookup: &dyn Fn(&str) -> Option<i64>) -> bool {
        self.eval(lookup).map(Value::truthy).unwrap_or(false)
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, ExprError> {
    if let (Value::Bool(a), Value::Bool(b)) = (lhs, rhs) {
        return match op {
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::Ne => Ok(Value::Bool(a != b)),
            _ => Err(ExprError::TypeMismatch(format!("{a} {op:?} {b}"))),
        };
    }

    let (a, b) = (lhs.int()?, rhs.int()?);
    let result = match op {
        BinaryOp::Eq => return Ok(Value::Bool(a == b)),
        BinaryOp::Ne => return Ok(Value::Bool(a != b)),
        BinaryOp::Lt => return Ok(Value::Bool(a < b)),
        BinaryOp::Le => return Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => return Ok(Value::Bool(a > b)),
        BinaryOp::Ge => return Ok(Value::Bool(a >= b)),
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(ExprError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::Or => return Ok(Value::Bool(a != 0 || b != 0)),
        BinaryOp::And => return Ok(Value::Bool(a != 0 && b != 0)),
    };

    result.map(Value::Int).ok_or(ExprError::Overflow)
}

fn call(func: Func, args: &[i64]) -> Result<Value, ExprError> {
    let result = match (func, args) {
        (Func::Abs, [x]) => x.checked_abs(),
        (Func::Max, [_, ..]) => args.iter().copied().max(),
        (Func::Min, [_, ..]) => args.iter().copied().min(),
        _ => {
            return Err(ExprError::TypeMismatch(format!(
                "{:?} called with {} argument(s)",
                func,
                args.len()
            )))
        }
    };

    result.map(Value::Int).ok_or(ExprError::Overflow)
}
