//! Round-trigger conditions for scenario rules and numeric value expressions.
//!
//! Conditions are written in a tiny expression language: number literals,
//! `true`/`false`, the bound variables `R` (current round), `C` (present
//! characters) and `L` (scenario level), arithmetic (`+ - * / %`),
//! comparisons (`== != < <= > >=`, with `===`/`!==` accepted as aliases),
//! logic (`&& || !`), parentheses and `cond ? a : b`.
//!
//! Expressions are parsed once (when the rule is loaded) and evaluated by
//! walking the tree against a set of [`Bindings`].
//!
//! ## Precedence (lowest to highest)
//!
//! 1. `?:` - right associative
//! 2. `||`
//! 3. `&&`
//! 4. `==`, `!=`
//! 5. `<`, `<=`, `>`, `>=`
//! 6. `+`, `-`
//! 7. `*`, `/`, `%`
//! 8. Unary `-`, `+`, `!`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConditionError;

/// A variable an expression may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Round,
    Characters,
    Level,
}

impl Variable {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "R" => Some(Variable::Round),
            "C" => Some(Variable::Characters),
            "L" => Some(Variable::Level),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Variable::Round => 'R',
            Variable::Characters => 'C',
            Variable::Level => 'L',
        }
    }
}

/// Values substituted for variables during evaluation. `None` means the
/// variable is not available in this context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bindings {
    pub round: Option<u32>,
    pub characters: Option<usize>,
    pub level: Option<u32>,
}

impl Bindings {
    /// Bindings for scenario rules: only `R` and `C` are available.
    pub fn for_rules(round: u32, characters: usize) -> Self {
        Self {
            round: Some(round),
            characters: Some(characters),
            level: None,
        }
    }

    fn get(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Round => self.round.map(f64::from),
            Variable::Characters => self.characters.map(|c| c as f64),
            Variable::Level => self.level.map(f64::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
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

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Bool(bool),
    Var(Variable),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    pub fn truthy(self) -> bool {
        match self {
            Value::Number(n) => n != 0.0 && !n.is_nan(),
            Value::Bool(b) => b,
        }
    }

    pub fn as_number(self) -> f64 {
        match self {
            Value::Number(n) => n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }
}

impl Expr {
    pub fn evaluate(&self, bindings: &Bindings) -> Result<Value, ConditionError> {
        match self {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Var(variable) => bindings
                .get(*variable)
                .map(Value::Number)
                .ok_or(ConditionError::Unbound {
                    symbol: variable.symbol(),
                }),
            Expr::Unary { op, operand } => {
                let value = operand.evaluate(bindings)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.as_number()),
                    UnaryOp::Plus => Value::Number(value.as_number()),
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                })
            }
            Expr::Binary { op, left, right } => {
                let left = left.evaluate(bindings)?;
                // `&&`/`||` yield an operand and skip the right side when decided.
                match op {
                    BinaryOp::And if !left.truthy() => return Ok(left),
                    BinaryOp::Or if left.truthy() => return Ok(left),
                    _ => {}
                }
                let right = right.evaluate(bindings)?;
                Ok(apply_binary(*op, left, right))
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(bindings)?.truthy() {
                    then.evaluate(bindings)
                } else {
                    otherwise.evaluate(bindings)
                }
            }
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Value {
    let (l, r) = (left.as_number(), right.as_number());
    match op {
        BinaryOp::Or => {
            if left.truthy() {
                left
            } else {
                right
            }
        }
        BinaryOp::And => {
            if left.truthy() {
                right
            } else {
                left
            }
        }
        BinaryOp::Eq => Value::Bool(loose_eq(left, right)),
        BinaryOp::Ne => Value::Bool(!loose_eq(left, right)),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::Le => Value::Bool(l <= r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::Ge => Value::Bool(l >= r),
        BinaryOp::Add => Value::Number(l + r),
        BinaryOp::Sub => Value::Number(l - r),
        BinaryOp::Mul => Value::Number(l * r),
        BinaryOp::Div => Value::Number(l / r),
        BinaryOp::Rem => Value::Number(l % r),
    }
}

fn loose_eq(left: Value, right: Value) -> bool {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => left.as_number() == right.as_number(),
    }
}

/* ---------------- lexer ---------------- */

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    Bang,
    LParen,
    RParen,
    Question,
    Colon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Percent => f.write_str("'%'"),
            Token::Lt => f.write_str("'<'"),
            Token::Le => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Ge => f.write_str("'>='"),
            Token::EqEq => f.write_str("'=='"),
            Token::Ne => f.write_str("'!='"),
            Token::AndAnd => f.write_str("'&&'"),
            Token::OrOr => f.write_str("'||'"),
            Token::Bang => f.write_str("'!'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Question => f.write_str("'?'"),
            Token::Colon => f.write_str("':'"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, ConditionError> {
    let chars: Vec<char> = src.chars().collect();
    let next_is = |i: usize, expected: char| chars.get(i + 1) == Some(&expected);
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| ConditionError::InvalidNumber {
                    text: text.clone(),
                    position: start,
                })?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push((Token::Ident(chars[start..i].iter().collect()), start));
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '?' => Token::Question,
            ':' => Token::Colon,
            '<' if next_is(i, '=') => {
                i += 1;
                Token::Le
            }
            '<' => Token::Lt,
            '>' if next_is(i, '=') => {
                i += 1;
                Token::Ge
            }
            '>' => Token::Gt,
            '=' if next_is(i, '=') => {
                i += 1;
                if next_is(i, '=') {
                    i += 1;
                }
                Token::EqEq
            }
            '!' if next_is(i, '=') => {
                i += 1;
                if next_is(i, '=') {
                    i += 1;
                }
                Token::Ne
            }
            '!' => Token::Bang,
            '&' if next_is(i, '&') => {
                i += 1;
                Token::AndAnd
            }
            '|' if next_is(i, '|') => {
                i += 1;
                Token::OrOr
            }
            other => {
                return Err(ConditionError::UnexpectedChar {
                    ch: other,
                    position: start,
                })
            }
        };
        i += 1;
        tokens.push((token, start));
    }

    Ok(tokens)
}

/* ---------------- parser ---------------- */

/// Binary operator precedence; higher binds tighter. All are left associative.
fn binary_op_info(token: &Token) -> Option<(u8, BinaryOp)> {
    match token {
        Token::OrOr => Some((10, BinaryOp::Or)),
        Token::AndAnd => Some((20, BinaryOp::And)),
        Token::EqEq => Some((30, BinaryOp::Eq)),
        Token::Ne => Some((30, BinaryOp::Ne)),
        Token::Lt => Some((35, BinaryOp::Lt)),
        Token::Le => Some((35, BinaryOp::Le)),
        Token::Gt => Some((35, BinaryOp::Gt)),
        Token::Ge => Some((35, BinaryOp::Ge)),
        Token::Plus => Some((40, BinaryOp::Add)),
        Token::Minus => Some((40, BinaryOp::Sub)),
        Token::Star => Some((50, BinaryOp::Mul)),
        Token::Slash => Some((50, BinaryOp::Div)),
        Token::Percent => Some((50, BinaryOp::Rem)),
        _ => None,
    }
}

/// Deepest nesting of parentheses, prefix operators and ternaries accepted.
pub const MAX_NESTING: usize = 64;

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<(Token, usize)> {
        let next = self.tokens.get(self.pos).cloned();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn unexpected(found: Option<(Token, usize)>, expected: &'static str) -> ConditionError {
        match found {
            Some((token, position)) => ConditionError::UnexpectedToken {
                found: token.to_string(),
                expected,
                position,
            },
            None => ConditionError::UnexpectedEnd { expected },
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ConditionError> {
        match self.advance() {
            Some((token, _)) if token == expected => Ok(()),
            other => Err(Self::unexpected(other, what)),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Expr, ConditionError>,
    ) -> Result<Expr, ConditionError> {
        if self.depth >= MAX_NESTING {
            return Err(ConditionError::TooDeep { limit: MAX_NESTING });
        }
        self.depth += 1;
        let expr = parse(self);
        self.depth -= 1;
        expr
    }

    fn parse_conditional(&mut self) -> Result<Expr, ConditionError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, ConditionError> {
        let condition = self.parse_binary(0)?;
        if self.peek() != Some(&Token::Question) {
            return Ok(condition);
        }
        self.advance();
        let then = self.parse_conditional()?;
        self.expect(Token::Colon, "':'")?;
        let otherwise = self.parse_conditional()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ConditionError> {
        let mut left = self.parse_prefix()?;

        while let Some((prec, op)) = self.peek().and_then(binary_op_info) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ConditionError> {
        self.nested(Self::prefix)
    }

    fn prefix(&mut self) -> Result<Expr, ConditionError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.parse_atom(),
        };
        self.advance();
        let operand = self.parse_prefix()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, ConditionError> {
        match self.advance() {
            Some((Token::Number(n), _)) => Ok(Expr::Number(n)),
            Some((Token::Ident(name), position)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                other => Variable::from_ident(other).map(Expr::Var).ok_or(
                    ConditionError::UnknownIdentifier {
                        name: name.clone(),
                        position,
                    },
                ),
            },
            Some((Token::LParen, _)) => {
                let inner = self.parse_conditional()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(Self::unexpected(other, "a value")),
        }
    }
}

/// Parse a complete expression.
pub fn parse(src: &str) -> Result<Expr, ConditionError> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_conditional()?;
    match parser.advance() {
        None => Ok(expr),
        found => Err(Parser::unexpected(found, "end of expression")),
    }
}

/// Parse and evaluate `src` as a number, truncated towards negative infinity.
pub fn evaluate_number(src: &str, bindings: &Bindings) -> Result<i64, ConditionError> {
    let value = parse(src)?.evaluate(bindings)?.as_number();
    if value.is_finite() {
        Ok(value.floor() as i64)
    } else {
        Err(ConditionError::NotANumber)
    }
}

/* ---------------- rule conditions ---------------- */

/// The round trigger of a scenario rule, parsed when loaded.
///
/// A condition that fails to parse is kept (so content still loads) and
/// reports its error on every evaluation. A blank condition never fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoundCondition {
    source: String,
    parsed: Result<Expr, ConditionError>,
}

impl RoundCondition {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let parsed = if source.trim().is_empty() {
            Ok(Expr::Bool(false))
        } else {
            parse(&source)
        };
        Self { source, parsed }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> Result<&Expr, &ConditionError> {
        self.parsed.as_ref()
    }

    pub fn evaluate(&self, bindings: &Bindings) -> Result<bool, ConditionError> {
        match &self.parsed {
            Ok(expr) => Ok(expr.evaluate(bindings)?.truthy()),
            Err(err) => Err(err.clone()),
        }
    }
}

impl Default for RoundCondition {
    fn default() -> Self {
        Self::parse("false")
    }
}

impl PartialEq for RoundCondition {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl From<String> for RoundCondition {
    fn from(source: String) -> Self {
        Self::parse(source)
    }
}

impl From<&str> for RoundCondition {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl From<RoundCondition> for String {
    fn from(condition: RoundCondition) -> Self {
        condition.source
    }
}

impl fmt::Display for RoundCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
