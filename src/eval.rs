//! A minimal expression evaluator satisfying the §6 interface:
//! `evaluate(expr, root, T)`, with `evaluateSize` and the boolean
//! condition entry point as convenience wrappers. Supports arithmetic,
//! comparison, logical operators, member access and named variable
//! lookup -- the operator set spec.md §9 calls sufficient.
//!
//! An empty expression string is treated as the literal `true`, matching
//! the "true or empty ⇒ include" condition semantics in §3.

use crate::context::Scope;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    Member(Box<Expr>, String),
    Unary(UnOp, Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expression parse error: {}", self.0)
    }
}

impl std::error::Error for ParseError {}

impl Expr {
    pub fn parse(src: &str) -> Result<Expr, ParseError> {
        let trimmed = src.trim();
        if trimmed.is_empty() {
            return Ok(Expr::Bool(true));
        }
        let tokens = tokenize(trimmed)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(ParseError(format!("unexpected trailing input in `{trimmed}`")));
        }
        Ok(expr)
    }

    pub fn eval(&self, scope: &Scope) -> Result<Value, ParseError> {
        match self {
            Expr::Number(n) => Ok(Value::F64(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Ident(name) => scope
                .lookup(name)
                .ok_or_else(|| ParseError(format!("unbound variable `{name}`"))),
            Expr::Member(base, field) => {
                let val = base.eval(scope)?;
                let obj = val
                    .as_object()
                    .ok_or_else(|| ParseError(format!("`{field}` accessed on non-object value")))?;
                Ok(obj.get(field).cloned().unwrap_or(Value::Null))
            }
            Expr::Unary(op, inner) => {
                let v = inner.eval(scope)?;
                match op {
                    UnOp::Neg => {
                        let n = v
                            .as_f64()
                            .ok_or_else(|| ParseError("`-` applied to non-numeric value".into()))?;
                        Ok(Value::F64(-n))
                    }
                    UnOp::Not => {
                        let b = v
                            .as_bool()
                            .ok_or_else(|| ParseError("`!` applied to non-boolean value".into()))?;
                        Ok(Value::Bool(!b))
                    }
                }
            }
            Expr::Binary(lhs, op, rhs) => eval_binary(lhs, *op, rhs, scope),
        }
    }
}

fn eval_binary(lhs: &Expr, op: BinOp, rhs: &Expr, scope: &Scope) -> Result<Value, ParseError> {
    if matches!(op, BinOp::And | BinOp::Or) {
        let l = lhs
            .eval(scope)?
            .as_bool()
            .ok_or_else(|| ParseError("logical operator applied to non-boolean value".into()))?;
        return match op {
            BinOp::And if !l => Ok(Value::Bool(false)),
            BinOp::Or if l => Ok(Value::Bool(true)),
            _ => {
                let r = rhs
                    .eval(scope)?
                    .as_bool()
                    .ok_or_else(|| ParseError("logical operator applied to non-boolean value".into()))?;
                Ok(Value::Bool(r))
            }
        };
    }

    let l = lhs.eval(scope)?;
    let r = rhs.eval(scope)?;

    if matches!(op, BinOp::Eq | BinOp::Ne) {
        let equal = values_equal(&l, &r);
        return Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }));
    }

    let (ln, rn) = (
        l.as_f64().ok_or_else(|| ParseError(format!("`{op:?}` applied to non-numeric value")))?,
        r.as_f64().ok_or_else(|| ParseError(format!("`{op:?}` applied to non-numeric value")))?,
    );
    Ok(match op {
        BinOp::Add => Value::F64(ln + rn),
        BinOp::Sub => Value::F64(ln - rn),
        BinOp::Mul => Value::F64(ln * rn),
        BinOp::Div => Value::F64(ln / rn),
        BinOp::Rem => Value::F64(ln % rn),
        BinOp::Lt => Value::Bool(ln < rn),
        BinOp::Le => Value::Bool(ln <= rn),
        BinOp::Gt => Value::Bool(ln > rn),
        BinOp::Ge => Value::Bool(ln >= rn),
        BinOp::Eq | BinOp::Ne | BinOp::And | BinOp::Or => unreachable!(),
    })
}

fn values_equal(l: &Value, r: &Value) -> bool {
    match (l.as_str(), r.as_str()) {
        (Some(a), Some(b)) => return a == b,
        _ => {}
    }
    match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => l == r,
    }
}

/// `evaluate(expr, root, int) -> usize`, with the all-digit fast path
/// §6 requires.
pub fn eval_size(expr: &str, scope: &Scope) -> Result<usize, ParseError> {
    let trimmed = expr.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed
            .parse()
            .map_err(|_| ParseError(format!("`{trimmed}` is not a valid size")));
    }
    let value = Expr::parse(trimmed)?.eval(scope)?;
    let n = value
        .as_i64()
        .ok_or_else(|| ParseError(format!("`{trimmed}` did not evaluate to an integer")))?;
    if n < 0 {
        return Err(ParseError(format!("`{trimmed}` evaluated to negative size {n}")));
    }
    Ok(n as usize)
}

/// `evaluate(expr, root, bool)`.
pub fn eval_bool(expr: &str, scope: &Scope) -> Result<bool, ParseError> {
    let value = Expr::parse(expr)?.eval(scope)?;
    value
        .as_bool()
        .or_else(|| value.as_f64().map(|n| n != 0.0))
        .ok_or_else(|| ParseError(format!("`{expr}` did not evaluate to a boolean")))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Dot,
    LParen,
    RParen,
    Op(&'static str),
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '.' {
            tokens.push(Token::Dot);
            i += 1;
        } else if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
        } else if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::Number(
                text.parse()
                    .map_err(|_| ParseError(format!("invalid number `{text}`")))?,
            ));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c == '"' || c == '\'' {
            let quote = c;
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err(ParseError("unterminated string literal".into()));
            }
            tokens.push(Token::Str(chars[start..i].iter().collect()));
            i += 1;
        } else {
            let two: String = chars[i..(i + 2).min(chars.len())].iter().collect();
            let op = match two.as_str() {
                "==" | "!=" | "&&" | "||" | "<=" | ">=" => {
                    i += 2;
                    two
                }
                _ => {
                    i += 1;
                    c.to_string()
                }
            };
            let op = match op.as_str() {
                "==" => "==",
                "!=" => "!=",
                "&&" => "&&",
                "||" => "||",
                "<=" => "<=",
                ">=" => ">=",
                "<" => "<",
                ">" => ">",
                "+" => "+",
                "-" => "-",
                "*" => "*",
                "/" => "/",
                "%" => "%",
                "!" => "!",
                other => return Err(ParseError(format!("unexpected character `{other}`"))),
            };
            tokens.push(Token::Op(op));
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if matches!(self.peek(), Some(Token::Op(o)) if *o == op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat_op("||") {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(Box::new(lhs), BinOp::Or, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.eat_op("&&") {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(Box::new(lhs), BinOp::And, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = if self.eat_op("==") {
                BinOp::Eq
            } else if self.eat_op("!=") {
                BinOp::Ne
            } else {
                break;
            };
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = if self.eat_op("<=") {
                BinOp::Le
            } else if self.eat_op(">=") {
                BinOp::Ge
            } else if self.eat_op("<") {
                BinOp::Lt
            } else if self.eat_op(">") {
                BinOp::Gt
            } else {
                break;
            };
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = if self.eat_op("+") {
                BinOp::Add
            } else if self.eat_op("-") {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.eat_op("*") {
                BinOp::Mul
            } else if self.eat_op("/") {
                BinOp::Div
            } else if self.eat_op("%") {
                BinOp::Rem
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat_op("-") {
            return Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)));
        }
        if self.eat_op("!") {
            return Ok(Expr::Unary(UnOp::Not, Box::new(self.parse_unary()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while matches!(self.peek(), Some(Token::Dot)) {
            self.pos += 1;
            match self.bump() {
                Some(Token::Ident(name)) => expr = Expr::Member(Box::new(expr), name),
                other => return Err(ParseError(format!("expected field name after `.`, got {other:?}"))),
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                _ => Ok(Expr::Ident(name)),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if !matches!(self.bump(), Some(Token::RParen)) {
                    return Err(ParseError("expected closing `)`".into()));
                }
                Ok(inner)
            }
            other => Err(ParseError(format!("unexpected token {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;

    #[test]
    fn all_digit_fast_path() {
        let record = Record::new("Msg");
        let scope = Scope::root_call(&record);
        assert_eq!(eval_size("42", &scope).unwrap(), 42);
    }

    #[test]
    fn arithmetic_and_member_access() {
        let mut record = Record::new("Msg");
        record.set("x", Value::I32(2));
        record.set("y", Value::I32(3));
        let scope = Scope::root_call(&record);
        assert_eq!(eval_size("x + y", &scope).unwrap(), 5);
        assert!(eval_bool("self.x == 2 && self.y > 1", &scope).unwrap());
    }

    #[test]
    fn prefix_condition() {
        let record = Record::new("Msg");
        let scope = Scope::root_call(&record).with_prefix(2);
        assert!(eval_bool("prefix == 2", &scope).unwrap());
        assert!(!eval_bool("prefix == 1", &scope).unwrap());
    }

    #[test]
    fn empty_condition_is_true() {
        let record = Record::new("Msg");
        let scope = Scope::root_call(&record);
        assert!(eval_bool("", &scope).unwrap());
    }
}
