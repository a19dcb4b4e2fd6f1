//! Calculator tool — evaluates arithmetic expressions given as plain text.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, `^` (right-associative), parentheses,
//! unary minus and decimal numbers. Evaluation is precedence climbing over a
//! token list.

use async_trait::async_trait;
use thinkloop_core::error::ToolError;
use thinkloop_core::tool::Tool;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Useful for getting the result of a math expression. The input to this tool should be a valid mathematical expression, e.g. (2 + 3) * 4 ^ 2."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let value = evaluate(input).map_err(ToolError::InvalidInput)?;
        Ok(format_number(value))
    }
}

/// Render integers without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate a mathematical expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = cursor.expr(0)?;
    match cursor.peek() {
        None => Ok(value),
        Some(tok) => Err(format!("Unexpected {tok:?} at token {}", cursor.pos)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse()
                    .map_err(|_| format!("Invalid number: {literal}"))?;
                tokens.push(Token::Num(n));
            }
            other => return Err(format!("Unexpected character: '{other}'")),
        }
    }

    if tokens.is_empty() {
        return Err("Empty expression".into());
    }
    Ok(tokens)
}

/// Binding power and right-associativity of a binary operator.
fn binding(op: char) -> Option<(u8, bool)> {
    match op {
        '+' | '-' => Some((1, false)),
        '*' | '/' | '%' => Some((2, false)),
        '^' => Some((4, true)),
        _ => None,
    }
}

/// Deepest nesting of parentheses, unary signs and `^` chains accepted.
const MAX_DEPTH: usize = 256;

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expr(&mut self, min_power: u8) -> Result<f64, String> {
        if self.depth >= MAX_DEPTH {
            return Err("Expression nested too deeply".into());
        }
        self.depth += 1;
        let value = self.climb(min_power);
        self.depth -= 1;
        value
    }

    fn climb(&mut self, min_power: u8) -> Result<f64, String> {
        let mut lhs = self.operand()?;

        while let Some(Token::Op(op)) = self.peek() {
            let Some((power, right_assoc)) = binding(op) else {
                break;
            };
            if power < min_power {
                break;
            }
            self.next();
            let next_min = if right_assoc { power } else { power + 1 };
            let rhs = self.expr(next_min)?;
            lhs = apply(op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    // Unary minus binds looser than '^' so -2^2 == -4.
    fn operand(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Op('-')) => Ok(-self.expr(3)?),
            Some(Token::Op('+')) => self.expr(3),
            Some(Token::Open) => {
                let value = self.expr(0)?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {tok:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

fn apply(op: char, lhs: f64, rhs: f64) -> Result<f64, String> {
    match op {
        '+' => Ok(lhs + rhs),
        '-' => Ok(lhs - rhs),
        '*' => Ok(lhs * rhs),
        '/' | '%' if rhs == 0.0 => Err("Division by zero".into()),
        '/' => Ok(lhs / rhs),
        '%' => Ok(lhs % rhs),
        '^' => Ok(lhs.powf(rhs)),
        other => Err(format!("Unknown operator: {other}")),
    }
}
