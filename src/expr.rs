//! A small arithmetic-expression evaluator.
//!
//! Entirely separate from the pipeline engine; nothing here touches a
//! descriptor or a process. The four binary operators and unary sign are
//! dispatched through exhaustively matched enums, so a missing operator
//! is a compile error rather than a hole in a lookup table.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
	#[error("invalid character {0:?}")]
	InvalidCharacter(char),

	#[error("malformed number {0:?}")]
	MalformedNumber(String),

	#[error("unexpected operator")]
	UnexpectedOperator,

	#[error("unexpected end of input")]
	UnexpectedEnd,

	#[error("trailing input after expression")]
	TrailingInput,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
	Number(f64),
	Op(BinaryOp),
	Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
}

impl BinaryOp {
	fn from_char(c: char) -> Option<BinaryOp> {
		match c {
			'+' => Some(BinaryOp::Add),
			'-' => Some(BinaryOp::Sub),
			'*' => Some(BinaryOp::Mul),
			'/' => Some(BinaryOp::Div),
			_ => None,
		}
	}

	/// Left and right binding power. Equal-precedence operators bind
	/// tighter on the right, giving left associativity.
	fn binding_power(self) -> (f32, f32) {
		match self {
			BinaryOp::Add | BinaryOp::Sub => (1.0, 1.1),
			BinaryOp::Mul | BinaryOp::Div => (2.0, 2.1),
		}
	}

	fn apply(self, lhs: f64, rhs: f64) -> f64 {
		match self {
			BinaryOp::Add => lhs + rhs,
			BinaryOp::Sub => lhs - rhs,
			BinaryOp::Mul => lhs * rhs,
			BinaryOp::Div => lhs / rhs,
		}
	}
}

/// Binding power of prefix `+`/`-`: tighter than any binary operator, so
/// `-1 + 2` is `(-1) + 2` and `-2 * 3` is `(-2) * 3`.
const UNARY_BINDING_POWER: f32 = 3.0;

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
	let mut tokens = vec![];
	let mut rest = input;
	while let Some(c) = rest.chars().next() {
		if c.is_whitespace() {
			rest = &rest[c.len_utf8()..];
			continue;
		}
		// Operators first, so "-10" lexes as Sub, 10 and signs are the
		// parser's business.
		if let Some(op) = BinaryOp::from_char(c) {
			tokens.push(Token::Op(op));
			rest = &rest[1..];
			continue;
		}
		if c.is_ascii_digit() || c == '.' {
			let len = rest
				.find(|c: char| !c.is_ascii_digit() && c != '.')
				.unwrap_or(rest.len());
			let literal = &rest[..len];
			let value = literal
				.parse::<f64>()
				.map_err(|_| ExprError::MalformedNumber(literal.to_string()))?;
			tokens.push(Token::Number(value));
			rest = &rest[len..];
			continue;
		}
		return Err(ExprError::InvalidCharacter(c));
	}
	Ok(tokens)
}

struct Lexer {
	tokens: Vec<Token>,
	index: usize,
}

impl Lexer {
	fn new(input: &str) -> Result<Lexer, ExprError> {
		Ok(Lexer { tokens: tokenize(input)?, index: 0 })
	}

	fn peek(&self) -> Token {
		self.tokens.get(self.index).copied().unwrap_or(Token::Eof)
	}

	fn next(&mut self) -> Token {
		let token = self.peek();
		self.index += 1;
		token
	}
}

/// Evaluates an arithmetic expression over f64.
///
/// Division follows IEEE semantics, so `1 / 0` is infinity rather than an
/// error.
pub fn eval(input: &str) -> Result<f64, ExprError> {
	let mut lexer = Lexer::new(input)?;
	let value = parse_expr(&mut lexer, 0.0)?;
	match lexer.next() {
		Token::Eof => Ok(value),
		_ => Err(ExprError::TrailingInput),
	}
}

fn parse_expr(lexer: &mut Lexer, min_binding_power: f32) -> Result<f64, ExprError> {
	let mut lhs = match lexer.next() {
		Token::Number(value) => value,
		Token::Op(BinaryOp::Add) => parse_expr(lexer, UNARY_BINDING_POWER)?,
		Token::Op(BinaryOp::Sub) => -parse_expr(lexer, UNARY_BINDING_POWER)?,
		Token::Op(_) => return Err(ExprError::UnexpectedOperator),
		Token::Eof => return Err(ExprError::UnexpectedEnd),
	};

	loop {
		let op = match lexer.peek() {
			Token::Eof => break,
			Token::Op(op) => op,
			// Two values in a row, e.g. "1 2".
			Token::Number(_) => return Err(ExprError::TrailingInput),
		};
		let (left, right) = op.binding_power();
		if left < min_binding_power {
			break;
		}
		lexer.next();
		let rhs = parse_expr(lexer, right)?;
		lhs = op.apply(lhs, rhs);
	}
	Ok(lhs)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_number() {
		assert_eq!(eval("42"), Ok(42.0));
		assert_eq!(eval(" 3.5 "), Ok(3.5));
	}

	#[test]
	fn precedence() {
		assert_eq!(eval("1 + 2 * 3"), Ok(7.0));
		assert_eq!(eval("2 * 3 + 1"), Ok(7.0));
	}

	#[test]
	fn left_associativity() {
		assert_eq!(eval("10 - 4 - 3"), Ok(3.0));
		assert_eq!(eval("100 / 10 / 5"), Ok(2.0));
	}

	#[test]
	fn unary_sign() {
		assert_eq!(eval("-10"), Ok(-10.0));
		assert_eq!(eval("-2 * 3"), Ok(-6.0));
		assert_eq!(eval("1 - -1"), Ok(2.0));
		assert_eq!(eval("+5"), Ok(5.0));
	}

	#[test]
	fn division_is_ieee() {
		assert_eq!(eval("1 / 0"), Ok(f64::INFINITY));
	}

	#[test]
	fn lexer_errors() {
		assert_eq!(eval("1 ^ 2"), Err(ExprError::InvalidCharacter('^')));
		assert_eq!(
			eval("1..2"),
			Err(ExprError::MalformedNumber("1..2".to_string()))
		);
	}

	#[test]
	fn parser_errors() {
		assert_eq!(eval(""), Err(ExprError::UnexpectedEnd));
		assert_eq!(eval("1 +"), Err(ExprError::UnexpectedEnd));
		assert_eq!(eval("* 2"), Err(ExprError::UnexpectedOperator));
		assert_eq!(eval("1 2"), Err(ExprError::TrailingInput));
	}
}
