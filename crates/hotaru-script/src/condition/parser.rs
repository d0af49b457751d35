//! Recursive-descent parser for condition expressions.
//!
//! Grammar, loosest-binding first:
//!
//! ```text
//! expr    := or
//! or      := and ("||" and)*
//! and     := not ("&&" not)*
//! not     := "!" not | cmp
//! cmp     := sum (("=="|"!="|">="|"<="|">"|"<") sum)?
//! sum     := term (("+"|"-") term)*
//! term    := unary (("*"|"/"|"%") unary)*
//! unary   := "-" unary | primary
//! primary := INT | "true" | "false" | FLAG | "(" expr ")"
//! ```
//!
//! Comparisons do not chain; `a < b < c` is a parse error rather than the
//! surprising thing other script dialects make of it.

use super::lexer::{ConditionError, Token, lex};

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal.
    Int(i64),
    /// Boolean literal.
    Bool(bool),
    /// Affinity flag reference; absent flags evaluate to 0.
    Flag(String),
    /// Unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// Binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation (`!`), via truthiness.
    Not,
    /// Arithmetic negation (`-`).
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `||` (short-circuit).
    Or,
    /// `&&` (short-circuit).
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

/// Parse a condition source string into an expression.
pub fn parse_condition(source: &str) -> Result<Expr, ConditionError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: source.len(),
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some((token, span)) => Err(ConditionError {
            span: span.clone(),
            message: format!("unexpected trailing input: {token}"),
        }),
    }
}

struct Parser<'t> {
    tokens: &'t [(Token, std::ops::Range<usize>)],
    pos: usize,
    end: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&(Token, std::ops::Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&(Token, std::ops::Range<usize>)> {
        let entry = self.tokens.get(self.pos);
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    /// Consume the next token if it satisfies the selector.
    fn eat<T>(&mut self, select: impl Fn(&Token) -> Option<T>) -> Option<T> {
        let picked = self.peek().and_then(|(token, _)| select(token));
        if picked.is_some() {
            self.pos += 1;
        }
        picked
    }

    fn error_here(&self, expected: &str) -> ConditionError {
        match self.peek() {
            Some((token, span)) => ConditionError {
                span: span.clone(),
                message: format!("expected {expected}, found {token}"),
            },
            None => ConditionError {
                span: self.end..self.end,
                message: format!("expected {expected}, found end of condition"),
            },
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_and()?;
        while self
            .eat(|t| matches!(t, Token::OrOr).then_some(()))
            .is_some()
        {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_not()?;
        while self
            .eat(|t| matches!(t, Token::AndAnd).then_some(()))
            .is_some()
        {
            let rhs = self.parse_not()?;
            lhs = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ConditionError> {
        if self
            .eat(|t| matches!(t, Token::Bang).then_some(()))
            .is_some()
        {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Expr, ConditionError> {
        let lhs = self.parse_sum()?;
        let op = self.eat(|t| match t {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::Ne),
            Token::GreaterEq => Some(BinaryOp::Ge),
            Token::LessEq => Some(BinaryOp::Le),
            Token::Greater => Some(BinaryOp::Gt),
            Token::Less => Some(BinaryOp::Lt),
            _ => None,
        });
        match op {
            Some(op) => {
                let rhs = self.parse_sum()?;
                Ok(Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            None => Ok(lhs),
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_term()?;
        while let Some(op) = self.eat(|t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        }) {
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ConditionError> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.eat(|t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        }) {
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
        if self
            .eat(|t| matches!(t, Token::Minus).then_some(()))
            .is_some()
        {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ConditionError> {
        let Some((token, _)) = self.peek() else {
            return Err(self.error_here("a value"));
        };
        match token {
            Token::Int(n) => {
                let n = *n;
                self.bump();
                Ok(Expr::Int(n))
            }
            Token::True => {
                self.bump();
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.bump();
                Ok(Expr::Bool(false))
            }
            Token::Flag(name) => {
                let name = name.clone();
                self.bump();
                Ok(Expr::Flag(name))
            }
            Token::LParen => {
                self.bump();
                let inner = self.parse_or()?;
                if self
                    .eat(|t| matches!(t, Token::RParen).then_some(()))
                    .is_none()
                {
                    return Err(self.error_here("closing `)`"));
                }
                Ok(inner)
            }
            _ => Err(self.error_here("a value")),
        }
    }
}
