use std::*;
use fmt::{Display, Formatter};

use crate::tokenizer::token::Terminal;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub(crate) fn from_terminal(terminal: Terminal) -> Option<ArithOp> {
        match terminal {
            Terminal::Plus => Some(ArithOp::Add),
            Terminal::Minus => Some(ArithOp::Sub),
            Terminal::Times => Some(ArithOp::Mul),
            Terminal::Divide => Some(ArithOp::Div),
            _ => None,
        }
    }

    pub(crate) fn is_additive(&self) -> bool {
        matches!(self, ArithOp::Add | ArithOp::Sub)
    }

    pub(crate) fn is_multiplicative(&self) -> bool {
        !self.is_additive()
    }
}

impl Display for ArithOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ArithOp::Add => "+",
                ArithOp::Sub => "-",
                ArithOp::Mul => "*",
                ArithOp::Div => "/",
            }
        )
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub(crate) enum Comparison {
    Equal,
    Smaller,
    Greater,
}

impl Comparison {
    pub(crate) fn from_terminal(terminal: Terminal) -> Option<Comparison> {
        match terminal {
            Terminal::Equal => Some(Comparison::Equal),
            Terminal::Smaller => Some(Comparison::Smaller),
            Terminal::Greater => Some(Comparison::Greater),
            _ => None,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Comparison::Equal => "=",
                Comparison::Smaller => "<",
                Comparison::Greater => ">",
            }
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Value {
    Variable(String),
    Constant(i32),
}

/// A leaf of an expression. The sign flip of a unary minus is folded into
/// the operand instead of being a node of its own.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Operand {
    pub(crate) value: Value,
    pub(crate) negated: bool,
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "-")?;
        }
        match &self.value {
            Value::Variable(name) => write!(f, "{}", name),
            Value::Constant(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Expr {
    Operand(Operand),
    Binary {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub(crate) fn binary(op: ArithOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// The same expression with its value sign-flipped, pushed down to the
    /// leftmost operand.
    pub(crate) fn negated(self) -> Expr {
        match self {
            Expr::Operand(operand) => Expr::Operand(Operand {
                negated: !operand.negated,
                ..operand
            }),
            Expr::Binary { op, lhs, rhs } => {
                let op = match op {
                    ArithOp::Add => ArithOp::Sub,
                    ArithOp::Sub => ArithOp::Add,
                    op => op,
                };
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs.negated()),
                    rhs,
                }
            }
        }
    }
}

/// Fully parenthesised, so that tests can tell groupings apart.
impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Operand(operand) => write!(f, "{}", operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Condition {
    pub(crate) lhs: Expr,
    pub(crate) comparison: Comparison,
    pub(crate) rhs: Expr,
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.comparison, self.rhs)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Instruction {
    Assign {
        target: String,
        value: Expr,
    },
    If {
        condition: Condition,
        then_branch: Vec<Instruction>,
        else_branch: Vec<Instruction>,
    },
    While {
        condition: Condition,
        body: Vec<Instruction>,
    },
    Print {
        variable: String,
    },
    Read {
        variable: String,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Program {
    pub(crate) name: String,
    pub(crate) instructions: Vec<Instruction>,
}
