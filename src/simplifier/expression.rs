//! Turning `<ExprArith>` parse trees into binary expression trees.
//!
//! The grammar has no left recursion, so `a - b + c` parses as `a` followed
//! by a chain of continuations (`- b`, then `+ c`). Three passes undo that:
//!
//! 1. [`raise_operators`] moves each continuation's operator up to the node
//!    owning the continuation and drops epsilon placeholders. Afterwards every
//!    operator labels a node with exactly two children: the left operand and
//!    the rest of the chain.
//! 2. [`fill_gaps`] reads the raised tree into a [`Filled`] tree, finding the
//!    actual operand under each side and folding unary minus signs into it.
//!    Parenthesised subexpressions stay marked as groups.
//! 3. [`correct_signs`] re-associates the right-nested chains so that they
//!    evaluate left to right, and drops the group markers.

use std::mem;

use crate::ast::*;
use crate::issue::Issue;
use crate::parser::parse_tree::*;
use crate::tokenizer::token::Terminal;

use super::malformed;

/// Expression tree straight out of gap filling. Chains are still nested to
/// the right, as the grammar produced them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Filled {
    Operand(Operand),
    Binary(ArithOp, Box<Filled>, Box<Filled>),
    /// Written between parentheses.
    Group(Box<Filled>),
    /// Unary minus applied to a compound expression.
    Negated(Box<Filled>),
}

pub(crate) fn raise_operators(mut tree: ParseTree) -> ParseTree {
    let mut label = tree.label.clone();
    let mut children = mem::take(&mut tree.children);

    let is_chain = matches!(&label, ParseSymbol::NonTerminal(nonterminal) if nonterminal.is_operator_chain());
    if is_chain {
        if let Some(continuation) = children.get_mut(1).filter(|child| !child.is_placeholder()) {
            if continuation.children.first().is_some_and(ParseTree::is_token) {
                label = continuation.children.remove(0).label.clone();
            }
        }
    }

    let children = children
        .into_iter()
        .filter(|child| !child.is_placeholder())
        .map(raise_operators)
        .collect();
    ParseTree { label, children }
}

/// Depth-first search for the operand of one side of an operator, along
/// with the sign flips and parentheses met on the way down.
#[derive(Default)]
struct OperandSearch {
    negated: bool,
    grouped: bool,
}

impl OperandSearch {
    fn operand(&self, value: Value) -> Filled {
        Filled::Operand(Operand {
            value,
            negated: self.negated,
        })
    }

    fn find(&mut self, node: &ParseTree) -> Result<Option<Filled>, Issue> {
        let token = match &node.label {
            ParseSymbol::NonTerminal(_) => {
                for child in &node.children {
                    if let Some(found) = self.find(child)? {
                        return Ok(Some(found));
                    }
                }
                return Ok(None);
            }
            ParseSymbol::Token(token) => token,
        };

        match token.terminal {
            Terminal::LParen => {
                self.grouped = true;
                Ok(None)
            }
            Terminal::RParen => Ok(None),
            Terminal::Minus if node.is_leaf() => {
                self.negated = !self.negated;
                Ok(None)
            }
            Terminal::VarName => Ok(Some(self.operand(Value::Variable(token.lexeme.clone())))),
            Terminal::Number => {
                let value = token
                    .lexeme
                    .parse::<i32>()
                    .map_err(|_| Issue::NumberOutOfRange {
                        lexeme: token.lexeme.clone(),
                        pos: token.pos,
                    })?;
                Ok(Some(self.operand(Value::Constant(value))))
            }
            terminal => {
                let op = ArithOp::from_terminal(terminal)
                    .ok_or_else(|| malformed("an arithmetic operator", node))?;
                let [lhs, rhs] = node.children.as_slice() else {
                    return Err(malformed("an operator with two operands", node));
                };

                let mut filled = Filled::Binary(op, Box::new(fill_gaps(lhs)?), Box::new(fill_gaps(rhs)?));
                if self.grouped {
                    filled = Filled::Group(Box::new(filled));
                }
                if self.negated {
                    filled = Filled::Negated(Box::new(filled));
                }
                Ok(Some(filled))
            }
        }
    }
}

pub(crate) fn fill_gaps(tree: &ParseTree) -> Result<Filled, Issue> {
    OperandSearch::default()
        .find(tree)?
        .ok_or_else(|| malformed("an operand", tree))
}

pub(crate) fn correct_signs(expr: Filled) -> Expr {
    match expr {
        Filled::Operand(operand) => Expr::Operand(operand),
        Filled::Group(inner) => correct_signs(*inner),
        Filled::Negated(inner) => correct_signs(*inner).negated(),
        Filled::Binary(op, lhs, rhs) if op.is_additive() => correct_sum(op, correct_signs(*lhs), *rhs),
        Filled::Binary(op, lhs, rhs) => correct_product(op, correct_signs(*lhs), *rhs),
    }
}

/// `first op rest`, where `rest` may continue the same `+`/`-` chain.
/// A subtraction is turned into the addition of the negated next term, so
/// the nesting to the right no longer changes the result.
fn correct_sum(op: ArithOp, first: Expr, rest: Filled) -> Expr {
    match rest {
        Filled::Binary(next_op, next, tail) if next_op.is_additive() => {
            let next = correct_signs(*next);
            let (op, next) = match op {
                ArithOp::Sub => (ArithOp::Add, next.negated()),
                op => (op, next),
            };
            Expr::binary(op, first, correct_sum(next_op, next, *tail))
        }
        rest @ Filled::Binary(..) if op == ArithOp::Sub => {
            Expr::binary(ArithOp::Add, first, correct_signs(rest).negated())
        }
        rest => Expr::binary(op, first, correct_signs(rest)),
    }
}

/// `first op rest` for `*` and `/`: folds the chain to the left.
fn correct_product(op: ArithOp, first: Expr, rest: Filled) -> Expr {
    match rest {
        Filled::Binary(next_op, next, tail) if next_op.is_multiplicative() => {
            let folded = Expr::binary(op, first, correct_signs(*next));
            correct_product(next_op, folded, *tail)
        }
        rest => Expr::binary(op, first, correct_signs(rest)),
    }
}

/// Runs the three passes over an `<ExprArith>` subtree.
pub(crate) fn simplify_expression(tree: &ParseTree) -> Result<Expr, Issue> {
    let raised = raise_operators(tree.clone());
    let filled = fill_gaps(&raised)?;
    Ok(correct_signs(filled))
}
