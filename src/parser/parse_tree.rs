use std::*;
use fmt::{Display, Formatter};
use mem;

use crate::grammar::NonTerminal;
use crate::tokenizer::token::{Terminal, Token};

/// Label of a concrete syntax tree node. Terminals only ever appear once
/// matched against the input, so they always carry their token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ParseSymbol {
    NonTerminal(NonTerminal),
    Token(Token),
}

impl Display for ParseSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseSymbol::NonTerminal(nonterminal) => write!(f, "{}", nonterminal),
            ParseSymbol::Token(token) => write!(f, "{}", token.lexeme),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParseTree {
    pub(crate) label: ParseSymbol,
    pub(crate) children: Vec<ParseTree>,
}

impl ParseTree {
    pub(crate) fn node(nonterminal: NonTerminal, children: Vec<ParseTree>) -> Self {
        ParseTree {
            label: ParseSymbol::NonTerminal(nonterminal),
            children,
        }
    }

    pub(crate) fn leaf(token: Token) -> Self {
        ParseTree {
            label: ParseSymbol::Token(token),
            children: vec![],
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// A nonterminal expanded with an epsilon rule.
    pub(crate) fn is_placeholder(&self) -> bool {
        matches!(self.label, ParseSymbol::NonTerminal(_)) && self.is_leaf()
    }

    pub(crate) fn is_token(&self) -> bool {
        matches!(self.label, ParseSymbol::Token(_))
    }

    pub(crate) fn nonterminal(&self) -> Option<NonTerminal> {
        match self.label {
            ParseSymbol::NonTerminal(nonterminal) => Some(nonterminal),
            ParseSymbol::Token(_) => None,
        }
    }

    pub(crate) fn token(&self) -> Option<&Token> {
        match &self.label {
            ParseSymbol::Token(token) => Some(token),
            ParseSymbol::NonTerminal(_) => None,
        }
    }

    pub(crate) fn children_of(&self, nonterminal: NonTerminal) -> impl Iterator<Item = &ParseTree> {
        self.children
            .iter()
            .filter(move |child| child.nonterminal() == Some(nonterminal))
    }

    pub(crate) fn child_of(&self, nonterminal: NonTerminal) -> Option<&ParseTree> {
        self.children_of(nonterminal).next()
    }

    pub(crate) fn token_of(&self, terminal: Terminal) -> Option<&Token> {
        self.children
            .iter()
            .filter_map(ParseTree::token)
            .find(|token| token.terminal == terminal)
    }
}

/// Instruction lists nest one level per instruction, so the tree is taken
/// apart with a worklist rather than by recursive drops.
impl Drop for ParseTree {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Renders the tree as nested parentheses, leaves bare:
/// `(<Atom> ( (<ExprArith> ...) ))`.
impl Display for ParseTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            return write!(f, "{}", self.label);
        }
        write!(f, "({}", self.label)?;
        for child in &self.children {
            write!(f, " {}", child)?;
        }
        write!(f, ")")
    }
}
