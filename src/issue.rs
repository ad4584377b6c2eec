use thiserror::Error;

use crate::grammar::NonTerminal;
use crate::tokenizer::token::{Terminal, Token, TokenPos};

/// Every way a compilation can fail. None of them is recoverable: the
/// pipeline stops at the first one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum Issue {
    #[error("{pos}: unknown character encountered: {character}")]
    UnknownCharacter { character: char, pos: TokenPos },
    #[error("{pos}: number {lexeme} does not fit in a 32-bit signed integer")]
    NumberOutOfRange { lexeme: String, pos: TokenPos },
    #[error("{pos}: comment is never closed")]
    UnterminatedComment { pos: TokenPos },

    #[error("grammar line {line}: unknown symbol {spelling}")]
    UnknownGrammarSymbol { line: usize, spelling: String },
    #[error("grammar line {line}: the left-hand side must be a nonterminal")]
    MissingLeftHandSide { line: usize },
    #[error("grammar line {line}: the production has no right-hand side")]
    EmptyRightHandSide { line: usize },
    #[error("the grammar description contains no productions")]
    EmptyGrammar,
    #[error("the grammar is not LL(1): rules {first} and {second} both apply to {nonterminal} on {terminal}")]
    GrammarConflict {
        nonterminal: NonTerminal,
        terminal: Terminal,
        first: usize,
        second: usize,
    },

    #[error("no applicable production for {nonterminal} on {found}")]
    GrammarMismatch { nonterminal: NonTerminal, found: Token },
    #[error("expected {expected}, found {found}")]
    TokenMismatch { expected: Terminal, found: Token },
    #[error("expected end of input, found {found}")]
    TrailingInput { found: Token },
    #[error("nesting deeper than {limit} levels at {found}")]
    NestingTooDeep { limit: usize, found: Token },

    #[error("unexpected parse tree shape: expected {expected}, found {found}")]
    MalformedTree { expected: &'static str, found: String },
    #[error("the program has no instruction to export")]
    NothingToExport,
}
