use std::*;
use slice::Iter;

use itertools::Itertools;

use crate::action_table::ActionTable;
use crate::grammar::*;
use crate::issue::Issue;
use crate::tokenizer::token::*;
use crate::tokenizer::TokenSource;
use parse_tree::*;

pub(crate) mod parse_tree;

/// Deepest nesting of expressions and blocks a program may use.
/// Continuations of an instruction list do not count.
pub(crate) const MAX_NESTING: usize = 512;

/// A node being expanded: its rule's symbols still to match, and the
/// children built so far.
struct Frame<'g> {
    nonterminal: NonTerminal,
    pending: Iter<'g, GrammarSymbol>,
    children: Vec<ParseTree>,
}

impl<'g> Frame<'g> {
    fn new(rule: &'g ProductionRule) -> Self {
        Frame {
            nonterminal: rule.lhs,
            pending: rule.rhs.iter(),
            children: Vec::with_capacity(rule.rhs.len()),
        }
    }
}

/// Table-driven predictive parser over a token source.
pub(crate) struct Parser<'t, 'g, S: TokenSource> {
    action_table: &'t ActionTable<'g>,
    tokens: S,
    lookahead: Option<Token>,
    applied_rules: Vec<usize>,
}

impl<'t, 'g, S: TokenSource> Parser<'t, 'g, S> {
    pub(crate) fn new(action_table: &'t ActionTable<'g>, tokens: S) -> Self {
        Parser {
            action_table,
            tokens,
            lookahead: None,
            applied_rules: vec![],
        }
    }

    fn peek(&mut self) -> Result<&Token, Issue> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.tokens.next_token()?,
        };
        Ok(&*self.lookahead.insert(token))
    }

    fn next(&mut self) -> Result<Token, Issue> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.tokens.next_token(),
        }
    }

    /// Parses the whole input from the start rule. The input must end
    /// right after the start symbol.
    ///
    /// Nodes under construction live on an explicit stack, so the length
    /// of the input does not grow the call stack.
    pub(crate) fn run(&mut self) -> Result<ParseTree, Issue> {
        let start_rule = self.action_table.grammar().start_rule();
        self.applied_rules.push(start_rule.idx);

        let mut current = Frame::new(start_rule);
        let mut ancestors: Vec<Frame<'g>> = vec![];
        let mut nesting = usize::from(start_rule.lhs != NonTerminal::Code);

        let tree = loop {
            match current.pending.next() {
                None => {
                    if current.nonterminal != NonTerminal::Code {
                        nesting -= 1;
                    }
                    let node = ParseTree::node(current.nonterminal, mem::take(&mut current.children));
                    match ancestors.pop() {
                        Some(parent) => {
                            current = parent;
                            current.children.push(node);
                        }
                        None => break node,
                    }
                }
                Some(GrammarSymbol::Terminal(Terminal::Epsilon)) => {}
                Some(&GrammarSymbol::Terminal(expected)) => {
                    let found = self.next()?;
                    if found.terminal != expected {
                        return Err(Issue::TokenMismatch { expected, found });
                    }
                    current.children.push(ParseTree::leaf(found));
                }
                Some(&GrammarSymbol::NonTerminal(nonterminal)) => {
                    let lookahead = self.peek()?.terminal;
                    let Some(chosen) = self.action_table.rule_for(nonterminal, lookahead) else {
                        return Err(Issue::GrammarMismatch {
                            nonterminal,
                            found: self.next()?,
                        });
                    };
                    self.applied_rules.push(chosen.idx);

                    if chosen.is_epsilon() {
                        current.children.push(ParseTree::node(nonterminal, vec![]));
                        continue;
                    }
                    if nonterminal != NonTerminal::Code {
                        if nesting == MAX_NESTING {
                            return Err(Issue::NestingTooDeep {
                                limit: MAX_NESTING,
                                found: self.next()?,
                            });
                        }
                        nesting += 1;
                    }
                    ancestors.push(mem::replace(&mut current, Frame::new(chosen)));
                }
            }
        };

        let found = self.next()?;
        if found.terminal != Terminal::EndOfStream {
            return Err(Issue::TrailingInput { found });
        }

        Ok(tree)
    }

    #[cfg(test)]
    fn applied_rules(&self) -> &[usize] {
        &self.applied_rules
    }

    /// Applied rules as 1-based rule numbers, in application order.
    pub(crate) fn left_derivation(&self) -> String {
        self.applied_rules.iter().map(|idx| idx + 1).join(" ")
    }
}
