use std::*;
use collections::hash_map::Entry;
use collections::{BTreeSet, HashMap, HashSet};

use crate::grammar::*;
use crate::issue::Issue;
use crate::tokenizer::token::Terminal;

/// Nullable, FIRST and FOLLOW sets of every nonterminal of a grammar.
#[derive(Default, Debug)]
struct GrammarSets {
    nullable: HashSet<NonTerminal>,
    first: HashMap<NonTerminal, BTreeSet<Terminal>>,
    follow: HashMap<NonTerminal, BTreeSet<Terminal>>,
}

fn extend_counting<T: Ord>(set: &mut BTreeSet<T>, items: BTreeSet<T>) -> bool {
    let len_before = set.len();
    set.extend(items);
    set.len() != len_before
}

impl GrammarSets {
    fn compute(grammar: &Grammar) -> Self {
        let mut sets = GrammarSets::default();

        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                let (first, nullable) = sets.first_of_sequence(&rule.rhs);
                changed |= extend_counting(sets.first.entry(rule.lhs).or_default(), first);
                if nullable {
                    changed |= sets.nullable.insert(rule.lhs);
                }
            }
        }

        sets.follow
            .entry(grammar.start_symbol())
            .or_default()
            .insert(Terminal::EndOfStream);

        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules() {
                for (i, symbol) in rule.rhs.iter().enumerate() {
                    let GrammarSymbol::NonTerminal(nonterminal) = symbol else {
                        continue;
                    };
                    let (mut additions, rest_is_nullable) =
                        sets.first_of_sequence(&rule.rhs[i + 1..]);
                    if rest_is_nullable {
                        additions.extend(sets.follow_of(rule.lhs));
                    }
                    changed |= extend_counting(sets.follow.entry(*nonterminal).or_default(), additions);
                }
            }
        }

        sets
    }

    /// FIRST set of a symbol string, and whether the whole string can
    /// derive the empty string.
    fn first_of_sequence(&self, symbols: &[GrammarSymbol]) -> (BTreeSet<Terminal>, bool) {
        let mut first = BTreeSet::new();
        for symbol in symbols {
            match *symbol {
                GrammarSymbol::Terminal(Terminal::Epsilon) => {}
                GrammarSymbol::Terminal(terminal) => {
                    first.insert(terminal);
                    return (first, false);
                }
                GrammarSymbol::NonTerminal(nonterminal) => {
                    first.extend(self.first.get(&nonterminal).into_iter().flatten().copied());
                    if !self.nullable.contains(&nonterminal) {
                        return (first, false);
                    }
                }
            }
        }
        (first, true)
    }

    fn follow_of(&self, nonterminal: NonTerminal) -> BTreeSet<Terminal> {
        self.follow.get(&nonterminal).cloned().unwrap_or_default()
    }
}

/// LL(1) parse-action table: which rule to expand a nonterminal with,
/// given the lookahead terminal. Built once and never modified.
pub(crate) struct ActionTable<'g> {
    grammar: &'g Grammar,
    entries: HashMap<(NonTerminal, Terminal), usize>,
}

impl<'g> ActionTable<'g> {
    pub(crate) fn build(grammar: &'g Grammar) -> Result<Self, Issue> {
        let sets = GrammarSets::compute(grammar);
        let mut entries = HashMap::new();

        for lhs in grammar.nonterminals() {
            let mut row = HashMap::new();
            for rule in grammar.rules_for(lhs) {
                let (mut lookaheads, nullable) = sets.first_of_sequence(&rule.rhs);
                if nullable {
                    lookaheads.extend(sets.follow_of(lhs));
                }
                for terminal in lookaheads {
                    match row.entry(terminal) {
                        Entry::Vacant(entry) => {
                            entry.insert(rule.idx);
                        }
                        Entry::Occupied(entry) => {
                            return Err(Issue::GrammarConflict {
                                nonterminal: lhs,
                                terminal,
                                first: *entry.get(),
                                second: rule.idx,
                            });
                        }
                    }
                }
            }
            entries.extend(row.into_iter().map(|(terminal, idx)| ((lhs, terminal), idx)));
        }

        Ok(ActionTable { grammar, entries })
    }

    pub(crate) fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub(crate) fn rule_for(
        &self,
        nonterminal: NonTerminal,
        lookahead: Terminal,
    ) -> Option<&'g ProductionRule> {
        let idx = *self.entries.get(&(nonterminal, lookahead))?;
        self.grammar.rule(idx)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
