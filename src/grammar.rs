use std::*;
use fmt::{Display, Formatter};

use itertools::Itertools;
use multimap::MultiMap;

use crate::issue::Issue;
use crate::tokenizer::token::Terminal;

/// The grammar of the Fortress language, one production per line.
pub(crate) const FORTRESS_GRAMMAR: &str = include_str!("../assets/fortress.grammar");

const FIELD_DELIMITER: char = ';';

#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub(crate) enum NonTerminal {
    Program,
    Code,
    Instruction,
    Assign,
    ExprArith,
    ExprArithPrime,
    Prod,
    ProdPrime,
    Atom,
    If,
    IfSeq,
    Cond,
    Comp,
    While,
    Print,
    Read,
}

const NON_TERMINALS: [NonTerminal; 16] = [
    NonTerminal::Program,
    NonTerminal::Code,
    NonTerminal::Instruction,
    NonTerminal::Assign,
    NonTerminal::ExprArith,
    NonTerminal::ExprArithPrime,
    NonTerminal::Prod,
    NonTerminal::ProdPrime,
    NonTerminal::Atom,
    NonTerminal::If,
    NonTerminal::IfSeq,
    NonTerminal::Cond,
    NonTerminal::Comp,
    NonTerminal::While,
    NonTerminal::Print,
    NonTerminal::Read,
];

impl NonTerminal {
    pub(crate) fn spelling(&self) -> &'static str {
        use NonTerminal::*;
        match self {
            Program => "<Program>",
            Code => "<Code>",
            Instruction => "<Instruction>",
            Assign => "<Assign>",
            ExprArith => "<ExprArith>",
            ExprArithPrime => "<ExprArith'>",
            Prod => "<Prod>",
            ProdPrime => "<Prod'>",
            Atom => "<Atom>",
            If => "<If>",
            IfSeq => "<IfSeq>",
            Cond => "<Cond>",
            Comp => "<Comp>",
            While => "<While>",
            Print => "<Print>",
            Read => "<Read>",
        }
    }

    /// Also accepts the upper-case `<IF>` of older grammar descriptions.
    pub(crate) fn from_spelling(spelling: &str) -> Option<NonTerminal> {
        if spelling == "<IF>" {
            return Some(NonTerminal::If);
        }
        NON_TERMINALS
            .into_iter()
            .find(|nonterminal| nonterminal.spelling() == spelling)
    }

    /// Expression and term nodes, and their continuations, which carry
    /// their operator one level down in the parse tree.
    pub(crate) fn is_operator_chain(&self) -> bool {
        use NonTerminal::*;
        matches!(self, ExprArith | ExprArithPrime | Prod | ProdPrime)
    }
}

impl Display for NonTerminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling())
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Hash)]
pub(crate) enum GrammarSymbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl GrammarSymbol {
    fn from_spelling(spelling: &str) -> Option<GrammarSymbol> {
        NonTerminal::from_spelling(spelling)
            .map(GrammarSymbol::NonTerminal)
            .or_else(|| Terminal::from_spelling(spelling).map(GrammarSymbol::Terminal))
    }
}

impl Display for GrammarSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GrammarSymbol::Terminal(terminal) => write!(f, "{}", terminal),
            GrammarSymbol::NonTerminal(nonterminal) => write!(f, "{}", nonterminal),
        }
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub(crate) struct ProductionRule {
    pub(crate) idx: usize,
    pub(crate) lhs: NonTerminal,
    pub(crate) rhs: Vec<GrammarSymbol>,
}

impl ProductionRule {
    pub(crate) fn is_epsilon(&self) -> bool {
        self.rhs == [GrammarSymbol::Terminal(Terminal::Epsilon)]
    }
}

impl Display for ProductionRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs.iter().join(" "))
    }
}

/// Production rules in description order. A rule's position is its index,
/// and rule 0 is the start rule.
#[derive(Debug)]
pub(crate) struct Grammar {
    rules: Vec<ProductionRule>,
    rules_by_lhs: MultiMap<NonTerminal, usize>,
}

impl Grammar {
    pub(crate) fn fortress() -> Result<Grammar, Issue> {
        Grammar::from_description(FORTRESS_GRAMMAR)
    }

    /// Reads `;`-separated productions: the left-hand nonterminal first,
    /// then the right-hand symbols. Blank lines are ignored.
    pub(crate) fn from_description(description: &str) -> Result<Grammar, Issue> {
        let mut rules = vec![];
        let mut rules_by_lhs = MultiMap::new();

        for (line_idx, line) in description.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split(FIELD_DELIMITER).map(|field| field.trim());
            let lhs = fields
                .next()
                .and_then(NonTerminal::from_spelling)
                .ok_or(Issue::MissingLeftHandSide { line: line_no })?;
            let rhs = fields
                .map(|spelling| {
                    GrammarSymbol::from_spelling(spelling).ok_or_else(|| {
                        Issue::UnknownGrammarSymbol {
                            line: line_no,
                            spelling: spelling.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if rhs.is_empty() {
                return Err(Issue::EmptyRightHandSide { line: line_no });
            }

            let idx = rules.len();
            rules_by_lhs.insert(lhs, idx);
            rules.push(ProductionRule { idx, lhs, rhs });
        }

        if rules.is_empty() {
            return Err(Issue::EmptyGrammar);
        }
        Ok(Grammar {
            rules,
            rules_by_lhs,
        })
    }

    pub(crate) fn start_rule(&self) -> &ProductionRule {
        &self.rules[0]
    }

    pub(crate) fn start_symbol(&self) -> NonTerminal {
        self.start_rule().lhs
    }

    pub(crate) fn rule(&self, idx: usize) -> Option<&ProductionRule> {
        self.rules.get(idx)
    }

    pub(crate) fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    /// Every left-hand side, in order of first appearance.
    pub(crate) fn nonterminals(&self) -> impl Iterator<Item = NonTerminal> + '_ {
        self.rules.iter().map(|rule| rule.lhs).unique()
    }

    pub(crate) fn rules_for(&self, lhs: NonTerminal) -> impl Iterator<Item = &ProductionRule> {
        self.rules_by_lhs
            .get_vec(&lhs)
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.rules.get(idx))
    }
}
