use fmt::{Display, Formatter};
use std::*;

/// Kinds of input symbols, plus the two pseudo-terminals the grammar needs:
/// `Epsilon` (empty right-hand side) and `EndOfStream`.
#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub(crate) enum Terminal {
    Begin,
    End,
    ProgName,
    VarName,
    Number,
    Comma,
    Assign,
    Equal,
    Smaller,
    Greater,
    Plus,
    Minus,
    Times,
    Divide,
    LParen,
    RParen,
    If,
    Then,
    Else,
    While,
    Do,
    Print,
    Read,
    Epsilon,
    EndOfStream,
}

const SPELLED_TERMINALS: [Terminal; 24] = [
    Terminal::Begin,
    Terminal::End,
    Terminal::ProgName,
    Terminal::VarName,
    Terminal::Number,
    Terminal::Comma,
    Terminal::Assign,
    Terminal::Equal,
    Terminal::Smaller,
    Terminal::Greater,
    Terminal::Plus,
    Terminal::Minus,
    Terminal::Times,
    Terminal::Divide,
    Terminal::LParen,
    Terminal::RParen,
    Terminal::If,
    Terminal::Then,
    Terminal::Else,
    Terminal::While,
    Terminal::Do,
    Terminal::Print,
    Terminal::Read,
    Terminal::Epsilon,
];

impl Terminal {
    /// How the terminal is written in a grammar description.
    pub(crate) fn spelling(&self) -> &'static str {
        use Terminal::*;
        match self {
            Begin => "BEGIN",
            End => "END",
            ProgName => "[ProgName]",
            VarName => "[VarName]",
            Number => "[Number]",
            Comma => ",",
            Assign => ":=",
            Equal => "=",
            Smaller => "<",
            Greater => ">",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Divide => "/",
            LParen => "(",
            RParen => ")",
            If => "IF",
            Then => "THEN",
            Else => "ELSE",
            While => "WHILE",
            Do => "DO",
            Print => "PRINT",
            Read => "READ",
            Epsilon => "E",
            EndOfStream => "end of stream",
        }
    }

    /// Also accepts `ProgName` and `[number]`, as written in older grammar
    /// descriptions.
    pub(crate) fn from_spelling(spelling: &str) -> Option<Terminal> {
        match spelling {
            "ProgName" => return Some(Terminal::ProgName),
            "[number]" => return Some(Terminal::Number),
            _ => {}
        }
        SPELLED_TERMINALS
            .into_iter()
            .find(|terminal| terminal.spelling() == spelling)
    }

    pub(crate) fn keyword(name: &str) -> Option<Terminal> {
        use Terminal::*;
        Some(match name {
            "BEGIN" => Begin,
            "END" => End,
            "IF" => If,
            "THEN" => Then,
            "ELSE" => Else,
            "WHILE" => While,
            "DO" => Do,
            "PRINT" => Print,
            "READ" => Read,
            _ => return None,
        })
    }

    /// Token classes whose lexeme carries information beyond the kind.
    pub(crate) fn is_class(&self) -> bool {
        matches!(self, Terminal::ProgName | Terminal::VarName | Terminal::Number)
    }
}

impl Display for Terminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling())
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash, PartialOrd)]
pub(crate) struct TokenPos {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl Default for TokenPos {
    fn default() -> Self {
        TokenPos { line: 1, column: 1 }
    }
}

impl From<(usize, usize)> for TokenPos {
    fn from(line_and_column: (usize, usize)) -> Self {
        let (line, column) = line_and_column;
        TokenPos { line, column }
    }
}

impl Display for TokenPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub(crate) struct Token {
    pub(crate) terminal: Terminal,
    pub(crate) lexeme: String,
    pub(crate) pos: TokenPos,
}

impl Token {
    pub(crate) fn end_of_stream(pos: TokenPos) -> Token {
        Token {
            terminal: Terminal::EndOfStream,
            lexeme: String::new(),
            pos,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.terminal {
            Terminal::EndOfStream => write!(f, "end of stream at {}", self.pos),
            terminal if terminal.is_class() => {
                write!(f, "{} `{}` at {}", terminal, self.lexeme, self.pos)
            }
            _ => write!(f, "`{}` at {}", self.lexeme, self.pos),
        }
    }
}
