use std::iter::Peekable;
use std::str::CharIndices;

use crate::issue::Issue;
use token::*;

pub mod token;

/// Anything able to hand out tokens one at a time. Once the input is
/// exhausted, every further call yields an end-of-stream token.
pub(crate) trait TokenSource {
    fn next_token(&mut self) -> Result<Token, Issue>;
}

pub(crate) struct Tokenizer<'a> {
    source_code: &'a str,
    chars: Peekable<CharIndices<'a>>,
    pos: TokenPos,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(source_code: &'a str) -> Self {
        Tokenizer {
            source_code,
            chars: source_code.char_indices().peekable(),
            pos: TokenPos::default(),
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let (i, c) = self.chars.next()?;
        if c == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some((i, c))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.source_code.len(), |&(i, _)| i)
    }

    fn rest(&mut self) -> &'a str {
        let offset = self.offset();
        &self.source_code[offset..]
    }

    fn skip_while<P: Fn(char) -> bool>(&mut self, pred: P) {
        while self.peek_char().map_or(false, &pred) {
            self.bump();
        }
    }

    /// Skips whitespace, `$` line comments and `!! ... !!` comments.
    fn skip_trivia(&mut self) -> Result<(), Issue> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('$') => self.skip_while(|c| c != '\n'),
                Some('!') if self.rest().starts_with("!!") => {
                    let opened_at = self.pos;
                    self.bump();
                    self.bump();
                    while !self.rest().starts_with("!!") {
                        if self.bump().is_none() {
                            return Err(Issue::UnterminatedComment { pos: opened_at });
                        }
                    }
                    self.bump();
                    self.bump();
                }
                _ => return Ok(()),
            }
        }
    }
}

impl TokenSource for Tokenizer<'_> {
    fn next_token(&mut self) -> Result<Token, Issue> {
        use Terminal::*;

        self.skip_trivia()?;
        let pos = self.pos;
        let Some((start, curr_char)) = self.bump() else {
            return Ok(Token::end_of_stream(pos));
        };

        let terminal = match curr_char {
            ',' => Comma,
            '=' => Equal,
            '<' => Smaller,
            '>' => Greater,
            '+' => Plus,
            '-' => Minus,
            '*' => Times,
            '/' => Divide,
            '(' => LParen,
            ')' => RParen,
            ':' if self.peek_char() == Some('=') => {
                self.bump();
                Assign
            }
            '0'..='9' => {
                self.skip_while(|c| c.is_ascii_digit());
                Number
            }
            'a'..='z' => {
                self.skip_while(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
                VarName
            }
            'A'..='Z' => {
                self.skip_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let end = self.offset();
                Terminal::keyword(&self.source_code[start..end]).unwrap_or(ProgName)
            }
            character => return Err(Issue::UnknownCharacter { character, pos }),
        };

        let end = self.offset();
        let lexeme = self.source_code[start..end].to_string();
        if terminal == Number && lexeme.parse::<i32>().is_err() {
            return Err(Issue::NumberOutOfRange { lexeme, pos });
        }

        Ok(Token {
            terminal,
            lexeme,
            pos,
        })
    }
}
