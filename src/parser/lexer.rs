use std::fmt;

type Pos = u32;

/// A span of the input, as byte offsets with an exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Pos,
    pub end: Pos,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Symbol,
    Number,
    Ident,
    Error,
}

#[derive(Debug, Clone)]
pub struct Lexeme {
    pub token: Token,
    pub text: String,
    pub range: Range,
}

/// Splits scene text into [`Lexeme`]s. Whitespace and `;` comments are skipped, and anything that
/// can't start a token comes out as a single-character [`Token::Error`].
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Advance past the longest prefix matching `pred`, returning its length in bytes.
    fn eat_while<P: FnMut(char) -> bool>(&mut self, mut pred: P) -> usize {
        let len = self
            .rest()
            .find(|c| !pred(c))
            .unwrap_or_else(|| self.rest().len());
        self.pos += len;
        len
    }

    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(char::is_whitespace);
            if self.peek() != Some(';') {
                break;
            }
            self.eat_while(|c| c != '\n');
        }
    }

    fn eat_word(&mut self) -> usize {
        self.eat_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '!' | '?'))
    }

    /// The rest of a number once its first digit or sign is consumed: digits with at most one
    /// decimal point.
    fn eat_number(&mut self) {
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
        }
    }

    fn classify(&mut self, first: char) -> Token {
        match first {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ':' if self.peek().map_or(false, |c| c.is_ascii_alphabetic()) => {
                self.eat_word();
                Token::Symbol
            }
            '-' | '+' if self.peek().map_or(false, |c| c.is_ascii_digit()) => {
                self.eat_number();
                Token::Number
            }
            '.' if self.peek().map_or(false, |c| c.is_ascii_digit()) => {
                self.eat_while(|c| c.is_ascii_digit());
                Token::Number
            }
            c if c.is_ascii_digit() => {
                self.eat_number();
                Token::Number
            }
            c if c.is_ascii_alphabetic() => {
                self.eat_word();
                Token::Ident
            }
            _ => Token::Error,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();

        let start = self.pos;
        let first = self.bump()?;
        let token = self.classify(first);

        Some(Lexeme {
            token,
            text: String::from(&self.input[start..self.pos]),
            range: Range {
                start: start as Pos,
                end: self.pos as Pos,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<(Token, String)> {
        Lexer::new(input).map(|lex| (lex.token, lex.text)).collect()
    }

    fn tok(token: Token, text: &str) -> (Token, String) {
        (token, String::from(text))
    }

    #[test]
    fn test_lex_sphere() {
        assert_eq!(
            vec![
                tok(Token::LParen, "("),
                tok(Token::Ident, "sphere"),
                tok(Token::Symbol, ":radius"),
                tok(Token::Number, "0.1"),
                tok(Token::Symbol, ":sway"),
                tok(Token::LParen, "("),
                tok(Token::Number, "-0.35"),
                tok(Token::Number, "0"),
                tok(Token::Number, "+0.5"),
                tok(Token::RParen, ")"),
                tok(Token::RParen, ")"),
            ],
            lex("(sphere :radius 0.1 :sway (-0.35 0 +0.5))")
        );
    }

    #[test]
    fn test_lex_ranges() {
        let ranges: Vec<Range> = Lexer::new("  (blend 12.5)").map(|lex| lex.range).collect();
        assert_eq!(
            vec![
                Range { start: 2, end: 3 },
                Range { start: 3, end: 8 },
                Range { start: 9, end: 13 },
                Range { start: 13, end: 14 },
            ],
            ranges
        );
    }

    #[test]
    fn test_lex_trivia() {
        assert_eq!(
            vec![tok(Token::Symbol, ":center"), tok(Token::Symbol, ":sway-x")],
            lex("  ; leading comment\n\t:center ;; trailing\n :sway-x ;")
        );
        assert!(lex("   ; only a comment").is_empty());
        assert!(lex("").is_empty());
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            vec![
                tok(Token::Number, "3."),
                tok(Token::Number, "7"),
                tok(Token::Number, "1.5"),
                tok(Token::Number, ".25"),
            ],
            lex("3. 7 1.5 .25")
        );
        assert_eq!(
            vec![tok(Token::Number, "1.5"), tok(Token::Error, ".")],
            lex("1.5.")
        );
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(
            vec![
                tok(Token::Error, ":"),
                tok(Token::Error, "-"),
                tok(Token::Error, "#"),
                tok(Token::Error, "é"),
                tok(Token::Ident, "x"),
            ],
            lex(": - # é x")
        );
    }
}
