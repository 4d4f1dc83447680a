//! Java tokenizer.
//!
//! A small lexer covering the subset of Java that jfuzz emits, plus
//! strings and comments so hand-edited files can be checked too. It backs
//! [`delimiter_balance`], which re-derives brace and parenthesis nesting
//! from finished source independently of the emitter's own counters.

use std::iter::Peekable;
use std::str::Chars;

use crate::emit::Balance;

/// Token kinds for Java source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A keyword (int, if, for, static, etc.)
    Keyword,
    Identifier,
    /// A number literal, suffix included
    Number,
    String,
    Char,
    /// An operator (+, >>>=, &&, etc.)
    Operator,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Whitespace,
    Newline,
    /// Comment (line or block)
    Comment,
    Unknown,
}

/// A token in Java source.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Start byte offset in source.
    pub start: usize,
    /// End byte offset in source.
    pub end: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, start: usize, end: usize) -> Self {
        Self {
            kind,
            text,
            start,
            end,
        }
    }

    /// Returns true for whitespace, newlines and comments.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment
        )
    }
}

/// Java source tokenizer.
pub struct Tokenizer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            position: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Consumes the next character if it equals `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance_while<F>(&mut self, predicate: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
    }

    fn text_from(&self, start: usize) -> String {
        self.source[start..self.position].to_string()
    }

    /// Checks if a string is a Java keyword or literal keyword.
    pub fn is_keyword(s: &str) -> bool {
        matches!(
            s,
            "boolean"
                | "byte"
                | "char"
                | "short"
                | "int"
                | "long"
                | "float"
                | "double"
                | "void"
                | "if"
                | "else"
                | "for"
                | "while"
                | "do"
                | "switch"
                | "case"
                | "default"
                | "break"
                | "continue"
                | "return"
                | "new"
                | "static"
                | "public"
                | "private"
                | "protected"
                | "final"
                | "class"
                | "package"
                | "import"
                | "true"
                | "false"
                | "null"
        )
    }

    fn identifier(&mut self, start: usize) -> Token {
        self.advance_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
        let text = self.text_from(start);
        let kind = if Self::is_keyword(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, text, start, self.position)
    }

    fn number(&mut self, start: usize) -> Token {
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        // Exponent signs, as in `1e-7`.
        if self.source[start..self.position].ends_with(['e', 'E'])
            && (self.eat('-') || self.eat('+'))
        {
            self.advance_while(|c| c.is_ascii_alphanumeric());
        }
        Token::new(TokenKind::Number, self.text_from(start), start, self.position)
    }

    /// Consumes a quoted literal whose opening quote is already consumed.
    fn quoted(&mut self, start: usize, quote: char, kind: TokenKind) -> Token {
        let mut escaped = false;
        while let Some(c) = self.advance() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote || c == '\n' {
                break;
            }
        }
        Token::new(kind, self.text_from(start), start, self.position)
    }

    fn block_comment(&mut self, start: usize) -> Token {
        while let Some(c) = self.advance() {
            if c == '*' && self.eat('/') {
                break;
            }
        }
        Token::new(TokenKind::Comment, self.text_from(start), start, self.position)
    }

    /// Consumes the longest operator starting with `first`.
    fn operator(&mut self, start: usize, first: char) -> Token {
        match first {
            '>' => {
                if self.eat('>') {
                    self.eat('>');
                }
                self.eat('=');
            }
            '<' => {
                self.eat('<');
                self.eat('=');
            }
            '&' | '|' | '+' | '-' => {
                if !self.eat(first) {
                    self.eat('=');
                }
            }
            _ => {
                self.eat('=');
            }
        }
        Token::new(TokenKind::Operator, self.text_from(start), start, self.position)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.position;
        let c = self.advance()?;

        let single = |kind: TokenKind, pos: usize| Token::new(kind, c.to_string(), start, pos);

        let token = match c {
            ' ' | '\t' => {
                self.advance_while(|c| c == ' ' || c == '\t');
                Token::new(TokenKind::Whitespace, self.text_from(start), start, self.position)
            }
            '\n' => single(TokenKind::Newline, self.position),
            '\r' => {
                self.eat('\n');
                Token::new(TokenKind::Newline, self.text_from(start), start, self.position)
            }

            c if c.is_alphabetic() || c == '_' || c == '$' => self.identifier(start),
            c if c.is_ascii_digit() => self.number(start),

            '"' => self.quoted(start, '"', TokenKind::String),
            '\'' => self.quoted(start, '\'', TokenKind::Char),

            '{' => single(TokenKind::OpenBrace, self.position),
            '}' => single(TokenKind::CloseBrace, self.position),
            '(' => single(TokenKind::OpenParen, self.position),
            ')' => single(TokenKind::CloseParen, self.position),
            '[' => single(TokenKind::OpenBracket, self.position),
            ']' => single(TokenKind::CloseBracket, self.position),
            ',' => single(TokenKind::Comma, self.position),
            ';' => single(TokenKind::Semicolon, self.position),
            ':' => single(TokenKind::Colon, self.position),
            '.' => single(TokenKind::Dot, self.position),

            '/' => {
                if self.eat('/') {
                    self.advance_while(|c| c != '\n');
                    Token::new(TokenKind::Comment, self.text_from(start), start, self.position)
                } else if self.eat('*') {
                    self.block_comment(start)
                } else {
                    self.operator(start, '/')
                }
            }

            '+' | '-' | '*' | '%' | '=' | '!' | '<' | '>' | '&' | '|' | '^' => {
                self.operator(start, c)
            }
            '~' | '?' => single(TokenKind::Operator, self.position),

            _ => single(TokenKind::Unknown, self.position),
        };

        Some(token)
    }
}

/// Re-derives delimiter nesting of `source`, ignoring delimiters inside
/// string, character and comment tokens.
pub fn delimiter_balance(source: &str) -> Balance {
    let mut balance = Balance::default();
    for token in Tokenizer::new(source) {
        match token.kind {
            TokenKind::OpenBrace
            | TokenKind::CloseBrace
            | TokenKind::OpenParen
            | TokenKind::CloseParen
            | TokenKind::OpenBracket
            | TokenKind::CloseBracket => balance.track_str(&token.text),
            _ => {}
        }
    }
    balance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        Tokenizer::new(source)
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_tokenize_declaration() {
        let tokens = kinds("long[] longArrVar_7 = new long [ 3 ] ;");
        assert_eq!(tokens[0], (TokenKind::Keyword, "long".to_string()));
        assert_eq!(tokens[1].0, TokenKind::OpenBracket);
        assert_eq!(tokens[3], (TokenKind::Identifier, "longArrVar_7".to_string()));
        assert_eq!(tokens[4], (TokenKind::Operator, "=".to_string()));
        assert_eq!(tokens[5], (TokenKind::Keyword, "new".to_string()));
    }

    #[test]
    fn test_tokenize_numbers() {
        let numbers: Vec<_> = kinds("-42 9223372036854775807L 0.25F 1e-7 (char)65")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Number)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(numbers, ["42", "9223372036854775807L", "0.25F", "1e-7", "65"]);
    }

    #[test]
    fn test_tokenize_shift_operators() {
        let ops: Vec<_> = kinds("a >>> 2 >> 1 << 3 >>>= b && c")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Operator)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(ops, [">>>", ">>", "<<", ">>>=", "&&"]);
    }

    #[test]
    fn test_balance_ignores_strings_and_comments() {
        let source = "class A { String s = \"{(\"; /* ) */ char c = '}'; // ]\n }";
        assert!(delimiter_balance(source).is_balanced());
        assert!(!delimiter_balance("class A { int[] x = new int [ 2 ;").is_balanced());
    }
}
