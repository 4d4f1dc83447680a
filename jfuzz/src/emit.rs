//! Source emission.
//!
//! The [`Emitter`] owns the output buffer and its cursor state: current
//! indentation, whether the next token starts a line, and the running
//! delimiter [`Balance`]. Tokens are separated by single spaces.

use std::fmt;

use crate::{GenError, GenResult};

/// Open-minus-close counts for each delimiter pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub braces: i64,
    pub parens: i64,
    pub brackets: i64,
    /// Set when a closing delimiter ever appeared without a matching opener.
    pub underflow: bool,
}

impl Balance {
    /// Updates the counts for one delimiter character; other characters
    /// are ignored.
    pub fn track(&mut self, c: char) {
        let slot = match c {
            '{' | '}' => &mut self.braces,
            '(' | ')' => &mut self.parens,
            '[' | ']' => &mut self.brackets,
            _ => return,
        };
        if matches!(c, '{' | '(' | '[') {
            *slot += 1;
        } else {
            *slot -= 1;
            if *slot < 0 {
                self.underflow = true;
            }
        }
    }

    /// Tracks every delimiter character of `text`.
    pub fn track_str(&mut self, text: &str) {
        text.chars().for_each(|c| self.track(c));
    }

    pub fn is_balanced(&self) -> bool {
        self.braces == 0 && self.parens == 0 && self.brackets == 0 && !self.underflow
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "braces {:+}, parens {:+}, brackets {:+}",
            self.braces, self.parens, self.brackets
        )?;
        if self.underflow {
            f.write_str(" (closed before opened)")?;
        }
        Ok(())
    }
}

/// Token writer for generated source.
#[derive(Debug)]
pub struct Emitter {
    output: String,
    indent_width: usize,
    indent_level: usize,
    at_line_start: bool,
    balance: Balance,
}

impl Emitter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            output: String::new(),
            indent_width,
            indent_level: 0,
            at_line_start: true,
            balance: Balance::default(),
        }
    }

    /// Writes one token, preceded by indentation at line start or by a
    /// single space otherwise.
    pub fn token(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            self.output
                .push_str(&" ".repeat(self.indent_width * self.indent_level));
            self.at_line_start = false;
        } else {
            self.output.push(' ');
        }
        self.balance.track_str(text);
        self.output.push_str(text);
    }

    /// Ends the current line.
    pub fn newline(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Runs `f` one indentation level deeper.
    pub fn with_indent<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent();
        let result = f(self);
        self.dedent();
        result
    }

    /// Writes `{`, ends the line and indents.
    pub fn open_block(&mut self) {
        self.token("{");
        self.newline();
        self.indent();
    }

    /// Dedents, writes `}` and ends the line.
    pub fn close_block(&mut self) {
        self.dedent();
        if !self.at_line_start {
            self.newline();
        }
        self.token("}");
        self.newline();
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    /// Finishes emission, failing if any delimiter was left open.
    pub fn finish(mut self) -> GenResult<String> {
        if !self.balance.is_balanced() {
            return Err(GenError::Unbalanced(self.balance));
        }
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
        Ok(self.output)
    }
}
