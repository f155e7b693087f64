//! Depth-tracking character scanner.
//!
//! Splits SQL text on a separator that sits outside every parenthesis and
//! quoted literal, so `DECIMAL(10,2)` or `CHECK (x IN (1, 2))` never break a
//! column list apart. Comments are dropped while scanning.

pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.current(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn at_comment(&self) -> bool {
        matches!(
            (self.current(), self.peek()),
            (Some('-'), Some('-')) | (Some('/'), Some('*'))
        )
    }

    fn skip_comment(&mut self) {
        if self.current() == Some('-') {
            while let Some(c) = self.current() {
                self.advance();
                if c == '\n' {
                    break;
                }
            }
        } else {
            self.advance(); // /
            self.advance(); // *
            while let Some(c) = self.current() {
                self.advance();
                if c == '*' && self.current() == Some('/') {
                    self.advance();
                    break;
                }
            }
        }
    }

    /// Copy a quoted run into `out`, quotes included. `[` closes with `]`;
    /// a doubled quote reads as a close followed by a fresh open, which keeps
    /// it opaque.
    fn read_quoted(&mut self, out: &mut String) {
        let Some(open) = self.current() else {
            return;
        };
        let close = if open == '[' { ']' } else { open };
        out.push(open);
        self.advance();
        while let Some(c) = self.current() {
            out.push(c);
            self.advance();
            if c == close {
                break;
            }
        }
    }

    /// Split on `separator` at depth zero. Fragments are trimmed and empty
    /// ones (including comment-only ones) are discarded.
    pub fn split(mut self, separator: char) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;

        while let Some(c) = self.current() {
            if self.at_comment() {
                self.skip_comment();
                current.push(' ');
                continue;
            }
            match c {
                '\'' | '"' | '`' | '[' => {
                    self.read_quoted(&mut current);
                    continue;
                }
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c == separator && depth == 0 => {
                    push_fragment(&mut parts, &current);
                    current.clear();
                    self.advance();
                    continue;
                }
                _ => {}
            }
            current.push(c);
            self.advance();
        }
        push_fragment(&mut parts, &current);

        parts
    }

    /// The input with comments removed; quoted literals are left intact.
    pub fn strip_comments(mut self) -> String {
        let mut out = String::with_capacity(self.chars.len());
        while let Some(c) = self.current() {
            if self.at_comment() {
                self.skip_comment();
                out.push(' ');
            } else if matches!(c, '\'' | '"' | '`' | '[') {
                self.read_quoted(&mut out);
            } else {
                out.push(c);
                self.advance();
            }
        }
        out
    }

    /// Next whitespace-delimited word. Whitespace inside parentheses or
    /// quotes does not end the word.
    pub fn read_word(&mut self) -> Option<String> {
        self.skip_whitespace();
        let mut word = String::new();
        let mut depth = 0usize;

        while let Some(c) = self.current() {
            match c {
                '\'' | '"' | '`' | '[' => {
                    self.read_quoted(&mut word);
                    continue;
                }
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                c if c.is_whitespace() && depth == 0 => break,
                _ => {}
            }
            word.push(c);
            self.advance();
        }

        (!word.is_empty()).then_some(word)
    }

    /// A declared type. A parameter list written after a space
    /// (`DECIMAL (10, 2)`) is folded into the type.
    pub fn read_type(&mut self) -> Option<String> {
        let mut typ = self.read_word()?;
        if typ.contains('(') {
            return Some(typ);
        }

        let mark = self.pos;
        self.skip_whitespace();
        if self.current() == Some('(') {
            if let Some(params) = self.read_word() {
                typ.push_str(&params);
            }
        } else {
            self.pos = mark;
        }
        Some(typ)
    }

    /// Read a parenthesized body whose `(` is already consumed, up to its
    /// matching `)`. `None` when an unquoted `;` or the end of input comes
    /// first; the scanner then sits just past that `;`.
    pub fn read_block(&mut self) -> Option<String> {
        let mut body = String::new();
        let mut depth = 1usize;

        while let Some(c) = self.current() {
            match c {
                '\'' | '"' | '`' | '[' => {
                    self.read_quoted(&mut body);
                    continue;
                }
                ';' => {
                    self.advance();
                    return None;
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Some(body);
                    }
                }
                _ => {}
            }
            body.push(c);
            self.advance();
        }
        None
    }

    /// Bytes of the input consumed so far.
    pub fn byte_offset(&self) -> usize {
        self.chars[..self.pos].iter().map(|c| c.len_utf8()).sum()
    }

    /// Everything not yet consumed, trimmed.
    pub fn rest(&self) -> String {
        self.chars[self.pos..].iter().collect::<String>().trim().to_string()
    }
}

fn push_fragment(parts: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(input: &str, separator: char) -> Vec<String> {
        Scanner::new(input).split(separator)
    }

    #[test]
    fn test_split_top_level_commas() {
        let body = "\n  Price DECIMAL(10,2) NOT NULL,\n  Name TEXT,\n  CHECK (Price IN (1, 2))\n";
        assert_eq!(
            split(body, ','),
            vec![
                "Price DECIMAL(10,2) NOT NULL",
                "Name TEXT",
                "CHECK (Price IN (1, 2))"
            ]
        );
    }

    #[test]
    fn test_quoted_separators_are_opaque() {
        let body = "Status TEXT DEFAULT 'a,b', Note TEXT";
        assert_eq!(split(body, ','), vec!["Status TEXT DEFAULT 'a,b'", "Note TEXT"]);

        let script = "INSERT INTO t VALUES ('x;y'); SELECT 1;";
        assert_eq!(split(script, ';'), vec!["INSERT INTO t VALUES ('x;y')", "SELECT 1"]);
    }

    #[test]
    fn test_comments_are_dropped() {
        let script = "-- don't split here; really\nCREATE TABLE a (id INTEGER);\n/* trailing; */\n";
        assert_eq!(split(script, ';'), vec!["CREATE TABLE a (id INTEGER)"]);
    }

    #[test]
    fn test_unbalanced_close_does_not_underflow() {
        assert_eq!(split("a), b", ','), vec!["a)", "b"]);
    }

    #[test]
    fn test_read_word_and_type() {
        let mut scanner = Scanner::new("  Price DECIMAL (10, 2) NOT NULL");
        assert_eq!(scanner.read_word().as_deref(), Some("Price"));
        assert_eq!(scanner.read_type().as_deref(), Some("DECIMAL(10, 2)"));
        assert_eq!(scanner.rest(), "NOT NULL");
    }

    #[test]
    fn test_read_type_without_params() {
        let mut scanner = Scanner::new("Name TEXT NOT NULL");
        scanner.read_word();
        assert_eq!(scanner.read_type().as_deref(), Some("TEXT"));
        assert_eq!(scanner.rest(), "NOT NULL");
    }

    #[test]
    fn test_read_word_keeps_quoted_spaces() {
        let mut scanner = Scanner::new("[Order ID] INTEGER, \"Item Name\" TEXT");
        assert_eq!(scanner.read_word().as_deref(), Some("[Order ID]"));
        assert_eq!(scanner.read_word().as_deref(), Some("INTEGER,"));
        assert_eq!(scanner.read_word().as_deref(), Some("\"Item Name\""));
    }

    #[test]
    fn test_read_block_skips_quoted_semicolons() {
        let mut scanner = Scanner::new("id INTEGER, note TEXT DEFAULT 'a;b)' , x NUMERIC(4)); next");
        assert_eq!(
            scanner.read_block().as_deref(),
            Some("id INTEGER, note TEXT DEFAULT 'a;b)' , x NUMERIC(4)")
        );
        assert_eq!(scanner.rest(), "; next");
    }

    #[test]
    fn test_read_block_stops_at_bare_semicolon() {
        let input = "id INTEGER;\nCREATE TABLE b (id INTEGER);";
        let mut scanner = Scanner::new(input);
        assert_eq!(scanner.read_block(), None);
        assert_eq!(&input[scanner.byte_offset()..], "\nCREATE TABLE b (id INTEGER);");
    }

    #[test]
    fn test_byte_offset_counts_multibyte_chars() {
        let mut scanner = Scanner::new("é);");
        scanner.read_block();
        assert_eq!(scanner.byte_offset(), 3);
    }

    #[test]
    fn test_strip_comments_keeps_literals() {
        let out = Scanner::new("SELECT '--not a comment' -- gone\n").strip_comments();
        assert_eq!(out.trim(), "SELECT '--not a comment'");
    }
}
