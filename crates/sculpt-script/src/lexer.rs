//! Line-level lexing
//!
//! Scripts are whitespace-delimited. A `#` starts a comment that runs to the
//! end of the line, and a double-quoted token may contain whitespace.

use crate::error::ParseErrorKind;

/// Assignment operators recognised after a node name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
}

/// Drop the line terminator and everything from the first `#` onward.
pub fn strip_comment(line: &str) -> &str {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.find('#') {
        Some(at) => &line[..at],
        None => line,
    }
}

/// Whether `token` sits in number position: it starts like a decimal
/// literal (digit, sign or dot).
pub fn looks_numeric(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}

/// Parse a finite decimal number.
pub fn parse_number(token: &str) -> Result<f32, ParseErrorKind> {
    token
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseErrorKind::InvalidNumber(token.to_string()))
}

/// Cursor over the remainder of one comment-stripped line.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// True when only whitespace remains.
    pub fn is_empty(&mut self) -> bool {
        self.skip_whitespace();
        self.rest.is_empty()
    }

    /// Whatever has not been consumed yet, trimmed.
    pub fn remainder(&self) -> &'a str {
        self.rest.trim()
    }

    /// Next bare or quoted token, `None` at end of line.
    pub fn next_token(&mut self) -> Result<Option<&'a str>, ParseErrorKind> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return Ok(None);
        }

        if let Some(quoted) = self.rest.strip_prefix('"') {
            let Some(end) = quoted.find('"') else {
                return Err(ParseErrorKind::UnterminatedString);
            };
            self.rest = &quoted[end + 1..];
            return Ok(Some(&quoted[..end]));
        }

        let end = self
            .rest
            .find(char::is_whitespace)
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(Some(token))
    }

    /// Next statement target. Like [`next_token`](Self::next_token), but a
    /// bare name also ends where an assignment operator begins, so `a+=b`
    /// and `a += b` read the same.
    pub fn next_name(&mut self) -> Result<Option<&'a str>, ParseErrorKind> {
        self.skip_whitespace();
        if self.rest.starts_with('"') {
            return self.next_token();
        }
        if self.rest.is_empty() {
            return Ok(None);
        }

        let bytes = self.rest.as_bytes();
        let end = self
            .rest
            .char_indices()
            .find(|&(at, c)| {
                c.is_whitespace()
                    || c == '='
                    || (matches!(c, '+' | '-') && bytes.get(at + 1) == Some(&b'='))
            })
            .map_or(self.rest.len(), |(at, _)| at);
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(Some(name))
    }

    /// Peek whether the next token starts like a number.
    pub fn at_number(&mut self) -> bool {
        self.skip_whitespace();
        looks_numeric(self.rest)
    }

    /// Next token parsed as a number; `None` at end of line.
    pub fn next_number(&mut self) -> Result<Option<f32>, ParseErrorKind> {
        match self.next_token()? {
            Some(token) => parse_number(token).map(Some),
            None => Ok(None),
        }
    }

    /// Consume `=`, `+=` or `-=`. The operator need not be followed by
    /// whitespace.
    pub fn eat_operator(&mut self) -> Option<Operator> {
        self.skip_whitespace();
        let (operator, len) = if self.rest.starts_with("+=") {
            (Operator::Add, 2)
        } else if self.rest.starts_with("-=") {
            (Operator::Subtract, 2)
        } else if self.rest.starts_with('=') {
            (Operator::Assign, 1)
        } else {
            return None;
        };
        self.rest = &self.rest[len..];
        Some(operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_terminators_are_stripped() {
        assert_eq!(strip_comment("a = sphere 0 0 0 1 # body\r\n"), "a = sphere 0 0 0 1 ");
        assert_eq!(strip_comment("# only a comment\n"), "");
        assert_eq!(strip_comment("b += c\n"), "b += c");
    }

    #[test]
    fn tokens_split_on_whitespace() {
        let mut cursor = Cursor::new("  alpha \t beta  gamma ");
        assert_eq!(cursor.next_token(), Ok(Some("alpha")));
        assert_eq!(cursor.next_token(), Ok(Some("beta")));
        assert_eq!(cursor.next_token(), Ok(Some("gamma")));
        assert_eq!(cursor.next_token(), Ok(None));
        assert!(cursor.is_empty());
    }

    #[test]
    fn quoted_tokens_keep_spaces() {
        let mut cursor = Cursor::new("\"left arm\" = sphere");
        assert_eq!(cursor.next_token(), Ok(Some("left arm")));
        assert_eq!(cursor.eat_operator(), Some(Operator::Assign));
        assert_eq!(cursor.next_token(), Ok(Some("sphere")));
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let mut cursor = Cursor::new("\"left arm = sphere");
        assert_eq!(cursor.next_token(), Err(ParseErrorKind::UnterminatedString));
    }

    #[test]
    fn operators() {
        assert_eq!(Cursor::new(" = x").eat_operator(), Some(Operator::Assign));
        assert_eq!(Cursor::new("+= x").eat_operator(), Some(Operator::Add));
        assert_eq!(Cursor::new("-=x").eat_operator(), Some(Operator::Subtract));
        assert_eq!(Cursor::new("*= x").eat_operator(), None);
        assert_eq!(Cursor::new("").eat_operator(), None);
    }

    #[test]
    fn names_stop_at_operators() {
        for (line, operator) in [
            ("a+=b", Operator::Add),
            ("a-= b", Operator::Subtract),
            ("a -=b", Operator::Subtract),
            ("a=sphere 0 0 0 1", Operator::Assign),
            ("a = b", Operator::Assign),
        ] {
            let mut cursor = Cursor::new(line);
            assert_eq!(cursor.next_name(), Ok(Some("a")), "line: {line}");
            assert_eq!(cursor.eat_operator(), Some(operator), "line: {line}");
        }

        let mut cursor = Cursor::new("left-arm+=b");
        assert_eq!(cursor.next_name(), Ok(Some("left-arm")));
        assert_eq!(cursor.eat_operator(), Some(Operator::Add));

        let mut cursor = Cursor::new("\"a b\"-=c");
        assert_eq!(cursor.next_name(), Ok(Some("a b")));
        assert_eq!(cursor.eat_operator(), Some(Operator::Subtract));

        assert_eq!(Cursor::new("   ").next_name(), Ok(None));
    }

    #[test]
    fn numbers() {
        assert!(looks_numeric("0.5"));
        assert!(looks_numeric("-2"));
        assert!(looks_numeric("+1e3"));
        assert!(looks_numeric(".25"));
        assert!(!looks_numeric("body"));
        assert!(!looks_numeric(""));

        assert_eq!(parse_number("-1.5"), Ok(-1.5));
        assert_eq!(parse_number("+3"), Ok(3.0));
        assert_eq!(parse_number("1e2"), Ok(100.0));
        assert_eq!(
            parse_number("1.2.3"),
            Err(ParseErrorKind::InvalidNumber("1.2.3".into()))
        );
        assert_eq!(
            parse_number("inf"),
            Err(ParseErrorKind::InvalidNumber("inf".into()))
        );
    }

    #[test]
    fn number_lookahead_does_not_consume() {
        let mut cursor = Cursor::new("  0.8 0.2 b");
        assert!(cursor.at_number());
        assert_eq!(cursor.next_number(), Ok(Some(0.8)));
        assert_eq!(cursor.next_number(), Ok(Some(0.2)));
        assert!(!cursor.at_number());
        assert_eq!(cursor.remainder(), "b");
    }
}
