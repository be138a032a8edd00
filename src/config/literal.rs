//! A narrow literal grammar for command-line and script values.
//!
//! Accepts `None`, `True`, `False`, integers (sign, `_` separators,
//! `0x`/`0o`/`0b` prefixes), floats, quoted strings and bytes with
//! backslash escapes, and lists, tuples, dicts and sets built from those.

use thiserror::Error;

use crate::value::{Value, ValueMap, ValueSet};

/// Where and why literal parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    /// Byte offset into the input
    pub offset: usize,
    /// What was expected or found
    pub message: String,
}

/// Parses `text` as a single literal. Leading and trailing whitespace is
/// ignored.
///
/// # Errors
///
/// Returns [`LiteralError`] when `text` is not exactly one literal.
pub fn parse_literal(text: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser { src: text, pos: 0 };
    parser.skip_ws();
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.fail("unexpected trailing input"));
    }
    Ok(value)
}

/// Interprets a command-line value: `~` is expanded to the home
/// directory, then the text is parsed as a literal, falling back to the
/// text itself as a string.
#[must_use]
pub fn parse_config_value(raw: &str) -> Value {
    let expanded = expand_user(raw);
    parse_literal(&expanded).unwrap_or(Value::Str(expanded))
}

/// Expands a leading `~` or `~/` to the home directory.
#[must_use]
pub fn expand_user(raw: &str) -> String {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return raw.to_owned(),
    };
    dirs::home_dir().map_or_else(
        || raw.to_owned(),
        |home| format!("{}{rest}", home.display()),
    )
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn fail(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.fail(format!("expected '{expected}'")))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expr(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(self.fail("unexpected end of input")),
            Some('[') => {
                self.pos += 1;
                Ok(Value::List(self.items(']')?.0))
            }
            Some('(') => {
                self.pos += 1;
                let (items, trailing_comma) = self.items(')')?;
                match items.len() {
                    1 if !trailing_comma => Ok(items.into_iter().next().unwrap_or(Value::None)),
                    _ => Ok(Value::Tuple(items)),
                }
            }
            Some('{') => {
                self.pos += 1;
                self.braces()
            }
            Some('\'' | '"') => self.string().map(Value::Str),
            Some('b' | 'B') if matches!(self.src[self.pos + 1..].chars().next(), Some('\'' | '"')) => {
                self.pos += 1;
                let text = self.string()?;
                if !text.is_ascii() {
                    return Err(self.fail("bytes can only contain ASCII characters"));
                }
                Ok(Value::Bytes(text.into_bytes()))
            }
            Some(c) if c == '+' || c == '-' || c == '.' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.keyword(),
            Some(c) => Err(self.fail(format!("unexpected character {c:?}"))),
        }
    }

    /// Comma-separated expressions up to `close`. Also reports whether a
    /// trailing comma was present.
    fn items(&mut self, close: char) -> Result<(Vec<Value>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok((items, trailing_comma));
            }
            items.push(self.expr()?);
            self.skip_ws();
            trailing_comma = self.eat(',');
            if !trailing_comma {
                self.skip_ws();
                self.expect(close)?;
                return Ok((items, false));
            }
        }
    }

    /// A dict or a set; `{}` is an empty dict.
    fn braces(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        if self.eat('}') {
            return Ok(Value::Dict(ValueMap::new()));
        }
        let first = self.expr()?;
        self.skip_ws();
        if self.eat(':') {
            let mut map = ValueMap::new();
            self.skip_ws();
            map.insert(first, self.expr()?);
            loop {
                self.skip_ws();
                if self.eat('}') {
                    return Ok(Value::Dict(map));
                }
                self.expect(',')?;
                self.skip_ws();
                if self.eat('}') {
                    return Ok(Value::Dict(map));
                }
                let key = self.expr()?;
                self.skip_ws();
                self.expect(':')?;
                self.skip_ws();
                map.insert(key, self.expr()?);
            }
        }
        let mut set = ValueSet::new();
        set.insert(first);
        if self.eat(',') {
            set.extend(self.items('}')?.0);
        } else {
            self.expect('}')?;
        }
        Ok(Value::Set(set))
    }

    fn keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "None" => Ok(Value::None),
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            word => {
                self.pos = start;
                Err(self.fail(format!("'{word}' is not a literal")))
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let Some(quote) = self.bump() else {
            return Err(self.fail("expected a string"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.fail("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some('\n') => return Err(self.fail("newline in string")),
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.fail("unterminated escape"))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' => out.push(c),
            '\n' => {}
            'x' => out.push(self.code_point(2)?),
            'u' => out.push(self.code_point(4)?),
            'U' => out.push(self.code_point(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn code_point(&mut self, digits: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.fail("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.fail("invalid escape"))?;
        let c = char::from_u32(code).ok_or_else(|| self.fail("invalid code point"))?;
        self.pos = end;
        Ok(c)
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let negative = self.eat('-');
        if !negative {
            self.eat('+');
        }
        self.skip_ws();
        let digits_start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
            || (self.pos > digits_start
                && matches!(self.peek(), Some('+' | '-'))
                && matches!(self.src[..self.pos].chars().last(), Some('e' | 'E'))
                && !self.src[digits_start..].starts_with("0x"))
        {
            self.bump();
        }
        let token = &self.src[digits_start..self.pos];
        let parsed = parse_number(token).ok_or_else(|| LiteralError {
            offset: start,
            message: format!("invalid number {:?}", &self.src[start..self.pos]),
        })?;
        Ok(match parsed {
            Value::Int(i) if negative => Value::Int(-i),
            Value::Float(x) if negative => Value::Float(-x),
            other => other,
        })
    }
}

fn parse_number(token: &str) -> Option<Value> {
    if token.starts_with('_') || token.ends_with('_') || token.contains("__") {
        return None;
    }
    let lower = token.to_ascii_lowercase();
    for (prefix, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        if let Some(digits) = lower.strip_prefix(prefix) {
            let digits = digits.strip_prefix('_').unwrap_or(digits).replace('_', "");
            return i64::from_str_radix(&digits, radix).ok().map(Value::Int);
        }
    }
    let plain = lower.replace('_', "");
    if plain.is_empty() || !plain.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if plain.bytes().all(|b| b.is_ascii_digit()) {
        if plain.len() > 1 && plain.starts_with('0') && plain.bytes().any(|b| b != b'0') {
            return None;
        }
        return plain.parse().ok().map(Value::Int);
    }
    if plain.contains("inf") || plain.contains("nan") {
        return None;
    }
    plain.parse().ok().map(Value::Float)
}

#[cfg(test)]
#[path = "literal_tests.rs"]
mod tests;
