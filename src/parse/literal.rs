// Permissive data-literal parser.
//
// Accepts the literal subset of Python-ish syntax models tend to emit instead of JSON:
// single-quoted strings, True/False/None, tuples, sets and trailing commas. It only
// ever builds `serde_json::Value`s; there is no evaluation of any kind.

use serde_json::{Map, Number, Value};

use crate::errors::ParseError;

const MAX_DEPTH: usize = 128;

/// Parse `text` as a single data literal. Surrounding whitespace is allowed.
pub fn parse_literal(text: &str) -> Result<Value, ParseError> {
    let mut parser = LiteralParser::new(text);
    parser.skip_ws();
    let value = parser.parse_value(0)?;
    parser.skip_ws();
    if parser.pos != text.len() {
        return Err(parser.error("trailing characters after literal"));
    }
    Ok(value)
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Literal {
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

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn parse_value(&mut self, depth: usize) -> Result<Value, ParseError> {
        if depth > MAX_DEPTH {
            return Err(self.error("literal nested too deeply"));
        }

        match self.peek() {
            Some('{') => self.parse_braces(depth),
            Some('[') => self.parse_sequence('[', ']', depth).map(|(items, _)| Value::Array(items)),
            Some('(') => self.parse_tuple(depth),
            Some('\'') | Some('"') => self.parse_strings(),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// `[a, b]` or `(a, b)`; returns the items and whether a separator comma was seen.
    fn parse_sequence(
        &mut self,
        open: char,
        close: char,
        depth: usize,
    ) -> Result<(Vec<Value>, bool), ParseError> {
        if !self.eat(open) {
            return Err(self.error(format!("expected '{open}'")));
        }
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok((items, saw_comma));
            }
            items.push(self.parse_value(depth + 1)?);
            self.skip_ws();
            if self.eat(',') {
                saw_comma = true;
                continue;
            }
            if self.eat(close) {
                return Ok((items, saw_comma));
            }
            return Err(self.error(format!("expected ',' or '{close}'")));
        }
    }

    fn parse_tuple(&mut self, depth: usize) -> Result<Value, ParseError> {
        let (mut items, saw_comma) = self.parse_sequence('(', ')', depth)?;
        // `(x)` is a parenthesized value, `(x,)` is a one-element tuple.
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    /// Dict `{k: v}` or set `{a, b}`; sets become arrays.
    fn parse_braces(&mut self, depth: usize) -> Result<Value, ParseError> {
        self.eat('{');
        self.skip_ws();
        if self.eat('}') {
            return Ok(Value::Object(Map::new()));
        }

        let first = self.parse_value(depth + 1)?;
        self.skip_ws();
        if self.peek() != Some(':') {
            return self.finish_set(first, depth);
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            if !self.eat(':') {
                return Err(self.error("expected ':' after mapping key"));
            }
            let key_str = self.key_to_string(key)?;
            self.skip_ws();
            let value = self.parse_value(depth + 1)?;
            map.insert(key_str, value);

            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}' in mapping"));
            }
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            key = self.parse_value(depth + 1)?;
            self.skip_ws();
        }
    }

    fn finish_set(&mut self, first: Value, depth: usize) -> Result<Value, ParseError> {
        let mut items = vec![first];
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Array(items));
            }
            if !self.eat(',') {
                return Err(self.error("expected ',' or '}' in set"));
            }
            self.skip_ws();
            if self.eat('}') {
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value(depth + 1)?);
        }
    }

    fn key_to_string(&self, key: Value) -> Result<String, ParseError> {
        match key {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Null => Ok("None".to_string()),
            Value::Array(_) | Value::Object(_) => Err(self.error("unhashable mapping key")),
        }
    }

    /// One or more adjacent string literals, concatenated.
    fn parse_strings(&mut self) -> Result<Value, ParseError> {
        let mut out = self.parse_string()?;
        loop {
            let checkpoint = self.pos;
            self.skip_ws();
            match self.peek() {
                Some('\'') | Some('"') => out.push_str(&self.parse_string()?),
                _ => {
                    self.pos = checkpoint;
                    return Ok(Value::String(out));
                }
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            let c = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            match c {
                c if c == quote => return Ok(out),
                '\\' => self.parse_escape(&mut out)?,
                '\n' => return Err(self.error("newline in string literal")),
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            '\\' | '\'' | '"' | '/' => out.push(c),
            '\n' => {}
            'x' => out.push(self.parse_hex_char(2)?),
            'u' => out.push(self.parse_hex_char(4)?),
            'U' => out.push(self.parse_hex_char(8)?),
            other => {
                // Unknown escapes are kept verbatim.
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex_char(&mut self, len: usize) -> Result<char, ParseError> {
        let end = self.pos + len;
        let digits = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| self.error("bad hex escape"))?;
        let c = char::from_u32(code).ok_or_else(|| self.error("invalid code point"))?;
        self.pos = end;
        Ok(c)
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let mut text = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            self.bump();
            if sign == '-' {
                text.push('-');
            }
            self.skip_ws();
        }

        if let Some(radix) = self.radix_prefix() {
            return self.parse_radix_int(start, text.starts_with('-'), radix);
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => text.push(c),
                '_' => {}
                '.' => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.bump();
                    if let Some(sign @ ('-' | '+')) = self.peek() {
                        text.push(sign);
                    } else {
                        continue;
                    }
                }
                _ => break,
            }
            self.bump();
        }

        if !text.chars().any(|c| c.is_ascii_digit()) {
            self.pos = start;
            return Err(self.error("invalid number"));
        }

        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Value::Number(n.into()));
            }
            if let Ok(n) = text.parse::<u64>() {
                return Ok(Value::Number(n.into()));
            }
        }

        let f = text
            .parse::<f64>()
            .map_err(|_| ParseError::Literal {
                offset: start,
                message: format!("invalid number '{text}'"),
            })?;
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ParseError::Literal {
                offset: start,
                message: format!("number '{text}' is not finite"),
            })
    }

    /// Consume a `0x`/`0o`/`0b` prefix and return its radix.
    fn radix_prefix(&mut self) -> Option<u32> {
        let mut chars = self.src[self.pos..].chars();
        if chars.next() != Some('0') {
            return None;
        }
        let radix = match chars.next()? {
            'x' | 'X' => 16,
            'o' | 'O' => 8,
            'b' | 'B' => 2,
            _ => return None,
        };
        self.pos += 2;
        Some(radix)
    }

    fn parse_radix_int(
        &mut self,
        start: usize,
        negative: bool,
        radix: u32,
    ) -> Result<Value, ParseError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                digits.push(c);
            } else if c != '_' {
                break;
            }
            self.bump();
        }

        let invalid = || ParseError::Literal {
            offset: start,
            message: format!("invalid base-{radix} integer"),
        };
        if digits.is_empty() {
            return Err(invalid());
        }
        let magnitude = u64::from_str_radix(&digits, radix).map_err(|_| invalid())?;
        if !negative {
            return Ok(Value::Number(magnitude.into()));
        }
        0i64
            .checked_sub_unsigned(magnitude)
            .map(|n| Value::Number(n.into()))
            .ok_or_else(invalid)
    }

    fn parse_keyword(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            other => {
                let message = format!("unsupported identifier '{other}'");
                self.pos = start;
                Err(self.error(message))
            }
        }
    }
}
