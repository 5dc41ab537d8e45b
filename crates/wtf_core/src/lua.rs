//! Minimal reader for addon SavedVariables files.
//!
//! The game persists addon state as a sequence of Lua assignments whose
//! right-hand sides are plain table constructors:
//!
//! ```lua
//! ElvDB = {
//!     ["class"] = {
//!         ["Stormrage"] = {
//!             ["Arthas"] = "DEATHKNIGHT",
//!         },
//!     },
//! }
//! ```
//!
//! Only the literal subset the client writes is supported: strings, numbers,
//! booleans, `nil` and nested tables, plus `--` comments.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Table(LuaTable),
}

impl LuaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            LuaValue::Table(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LuaKey {
    Str(String),
    Index(i64),
    /// Boolean or fractional keys; kept so entry counts stay faithful.
    Other(String),
}

/// A table constructor, entries kept in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LuaTable {
    entries: Vec<(LuaKey, LuaValue)>,
}

impl LuaTable {
    /// Look up a string key. Later duplicates win, as in Lua.
    pub fn get(&self, key: &str) -> Option<&LuaValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| matches!(k, LuaKey::Str(s) if s == key))
            .map(|(_, v)| v)
    }

    /// Look up an integer key (positional entries start at 1).
    pub fn get_index(&self, index: i64) -> Option<&LuaValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| matches!(k, LuaKey::Index(i) if *i == index))
            .map(|(_, v)| v)
    }

    pub fn get_table(&self, key: &str) -> Option<&LuaTable> {
        self.get(key).and_then(LuaValue::as_table)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(LuaKey, LuaValue)> {
        self.entries.iter()
    }

    /// Entries with string keys.
    pub fn string_entries(&self) -> impl Iterator<Item = (&str, &LuaValue)> {
        self.entries.iter().filter_map(|(k, v)| match k {
            LuaKey::Str(s) => Some((s.as_str(), v)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-level assignments of a SavedVariables file, in file order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavedVariables {
    pub globals: Vec<(String, LuaValue)>,
}

impl SavedVariables {
    pub fn get(&self, name: &str) -> Option<&LuaValue> {
        self.globals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

pub fn parse_saved_variables(src: &str) -> Result<SavedVariables, ParseError> {
    let mut parser = Parser::new(src);
    let mut globals = Vec::new();

    loop {
        parser.skip_trivia();
        if parser.at_end() {
            break;
        }
        let name = parser.identifier()?;
        parser.skip_trivia();
        parser.expect(b'=')?;
        let value = parser.value()?;
        globals.push((name, value));
    }

    Ok(SavedVariables { globals })
}

/// Deepest table nesting accepted before a file is rejected as malformed.
pub const MAX_TABLE_DEPTH: usize = 200;

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line,
            message: message.into(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        match self.bump() {
            Some(b) if b == byte => Ok(()),
            Some(b) => Err(self.error(format!(
                "expected '{}', found '{}'",
                byte as char, b as char
            ))),
            None => Err(self.error(format!("expected '{}', found end of file", byte as char))),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                // UTF-8 byte order mark
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.pos += 3;
                }
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    self.pos += 2;
                    if self.peek() == Some(b'[') && self.peek_at(1) == Some(b'[') {
                        self.skip_block_comment();
                    } else {
                        while let Some(b) = self.peek() {
                            if b == b'\n' {
                                break;
                            }
                            self.bump();
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        while let Some(b) = self.bump() {
            if b == b']' && self.peek() == Some(b']') {
                self.bump();
                return;
            }
        }
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
            Some(b) => return Err(self.error(format!("unexpected '{}'", b as char))),
            None => return Err(self.error("unexpected end of file")),
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn value(&mut self) -> Result<LuaValue, ParseError> {
        self.skip_trivia();
        match self.peek() {
            Some(b'{') => self.table().map(LuaValue::Table),
            Some(b'"') | Some(b'\'') => self.string().map(LuaValue::String),
            Some(b'[') if matches!(self.peek_at(1), Some(b'[') | Some(b'=')) => {
                self.long_string().map(LuaValue::String)
            }
            Some(b) if b == b'-' || b == b'.' || b.is_ascii_digit() => {
                self.number().map(LuaValue::Number)
            }
            Some(b) if b.is_ascii_alphabetic() => match self.identifier()?.as_str() {
                "true" => Ok(LuaValue::Bool(true)),
                "false" => Ok(LuaValue::Bool(false)),
                "nil" => Ok(LuaValue::Nil),
                other => Err(self.error(format!("unsupported expression '{}'", other))),
            },
            Some(b) => Err(self.error(format!("unexpected '{}'", b as char))),
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn table(&mut self) -> Result<LuaTable, ParseError> {
        if self.depth >= MAX_TABLE_DEPTH {
            return Err(self.error(format!(
                "tables nested deeper than {}",
                MAX_TABLE_DEPTH
            )));
        }
        self.depth += 1;
        let table = self.table_entries();
        self.depth -= 1;
        table
    }

    fn table_entries(&mut self) -> Result<LuaTable, ParseError> {
        self.expect(b'{')?;
        let mut table = LuaTable::default();
        let mut next_index = 1i64;

        loop {
            self.skip_trivia();
            match self.peek() {
                Some(b'}') => {
                    self.bump();
                    return Ok(table);
                }
                None => return Err(self.error("unterminated table")),
                _ => {}
            }

            let entry = if self.peek() == Some(b'[')
                && !matches!(self.peek_at(1), Some(b'[') | Some(b'='))
            {
                self.bump();
                let key = self.value()?;
                self.skip_trivia();
                self.expect(b']')?;
                self.skip_trivia();
                self.expect(b'=')?;
                (to_key(&key), self.value()?)
            } else if self.is_named_field() {
                let name = self.identifier()?;
                self.skip_trivia();
                self.expect(b'=')?;
                (LuaKey::Str(name), self.value()?)
            } else {
                let key = LuaKey::Index(next_index);
                next_index += 1;
                (key, self.value()?)
            };
            table.entries.push(entry);

            self.skip_trivia();
            match self.peek() {
                Some(b',') | Some(b';') => {
                    self.bump();
                }
                Some(b'}') => {}
                Some(b) => return Err(self.error(format!("unexpected '{}' in table", b as char))),
                None => return Err(self.error("unterminated table")),
            }
        }
    }

    /// `name = value` inside a table, as opposed to a bare `true`/`nil` value.
    fn is_named_field(&self) -> bool {
        let mut i = self.pos;
        match self.src.get(i) {
            Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
            _ => return false,
        }
        while matches!(self.src.get(i), Some(b) if b.is_ascii_alphanumeric() || *b == b'_') {
            i += 1;
        }
        while matches!(self.src.get(i), Some(b) if b.is_ascii_whitespace()) {
            i += 1;
        }
        self.src.get(i) == Some(&b'=') && self.src.get(i + 1) != Some(&b'=')
    }

    fn string(&mut self) -> Result<String, ParseError> {
        let quote = self.bump().ok_or_else(|| self.error("unexpected end of file"))?;
        let mut bytes = Vec::new();

        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(b) if b == quote => break,
                Some(b'\n') => return Err(self.error("newline in string")),
                Some(b'\\') => {
                    let escaped = self.bump().ok_or_else(|| self.error("unterminated string"))?;
                    match escaped {
                        b'n' => bytes.push(b'\n'),
                        b't' => bytes.push(b'\t'),
                        b'r' => bytes.push(b'\r'),
                        b'a' => bytes.push(0x07),
                        b'b' => bytes.push(0x08),
                        b'f' => bytes.push(0x0c),
                        b'v' => bytes.push(0x0b),
                        b'\n' => bytes.push(b'\n'),
                        b'0'..=b'9' => {
                            let mut code = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'9') => {
                                        code = code * 10 + u32::from(d - b'0');
                                        self.bump();
                                    }
                                    _ => break,
                                }
                            }
                            let byte = u8::try_from(code)
                                .map_err(|_| self.error("decimal escape too large"))?;
                            bytes.push(byte);
                        }
                        other => bytes.push(other),
                    }
                }
                Some(b) => bytes.push(b),
            }
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn long_string(&mut self) -> Result<String, ParseError> {
        self.expect(b'[')?;
        let mut level = 0;
        while self.peek() == Some(b'=') {
            self.bump();
            level += 1;
        }
        self.expect(b'[')?;
        if self.peek() == Some(b'\n') {
            self.bump();
        }

        let start = self.pos;
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated long string")),
                Some(b']') => {
                    let end = self.pos - 1;
                    let mut closing = 0;
                    while closing < level && self.peek() == Some(b'=') {
                        self.bump();
                        closing += 1;
                    }
                    if closing == level && self.peek() == Some(b']') {
                        self.bump();
                        return Ok(String::from_utf8_lossy(&self.src[start..end]).into_owned());
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.bump();
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'+' || b == b'-' {
                // sign is only valid right after an exponent marker
                if (b == b'+' || b == b'-')
                    && !matches!(self.src.get(self.pos - 1), Some(b'e') | Some(b'E'))
                {
                    break;
                }
                self.pos += 1;
            } else {
                break;
            }
        }

        let text = std::str::from_utf8(&self.src[start..self.pos])
            .map_err(|_| self.error("invalid number"))?;
        parse_number(text).ok_or_else(|| self.error(format!("invalid number '{}'", text)))
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()? as f64,
        None => match digits {
            "inf" => f64::INFINITY,
            "nan" => f64::NAN,
            _ => digits.parse::<f64>().ok()?,
        },
    };
    Some(if negative { -value } else { value })
}

fn to_key(value: &LuaValue) -> LuaKey {
    match value {
        LuaValue::String(s) => LuaKey::Str(s.clone()),
        LuaValue::Number(n) if n.fract() == 0.0 && n.is_finite() => LuaKey::Index(*n as i64),
        other => LuaKey::Other(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_tables() {
        let src = r#"
ElvDB = {
    ["class"] = {
        ["Stormrage"] = {
            ["Arthas"] = "DEATHKNIGHT",
            ["Jaina"] = "MAGE",
        },
    },
    ["profileKeys"] = {
        ["Arthas - Stormrage"] = "Default",
    },
}
ElvPrivateDB = nil
"#;
        let saved = parse_saved_variables(src).unwrap();
        assert_eq!(saved.globals.len(), 2);

        let realm = saved
            .get("ElvDB")
            .and_then(LuaValue::as_table)
            .and_then(|t| t.get_table("class"))
            .and_then(|t| t.get_table("Stormrage"))
            .unwrap();
        assert_eq!(realm.get("Arthas").and_then(LuaValue::as_str), Some("DEATHKNIGHT"));
        assert_eq!(realm.get("Jaina").and_then(LuaValue::as_str), Some("MAGE"));
        assert_eq!(saved.get("ElvPrivateDB"), Some(&LuaValue::Nil));
    }

    #[test]
    fn test_positional_entries_and_comments() {
        let src = "NDuiADB = {\n\t[\"totalGold\"] = {\n\t\t[\"Realm\"] = {\n\t\t\t[\"Thrall\"] = {\n\t\t\t\t123456, -- [1]\n\t\t\t\t\"SHAMAN\", -- [2]\n\t\t\t},\n\t\t},\n\t},\n}\n";
        let saved = parse_saved_variables(src).unwrap();
        let entry = saved
            .get("NDuiADB")
            .and_then(LuaValue::as_table)
            .and_then(|t| t.get_table("totalGold"))
            .and_then(|t| t.get_table("Realm"))
            .and_then(|t| t.get_table("Thrall"))
            .unwrap();

        assert_eq!(entry.get_index(1).and_then(LuaValue::as_number), Some(123456.0));
        assert_eq!(entry.get_index(2).and_then(LuaValue::as_str), Some("SHAMAN"));
    }

    #[test]
    fn test_scalars_and_named_fields() {
        let src = "Db = { enabled = true, off = false, ratio = -1.5e2, hex = 0x10, [3] = 'x', note = [[long\ntext]] }";
        let saved = parse_saved_variables(src).unwrap();
        let table = saved.get("Db").and_then(LuaValue::as_table).unwrap();

        assert_eq!(table.get("enabled"), Some(&LuaValue::Bool(true)));
        assert_eq!(table.get("off"), Some(&LuaValue::Bool(false)));
        assert_eq!(table.get("ratio").and_then(LuaValue::as_number), Some(-150.0));
        assert_eq!(table.get("hex").and_then(LuaValue::as_number), Some(16.0));
        assert_eq!(table.get_index(3).and_then(LuaValue::as_str), Some("x"));
        assert_eq!(table.get("note").and_then(LuaValue::as_str), Some("long\ntext"));
    }

    #[test]
    fn test_string_escapes() {
        let saved = parse_saved_variables(r#"S = "a\"b\\c\65\n""#).unwrap();
        assert_eq!(saved.get("S").and_then(LuaValue::as_str), Some("a\"b\\cA\n"));
    }

    #[test]
    fn test_malformed_reports_line() {
        let err = parse_saved_variables("A = {\n  [\"x\"] = ,\n}").unwrap_err();
        assert_eq!(err.line, 2);

        assert!(parse_saved_variables("A = { 1, 2").is_err());
        assert!(parse_saved_variables("A = \"open").is_err());
    }

    #[test]
    fn test_empty_file() {
        let saved = parse_saved_variables("\n-- nothing here\n").unwrap();
        assert!(saved.globals.is_empty());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("A = {}{}", "{".repeat(depth), "}".repeat(depth));

        assert!(parse_saved_variables(&nested(MAX_TABLE_DEPTH)).is_ok());

        let err = parse_saved_variables(&nested(MAX_TABLE_DEPTH + 1)).unwrap_err();
        assert!(err.message.contains("nested"));

        // Far beyond the limit must still come back as an error, not a crash
        assert!(parse_saved_variables(&nested(200_000)).is_err());
    }
}
