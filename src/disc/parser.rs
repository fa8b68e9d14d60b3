//! Parsing of the textual disc dump produced by `lsdvd -x -Oy`.
//!
//! The tool prints a Python-literal data structure prefixed by libdvdread
//! diagnostics and a `lsdvd = ` assignment. The diagnostics and the
//! assignment token are stripped, then the remaining text is parsed with a
//! strict recursive-descent parser over the literal grammar (mappings,
//! sequences, strings, numbers, booleans). Nothing is ever evaluated, so
//! hostile tool output cannot execute anything.

use crate::disc::model::{AudioTrack, Chapter, DiscInfo, SubtitleTrack, Title};
use crate::utils::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static DIAGNOSTIC_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^libdvdread:.*\n?").unwrap());

const ASSIGNMENT_TOKEN: &str = "lsdvd = ";

/// How much of the offending text is quoted in parse errors.
const ERROR_SNIPPET_LEN: usize = 1024;

/// Strips libdvdread diagnostic lines and the leading assignment token,
/// leaving the bare literal structure.
pub fn clean_output(output: &str) -> String {
    DIAGNOSTIC_LINE
        .replace_all(output, "")
        .replace(ASSIGNMENT_TOKEN, "")
}

/// Parses raw lsdvd output into the disc model.
pub fn parse_disc_info(output: &str) -> Result<DiscInfo> {
    let cleaned = clean_output(output);

    let root = parse_literal(&cleaned).map_err(|e| {
        let snippet: String = cleaned.chars().take(ERROR_SNIPPET_LEN).collect();
        Error::metadata(format!("{}; offending text starts with: {}", e, snippet))
    })?;

    disc_from_literal(&root)
}

/// A value of the small literal grammar lsdvd emits.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Map(BTreeMap<String, Literal>),
    List(Vec<Literal>),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Literal {
    fn type_name(&self) -> &'static str {
        match self {
            Literal::Map(_) => "mapping",
            Literal::List(_) => "sequence",
            Literal::Str(_) => "string",
            Literal::Int(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Bool(_) => "boolean",
        }
    }
}

fn parse_literal(input: &str) -> Result<Literal> {
    let mut parser = LiteralParser::new(input);
    parser.skip_whitespace();
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("trailing data after literal"));
    }
    Ok(value)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn error<T: Into<String>>(&self, message: T) -> Error {
        Error::metadata(format!(
            "invalid literal at offset {}: {}",
            self.pos,
            message.into()
        ))
    }

    fn parse_value(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.parse_map(),
            Some('[') => self.parse_list(),
            Some('\'') | Some('"') => self.parse_string(),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => self.parse_number(),
            Some(c) if c.is_alphabetic() => self.parse_keyword(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_map(&mut self) -> Result<Literal> {
        self.expect('{')?;
        let mut entries = BTreeMap::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.pos += 1;
                break;
            }

            let key = match self.parse_string()? {
                Literal::Str(s) => s,
                other => return Err(self.error(format!("mapping key must be a string, found {}", other.type_name()))),
            };

            self.skip_whitespace();
            self.expect(':')?;
            let value = self.parse_value()?;
            entries.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or '}' in mapping")),
            }
        }

        Ok(Literal::Map(entries))
    }

    fn parse_list(&mut self) -> Result<Literal> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek() == Some(']') {
                self.pos += 1;
                break;
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or ']' in sequence")),
            }
        }

        Ok(Literal::List(items))
    }

    fn parse_string(&mut self) -> Result<Literal> {
        self.skip_whitespace();
        let quote = match self.bump() {
            Some(c @ ('\'' | '"')) => c,
            _ => return Err(self.error("expected string")),
        };

        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(c) => value.push(c),
                    None => return Err(self.error("unterminated escape in string")),
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }

        Ok(Literal::Str(value))
    }

    fn parse_number(&mut self) -> Result<Literal> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }

        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' && !is_float {
                is_float = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        if is_float {
            text.parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| self.error(format!("invalid float '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| self.error(format!("invalid integer '{}'", text)))
        }
    }

    fn parse_keyword(&mut self) -> Result<Literal> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric()) {
            self.pos += 1;
        }

        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            _ => Err(self.error(format!("unknown keyword '{}'", word))),
        }
    }
}

fn disc_from_literal(root: &Literal) -> Result<DiscInfo> {
    let map = as_map(root, "disc info")?;

    let device = required_str(map, "device")?;
    let title = required_str(map, "title")?;
    let longest_track = required_usize(map, "longest_track")?;

    let track_list = match map.get("track") {
        Some(Literal::List(items)) => items,
        Some(other) => {
            return Err(Error::metadata(format!(
                "'track' must be a sequence, found {}",
                other.type_name()
            )))
        }
        None => return Err(Error::metadata("missing required key 'track'")),
    };

    let track = track_list
        .iter()
        .map(title_from_literal)
        .collect::<Result<Vec<_>>>()?;

    Ok(DiscInfo {
        device,
        title,
        track,
        longest_track,
    })
}

fn title_from_literal(value: &Literal) -> Result<Title> {
    let map = as_map(value, "track")?;

    Ok(Title {
        ix: required_usize(map, "ix")?,
        length: required_f64(map, "length")?,
        audio: optional_list(map, "audio", |m| {
            Ok(AudioTrack {
                ix: required_usize(m, "ix")?,
                langcode: optional_str(m, "langcode"),
            })
        })?,
        subp: optional_list(map, "subp", |m| {
            Ok(SubtitleTrack {
                ix: required_usize(m, "ix")?,
                langcode: optional_str(m, "langcode"),
            })
        })?,
        chapter: optional_list(map, "chapter", |m| {
            Ok(Chapter {
                ix: required_usize(m, "ix")?,
                length: required_f64(m, "length")?,
            })
        })?,
    })
}

fn as_map<'a>(value: &'a Literal, what: &str) -> Result<&'a BTreeMap<String, Literal>> {
    match value {
        Literal::Map(map) => Ok(map),
        other => Err(Error::metadata(format!(
            "{} must be a mapping, found {}",
            what,
            other.type_name()
        ))),
    }
}

fn required_str(map: &BTreeMap<String, Literal>, key: &str) -> Result<String> {
    match map.get(key) {
        Some(Literal::Str(s)) => Ok(s.clone()),
        Some(other) => Err(Error::metadata(format!(
            "'{}' must be a string, found {}",
            key,
            other.type_name()
        ))),
        None => Err(Error::metadata(format!("missing required key '{}'", key))),
    }
}

fn optional_str(map: &BTreeMap<String, Literal>, key: &str) -> String {
    match map.get(key) {
        Some(Literal::Str(s)) => s.clone(),
        _ => String::new(),
    }
}

fn required_usize(map: &BTreeMap<String, Literal>, key: &str) -> Result<usize> {
    match map.get(key) {
        Some(Literal::Int(i)) if *i >= 0 => Ok(*i as usize),
        Some(other) => Err(Error::metadata(format!(
            "'{}' must be a non-negative integer, found {}",
            key,
            other.type_name()
        ))),
        None => Err(Error::metadata(format!("missing required key '{}'", key))),
    }
}

fn required_f64(map: &BTreeMap<String, Literal>, key: &str) -> Result<f64> {
    match map.get(key) {
        Some(Literal::Float(f)) => Ok(*f),
        Some(Literal::Int(i)) => Ok(*i as f64),
        Some(other) => Err(Error::metadata(format!(
            "'{}' must be a number, found {}",
            key,
            other.type_name()
        ))),
        None => Err(Error::metadata(format!("missing required key '{}'", key))),
    }
}

fn optional_list<T>(
    map: &BTreeMap<String, Literal>,
    key: &str,
    convert: impl Fn(&BTreeMap<String, Literal>) -> Result<T>,
) -> Result<Vec<T>> {
    match map.get(key) {
        Some(Literal::List(items)) => items
            .iter()
            .map(|item| convert(as_map(item, key)?))
            .collect(),
        Some(other) => Err(Error::metadata(format!(
            "'{}' must be a sequence, found {}",
            key,
            other.type_name()
        ))),
        // Absent per-track lists are normal; lsdvd omits what a title lacks.
        None => Ok(Vec::new()),
    }
}

/// Shared lsdvd fixture mirroring a real `lsdvd -x -Oy` dump.
#[cfg(test)]
pub(crate) const LSDVD_OUTPUT: &str = r#"libdvdread: Encrypted DVD support unavailable.
lsdvd = {
  'device' : '.',
  'title' : 'TEST_DVD',
  'track' : [
    {
      'ix' : 1,
      'length' : 3600.000,
      'audio' : [
        {
          'ix' : 1,
          'langcode' : 'en',
        },
        {
          'ix' : 2,
          'langcode' : 'ru',
        },
      ],
      'chapter' : [
        {
          'ix' : 1,
          'length' : 100.880,
          'startcell' : 1,
        },
        {
          'ix' : 2,
          'length' : 69.160,
          'startcell' : 2,
        },
        {
          'ix' : 3,
          'length' : 78.000,
          'startcell' : 3,
        },
      ],
      'subp' : [
        {
          'ix' : 1,
          'langcode' : 'ru',
        },
        {
          'ix' : 2,
          'langcode' : 'fr',
        },
      ],
    },
    {
      'ix' : 2,
      'length' : 600.000,
      'chapter' : [],
    },
    {
      'ix' : 3,
      'length' : 300.000,
      'chapter' : [],
    },
    {
      'ix' : 4,
      'length' : 0.100,
      'chapter' : [],
    },
  ],
  'longest_track' : 1,
}
"#;
