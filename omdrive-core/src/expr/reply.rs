//! Reply text classification and parsing.
//!
//! Replies arrive as plain text. Most commands answer with a bare boolean
//! or a short string, the simulate command answers with a multi-line
//! record, and the result-read commands answer with brace-wrapped arrays.

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::Float;

/// Classified session reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Bool(bool),
    Record(SimulationRecord),
    Text(String),
    Empty,
}

impl Reply {
    /// Classifies raw reply text.
    pub fn classify(raw: &str) -> Reply {
        let trimmed = raw.trim();
        match trimmed {
            "" => Reply::Empty,
            "true" => Reply::Bool(true),
            "false" => Reply::Bool(false),
            _ => {
                if trimmed.starts_with("record") {
                    match parse_simulation_record(trimmed) {
                        Ok(record) => Reply::Record(record),
                        Err(_) => Reply::Text(trimmed.to_string()),
                    }
                } else {
                    Reply::Text(trimmed.to_string())
                }
            }
        }
    }

    /// Decides whether this reply means the given command went through.
    ///
    /// The judgement is command-specific. A load command only succeeds on
    /// a literal `true`, a simulate command only when the returned record
    /// points at a produced result file, and text-returning commands fail
    /// on an empty reply or an error dump.
    pub fn indicates_success(&self, expr: &Expr) -> bool {
        match expr {
            Expr::LoadModel(_) | Expr::LoadFile(_) => matches!(self, Reply::Bool(true)),
            Expr::Simulate(_, _) => match self {
                Reply::Record(record) => !record.result_file.is_empty(),
                _ => false,
            },
            Expr::InstantiateModel(_) => match self {
                Reply::Text(text) => !is_error_text(text),
                _ => false,
            },
            Expr::Cd(_) | Expr::GetVersion => match self {
                Reply::Text(text) => !is_error_text(text),
                _ => false,
            },
            Expr::ReadResultVars(_) | Expr::ReadResult(_, _) => match self {
                Reply::Text(text) => text.starts_with('{') && !is_error_text(text),
                _ => false,
            },
            // these carry no failure signal of their own
            Expr::GetErrorString | Expr::CloseResultFile | Expr::Quit => true,
        }
    }

    /// Raw-ish text form, used for report bookkeeping.
    pub fn text(&self) -> String {
        match self {
            Reply::Bool(b) => b.to_string(),
            Reply::Record(record) => format!("resultFile = \"{}\"", record.result_file),
            Reply::Text(text) => text.clone(),
            Reply::Empty => String::new(),
        }
    }
}

/// Fields extracted from a simulate reply record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationRecord {
    /// Path of the produced result file, empty when the run failed
    pub result_file: String,
    /// Engine log lines bundled into the record
    pub messages: String,
}

/// Extracts the interesting fields from a `record ... end ...;` reply.
pub fn parse_simulation_record(text: &str) -> Result<SimulationRecord> {
    if !text.trim_start().starts_with("record") {
        return Err(Error::ParsingError(format!(
            "not a record reply: {}",
            first_line(text)
        )));
    }
    let result_file = field_value(text, "resultFile").ok_or_else(|| {
        Error::ParsingError(format!("record without resultFile field: {}", first_line(text)))
    })?;
    let messages = field_value(text, "messages").unwrap_or_default();
    Ok(SimulationRecord {
        result_file,
        messages,
    })
}

/// Heuristic for replies that are an error dump rather than a value.
///
/// Engine dumps come as bare `Error: ...` lines or with a source
/// location prefix, `[file.mo:3:1-4:9] Error: ...`. Detection is
/// anchored to line starts, model text can legitimately carry "Error"
/// inside assert messages.
pub fn is_error_text(text: &str) -> bool {
    text.lines().any(is_error_line)
}

fn is_error_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("Error") {
        return true;
    }
    if trimmed.starts_with('[') {
        if let Some(close) = trimmed.find(']') {
            return trimmed[close + 1..].trim_start().starts_with("Error");
        }
    }
    false
}

/// Parses a `{"a","b"}` style array of quoted strings.
pub fn parse_string_array(text: &str) -> Result<Vec<String>> {
    let mut sc = Scanner::new(text.trim());
    sc.expect('{')?;
    let mut out = Vec::new();
    loop {
        sc.skip_ws();
        match sc.peek() {
            Some('}') => {
                sc.bump();
                break;
            }
            Some(',') => {
                sc.bump();
            }
            Some('"') => out.push(sc.read_quoted()?),
            Some(other) => {
                return Err(Error::ParsingError(format!(
                    "unexpected character in string array: {}",
                    other
                )))
            }
            None => return Err(Error::ParsingError("unterminated string array".to_string())),
        }
    }
    Ok(out)
}

/// Parses a `{{1.0,2.0},{3.0,4.0}}` style matrix of numbers, one inner
/// array per variable.
pub fn parse_value_matrix(text: &str) -> Result<Vec<Vec<Float>>> {
    let mut sc = Scanner::new(text.trim());
    sc.expect('{')?;
    let mut rows = Vec::new();
    loop {
        sc.skip_ws();
        match sc.peek() {
            Some('}') => {
                sc.bump();
                break;
            }
            Some(',') => {
                sc.bump();
            }
            Some('{') => rows.push(parse_number_row(&mut sc)?),
            Some(other) => {
                return Err(Error::ParsingError(format!(
                    "unexpected character in value matrix: {}",
                    other
                )))
            }
            None => return Err(Error::ParsingError("unterminated value matrix".to_string())),
        }
    }
    Ok(rows)
}

fn parse_number_row(sc: &mut Scanner) -> Result<Vec<Float>> {
    sc.expect('{')?;
    let mut row = Vec::new();
    loop {
        sc.skip_ws();
        match sc.peek() {
            Some('}') => {
                sc.bump();
                break;
            }
            Some(',') => {
                sc.bump();
            }
            Some(_) => {
                let token = sc.read_until(&[',', '}']).trim().to_string();
                row.push(token.parse::<Float>()?);
            }
            None => return Err(Error::ParsingError("unterminated number row".to_string())),
        }
    }
    Ok(row)
}

/// Finds `<field> = <value>` in record text and returns the value with
/// quoting stripped. Quoted values may span multiple lines.
fn field_value(src: &str, field: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(found) = src[search_from..].find(field) {
        let at = search_from + found;
        search_from = at + field.len();
        if let Some(prev) = src[..at].chars().next_back() {
            if prev.is_ascii_alphanumeric() || prev == '_' {
                continue;
            }
        }
        let mut sc = Scanner::new(&src[at + field.len()..]);
        sc.skip_ws();
        if sc.peek() != Some('=') {
            continue;
        }
        sc.bump();
        sc.skip_ws();
        return match sc.peek() {
            Some('"') => sc.read_quoted().ok(),
            Some(_) => Some(sc.read_until(&[',', '\n']).trim().to_string()),
            None => None,
        };
    }
    None
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// Byte-position scanner over reply text.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(Error::ParsingError(format!(
                "expected '{}', found '{}'",
                wanted, c
            ))),
            None => Err(Error::ParsingError(format!(
                "expected '{}', found end of input",
                wanted
            ))),
        }
    }

    /// Reads a double-quoted string with escape handling, cursor placed
    /// on the opening quote.
    fn read_quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => {
                        return Err(Error::ParsingError(
                            "unterminated escape in quoted string".to_string(),
                        ))
                    }
                },
                Some(c) => out.push(c),
                None => {
                    return Err(Error::ParsingError(
                        "unterminated quoted string".to_string(),
                    ))
                }
            }
        }
    }

    /// Consumes text until one of the stop characters, which is left in
    /// place.
    fn read_until(&mut self, stops: &[char]) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }
}
