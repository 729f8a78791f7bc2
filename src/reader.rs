//! Reader for the URL file: a Lisp literal holding a list of dotted pairs,
//! e.g. `(("The GNU Project" . "http://www.gnu.org/"))`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub reason: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.reason)
    }
}

impl std::error::Error for SyntaxError {}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Atom(String),
    Str(String),
    List {
        items: Vec<Datum>,
        tail: Option<Box<Datum>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Datum {
    value: Value,
    line: usize,
    column: usize,
}

impl Datum {
    fn text(&self) -> Option<&str> {
        match &self.value {
            Value::Atom(s) | Value::Str(s) => Some(s),
            Value::List { .. } => None,
        }
    }

    fn is_nil(&self) -> bool {
        match &self.value {
            Value::Atom(s) => s == "nil",
            Value::List { items, tail } => items.is_empty() && tail.is_none(),
            Value::Str(_) => false,
        }
    }
}

/// Parses `input` into `(name, url)` pairs in file order.
pub fn read_pairs(input: &str) -> Result<Vec<(String, String)>, SyntaxError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut reader = Reader::new(input);
    reader.skip_blank();
    if reader.peek().is_none() {
        return Err(reader.error("end of file before any list"));
    }
    let top = reader.read_datum()?;
    reader.skip_blank();
    if reader.peek().is_some() {
        return Err(reader.error("trailing content after the list"));
    }

    if top.is_nil() {
        return Ok(Vec::new());
    }
    let items = match top.value {
        Value::List { items, tail: None } => items,
        _ => {
            return Err(SyntaxError {
                line: top.line,
                column: top.column,
                reason: "expected a list of (name . url) pairs".to_string(),
            })
        }
    };

    items.into_iter().map(into_pair).collect()
}

fn into_pair(entry: Datum) -> Result<(String, String), SyntaxError> {
    let bad = |reason: &str| SyntaxError {
        line: entry.line,
        column: entry.column,
        reason: reason.to_string(),
    };
    let Value::List { items, tail } = &entry.value else {
        return Err(bad("expected a (name . url) pair"));
    };
    let (Some(tail), [name]) = (tail, items.as_slice()) else {
        return Err(bad("expected a (name . url) pair"));
    };
    let name = name.text().ok_or_else(|| bad("pair name must be a string"))?;
    if tail.is_nil() {
        return Err(bad("expected a (name . url) pair"));
    }
    let url = tail.text().ok_or_else(|| bad("pair url must be a string"))?;
    Ok((name.to_string(), url.to_string()))
}

/// Lists may nest at most this deep.
const MAX_DEPTH: usize = 512;

struct Reader {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
}

impl Reader {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, reason: &str) -> SyntaxError {
        SyntaxError {
            line: self.line,
            column: self.column,
            reason: reason.to_string(),
        }
    }

    fn skip_blank(&mut self) {
        while let Some(c) = self.peek() {
            if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn read_datum(&mut self) -> Result<Datum, SyntaxError> {
        self.skip_blank();
        let (line, column) = (self.line, self.column);
        let value = match self.peek() {
            None => return Err(self.error("unexpected end of file")),
            Some('(') => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("lists nested too deeply"));
                }
                self.depth += 1;
                let list = self.read_list();
                self.depth -= 1;
                list?
            }
            Some(')') => return Err(self.error("unexpected ')'")),
            Some('"') => Value::Str(self.read_string()?),
            Some('.') if is_delimiter(self.peek_second()) => {
                return Err(self.error("unexpected '.'"))
            }
            Some(_) => Value::Atom(self.read_atom()),
        };
        Ok(Datum {
            value,
            line,
            column,
        })
    }

    fn read_list(&mut self) -> Result<Value, SyntaxError> {
        let open = self.error("unclosed '('");
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_blank();
            match self.peek() {
                None => return Err(open),
                Some(')') => {
                    self.bump();
                    return Ok(Value::List { items, tail: None });
                }
                Some('.') if is_delimiter(self.peek_second()) => {
                    if items.is_empty() {
                        return Err(self.error("'.' at the start of a list"));
                    }
                    self.bump();
                    let tail = self.read_datum()?;
                    self.skip_blank();
                    if self.peek() != Some(')') {
                        return Err(self.error("expected ')' after dotted tail"));
                    }
                    self.bump();
                    return Ok(Value::List {
                        items,
                        tail: Some(Box::new(tail)),
                    });
                }
                Some(_) => items.push(self.read_datum()?),
            }
        }
    }

    fn read_string(&mut self) -> Result<String, SyntaxError> {
        let open = self.error("unterminated string");
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(open),
                Some('"') => return Ok(out),
                Some('\\') => {
                    if let Some(c) = self.read_escape()? {
                        out.push(c);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Decodes the escape after a backslash inside a string. `None` for the
    /// escapes that produce nothing.
    fn read_escape(&mut self) -> Result<Option<char>, SyntaxError> {
        let at = self.error("unterminated string");
        let c = match self.bump() {
            None => return Err(at),
            // backslash-newline and backslash-space are dropped
            Some('\n') | Some(' ') => return Ok(None),
            Some('a') => '\u{07}',
            Some('b') => '\u{08}',
            Some('t') => '\t',
            Some('n') => '\n',
            Some('v') => '\u{0B}',
            Some('f') => '\u{0C}',
            Some('r') => '\r',
            Some('e') => '\u{1B}',
            Some('s') => ' ',
            Some('d') => '\u{7F}',
            Some('x') => self.read_code_point(16, None, &at)?,
            Some('u') => self.read_code_point(16, Some(4), &at)?,
            Some('U') => self.read_code_point(16, Some(8), &at)?,
            Some(d @ '0'..='7') => {
                let mut value = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            self.bump();
                            value = value * 8 + digit;
                        }
                        None => break,
                    }
                }
                char::from_u32(value).ok_or_else(|| bad_escape(&at))?
            }
            Some('C') | Some('^') | Some('M') | Some('N') => return Err(bad_escape(&at)),
            Some(c) => c,
        };
        Ok(Some(c))
    }

    /// Reads hex digits for `\x`, `\u` and `\U`. With `exact`, exactly that
    /// many digits are required; otherwise any non-empty run is taken.
    fn read_code_point(
        &mut self,
        radix: u32,
        exact: Option<usize>,
        at: &SyntaxError,
    ) -> Result<char, SyntaxError> {
        let mut value: u32 = 0;
        let mut digits = 0;
        while exact.is_none_or(|n| digits < n) {
            let Some(digit) = self.peek().and_then(|c| c.to_digit(radix)) else {
                break;
            };
            self.bump();
            value = value
                .checked_mul(radix)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| bad_escape(at))?;
            digits += 1;
        }
        if digits == 0 || exact.is_some_and(|n| digits != n) {
            return Err(bad_escape(at));
        }
        char::from_u32(value).ok_or_else(|| bad_escape(at))
    }

    fn read_atom(&mut self) -> String {
        let mut out = String::new();
        while !is_delimiter(self.peek()) {
            match self.bump() {
                Some('\\') => {
                    if let Some(c) = self.bump() {
                        out.push(c);
                    }
                }
                Some(c) => out.push(c),
                None => break,
            }
        }
        out
    }
}

fn bad_escape(at: &SyntaxError) -> SyntaxError {
    SyntaxError {
        line: at.line,
        column: at.column,
        reason: "invalid escape in string".to_string(),
    }
}

fn is_delimiter(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';'),
    }
}
