//! Recovery of a JSON object from free-form LLM output.
//!
//! Models wrap their JSON in prose or markdown fences, stop mid-array when they
//! hit the token limit, and drift into JavaScript or Python literal syntax.
//! [`recover_json`] first tries a strict parse, then slices the object region
//! out of the surrounding text and runs it through [`repair_json`], a small
//! state machine that tracks the container stack and string state.
//!
//! Truncated input is never completed with guessed data. When the text ends
//! inside an array element, that element is dropped whole. When it ends inside
//! an object member, the object keeps only its completed members.

use serde_json::{Map, Value};
use thiserror::Error;

const SNIPPET_LEN: usize = 500;

#[derive(Debug, Error)]
pub enum JsonRecoveryError {
    #[error("No JSON object found in LLM response")]
    NoJsonObject { snippet: String },

    #[error("Recovered JSON is not an object")]
    NotAnObject { snippet: String },

    #[error("Failed to parse repaired JSON: {source}")]
    Unparseable {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },
}

impl JsonRecoveryError {
    /// Start of the offending text, for diagnostics only.
    pub fn snippet(&self) -> &str {
        match self {
            Self::NoJsonObject { snippet }
            | Self::NotAnObject { snippet }
            | Self::Unparseable { snippet, .. } => snippet,
        }
    }
}

pub fn recover_json(raw: &str) -> Result<Map<String, Value>, JsonRecoveryError> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw.trim()) {
        return Ok(map);
    }

    let candidate = json_candidate(raw).ok_or_else(|| JsonRecoveryError::NoJsonObject {
        snippet: snippet(raw),
    })?;

    let repaired = repair_json(candidate);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(JsonRecoveryError::NotAnObject {
            snippet: snippet(candidate),
        }),
        Err(source) => Err(JsonRecoveryError::Unparseable {
            snippet: snippet(candidate),
            source,
        }),
    }
}

/// The region from the first `{` to the last `}` after it, or to the end of the
/// text when the closing brace never arrived.
pub fn json_candidate(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let rest = &raw[start..];
    match rest.rfind('}') {
        Some(end) => Some(&rest[..=end]),
        None => Some(rest),
    }
}

/// Rewrites malformed JSON text into strict JSON where the damage is structural.
///
/// The output is compact (insignificant whitespace is dropped). Input that is
/// beyond repair still comes back as text; the strict parse that follows
/// reports it.
pub fn repair_json(candidate: &str) -> String {
    let mut repairer = Repairer::new(candidate);
    repairer.run();
    repairer.out
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn opener(self) -> char {
        match self {
            Container::Object => '{',
            Container::Array => '[',
        }
    }

    fn closer(self) -> char {
        match self {
            Container::Object => '}',
            Container::Array => ']',
        }
    }

    fn first_expect(self) -> Expect {
        match self {
            Container::Object => Expect::Key,
            Container::Array => Expect::Value,
        }
    }
}

/// What the innermost open container accepts next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Key,
    Colon,
    Value,
    Separator,
}

/// Where the token being read will land once it is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Key,
    Value,
    Invalid,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    // Output offset of the opening bracket
    start: usize,
    // Output offset just past the last completed member or element
    last_complete: usize,
}

struct Repairer {
    input: Vec<char>,
    pos: usize,
    out: String,
    frames: Vec<Frame>,
    expect: Expect,
    done: bool,
}

impl Repairer {
    fn new(candidate: &str) -> Self {
        Self {
            input: candidate.chars().collect(),
            pos: 0,
            out: String::with_capacity(candidate.len()),
            frames: Vec::new(),
            expect: Expect::Value,
            done: false,
        }
    }

    fn run(&mut self) {
        while !self.done {
            let Some(c) = self.peek() else {
                self.finish_truncated();
                return;
            };

            let complete = match c {
                c if c.is_whitespace() => {
                    self.pos += 1;
                    true
                }
                '/' if self.peek_at(1) == Some('/') => {
                    self.skip_line_comment();
                    true
                }
                '/' if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment();
                    true
                }
                '{' => {
                    self.pos += 1;
                    self.open(Container::Object);
                    true
                }
                '[' => {
                    self.pos += 1;
                    self.open(Container::Array);
                    true
                }
                '}' => {
                    self.pos += 1;
                    self.close_matching(Container::Object);
                    true
                }
                ']' => {
                    self.pos += 1;
                    self.close_matching(Container::Array);
                    true
                }
                ',' => {
                    self.pos += 1;
                    self.separator();
                    true
                }
                ':' => {
                    self.pos += 1;
                    if self.expect == Expect::Colon {
                        self.out.push(':');
                        self.expect = Expect::Value;
                    }
                    true
                }
                '"' | '\'' => self.string(c),
                c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
                c if c.is_alphabetic() || matches!(c, '_' | '$') => self.word(),
                _ => {
                    self.pos += 1;
                    true
                }
            };

            if !complete {
                self.finish_truncated();
                return;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        while !self.at_end() {
            if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }

    /// Brings the state machine to a point where a key or value may start,
    /// inserting a missing colon or comma on the way.
    fn prepare_slot(&mut self) -> Slot {
        match self.expect {
            Expect::Key => Slot::Key,
            Expect::Value => Slot::Value,
            Expect::Colon => {
                self.out.push(':');
                self.expect = Expect::Value;
                Slot::Value
            }
            Expect::Separator => match self.frames.last() {
                Some(frame) => {
                    let container = frame.container;
                    self.out.push(',');
                    self.expect = container.first_expect();
                    match container {
                        Container::Object => Slot::Key,
                        Container::Array => Slot::Value,
                    }
                }
                None => Slot::Invalid,
            },
        }
    }

    fn after_value(&mut self) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.last_complete = self.out.len();
                self.expect = Expect::Separator;
            }
            None => self.done = true,
        }
    }

    fn open(&mut self, container: Container) {
        if self.prepare_slot() != Slot::Value {
            return;
        }
        let start = self.out.len();
        self.out.push(container.opener());
        self.frames.push(Frame {
            container,
            start,
            last_complete: self.out.len(),
        });
        self.expect = container.first_expect();
    }

    fn close_matching(&mut self, target: Container) {
        // A stray closer with nothing to match is dropped
        if !self.frames.iter().any(|f| f.container == target) {
            return;
        }
        while let Some(container) = self.frames.last().map(|f| f.container) {
            self.close_innermost();
            if container == target {
                break;
            }
        }
    }

    fn close_innermost(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };

        // A key that never received its value goes away with its comma
        let dangling_key = frame.container == Container::Object
            && matches!(self.expect, Expect::Colon | Expect::Value);
        if dangling_key {
            self.out.truncate(frame.last_complete);
        }
        if self.out.ends_with(',') {
            self.out.pop();
        }

        self.out.push(frame.container.closer());
        self.after_value();
    }

    fn separator(&mut self) {
        if self.expect != Expect::Separator {
            return;
        }
        if let Some(container) = self.frames.last().map(|f| f.container) {
            self.out.push(',');
            self.expect = container.first_expect();
        }
    }

    fn string(&mut self, quote: char) -> bool {
        let slot = self.prepare_slot();
        self.pos += 1;

        let Some(content) = self.scan_string(quote) else {
            return false;
        };

        match slot {
            Slot::Key => {
                self.push_escaped(&content);
                self.expect = Expect::Colon;
            }
            Slot::Value => {
                self.push_escaped(&content);
                self.after_value();
            }
            Slot::Invalid => {}
        }
        true
    }

    /// Reads up to the closing quote, returning the body already escaped for a
    /// double-quoted JSON string. `None` when the input ends first.
    fn scan_string(&mut self, quote: char) -> Option<String> {
        let mut body = String::new();
        loop {
            let c = self.peek()?;
            self.pos += 1;

            match c {
                c if c == quote => return Some(body),
                '\\' => {
                    let next = self.peek()?;
                    match next {
                        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
                            body.push('\\');
                            body.push(next);
                            self.pos += 1;
                        }
                        'u' if self.has_hex_escape() => {
                            body.push('\\');
                            body.extend(&self.input[self.pos..self.pos + 5]);
                            self.pos += 5;
                        }
                        '\'' => {
                            body.push('\'');
                            self.pos += 1;
                        }
                        // Keep the backslash literally and read `next` as content
                        _ => body.push_str("\\\\"),
                    }
                }
                '"' => body.push_str("\\\""),
                '\n' => body.push_str("\\n"),
                '\r' => body.push_str("\\r"),
                '\t' => body.push_str("\\t"),
                c if (c as u32) < 0x20 => body.push_str(&format!("\\u{:04x}", c as u32)),
                c => body.push(c),
            }
        }
    }

    fn has_hex_escape(&self) -> bool {
        // self.pos sits on the `u`
        (1..=4).all(|offset| {
            self.peek_at(offset)
                .map(|c| c.is_ascii_hexdigit())
                .unwrap_or(false)
        })
    }

    fn push_escaped(&mut self, body: &str) {
        self.out.push('"');
        self.out.push_str(body);
        self.out.push('"');
    }

    fn number(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        // A number running into the end of input may have lost digits
        if self.at_end() {
            return false;
        }

        let token: String = self.input[start..self.pos].iter().collect();
        match self.prepare_slot() {
            Slot::Key => {
                self.out.push_str(&Value::String(token).to_string());
                self.expect = Expect::Colon;
            }
            Slot::Value => {
                self.out.push_str(&fix_number(&token));
                self.after_value();
            }
            Slot::Invalid => {}
        }
        true
    }

    fn word(&mut self) -> bool {
        match self.prepare_slot() {
            Slot::Key => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '.') {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                if self.at_end() {
                    return false;
                }
                let key: String = self.input[start..self.pos].iter().collect();
                self.out.push_str(&Value::String(key).to_string());
                self.expect = Expect::Colon;
            }
            Slot::Value => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if matches!(c, ',' | '}' | ']' | '\n') {
                        break;
                    }
                    self.pos += 1;
                }
                if self.at_end() {
                    return false;
                }
                let word: String = self.input[start..self.pos].iter().collect();
                self.out.push_str(&bare_value(word.trim_end()));
                self.after_value();
            }
            Slot::Invalid => self.pos += 1,
        }
        true
    }

    fn finish_truncated(&mut self) {
        let incomplete_element = (1..self.frames.len())
            .find(|&depth| self.frames[depth - 1].container == Container::Array);

        if let Some(depth) = incomplete_element {
            self.out.truncate(self.frames[depth].start);
            self.frames.truncate(depth);
        } else if let Some(frame) = self.frames.last() {
            self.out.truncate(frame.last_complete);
        }

        if self.out.ends_with(',') {
            self.out.pop();
        }
        while let Some(frame) = self.frames.pop() {
            self.out.push(frame.container.closer());
        }
        self.done = true;
    }
}

/// Emits a number-like token as a JSON number when it is one after light
/// cleanup (`.5`, `5.`, `+5`), otherwise as a string (`2024-01-01`, `05.00`).
fn fix_number(raw: &str) -> String {
    let token = raw.trim_start_matches('+');
    if !token.chars().any(|c| c.is_ascii_digit()) {
        return "null".to_string();
    }

    let mut number = token.to_string();
    if number.starts_with('.') {
        number.insert(0, '0');
    } else if number.starts_with("-.") {
        number.insert(1, '0');
    }
    if number.ends_with('.') {
        number.push('0');
    }

    if serde_json::from_str::<serde_json::Number>(&number).is_ok() {
        number
    } else {
        Value::String(raw.to_string()).to_string()
    }
}

fn bare_value(word: &str) -> String {
    match word {
        "true" | "True" | "TRUE" => "true".to_string(),
        "false" | "False" | "FALSE" => "false".to_string(),
        "null" | "Null" | "NULL" | "None" | "undefined" | "NaN" | "Infinity" => {
            "null".to_string()
        }
        other => Value::String(other.to_string()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recovered(raw: &str) -> Value {
        Value::Object(recover_json(raw).unwrap())
    }

    #[test]
    fn test_valid_json_matches_strict_parse() {
        let raw = r#"{"transactions":[{"date":"2024-01-01","amount":12.5,"type":"Debit","balance":null}],"note":"ok"}"#;
        let strict: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(recovered(raw), strict);
    }

    #[test]
    fn test_object_wrapped_in_prose() {
        let raw = r#"Here is the data: {"transactions":[{"date":"2024-01-01","description":"Coffee","amount":"12.50","type":"Debit","balance":"987.50"}]} Thanks!"#;
        let value = recovered(raw);
        assert_eq!(value["transactions"][0]["amount"], "12.50");
        assert_eq!(value["transactions"][0]["type"], "Debit");
    }

    #[test]
    fn test_markdown_fence() {
        let raw = "```json\n{\n  \"transactions\": []\n}\n```";
        assert_eq!(recovered(raw), json!({"transactions": []}));
    }

    #[test]
    fn test_truncated_mid_array_keeps_complete_elements() {
        let raw = r#"{"transactions":[{"amount":1},{"amou"#;
        assert_eq!(recovered(raw), json!({"transactions": [{"amount": 1}]}));
    }

    #[test]
    fn test_truncated_mid_string_value() {
        let raw = r#"Sure! {"transactions":[{"date":"2024-01-01","amount":12.5,"type":"Debit"},{"date":"2024-01-02","descr"#;
        assert_eq!(
            recovered(raw),
            json!({"transactions": [{"date": "2024-01-01", "amount": 12.5, "type": "Debit"}]})
        );
    }

    #[test]
    fn test_truncated_before_first_element_closes() {
        assert_eq!(
            recovered(r#"{"transactions":[{"date":"2024-01-01","amount":12"#),
            json!({"transactions": []})
        );
        assert_eq!(recovered(r#"{"transactions":["#), json!({"transactions": []}));
    }

    #[test]
    fn test_truncated_inside_object_member() {
        assert_eq!(
            recovered(r#"{"bank":"ACME","account":"12"#),
            json!({"bank": "ACME"})
        );
    }

    #[test]
    fn test_truncated_number_is_not_kept() {
        assert_eq!(recovered(r#"{"items":[1,2,3"#), json!({"items": [1, 2]}));
    }

    #[test]
    fn test_unquoted_date_becomes_string() {
        let raw = r#"{"transactions":[{"date":2024-01-01,"amount":5,"type":"Debit"},{"date":"2024-01-02","amount":7,"type":"Credit"}]}"#;
        assert_eq!(
            recovered(raw),
            json!({"transactions": [
                {"date": "2024-01-01", "amount": 5, "type": "Debit"},
                {"date": "2024-01-02", "amount": 7, "type": "Credit"}
            ]})
        );
    }

    #[test]
    fn test_leading_zero_number_becomes_string() {
        let raw = r#"{"transactions":[{"amount":05.00,"type":"Debit"}]}"#;
        assert_eq!(
            recovered(raw),
            json!({"transactions": [{"amount": "05.00", "type": "Debit"}]})
        );
    }

    #[test]
    fn test_loose_numbers_are_completed() {
        assert_eq!(
            recovered(r#"{"a":.5,"b":5.,"c":+3,"d":-.25,"e":1e3}"#),
            json!({"a": 0.5, "b": 5.0, "c": 3, "d": -0.25, "e": 1000.0})
        );
    }

    #[test]
    fn test_trailing_commas() {
        let raw = r#"{"transactions":[{"amount":1,},{"amount":2},],}"#;
        assert_eq!(
            recovered(raw),
            json!({"transactions": [{"amount": 1}, {"amount": 2}]})
        );
    }

    #[test]
    fn test_single_quotes_and_bare_keys() {
        let raw = r#"{transactions: [{'date': '2024-01-01', 'description': 'Joe\'s "Diner"', amount: 12.5, type: 'Debit'}]}"#;
        assert_eq!(
            recovered(raw),
            json!({"transactions": [{
                "date": "2024-01-01",
                "description": "Joe's \"Diner\"",
                "amount": 12.5,
                "type": "Debit"
            }]})
        );
    }

    #[test]
    fn test_missing_commas_and_colons() {
        let raw = r#"{"a" 1 "b": [1 2 3] "c": {"d": true}}"#;
        assert_eq!(recovered(raw), json!({"a": 1, "b": [1, 2, 3], "c": {"d": true}}));
    }

    #[test]
    fn test_literals_and_bare_words() {
        let raw = r#"{"a": True, "b": None, "c": undefined, "d": NaN, "type": Debit}"#;
        assert_eq!(
            recovered(raw),
            json!({"a": true, "b": null, "c": null, "d": null, "type": "Debit"})
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let raw = "{\n  // running balance\n  \"balance\": 5000.75, /* may be null */ \"amount\": .5\n}";
        assert_eq!(recovered(raw), json!({"balance": 5000.75, "amount": 0.5}));
    }

    #[test]
    fn test_raw_newline_inside_string() {
        let raw = "{\"description\": \"NEFT TRANSFER\nREF 1234\", \"amount\": 1}garbage";
        assert_eq!(
            recovered(raw),
            json!({"description": "NEFT TRANSFER\nREF 1234", "amount": 1})
        );
    }

    #[test]
    fn test_dangling_key_is_dropped() {
        assert_eq!(recovered(r#"{"a": 1, "b": }"#), json!({"a": 1}));
        assert_eq!(recovered(r#"{"a": 1, "b"}"#), json!({"a": 1}));
    }

    #[test]
    fn test_mismatched_closer() {
        assert_eq!(recovered(r#"{"items": [1, 2}"#), json!({"items": [1, 2]}));
    }

    #[test]
    fn test_no_object() {
        let err = recover_json("I could not find any transactions.").unwrap_err();
        assert!(matches!(err, JsonRecoveryError::NoJsonObject { .. }));
        assert_eq!(err.to_string(), "No JSON object found in LLM response");
        assert_eq!(err.snippet(), "I could not find any transactions.");
    }

    #[test]
    fn test_unrepairable_reports_snippet() {
        let err = recover_json(r#"Result: {"amount": 1e}"#).unwrap_err();
        assert!(matches!(err, JsonRecoveryError::Unparseable { .. }));
        assert_eq!(err.snippet(), r#"{"amount": 1e}"#);
        assert!(!err.to_string().contains("Result:"));
    }

    #[test]
    fn test_candidate_slicing() {
        assert_eq!(json_candidate("x {\"a\":1} y } z"), Some("{\"a\":1} y }"));
        assert_eq!(json_candidate("x {\"a\":"), Some("{\"a\":"));
        assert_eq!(json_candidate("no braces"), None);
    }

    #[test]
    fn test_repair_output_is_compact() {
        assert_eq!(repair_json("{ 'a' : [ 1 , 2 , ] }"), r#"{"a":[1,2]}"#);
    }
}
