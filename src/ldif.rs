//! LDIF change records (RFC 2849).
//!
//! Scenarios describe most of their operations as LDIF text, the same way an
//! administrator would feed them to a command line tool. This module parses
//! `add`, `modify` and `delete` change records into [`LdifRecord`]s and
//! renders entries back to LDIF for logging.
//!
//! Supported: comments, a leading `version: 1`, folded lines, base64 values
//! (`attr:: ...`), the empty root DSE DN (`dn:`) and content records without a
//! `changetype`, which are treated as adds. URL values (`attr:< ...`) are not.
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_schema_harness::ldif::{self, LdifRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let records = ldif::parse(
//!     "dn:\nchangetype: modify\nadd: schemaUpdateNow\nschemaUpdateNow: 1\n-\n",
//! )?;
//! assert!(matches!(&records[0], LdifRecord::Modify { dn, .. } if dn.is_root()));
//! # Ok(())
//! # }
//! ```

use crate::directory::{Entry, Modification, ModificationOp};
use crate::error::ValidationError;
use crate::value_objects::Dn;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors raised while parsing LDIF. Line numbers are 1-based and refer to
/// the first physical line of the offending logical line.
#[derive(Debug, Error)]
pub enum LdifError {
    #[error("line {line}: record does not start with a dn")]
    MissingDn { line: usize },

    #[error("line {line}: invalid dn: {source}")]
    InvalidDn {
        line: usize,
        #[source]
        source: ValidationError,
    },

    #[error("line {line}: malformed line '{content}'")]
    MalformedLine { line: usize, content: String },

    #[error("line {line}: unsupported changetype '{changetype}'")]
    UnknownChangeType { line: usize, changetype: String },

    #[error("line {line}: invalid base64 value: {source}")]
    InvalidBase64 {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("line {line}: base64 value is not UTF-8")]
    NotUtf8 { line: usize },

    #[error("line {line}: expected values of '{expected}', found '{found}'")]
    ModificationMismatch {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("line {line}: delete record carries attributes")]
    DeleteWithAttributes { line: usize },

    #[error("expected exactly one entry, found {records} record(s)")]
    NotASingleEntry { records: usize },
}

/// One change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdifRecord {
    Add(Entry),
    Modify { dn: Dn, changes: Vec<Modification> },
    Delete(Dn),
}

impl LdifRecord {
    pub fn dn(&self) -> &Dn {
        match self {
            LdifRecord::Add(entry) => entry.dn(),
            LdifRecord::Modify { dn, .. } => dn,
            LdifRecord::Delete(dn) => dn,
        }
    }
}

/// A logical line after unfolding.
#[derive(Debug)]
enum Line {
    Separator,
    Value { name: String, value: String },
}

/// Parse LDIF text into change records.
pub fn parse(input: &str) -> Result<Vec<LdifRecord>, LdifError> {
    let mut records = Vec::new();
    for block in logical_blocks(input) {
        let mut lines = Vec::with_capacity(block.len());
        for (number, text) in block {
            lines.push((number, parse_line(number, &text)?));
        }
        if let Some(record) = parse_record(lines)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Parse input holding exactly one add or content record.
pub fn parse_entry(input: &str) -> Result<Entry, LdifError> {
    let records = parse(input)?;
    let count = records.len();
    let mut records = records.into_iter();
    match (records.next(), records.next()) {
        (Some(LdifRecord::Add(entry)), None) => Ok(entry),
        _ => Err(LdifError::NotASingleEntry { records: count }),
    }
}

/// Split input into blank-line separated blocks of unfolded lines, dropping
/// comments.
fn logical_blocks(input: &str) -> Vec<Vec<(usize, String)>> {
    let mut blocks = Vec::new();
    let mut current: Vec<(usize, String)> = Vec::new();
    let mut in_comment = false;

    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        if let Some(continuation) = raw.strip_prefix(' ') {
            if in_comment {
                continue;
            }
            if let Some((_, last)) = current.last_mut() {
                last.push_str(continuation);
                continue;
            }
        }
        in_comment = false;

        if raw.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        if raw.starts_with('#') {
            in_comment = true;
            continue;
        }
        current.push((number, raw.to_string()));
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_line(number: usize, text: &str) -> Result<Line, LdifError> {
    if text == "-" {
        return Ok(Line::Separator);
    }
    let malformed = || LdifError::MalformedLine {
        line: number,
        content: text.to_string(),
    };
    let (name, rest) = text.split_once(':').ok_or_else(malformed)?;
    if name.is_empty() || name.contains(' ') {
        return Err(malformed());
    }

    let value = if let Some(encoded) = rest.strip_prefix(':') {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|source| LdifError::InvalidBase64 {
                line: number,
                source,
            })?;
        String::from_utf8(bytes).map_err(|_| LdifError::NotUtf8 { line: number })?
    } else if rest.starts_with('<') {
        return Err(malformed());
    } else {
        rest.trim_start_matches(' ').to_string()
    };

    Ok(Line::Value {
        name: name.to_string(),
        value,
    })
}

fn parse_record(lines: Vec<(usize, Line)>) -> Result<Option<LdifRecord>, LdifError> {
    let mut iter = lines.into_iter().peekable();

    // A version line may precede the first record in its own block.
    if let Some((_, Line::Value { name, .. })) = iter.peek() {
        if name.eq_ignore_ascii_case("version") {
            iter.next();
            if iter.peek().is_none() {
                return Ok(None);
            }
        }
    }

    let (dn_line, dn) = match iter.next() {
        Some((number, Line::Value { name, value })) if name.eq_ignore_ascii_case("dn") => {
            let dn = if value.is_empty() {
                Dn::root()
            } else {
                Dn::new(value).map_err(|source| LdifError::InvalidDn {
                    line: number,
                    source,
                })?
            };
            (number, dn)
        }
        Some((number, _)) => return Err(LdifError::MissingDn { line: number }),
        None => return Ok(None),
    };

    let changetype = match iter.peek() {
        Some((number, Line::Value { name, value })) if name.eq_ignore_ascii_case("changetype") => {
            let changetype = (value.to_ascii_lowercase(), *number);
            iter.next();
            Some(changetype)
        }
        _ => None,
    };

    match changetype {
        None => parse_add(dn, iter).map(Some),
        Some((kind, _)) if kind == "add" => parse_add(dn, iter).map(Some),
        Some((kind, _)) if kind == "delete" => match iter.next() {
            Some((number, _)) => Err(LdifError::DeleteWithAttributes { line: number }),
            None => Ok(Some(LdifRecord::Delete(dn))),
        },
        Some((kind, _)) if kind == "modify" => {
            let changes = parse_changes(iter)?;
            Ok(Some(LdifRecord::Modify { dn, changes }))
        }
        Some((kind, number)) => Err(LdifError::UnknownChangeType {
            line: number.max(dn_line),
            changetype: kind,
        }),
    }
}

fn parse_add(
    dn: Dn,
    lines: impl Iterator<Item = (usize, Line)>,
) -> Result<LdifRecord, LdifError> {
    let mut entry = Entry::new(dn);
    for (number, line) in lines {
        match line {
            Line::Value { name, value } => entry.add_values(&name, [value]),
            Line::Separator => {
                return Err(LdifError::MalformedLine {
                    line: number,
                    content: "-".to_string(),
                });
            }
        }
    }
    Ok(LdifRecord::Add(entry))
}

fn parse_changes(
    lines: impl Iterator<Item = (usize, Line)>,
) -> Result<Vec<Modification>, LdifError> {
    let mut changes = Vec::new();
    let mut current: Option<Modification> = None;

    for (number, line) in lines {
        match line {
            Line::Separator => match current.take() {
                Some(change) => changes.push(change),
                None => {
                    return Err(LdifError::MalformedLine {
                        line: number,
                        content: "-".to_string(),
                    });
                }
            },
            Line::Value { name, value } => match current.as_mut() {
                Some(change) => {
                    if !change.targets(&name) {
                        return Err(LdifError::ModificationMismatch {
                            line: number,
                            expected: change.attribute.clone(),
                            found: name,
                        });
                    }
                    change.values.push(value);
                }
                None => {
                    let op = match name.to_ascii_lowercase().as_str() {
                        "add" => ModificationOp::Add,
                        "replace" => ModificationOp::Replace,
                        "delete" => ModificationOp::Delete,
                        _ => {
                            return Err(LdifError::MalformedLine {
                                line: number,
                                content: format!("{}: {}", name, value),
                            });
                        }
                    };
                    current = Some(Modification::new(op, &value, Vec::<String>::new()));
                }
            },
        }
    }
    // The trailing separator is optional on the last change.
    changes.extend(current);
    Ok(changes)
}

fn needs_base64(value: &str) -> bool {
    value.starts_with([' ', ':', '<'])
        || value.ends_with(' ')
        || value.chars().any(|c| !c.is_ascii() || c == '\n' || c == '\r' || c == '\0')
}

fn write_value(out: &mut String, name: &str, value: &str) {
    if needs_base64(value) {
        let _ = writeln!(out, "{}:: {}", name, STANDARD.encode(value.as_bytes()));
    } else if value.is_empty() {
        let _ = writeln!(out, "{}:", name);
    } else {
        let _ = writeln!(out, "{}: {}", name, value);
    }
}

/// Render an entry as an LDIF content record.
pub fn render_entry(entry: &Entry) -> String {
    let mut out = String::new();
    write_value(&mut out, "dn", entry.dn().as_str());
    for attribute in entry.attributes() {
        for value in &attribute.values {
            write_value(&mut out, &attribute.name, value);
        }
    }
    out
}

/// Render a change record.
pub fn render_record(record: &LdifRecord) -> String {
    match record {
        LdifRecord::Add(entry) => {
            let mut out = String::new();
            write_value(&mut out, "dn", entry.dn().as_str());
            out.push_str("changetype: add\n");
            for attribute in entry.attributes() {
                for value in &attribute.values {
                    write_value(&mut out, &attribute.name, value);
                }
            }
            out
        }
        LdifRecord::Modify { dn, changes } => {
            let mut out = String::new();
            write_value(&mut out, "dn", dn.as_str());
            out.push_str("changetype: modify\n");
            for change in changes {
                let _ = writeln!(out, "{}: {}", change.op, change.attribute);
                for value in &change.values {
                    write_value(&mut out, &change.attribute, value);
                }
                out.push_str("-\n");
            }
            out
        }
        LdifRecord::Delete(dn) => {
            let mut out = String::new();
            write_value(&mut out, "dn", dn.as_str());
            out.push_str("changetype: delete\n");
            out
        }
    }
}
