//! LDAP search filters.
//!
//! Supports the subset of RFC 4515 the harness needs: `&`, `|`, `!`,
//! equality, presence and substring assertions. An empty filter matches
//! every entry and a bare `attr=value` is accepted without parentheses.

use super::Entry;
use std::fmt;

/// Errors raised while parsing a filter string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Unexpected end of filter '{filter}'")]
    UnexpectedEnd { filter: String },

    #[error("Unexpected character '{found}' at offset {offset} in filter '{filter}'")]
    UnexpectedCharacter {
        filter: String,
        offset: usize,
        found: char,
    },

    #[error("Filter '{filter}' has an item without an attribute type")]
    MissingAttribute { filter: String },

    #[error("Trailing input after filter '{filter}'")]
    TrailingInput { filter: String },
}

/// A parsed search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Matches every entry.
    MatchAll,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Equality {
        attribute: String,
        value: String,
    },
    Present {
        attribute: String,
    },
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        final_: Option<String>,
    },
}

impl Filter {
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    /// Parse a filter string.
    ///
    /// ```rust
    /// use ldap_schema_harness::directory::Filter;
    ///
    /// let filter = Filter::parse("(|(objectClass=attributeSchema)(objectClass=classSchema))").unwrap();
    /// assert!(matches!(filter, Filter::Or(ref items) if items.len() == 2));
    /// assert_eq!(Filter::parse("").unwrap(), Filter::MatchAll);
    /// assert_eq!(Filter::parse("cn=*").unwrap(), Filter::present("cn"));
    /// ```
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Filter::MatchAll);
        }
        let mut parser = Parser {
            source: trimmed,
            chars: trimmed.char_indices().collect(),
            pos: 0,
        };
        let filter = if trimmed.starts_with('(') {
            parser.filter()?
        } else {
            parser.item(trimmed.len())?
        };
        if parser.pos < parser.chars.len() {
            return Err(FilterError::TrailingInput {
                filter: trimmed.to_string(),
            });
        }
        Ok(filter)
    }

    /// Evaluate the filter against an entry. Values compare ignoring case.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::And(items) => items.iter().all(|f| f.matches(entry)),
            Filter::Or(items) => items.iter().any(|f| f.matches(entry)),
            Filter::Not(inner) => !inner.matches(entry),
            Filter::Equality { attribute, value } => entry.has_value(attribute, value),
            Filter::Present { attribute } => {
                attribute.eq_ignore_ascii_case("objectClass") || entry.contains(attribute)
            }
            Filter::Substring {
                attribute,
                initial,
                any,
                final_,
            } => entry.values(attribute).iter().any(|v| {
                substring_match(v, initial.as_deref(), any, final_.as_deref())
            }),
        }
    }
}

fn substring_match(value: &str, initial: Option<&str>, any: &[String], final_: Option<&str>) -> bool {
    let value = value.to_lowercase();
    let mut rest: &str = &value;

    if let Some(prefix) = initial {
        let prefix = prefix.to_lowercase();
        match rest.strip_prefix(prefix.as_str()) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    for part in any {
        let part = part.to_lowercase();
        match rest.find(part.as_str()) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    match final_ {
        Some(suffix) => rest.ends_with(suffix.to_lowercase().as_str()),
        None => true,
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(idx, _)| *idx)
            .unwrap_or(self.source.len())
    }

    fn expect(&mut self, wanted: char) -> Result<(), FilterError> {
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(FilterError::UnexpectedCharacter {
                filter: self.source.to_string(),
                offset: self.offset(),
                found,
            }),
            None => Err(self.unexpected_end()),
        }
    }

    fn unexpected_end(&self) -> FilterError {
        FilterError::UnexpectedEnd {
            filter: self.source.to_string(),
        }
    }

    fn filter(&mut self) -> Result<Filter, FilterError> {
        self.expect('(')?;
        let filter = match self.peek() {
            Some('&') => {
                self.pos += 1;
                Filter::And(self.filter_list()?)
            }
            Some('|') => {
                self.pos += 1;
                Filter::Or(self.filter_list()?)
            }
            Some('!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => {
                let end = self.closing_paren()?;
                self.item(end)?
            }
            None => return Err(self.unexpected_end()),
        };
        self.expect(')')?;
        Ok(filter)
    }

    fn filter_list(&mut self) -> Result<Vec<Filter>, FilterError> {
        let mut items = Vec::new();
        while self.peek() == Some('(') {
            items.push(self.filter()?);
        }
        Ok(items)
    }

    /// Byte offset of the `)` closing the current simple item.
    fn closing_paren(&self) -> Result<usize, FilterError> {
        let mut escaped = false;
        for &(idx, c) in &self.chars[self.pos..] {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == ')' {
                return Ok(idx);
            } else if c == '(' {
                return Err(FilterError::UnexpectedCharacter {
                    filter: self.source.to_string(),
                    offset: idx,
                    found: c,
                });
            }
        }
        Err(self.unexpected_end())
    }

    /// Parse `attr=value` from the current position up to byte offset `end`.
    fn item(&mut self, end: usize) -> Result<Filter, FilterError> {
        let start = self.offset();
        let text = &self.source[start..end];
        while self.offset() < end {
            self.pos += 1;
        }

        let Some((attribute, value)) = text.split_once('=') else {
            return Err(FilterError::UnexpectedCharacter {
                filter: self.source.to_string(),
                offset: start,
                found: text.chars().next().unwrap_or(')'),
            });
        };
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(FilterError::MissingAttribute {
                filter: self.source.to_string(),
            });
        }

        if value == "*" {
            return Ok(Filter::present(attribute));
        }
        if !value.contains('*') {
            return Ok(Filter::equality(attribute, unescape(value)));
        }

        let parts: Vec<&str> = value.split('*').collect();
        let last = parts.len() - 1;
        let non_empty = |s: &str| (!s.is_empty()).then(|| unescape(s));
        Ok(Filter::Substring {
            attribute: attribute.to_string(),
            initial: non_empty(parts[0]),
            any: parts[1..last]
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| unescape(p))
                .collect(),
            final_: non_empty(parts[last]),
        })
    }
}

/// Decode RFC 4515 `\XX` escapes; anything else passes through.
fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::MatchAll => f.write_str("(objectClass=*)"),
            Filter::And(items) => {
                f.write_str("(&")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Filter::Or(items) => {
                f.write_str("(|")?;
                for item in items {
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
            Filter::Not(inner) => write!(f, "(!{})", inner),
            Filter::Equality { attribute, value } => {
                write!(f, "({}={})", attribute, escape(value))
            }
            Filter::Present { attribute } => write!(f, "({}=*)", attribute),
            Filter::Substring {
                attribute,
                initial,
                any,
                final_,
            } => {
                write!(f, "({}=", attribute)?;
                if let Some(initial) = initial {
                    f.write_str(&escape(initial))?;
                }
                f.write_str("*")?;
                for part in any {
                    write!(f, "{}*", escape(part))?;
                }
                if let Some(final_) = final_ {
                    f.write_str(&escape(final_))?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Dn;

    fn schema_entry() -> Entry {
        Entry::new(Dn::new("CN=test-Attr,CN=Schema,CN=Configuration,DC=example").unwrap())
            .with("objectClass", ["top", "attributeSchema"])
            .with("cn", ["test-Attr"])
            .with("lDAPDisplayName", ["testAttr"])
    }

    #[test]
    fn test_equality_ignores_case() {
        let filter = Filter::parse("(objectClass=AttributeSchema)").unwrap();
        assert!(filter.matches(&schema_entry()));
        assert!(!Filter::parse("(objectClass=classSchema)").unwrap().matches(&schema_entry()));
    }

    #[test]
    fn test_bare_item_and_presence() {
        assert_eq!(
            Filter::parse("cn=test-Attr").unwrap(),
            Filter::equality("cn", "test-Attr")
        );
        assert!(Filter::parse("(cn=*)").unwrap().matches(&schema_entry()));
        assert!(!Filter::parse("(msDS-IntId=*)").unwrap().matches(&schema_entry()));
    }

    #[test]
    fn test_boolean_composition() {
        let filter =
            Filter::parse("(&(objectClass=attributeSchema)(!(cn=other))(|(cn=x)(lDAPDisplayName=testAttr)))")
                .unwrap();
        assert!(filter.matches(&schema_entry()));
    }

    #[test]
    fn test_substring_assertions() {
        let entry = schema_entry();
        assert!(Filter::parse("(cn=test-*)").unwrap().matches(&entry));
        assert!(Filter::parse("(cn=*-attr)").unwrap().matches(&entry));
        assert!(Filter::parse("(cn=t*st*tr)").unwrap().matches(&entry));
        assert!(!Filter::parse("(cn=*class*)").unwrap().matches(&entry));
    }

    #[test]
    fn test_escaped_values() {
        let filter = Filter::parse(r"(cn=a\2ab)").unwrap();
        assert_eq!(filter, Filter::equality("cn", "a*b"));
        assert_eq!(filter.to_string(), r"(cn=a\2ab)");
    }

    #[test]
    fn test_malformed_filters_are_rejected() {
        assert!(matches!(
            Filter::parse("(cn=x"),
            Err(FilterError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            Filter::parse("(=x)"),
            Err(FilterError::MissingAttribute { .. })
        ));
        assert!(Filter::parse("(cn)").is_err());
        assert!(matches!(
            Filter::parse("(cn=x)(cn=y)"),
            Err(FilterError::TrailingInput { .. })
        ));
    }
}
