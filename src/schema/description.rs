//! RFC 4512 schema descriptions.
//!
//! The aggregate schema entry publishes every element as a description
//! string: `attributeTypes`, `objectClasses` and `dITContentRules` values in
//! RFC 4512 syntax, plus the directory-specific `extendedAttributeInfo` and
//! `extendedClassInfo`. This module renders those values from accepted
//! elements and parses the standard ones back.

use super::set::{AcceptedElement, SchemaSet};
use super::syntax;
use super::types::{ClassCategory, ElementKind};
use std::fmt;

/// Errors raised while parsing a description value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptionError {
    #[error("Description '{input}' ended unexpectedly")]
    UnexpectedEnd { input: String },

    #[error("Unexpected token '{token}' in description '{input}'")]
    UnexpectedToken { input: String, token: String },

    #[error("Unterminated quoted string in description '{input}'")]
    UnterminatedQuote { input: String },

    #[error("Description '{input}' has no numeric OID")]
    MissingOid { input: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Dollar,
    Quoted(String),
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
            Token::Dollar => f.write_str("$"),
            Token::Quoted(s) => write!(f, "'{}'", s),
            Token::Word(s) => f.write_str(s),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, DescriptionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            '$' => {
                chars.next();
                tokens.push(Token::Dollar);
            }
            '\'' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => value.push(c),
                        None => {
                            return Err(DescriptionError::UnterminatedQuote {
                                input: input.to_string(),
                            });
                        }
                    }
                }
                tokens.push(Token::Quoted(value));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '$' | '\'') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

/// Keywords that stand alone without a value.
const FLAGS: &[&str] = &[
    "OBSOLETE",
    "SINGLE-VALUE",
    "COLLECTIVE",
    "NO-USER-MODIFICATION",
    "ABSTRACT",
    "STRUCTURAL",
    "AUXILIARY",
];

/// A description split into its OID and keyword fields.
struct Fields {
    oid: String,
    fields: Vec<(String, Vec<String>)>,
}

impl Fields {
    fn parse(input: &str) -> Result<Self, DescriptionError> {
        let tokens = tokenize(input)?;
        let end = || DescriptionError::UnexpectedEnd {
            input: input.to_string(),
        };
        let unexpected = |token: &Token| DescriptionError::UnexpectedToken {
            input: input.to_string(),
            token: token.to_string(),
        };

        let mut iter = tokens.iter();
        match iter.next() {
            Some(Token::Open) => {}
            Some(other) => return Err(unexpected(other)),
            None => return Err(end()),
        }
        let oid = match iter.next() {
            Some(Token::Word(word)) if word.chars().all(|c| c.is_ascii_digit() || c == '.') => {
                word.clone()
            }
            Some(_) => {
                return Err(DescriptionError::MissingOid {
                    input: input.to_string(),
                });
            }
            None => return Err(end()),
        };

        let mut fields = Vec::new();
        loop {
            let keyword = match iter.next() {
                Some(Token::Close) => break,
                Some(Token::Word(word)) => word.clone(),
                Some(other) => return Err(unexpected(other)),
                None => return Err(end()),
            };
            if FLAGS.contains(&keyword.as_str()) {
                fields.push((keyword, Vec::new()));
                continue;
            }
            let values = match iter.next() {
                Some(Token::Quoted(v)) | Some(Token::Word(v)) => vec![v.clone()],
                Some(Token::Open) => {
                    let mut values = Vec::new();
                    loop {
                        match iter.next() {
                            Some(Token::Close) => break,
                            Some(Token::Dollar) => {}
                            Some(Token::Quoted(v)) | Some(Token::Word(v)) => values.push(v.clone()),
                            Some(other) => return Err(unexpected(other)),
                            None => return Err(end()),
                        }
                    }
                    values
                }
                Some(other) => return Err(unexpected(other)),
                None => return Err(end()),
            };
            fields.push((keyword, values));
        }

        if let Some(extra) = iter.next() {
            return Err(unexpected(extra));
        }
        Ok(Self { oid, fields })
    }

    fn values(&self, keyword: &str) -> Vec<String> {
        self.fields
            .iter()
            .find(|(k, _)| k == keyword)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn first(&self, keyword: &str) -> Option<String> {
        self.values(keyword).into_iter().next()
    }

    fn has(&self, keyword: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == keyword)
    }
}

fn write_names(f: &mut fmt::Formatter<'_>, names: &[String]) -> fmt::Result {
    match names {
        [] => Ok(()),
        [single] => write!(f, " NAME '{}'", single),
        many => {
            f.write_str(" NAME (")?;
            for name in many {
                write!(f, " '{}'", name)?;
            }
            f.write_str(" )")
        }
    }
}

fn write_oids(f: &mut fmt::Formatter<'_>, keyword: &str, oids: &[String]) -> fmt::Result {
    match oids {
        [] => Ok(()),
        [single] => write!(f, " {} {}", keyword, single),
        many => write!(f, " {} ( {} )", keyword, many.join(" $ ")),
    }
}

/// Canonical display name of a referenced element, or the reference as given.
fn canonical(schema: &SchemaSet, reference: &str) -> String {
    schema
        .find(reference)
        .map(|e| e.ldap_display_name().to_string())
        .unwrap_or_else(|| reference.to_string())
}

/// An `attributeTypes` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub syntax: Option<String>,
    pub single_value: bool,
    pub no_user_modification: bool,
}

impl AttributeTypeDescription {
    pub fn from_element(element: &AcceptedElement) -> Self {
        let definition = element.definition();
        Self {
            oid: definition.object_identifier().to_string(),
            names: vec![element.ldap_display_name().to_string()],
            syntax: definition
                .attribute_syntax()
                .and_then(syntax::lookup)
                .map(|rule| rule.ldap_syntax.to_string()),
            single_value: definition.is_single_valued(),
            no_user_modification: definition.is_system_only(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, DescriptionError> {
        let fields = Fields::parse(input)?;
        Ok(Self {
            names: fields.values("NAME"),
            syntax: fields.first("SYNTAX"),
            single_value: fields.has("SINGLE-VALUE"),
            no_user_modification: fields.has("NO-USER-MODIFICATION"),
            oid: fields.oid,
        })
    }

    /// Primary name, falling back to the OID.
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }
}

impl fmt::Display for AttributeTypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        write_names(f, &self.names)?;
        if let Some(syntax) = &self.syntax {
            write!(f, " SYNTAX '{}'", syntax)?;
        }
        if self.single_value {
            f.write_str(" SINGLE-VALUE")?;
        }
        if self.no_user_modification {
            f.write_str(" NO-USER-MODIFICATION")?;
        }
        f.write_str(" )")
    }
}

/// Kind keyword of an `objectClasses` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClassKind {
    Abstract,
    Structural,
    Auxiliary,
}

impl From<ClassCategory> for ObjectClassKind {
    fn from(category: ClassCategory) -> Self {
        match category {
            ClassCategory::Abstract => ObjectClassKind::Abstract,
            ClassCategory::Auxiliary => ObjectClassKind::Auxiliary,
            ClassCategory::Structural | ClassCategory::Class88 => ObjectClassKind::Structural,
        }
    }
}

/// An `objectClasses` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectClassDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub superclasses: Vec<String>,
    pub kind: ObjectClassKind,
    pub must: Vec<String>,
    pub may: Vec<String>,
}

impl ObjectClassDescription {
    pub fn from_element(element: &AcceptedElement, schema: &SchemaSet) -> Self {
        let definition = element.definition();
        Self {
            oid: definition.object_identifier().to_string(),
            names: vec![element.ldap_display_name().to_string()],
            superclasses: definition
                .parent_class()
                .map(|parent| canonical(schema, parent))
                .into_iter()
                .collect(),
            kind: definition
                .class_category()
                .map(ObjectClassKind::from)
                .unwrap_or(ObjectClassKind::Structural),
            must: definition
                .required_attributes()
                .iter()
                .map(|a| canonical(schema, a))
                .collect(),
            may: definition
                .optional_attributes()
                .iter()
                .map(|a| canonical(schema, a))
                .collect(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, DescriptionError> {
        let fields = Fields::parse(input)?;
        let kind = if fields.has("ABSTRACT") {
            ObjectClassKind::Abstract
        } else if fields.has("AUXILIARY") {
            ObjectClassKind::Auxiliary
        } else {
            ObjectClassKind::Structural
        };
        Ok(Self {
            names: fields.values("NAME"),
            superclasses: fields.values("SUP"),
            kind,
            must: fields.values("MUST"),
            may: fields.values("MAY"),
            oid: fields.oid,
        })
    }

    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }
}

impl fmt::Display for ObjectClassDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        write_names(f, &self.names)?;
        write_oids(f, "SUP", &self.superclasses)?;
        let kind = match self.kind {
            ObjectClassKind::Abstract => "ABSTRACT",
            ObjectClassKind::Structural => "STRUCTURAL",
            ObjectClassKind::Auxiliary => "AUXILIARY",
        };
        write!(f, " {}", kind)?;
        write_oids(f, "MUST", &self.must)?;
        write_oids(f, "MAY", &self.may)?;
        f.write_str(" )")
    }
}

/// A `dITContentRules` value, published for each structural class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRuleDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub auxiliary: Vec<String>,
}

impl ContentRuleDescription {
    /// Content rule of a structural class; `None` for other elements.
    pub fn from_element(element: &AcceptedElement, schema: &SchemaSet) -> Option<Self> {
        let definition = element.definition();
        let structural = matches!(
            definition.class_category(),
            Some(ClassCategory::Structural) | Some(ClassCategory::Class88)
        );
        if definition.kind() != ElementKind::Class || !structural {
            return None;
        }
        Some(Self {
            oid: definition.object_identifier().to_string(),
            names: vec![element.ldap_display_name().to_string()],
            auxiliary: definition
                .auxiliary_classes()
                .iter()
                .map(|a| canonical(schema, a))
                .collect(),
        })
    }

    pub fn parse(input: &str) -> Result<Self, DescriptionError> {
        let fields = Fields::parse(input)?;
        Ok(Self {
            names: fields.values("NAME"),
            auxiliary: fields.values("AUX"),
            oid: fields.oid,
        })
    }

    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(&self.oid)
    }
}

impl fmt::Display for ContentRuleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        write_names(f, &self.names)?;
        write_oids(f, "AUX", &self.auxiliary)?;
        f.write_str(" )")
    }
}

/// `extendedAttributeInfo` value of an attribute.
pub fn extended_attribute_info(element: &AcceptedElement) -> String {
    let definition = element.definition();
    let mut value = format!(
        "( {} NAME '{}' PROPERTY-GUID '{}'",
        definition.object_identifier(),
        element.ldap_display_name(),
        element.schema_id_guid().simple()
    );
    if definition.is_system_only() {
        value.push_str(" SYSTEM-ONLY");
    }
    value.push_str(" )");
    value
}

/// `extendedClassInfo` value of a class.
pub fn extended_class_info(element: &AcceptedElement) -> String {
    format!(
        "( {} NAME '{}' CLASS-GUID '{}' )",
        element.definition().object_identifier(),
        element.ldap_display_name(),
        element.schema_id_guid().simple()
    )
}
