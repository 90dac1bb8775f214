//! Attribute syntax table.
//!
//! Every attribute schema element pairs an `attributeSyntax` OID with an
//! `oMSyntax` integer. Only the combinations listed here are valid; each
//! also maps to the LDAP syntax OID published in `attributeTypes`.

/// One valid `attributeSyntax` with the `oMSyntax` values it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxRule {
    pub attribute_syntax: &'static str,
    pub om_syntaxes: &'static [i32],
    pub ldap_syntax: &'static str,
    pub name: &'static str,
}

pub const SYNTAX_RULES: &[SyntaxRule] = &[
    SyntaxRule {
        attribute_syntax: "2.5.5.1",
        om_syntaxes: &[127],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.12",
        name: "Object(DS-DN)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.2",
        om_syntaxes: &[6],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.38",
        name: "String(Object-Identifier)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.3",
        om_syntaxes: &[27],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.26",
        name: "String(Case Sensitive)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.4",
        om_syntaxes: &[20],
        ldap_syntax: "1.2.840.113556.1.4.905",
        name: "String(Teletex)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.5",
        om_syntaxes: &[19, 22],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.44",
        name: "String(Printable)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.6",
        om_syntaxes: &[18],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.36",
        name: "String(Numeric)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.7",
        om_syntaxes: &[127],
        ldap_syntax: "1.2.840.113556.1.4.903",
        name: "Object(DN-Binary)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.8",
        om_syntaxes: &[1],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.7",
        name: "Boolean",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.9",
        om_syntaxes: &[2, 10],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.27",
        name: "Integer",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.10",
        om_syntaxes: &[4],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.40",
        name: "String(Octet)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.11",
        om_syntaxes: &[23, 24],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.24",
        name: "String(Generalized-Time)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.12",
        om_syntaxes: &[64],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.15",
        name: "String(Unicode)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.13",
        om_syntaxes: &[127],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.43",
        name: "Object(Presentation-Address)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.14",
        om_syntaxes: &[127],
        ldap_syntax: "1.2.840.113556.1.4.904",
        name: "Object(DN-String)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.15",
        om_syntaxes: &[66],
        ldap_syntax: "1.2.840.113556.1.4.907",
        name: "String(NT-Sec-Desc)",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.16",
        om_syntaxes: &[65],
        ldap_syntax: "1.2.840.113556.1.4.906",
        name: "LargeInteger",
    },
    SyntaxRule {
        attribute_syntax: "2.5.5.17",
        om_syntaxes: &[4],
        ldap_syntax: "1.3.6.1.4.1.1466.115.121.1.40",
        name: "String(Sid)",
    },
];

/// Look up the rule for an `attributeSyntax` OID.
pub fn lookup(attribute_syntax: &str) -> Option<&'static SyntaxRule> {
    SYNTAX_RULES
        .iter()
        .find(|rule| rule.attribute_syntax == attribute_syntax)
}

/// Check an `attributeSyntax`/`oMSyntax` pair, returning the matching rule or
/// a description of what is wrong with it.
pub fn validate_pair(
    attribute_syntax: Option<&str>,
    om_syntax: Option<i32>,
) -> Result<&'static SyntaxRule, String> {
    let syntax = attribute_syntax.ok_or_else(|| "attributeSyntax is missing".to_string())?;
    let om = om_syntax.ok_or_else(|| "oMSyntax is missing".to_string())?;
    let rule = lookup(syntax).ok_or_else(|| format!("unknown attributeSyntax '{}'", syntax))?;
    if !rule.om_syntaxes.contains(&om) {
        return Err(format!(
            "oMSyntax {} does not match attributeSyntax {} ({}), expected one of {:?}",
            om, syntax, rule.name, rule.om_syntaxes
        ));
    }
    Ok(rule)
}
