//! Embedded bootstrap schema.
//!
//! The base-object attributes and classes every directory starts with,
//! embedded as a JSON array of schema element definitions. All of them carry
//! the `SCHEMA_BASE_OBJECT` system flag, so none receives an `msDS-IntId`.

use super::types::SchemaElementDefinition;

/// Returns the bootstrap schema as a JSON string.
pub fn base_schema() -> &'static str {
    r#"[
  {"name": "Common-Name", "ldapDisplayName": "cn", "objectIdentifier": "2.5.4.3", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Object-Class", "ldapDisplayName": "objectClass", "objectIdentifier": "2.5.4.0", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": false},
  {"name": "RDN", "ldapDisplayName": "name", "objectIdentifier": "1.2.840.113556.1.4.1", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true, "systemOnly": true},
  {"name": "Description", "ldapDisplayName": "description", "objectIdentifier": "2.5.4.13", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": false},
  {"name": "Obj-Dist-Name", "ldapDisplayName": "distinguishedName", "objectIdentifier": "2.5.4.49", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.1", "omSyntax": 127, "isSingleValued": true},
  {"name": "Instance-Type", "ldapDisplayName": "instanceType", "objectIdentifier": "1.2.840.113556.1.2.1", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.9", "omSyntax": 2, "isSingleValued": true, "systemOnly": true},
  {"name": "Object-Category", "ldapDisplayName": "objectCategory", "objectIdentifier": "1.2.840.113556.1.4.782", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.1", "omSyntax": 127, "isSingleValued": true},
  {"name": "When-Created", "ldapDisplayName": "whenCreated", "objectIdentifier": "1.2.840.113556.1.2.2", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.11", "omSyntax": 24, "isSingleValued": true, "systemOnly": true},
  {"name": "Surname", "ldapDisplayName": "sn", "objectIdentifier": "2.5.4.4", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Given-Name", "ldapDisplayName": "givenName", "objectIdentifier": "2.5.4.42", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Telephone-Number", "ldapDisplayName": "telephoneNumber", "objectIdentifier": "2.5.4.20", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Title", "ldapDisplayName": "title", "objectIdentifier": "2.5.4.12", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "E-mail-Addresses", "ldapDisplayName": "mail", "objectIdentifier": "0.9.2342.19200300.100.1.3", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "SAM-Account-Name", "ldapDisplayName": "sAMAccountName", "objectIdentifier": "1.2.840.113556.1.4.221", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Domain-Component", "ldapDisplayName": "dc", "objectIdentifier": "0.9.2342.19200300.100.1.25", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "LDAP-Display-Name", "ldapDisplayName": "lDAPDisplayName", "objectIdentifier": "1.2.840.113556.1.2.460", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Attribute-ID", "ldapDisplayName": "attributeID", "objectIdentifier": "1.2.840.113556.1.2.30", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": true, "systemOnly": true},
  {"name": "Governs-ID", "ldapDisplayName": "governsID", "objectIdentifier": "1.2.840.113556.1.2.22", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": true, "systemOnly": true},
  {"name": "Attribute-Syntax", "ldapDisplayName": "attributeSyntax", "objectIdentifier": "1.2.840.113556.1.2.32", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": true, "systemOnly": true},
  {"name": "OM-Syntax", "ldapDisplayName": "oMSyntax", "objectIdentifier": "1.2.840.113556.1.2.231", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.9", "omSyntax": 2, "isSingleValued": true, "systemOnly": true},
  {"name": "Is-Single-Valued", "ldapDisplayName": "isSingleValued", "objectIdentifier": "1.2.840.113556.1.2.33", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.8", "omSyntax": 1, "isSingleValued": true},
  {"name": "System-Only", "ldapDisplayName": "systemOnly", "objectIdentifier": "1.2.840.113556.1.4.170", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.8", "omSyntax": 1, "isSingleValued": true, "systemOnly": true},
  {"name": "System-Flags", "ldapDisplayName": "systemFlags", "objectIdentifier": "1.2.840.113556.1.4.375", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.9", "omSyntax": 2, "isSingleValued": true},
  {"name": "ms-DS-IntId", "ldapDisplayName": "msDS-IntId", "objectIdentifier": "1.2.840.113556.1.4.1716", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.9", "omSyntax": 2, "isSingleValued": true, "systemOnly": true},
  {"name": "Schema-ID-GUID", "ldapDisplayName": "schemaIDGUID", "objectIdentifier": "1.2.840.113556.1.4.148", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.10", "omSyntax": 4, "isSingleValued": true},
  {"name": "Sub-Class-Of", "ldapDisplayName": "subClassOf", "objectIdentifier": "1.2.840.113556.1.2.21", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": true, "systemOnly": true},
  {"name": "System-Must-Contain", "ldapDisplayName": "systemMustContain", "objectIdentifier": "1.2.840.113556.1.4.197", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": false, "systemOnly": true},
  {"name": "System-May-Contain", "ldapDisplayName": "systemMayContain", "objectIdentifier": "1.2.840.113556.1.4.196", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": false, "systemOnly": true},
  {"name": "System-Auxiliary-Class", "ldapDisplayName": "systemAuxiliaryClass", "objectIdentifier": "1.2.840.113556.1.4.198", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": false, "systemOnly": true},
  {"name": "Default-Object-Category", "ldapDisplayName": "defaultObjectCategory", "objectIdentifier": "1.2.840.113556.1.4.783", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.1", "omSyntax": 127, "isSingleValued": true},
  {"name": "Object-Class-Category", "ldapDisplayName": "objectClassCategory", "objectIdentifier": "1.2.840.113556.1.2.370", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.9", "omSyntax": 10, "isSingleValued": true, "systemOnly": true},
  {"name": "RDN-Att-ID", "ldapDisplayName": "rDNAttID", "objectIdentifier": "1.2.840.113556.1.2.26", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.2", "omSyntax": 6, "isSingleValued": true, "systemOnly": true},
  {"name": "Admin-Description", "ldapDisplayName": "adminDescription", "objectIdentifier": "1.2.840.113556.1.2.226", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Admin-Display-Name", "ldapDisplayName": "adminDisplayName", "objectIdentifier": "1.2.840.113556.1.2.194", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": true},
  {"name": "Attribute-Types", "ldapDisplayName": "attributeTypes", "objectIdentifier": "2.5.21.5", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": false, "systemOnly": true},
  {"name": "Object-Classes", "ldapDisplayName": "objectClasses", "objectIdentifier": "2.5.21.6", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": false, "systemOnly": true},
  {"name": "DIT-Content-Rules", "ldapDisplayName": "dITContentRules", "objectIdentifier": "2.5.21.2", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": false, "systemOnly": true},
  {"name": "Extended-Attribute-Info", "ldapDisplayName": "extendedAttributeInfo", "objectIdentifier": "1.2.840.113556.1.4.909", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": false, "systemOnly": true},
  {"name": "Extended-Class-Info", "ldapDisplayName": "extendedClassInfo", "objectIdentifier": "1.2.840.113556.1.4.908", "kind": "attribute", "systemFlags": 16, "attributeSyntax": "2.5.5.12", "omSyntax": 64, "isSingleValued": false, "systemOnly": true},

  {"name": "Top", "ldapDisplayName": "top", "objectIdentifier": "2.5.6.0", "kind": "class", "systemFlags": 16, "classCategory": "abstract",
   "requiredAttributes": ["objectClass", "instanceType", "objectCategory"],
   "optionalAttributes": ["cn", "name", "description", "distinguishedName", "whenCreated", "adminDescription", "adminDisplayName", "systemFlags"]},
  {"name": "Person", "ldapDisplayName": "person", "objectIdentifier": "2.5.6.6", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn", "optionalAttributes": ["sn", "telephoneNumber"]},
  {"name": "Organizational-Person", "ldapDisplayName": "organizationalPerson", "objectIdentifier": "2.5.6.7", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "person", "rdnAttribute": "cn", "optionalAttributes": ["title", "givenName"]},
  {"name": "Mail-Recipient", "ldapDisplayName": "mailRecipient", "objectIdentifier": "1.2.840.113556.1.3.46", "kind": "class", "systemFlags": 16, "classCategory": "auxiliary",
   "parentClass": "top", "requiredAttributes": ["cn"], "optionalAttributes": ["mail", "telephoneNumber"]},
  {"name": "User", "ldapDisplayName": "user", "objectIdentifier": "1.2.840.113556.1.5.9", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "organizationalPerson", "rdnAttribute": "cn", "optionalAttributes": ["sAMAccountName"], "auxiliaryClasses": ["mailRecipient"]},
  {"name": "Container", "ldapDisplayName": "container", "objectIdentifier": "1.2.840.113556.1.3.23", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn", "requiredAttributes": ["cn"]},
  {"name": "Domain", "ldapDisplayName": "domain", "objectIdentifier": "1.2.840.113556.1.5.66", "kind": "class", "systemFlags": 16, "classCategory": "abstract",
   "parentClass": "top", "rdnAttribute": "dc", "requiredAttributes": ["dc"]},
  {"name": "Domain-DNS", "ldapDisplayName": "domainDNS", "objectIdentifier": "1.2.840.113556.1.5.67", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "domain", "rdnAttribute": "dc"},
  {"name": "Configuration", "ldapDisplayName": "configuration", "objectIdentifier": "1.2.840.113556.1.5.12", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn", "requiredAttributes": ["cn"]},
  {"name": "DMD", "ldapDisplayName": "dMD", "objectIdentifier": "1.2.840.113556.1.3.9", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn", "requiredAttributes": ["cn"]},
  {"name": "Attribute-Schema", "ldapDisplayName": "attributeSchema", "objectIdentifier": "1.2.840.113556.1.3.14", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn",
   "requiredAttributes": ["cn", "attributeID", "attributeSyntax", "oMSyntax", "isSingleValued", "lDAPDisplayName", "schemaIDGUID"],
   "optionalAttributes": ["systemOnly", "msDS-IntId"]},
  {"name": "Class-Schema", "ldapDisplayName": "classSchema", "objectIdentifier": "1.2.840.113556.1.3.13", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn",
   "requiredAttributes": ["cn", "governsID", "objectClassCategory", "subClassOf", "defaultObjectCategory", "lDAPDisplayName", "schemaIDGUID"],
   "optionalAttributes": ["systemMustContain", "systemMayContain", "systemAuxiliaryClass", "rDNAttID", "systemOnly", "msDS-IntId"]},
  {"name": "SubSchema", "ldapDisplayName": "subSchema", "objectIdentifier": "2.5.20.1", "kind": "class", "systemFlags": 16, "classCategory": "structural",
   "parentClass": "top", "rdnAttribute": "cn",
   "optionalAttributes": ["attributeTypes", "objectClasses", "dITContentRules", "extendedAttributeInfo", "extendedClassInfo"]}
]"#
}

/// Parse the embedded bootstrap schema.
pub fn base_schema_definitions() -> Result<Vec<SchemaElementDefinition>, serde_json::Error> {
    serde_json::from_str(base_schema())
}
