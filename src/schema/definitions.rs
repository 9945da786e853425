//! SCIM 2.0 User schema knowledge for the fixed (non-dynamic) attributes.
//!
//! Every fixed attribute a filter, `sortBy` or `attributes` parameter can
//! address is listed here, with its comparison case rule spelled out.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// SCIM 2.0 Core Schema identifiers
pub const SCIM_SCHEMA_CORE_USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";

/// Attribute type in SCIM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    String,
    Boolean,
    DateTime,
    Reference,
    Complex,
}

/// When an attribute is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Returned {
    Always,
    Default,
}

/// Complete attribute definition
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub name: &'static str,
    pub attr_type: AttributeType,
    pub multi_valued: bool,
    pub description: &'static str,
    pub case_exact: bool,
    pub returned: Returned,
    pub sub_attributes: Vec<AttributeDefinition>,
}

impl AttributeDefinition {
    fn simple(name: &'static str, attr_type: AttributeType, case_exact: bool, description: &'static str) -> Self {
        Self {
            name,
            attr_type,
            multi_valued: false,
            description,
            case_exact,
            returned: Returned::Default,
            sub_attributes: vec![],
        }
    }

    /// Look up a direct sub-attribute by name, ignoring case
    pub fn sub_attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.sub_attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn is_complex(&self) -> bool {
        self.attr_type == AttributeType::Complex
    }
}

/// Schema definition
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub attributes: Vec<AttributeDefinition>,
}

fn multi_valued_sub_attributes(value_type: AttributeType, value_case_exact: bool) -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::simple("value", value_type, value_case_exact, "The attribute value"),
        AttributeDefinition::simple("type", AttributeType::String, false, "A label indicating the attribute's function"),
        AttributeDefinition::simple("primary", AttributeType::Boolean, false, "Marks the preferred value"),
    ]
}

lazy_static! {
    /// User schema definition
    pub static ref USER_SCHEMA: SchemaDefinition = SchemaDefinition {
        id: SCIM_SCHEMA_CORE_USER,
        name: "User",
        description: "User Account",
        attributes: vec![
            AttributeDefinition {
                returned: Returned::Always,
                ..AttributeDefinition::simple("id", AttributeType::String, true, "Unique identifier for the User")
            },
            AttributeDefinition::simple(
                "userName",
                AttributeType::String,
                false, // Case-insensitive per RFC 7643
                "Unique identifier for the User, typically used by the user to directly authenticate",
            ),
            AttributeDefinition::simple(
                "displayName",
                AttributeType::String,
                false,
                "The name of the User, suitable for display to end-users",
            ),
            AttributeDefinition {
                sub_attributes: vec![AttributeDefinition::simple(
                    "formatted",
                    AttributeType::String,
                    false,
                    "The full name, formatted for display",
                )],
                ..AttributeDefinition::simple("name", AttributeType::Complex, false, "The components of the user's real name")
            },
            AttributeDefinition {
                multi_valued: true,
                sub_attributes: multi_valued_sub_attributes(AttributeType::String, false),
                ..AttributeDefinition::simple("emails", AttributeType::Complex, false, "Email addresses for the user")
            },
            AttributeDefinition {
                multi_valued: true,
                sub_attributes: multi_valued_sub_attributes(AttributeType::Reference, true),
                ..AttributeDefinition::simple("photos", AttributeType::Complex, false, "URLs of images of the user")
            },
            AttributeDefinition::simple(
                "active",
                AttributeType::Boolean,
                false,
                "A Boolean value indicating the User's administrative status",
            ),
            AttributeDefinition {
                returned: Returned::Always,
                sub_attributes: vec![
                    AttributeDefinition::simple("resourceType", AttributeType::String, true, "The resource type"),
                    AttributeDefinition::simple("created", AttributeType::DateTime, false, "When the resource was added"),
                    AttributeDefinition::simple(
                        "lastModified",
                        AttributeType::DateTime,
                        false,
                        "When the resource was last updated",
                    ),
                    AttributeDefinition::simple("location", AttributeType::Reference, true, "The URI of the resource"),
                ],
                ..AttributeDefinition::simple("meta", AttributeType::Complex, true, "Resource metadata")
            },
        ],
    };
}

/// Find attribute definition in schema
pub fn find_attribute<'a>(
    schema: &'a SchemaDefinition,
    attr_path: &str,
) -> Option<&'a AttributeDefinition> {
    let mut parts = attr_path.split('.');
    let first = parts.next()?;
    let mut current = schema
        .attributes
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(first))?;
    for part in parts {
        current = current.sub_attribute(part)?;
    }
    Some(current)
}

/// Top-level user attribute by name, ignoring case
pub fn user_attribute(name: &str) -> Option<&'static AttributeDefinition> {
    USER_SCHEMA
        .attributes
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(name))
}
