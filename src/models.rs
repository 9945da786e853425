use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

use crate::schema::definitions::SCIM_SCHEMA_CORE_USER;

pub const SCIM_API_MESSAGES_LIST_RESPONSE: &str =
    "urn:ietf:params:scim:api:messages:2.0:ListResponse";

fn default_true() -> bool {
    true
}

/// A user as handed over by the resource store: fixed columns plus the
/// dynamic attribute values and tag codes assigned to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Dynamic attribute values keyed by declaration key
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Codes of the tags assigned to the user
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            full_name: None,
            is_active: true,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: None,
            attributes: BTreeMap::new(),
            tags: BTreeSet::new(),
        }
    }

    /// The single work email, as the SCIM `emails` collection
    pub fn scim_emails(&self) -> Vec<ScimMultiValue> {
        vec![ScimMultiValue {
            value: self.email.clone(),
            value_type: "work".to_string(),
            primary: true,
        }]
    }

    /// The avatar as the SCIM `photos` collection; an avatar that is not
    /// an absolute http(s) URL is left out
    pub fn scim_photos(&self) -> Vec<ScimMultiValue> {
        self.avatar_url
            .as_deref()
            .filter(|raw| {
                url::Url::parse(raw)
                    .map(|u| matches!(u.scheme(), "http" | "https"))
                    .unwrap_or(false)
            })
            .map(|raw| ScimMultiValue {
                value: raw.to_string(),
                value_type: "photo".to_string(),
                primary: true,
            })
            .into_iter()
            .collect()
    }
}

/// Declaration of a dynamic attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDeclaration {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    /// String comparisons on this attribute are case-sensitive unless cleared
    #[serde(default = "default_true")]
    pub case_exact: bool,
    #[serde(default)]
    pub edit_requires_superuser: bool,
    #[serde(default)]
    pub view_requires_superuser: bool,
}

/// Declaration of a tag users can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDeclaration {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub edit_requires_superuser: bool,
    #[serde(default)]
    pub view_requires_superuser: bool,
}

/// A declared attribute or tag, as presented to the permission oracle
#[derive(Debug, Clone, Copy)]
pub enum DeclaredKey<'a> {
    Attribute(&'a AttributeDeclaration),
    Tag(&'a TagDeclaration),
}

impl<'a> DeclaredKey<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            DeclaredKey::Attribute(a) => &a.key,
            DeclaredKey::Tag(t) => &t.code,
        }
    }

    pub fn view_requires_superuser(&self) -> bool {
        match self {
            DeclaredKey::Attribute(a) => a.view_requires_superuser,
            DeclaredKey::Tag(t) => t.view_requires_superuser,
        }
    }

    pub fn edit_requires_superuser(&self) -> bool {
        match self {
            DeclaredKey::Attribute(a) => a.edit_requires_superuser,
            DeclaredKey::Tag(t) => t.edit_requires_superuser,
        }
    }
}

/// Snapshot of the declared attributes and tags, taken once per request
#[derive(Debug, Clone, Default)]
pub struct AttributeCatalog {
    attributes: HashMap<String, AttributeDeclaration>,
    tags: HashMap<String, TagDeclaration>,
}

impl AttributeCatalog {
    pub fn new(attributes: Vec<AttributeDeclaration>, tags: Vec<TagDeclaration>) -> Self {
        Self {
            attributes: attributes.into_iter().map(|a| (a.key.clone(), a)).collect(),
            tags: tags.into_iter().map(|t| (t.code.clone(), t)).collect(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeDeclaration> {
        self.attributes.get(key)
    }

    pub fn tag(&self, code: &str) -> Option<&TagDeclaration> {
        self.tags.get(code)
    }

    pub fn declare_attribute(&mut self, declaration: AttributeDeclaration) {
        self.attributes.insert(declaration.key.clone(), declaration);
    }

    pub fn declare_tag(&mut self, declaration: TagDeclaration) {
        self.tags.insert(declaration.code.clone(), declaration);
    }
}

/// Who is asking. Supplied once per request and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    pub caller_id: Option<Uuid>,
    pub is_superuser: bool,
}

impl EvaluationContext {
    pub fn user(caller_id: Uuid) -> Self {
        Self {
            caller_id: Some(caller_id),
            is_superuser: false,
        }
    }

    pub fn superuser(caller_id: Uuid) -> Self {
        Self {
            caller_id: Some(caller_id),
            is_superuser: true,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScimMultiValue {
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub primary: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScimName {
    pub formatted: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScimMeta {
    pub resource_type: String,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    pub location: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScimTag {
    pub value: String,
    pub display: String,
}

/// Caller-visible SCIM representation of a user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    pub schemas: Vec<String>,
    pub id: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<ScimName>,
    pub emails: Vec<ScimMultiValue>,
    pub active: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub photos: Vec<ScimMultiValue>,
    pub meta: ScimMeta,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<ScimTag>,
}

impl ScimUser {
    pub fn core_schemas() -> Vec<String> {
        vec![SCIM_SCHEMA_CORE_USER.to_string()]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScimListResponse {
    pub schemas: Vec<String>,
    #[serde(rename = "totalResults")]
    pub total_results: i64,
    #[serde(rename = "startIndex")]
    pub start_index: i64,
    #[serde(rename = "itemsPerPage")]
    pub items_per_page: i64,
    #[serde(rename = "Resources")]
    pub resources: Vec<Value>,
}

impl ScimListResponse {
    pub fn new(total_results: usize, start_index: usize, resources: Vec<Value>) -> Self {
        Self {
            schemas: vec![SCIM_API_MESSAGES_LIST_RESPONSE.to_string()],
            total_results: total_results as i64,
            start_index: start_index as i64,
            items_per_page: resources.len() as i64,
            resources,
        }
    }
}
