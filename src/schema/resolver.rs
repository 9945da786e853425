//! Binding of filter attribute paths to user data.
//!
//! A path resolves to a fixed schema attribute, a declared dynamic
//! attribute (`attributes.<key>...`) or a declared tag (`tags.<code>`).
//! Dynamic attributes and tags are checked against the permission oracle
//! here, so callers only ever see `Denied` and never the reason.

use crate::backend::PermissionOracle;
use crate::models::{
    AttributeCatalog, AttributeDeclaration, DeclaredKey, EvaluationContext, TagDeclaration,
    UserRecord,
};
use crate::parser::AttributePath;
use crate::schema::definitions::{user_attribute, AttributeDefinition, AttributeType};
use crate::utils::format_scim_datetime;
use serde_json::{json, Map, Value};

/// Container of dynamic attribute values in the resource view
pub const ATTRIBUTES_CONTAINER: &str = "attributes";
/// Container of carried tags in the resource view
pub const TAGS_CONTAINER: &str = "tags";

/// What a relative path inside a `[...]` sub-filter is resolved against
#[derive(Debug, Clone, Copy)]
pub enum Scope<'c> {
    Root,
    Fixed(&'static AttributeDefinition),
    Dynamic(&'c AttributeDeclaration),
}

#[derive(Debug, Clone, Copy)]
pub enum AttributeDescriptor<'c> {
    Fixed(&'static AttributeDefinition),
    Attribute(&'c AttributeDeclaration),
    Tag(&'c TagDeclaration),
}

impl AttributeDescriptor<'_> {
    pub fn case_exact(&self) -> bool {
        match self {
            AttributeDescriptor::Fixed(def) => def.case_exact,
            AttributeDescriptor::Attribute(decl) => decl.case_exact,
            AttributeDescriptor::Tag(_) => true,
        }
    }

    /// Declared type, when the schema knows it. Dynamic attribute values
    /// carry whatever JSON type they were stored with.
    pub fn attr_type(&self) -> Option<AttributeType> {
        match self {
            AttributeDescriptor::Fixed(def) => Some(def.attr_type),
            AttributeDescriptor::Attribute(_) => None,
            AttributeDescriptor::Tag(_) => Some(AttributeType::Boolean),
        }
    }
}

/// One path segment bound to its key in the resource view
#[derive(Debug, Clone)]
pub struct Step<'c> {
    pub key: String,
    /// Scope for a sub-filter attached to this segment; `None` when the
    /// segment cannot carry one
    pub filter_scope: Option<Scope<'c>>,
}

#[derive(Debug, Clone)]
pub struct ResolvedPath<'c> {
    pub descriptor: AttributeDescriptor<'c>,
    /// One step per path segment, in order
    pub steps: Vec<Step<'c>>,
}

#[derive(Debug, Clone)]
pub enum Resolution<'c> {
    Resolved(ResolvedPath<'c>),
    Denied,
    Unknown,
}

impl<'c> Resolution<'c> {
    pub fn is_denied(&self) -> bool {
        matches!(self, Resolution::Denied)
    }
}

pub struct AttributeResolver<'c> {
    catalog: &'c AttributeCatalog,
    oracle: &'c dyn PermissionOracle,
}

impl<'c> AttributeResolver<'c> {
    pub fn new(catalog: &'c AttributeCatalog, oracle: &'c dyn PermissionOracle) -> Self {
        Self { catalog, oracle }
    }

    pub fn catalog(&self) -> &'c AttributeCatalog {
        self.catalog
    }

    pub fn can_view(&self, ctx: &EvaluationContext, key: DeclaredKey<'_>) -> bool {
        self.oracle.can_view(ctx, key)
    }

    /// Resolve a path written at the top level of a filter
    pub fn resolve(&self, path: &AttributePath, ctx: &EvaluationContext) -> Resolution<'c> {
        self.resolve_in(Scope::Root, path, ctx)
    }

    pub fn resolve_in(
        &self,
        scope: Scope<'c>,
        path: &AttributePath,
        ctx: &EvaluationContext,
    ) -> Resolution<'c> {
        let Some(first) = path.segments.first() else {
            return Resolution::Unknown;
        };

        match scope {
            Scope::Root if first.name.eq_ignore_ascii_case(ATTRIBUTES_CONTAINER) => {
                self.resolve_attribute(path, ctx)
            }
            Scope::Root if first.name.eq_ignore_ascii_case(TAGS_CONTAINER) => {
                self.resolve_tag(path, ctx)
            }
            Scope::Root => match user_attribute(&first.name) {
                Some(def) => resolve_fixed(def, path),
                None => Resolution::Unknown,
            },
            Scope::Fixed(parent) => match parent.sub_attribute(&first.name) {
                Some(def) => resolve_fixed(def, path),
                None => Resolution::Unknown,
            },
            Scope::Dynamic(decl) => {
                if !self.oracle.can_view(ctx, DeclaredKey::Attribute(decl)) {
                    return Resolution::Denied;
                }
                let steps = path
                    .segments
                    .iter()
                    .map(|s| Step {
                        key: s.name.clone(),
                        filter_scope: Some(Scope::Dynamic(decl)),
                    })
                    .collect();
                Resolution::Resolved(ResolvedPath {
                    descriptor: AttributeDescriptor::Attribute(decl),
                    steps,
                })
            }
        }
    }

    fn resolve_attribute(&self, path: &AttributePath, ctx: &EvaluationContext) -> Resolution<'c> {
        let segments = &path.segments;
        if segments.len() < 2 || segments[0].filter.is_some() {
            return Resolution::Unknown;
        }
        let Some(decl) = self.catalog.attribute(&segments[1].name) else {
            return Resolution::Unknown;
        };
        if !self.oracle.can_view(ctx, DeclaredKey::Attribute(decl)) {
            return Resolution::Denied;
        }

        let mut steps = vec![Step {
            key: ATTRIBUTES_CONTAINER.to_string(),
            filter_scope: None,
        }];
        steps.extend(segments[1..].iter().map(|s| Step {
            key: s.name.clone(),
            filter_scope: Some(Scope::Dynamic(decl)),
        }));
        Resolution::Resolved(ResolvedPath {
            descriptor: AttributeDescriptor::Attribute(decl),
            steps,
        })
    }

    fn resolve_tag(&self, path: &AttributePath, ctx: &EvaluationContext) -> Resolution<'c> {
        let segments = &path.segments;
        if segments.len() != 2 || path.has_sub_filter() {
            return Resolution::Unknown;
        }
        let Some(decl) = self.catalog.tag(&segments[1].name) else {
            return Resolution::Unknown;
        };
        if !self.oracle.can_view(ctx, DeclaredKey::Tag(decl)) {
            return Resolution::Denied;
        }
        Resolution::Resolved(ResolvedPath {
            descriptor: AttributeDescriptor::Tag(decl),
            steps: vec![
                Step {
                    key: TAGS_CONTAINER.to_string(),
                    filter_scope: None,
                },
                Step {
                    key: decl.code.clone(),
                    filter_scope: None,
                },
            ],
        })
    }
}

/// Walk fixed definitions starting at `first`, which matched the first
/// segment of `path`
fn resolve_fixed<'c>(first: &'static AttributeDefinition, path: &AttributePath) -> Resolution<'c> {
    let mut current = first;
    let mut steps = Vec::with_capacity(path.segments.len());

    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            match current.sub_attribute(&segment.name) {
                Some(def) => current = def,
                None => return Resolution::Unknown,
            }
        }
        let filter_scope = current.is_complex().then_some(Scope::Fixed(current));
        if segment.filter.is_some() && filter_scope.is_none() {
            return Resolution::Unknown;
        }
        steps.push(Step {
            key: current.name.to_string(),
            filter_scope,
        });
    }

    Resolution::Resolved(ResolvedPath {
        descriptor: AttributeDescriptor::Fixed(current),
        steps,
    })
}

/// JSON view of a record keyed by SCIM attribute names. Paths resolved by
/// [`AttributeResolver`] are walked over this view.
pub fn resource_view(record: &UserRecord) -> Value {
    let tags: Map<String, Value> = record
        .tags
        .iter()
        .map(|code| (code.clone(), Value::Bool(true)))
        .collect();

    let mut view = json!({
        "id": record.id.to_string(),
        "userName": record.username,
        "emails": record.scim_emails(),
        "photos": record.scim_photos(),
        "active": record.is_active,
        "meta": {
            "resourceType": "User",
            "created": format_scim_datetime(record.created_at),
            "lastModified": format_scim_datetime(record.updated_at.unwrap_or(record.created_at)),
        },
        ATTRIBUTES_CONTAINER: record.attributes,
        TAGS_CONTAINER: tags,
    });

    if let Some(full_name) = &record.full_name {
        view["displayName"] = json!(full_name);
        view["name"] = json!({ "formatted": full_name });
    }
    view
}
