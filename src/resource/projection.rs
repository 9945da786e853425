use crate::config::ResponseConfig;
use crate::models::{
    DeclaredKey, EvaluationContext, ScimMeta, ScimName, ScimTag, ScimUser, UserRecord,
};
use crate::schema::resolver::AttributeResolver;
use crate::utils::format_datetime_with_type;
use std::collections::BTreeMap;

/// Caller-visible representation of `record`.
///
/// Dynamic attributes and tags go through the same catalog and permission
/// oracle as filter resolution, so anything a filter sees as denied is
/// omitted here and anything omitted here is denied to filters. Values of
/// undeclared keys are never shown.
pub fn project_user(
    record: &UserRecord,
    resolver: &AttributeResolver<'_>,
    ctx: &EvaluationContext,
    response: &ResponseConfig,
) -> ScimUser {
    let catalog = resolver.catalog();
    let id = record.id.to_string();
    let datetime_format = response.meta_datetime_format.as_str();

    let attributes: BTreeMap<String, serde_json::Value> = record
        .attributes
        .iter()
        .filter(|(key, _)| {
            catalog
                .attribute(key)
                .is_some_and(|decl| resolver.can_view(ctx, DeclaredKey::Attribute(decl)))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let tags: Vec<ScimTag> = record
        .tags
        .iter()
        .filter_map(|code| catalog.tag(code))
        .filter(|decl| resolver.can_view(ctx, DeclaredKey::Tag(decl)))
        .map(|decl| ScimTag {
            value: decl.code.clone(),
            display: decl.title.clone(),
        })
        .collect();

    ScimUser {
        schemas: ScimUser::core_schemas(),
        user_name: record.username.clone(),
        display_name: record.full_name.clone(),
        name: record.full_name.as_ref().map(|formatted| ScimName {
            formatted: formatted.clone(),
        }),
        emails: record.scim_emails(),
        active: record.is_active,
        photos: record.scim_photos(),
        meta: ScimMeta {
            resource_type: "User".to_string(),
            created: format_datetime_with_type(record.created_at, datetime_format),
            last_modified: Some(format_datetime_with_type(
                record.updated_at.unwrap_or(record.created_at),
                datetime_format,
            )),
            location: response.user_location(&id),
        },
        id,
        attributes,
        tags,
    }
}
