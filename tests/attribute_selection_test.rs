use scim_query::query::SearchRequest;
use std::collections::HashMap;

mod common;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_attributes_parameter_limits_returned_fields() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::john_and_jane()).await;

    let request = SearchRequest::from_params(&params(&[
        ("filter", r#"userName eq "john""#),
        ("attributes", "userName,emails.value"),
    ]));
    let result = engine.search(&request, &common::user_ctx()).await.unwrap();
    let john = &result.resources[0];

    assert_eq!(john["userName"], "john");
    assert_eq!(john["emails"][0]["value"], "john@example.com");
    assert!(john["emails"][0].get("type").is_none());
    assert!(john.get("displayName").is_none());
    assert!(john.get("active").is_none());
    // always returned
    assert!(john.get("id").is_some());
    assert!(john.get("meta").is_some());
    assert!(john.get("schemas").is_some());
}

#[tokio::test]
async fn test_excluded_attributes_parameter_drops_fields() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::john_and_jane()).await;

    let request = SearchRequest::from_params(&params(&[
        ("filter", r#"userName eq "jane""#),
        ("excludedAttributes", "emails,attributes,id"),
    ]));
    let result = engine.search(&request, &common::user_ctx()).await.unwrap();
    let jane = &result.resources[0];

    assert!(jane.get("emails").is_none());
    assert!(jane.get("attributes").is_none());
    assert_eq!(jane["userName"], "jane");
    assert!(jane.get("id").is_some());
}

#[tokio::test]
async fn test_schema_qualified_attribute_names() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::john_and_jane()).await;

    let request = SearchRequest::from_params(&params(&[(
        "attributes",
        "urn:ietf:params:scim:schemas:core:2.0:User:displayName",
    )]));
    let result = engine.search(&request, &common::user_ctx()).await.unwrap();

    assert_eq!(result.total, 2);
    for resource in &result.resources {
        assert!(resource.get("displayName").is_some());
        assert!(resource.get("userName").is_none());
    }
}

#[tokio::test]
async fn test_selection_cannot_reveal_restricted_attributes() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::john_and_jane()).await;

    let request = SearchRequest::from_params(&params(&[("attributes", "attributes.salary,tags")]));
    let result = engine.search(&request, &common::user_ctx()).await.unwrap();

    for resource in &result.resources {
        assert!(resource.get("attributes").is_none());
    }
    // jane carries the open beta tag
    let tagged = result
        .resources
        .iter()
        .filter(|r| r.get("tags").is_some())
        .count();
    assert_eq!(tagged, 1);
}

#[tokio::test]
async fn test_meta_reflects_response_config() {
    let mut config = common::create_test_app_config();
    config.response.base_url = "https://scim.example.com/scim/v2/".to_string();
    let engine = common::setup_test_engine(&config, common::john_and_jane()).await;

    let result = engine
        .query(Some(r#"userName eq "john""#), None, None, None, None, &common::user_ctx())
        .await
        .unwrap();
    let john = &result.resources[0];
    let id = john["id"].as_str().unwrap();

    assert_eq!(john["meta"]["resourceType"], "User");
    assert_eq!(
        john["meta"]["location"],
        format!("https://scim.example.com/scim/v2/Users/{}", id)
    );
    assert_eq!(john["meta"]["created"], john["meta"]["lastModified"]);
}
