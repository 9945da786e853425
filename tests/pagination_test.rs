use scim_query::models::SCIM_API_MESSAGES_LIST_RESPONSE;
use scim_query::query::SearchRequest;
use serde_json::json;
use std::collections::HashSet;

mod common;

#[tokio::test]
async fn test_default_page_returns_everything() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(5)).await;

    let result = engine
        .query(None, None, None, None, None, &common::user_ctx())
        .await
        .unwrap();

    assert_eq!(result.total, 5);
    assert_eq!(result.start_index, 1);
    assert_eq!(
        common::user_names(&result),
        vec!["user01", "user02", "user03", "user04", "user05"]
    );
}

#[tokio::test]
async fn test_start_index_zero_behaves_like_one() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(5)).await;
    let ctx = common::user_ctx();

    let zero = engine
        .query(None, None, None, Some(0), Some(2), &ctx)
        .await
        .unwrap();
    let one = engine
        .query(None, None, None, Some(1), Some(2), &ctx)
        .await
        .unwrap();

    assert_eq!(zero.start_index, 1);
    assert_eq!(common::user_names(&zero), common::user_names(&one));
}

#[tokio::test]
async fn test_count_zero_returns_total_only() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(5)).await;

    let result = engine
        .query(Some(r#"userName sw "user""#), None, None, None, Some(0), &common::user_ctx())
        .await
        .unwrap();

    assert_eq!(result.total, 5);
    assert!(result.resources.is_empty());
}

#[tokio::test]
async fn test_negative_count_is_treated_as_zero() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(3)).await;

    let result = engine
        .query(None, None, None, None, Some(-4), &common::user_ctx())
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert!(result.resources.is_empty());
}

#[tokio::test]
async fn test_count_is_clamped_to_configured_maximum() {
    let mut config = common::create_test_app_config();
    config.query.max_count = 3;
    let engine = common::setup_test_engine(&config, common::numbered_users(10)).await;

    let result = engine
        .query(None, None, None, None, Some(1_000_000), &common::user_ctx())
        .await
        .unwrap();
    assert_eq!(result.total, 10);
    assert_eq!(result.resources.len(), 3);

    let result = engine
        .query(None, None, None, None, None, &common::user_ctx())
        .await
        .unwrap();
    assert_eq!(result.resources.len(), 3);
}

#[tokio::test]
async fn test_start_index_past_end_returns_empty_page() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(3)).await;

    let result = engine
        .query(None, None, None, Some(10), Some(5), &common::user_ctx())
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.start_index, 10);
    assert!(result.resources.is_empty());
}

#[tokio::test]
async fn test_consecutive_pages_cover_results_without_overlap() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(7)).await;
    let ctx = common::user_ctx();

    let mut seen = Vec::new();
    let mut start = 1;
    loop {
        let page = engine
            .query(None, Some("userName"), Some("descending"), Some(start), Some(3), &ctx)
            .await
            .unwrap();
        assert_eq!(page.total, 7);
        if page.resources.is_empty() {
            break;
        }
        seen.extend(common::user_names(&page));
        start += 3;
    }

    assert_eq!(seen.len(), 7);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 7);
    assert_eq!(seen.first().map(String::as_str), Some("user07"));
    assert_eq!(seen.last().map(String::as_str), Some("user01"));
}

#[tokio::test]
async fn test_repeated_queries_are_deterministic() {
    let config = common::create_test_app_config();
    let mut users = common::numbered_users(6);
    // Same sort key everywhere; only the id tie-break orders them
    for user in &mut users {
        user.attributes.insert("department".to_string(), json!("Sales"));
    }
    let engine = common::setup_test_engine(&config, users).await;
    let ctx = common::user_ctx();

    let first = engine
        .query(None, Some("attributes.department"), None, Some(2), Some(3), &ctx)
        .await
        .unwrap();
    for _ in 0..5 {
        let again = engine
            .query(None, Some("attributes.department"), None, Some(2), Some(3), &ctx)
            .await
            .unwrap();
        assert_eq!(again, first);
    }
}

#[tokio::test]
async fn test_list_response_shape() {
    let config = common::create_test_app_config();
    let engine = common::setup_test_engine(&config, common::numbered_users(4)).await;

    let request = SearchRequest::default().with_page(2, 2);
    let response = engine
        .search(&request, &common::user_ctx())
        .await
        .unwrap()
        .into_list_response();
    let body = serde_json::to_value(&response).unwrap();

    assert_eq!(body["schemas"], json!([SCIM_API_MESSAGES_LIST_RESPONSE]));
    assert_eq!(body["totalResults"], 4);
    assert_eq!(body["startIndex"], 2);
    assert_eq!(body["itemsPerPage"], 2);
    assert_eq!(body["Resources"][0]["userName"], "user02");
    assert_eq!(body["Resources"][1]["userName"], "user03");
}
