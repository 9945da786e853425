#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use scim_query::backend::{InMemoryStore, SuperuserPolicy};
use scim_query::config::AppConfig;
use scim_query::models::{AttributeDeclaration, EvaluationContext, TagDeclaration, UserRecord};
use scim_query::query::{QueryEngine, QueryResult};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Default configuration with the per-query log line switched off
pub fn create_test_app_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.logging.query_log = false;
    config
}

/// A user created `minutes` after 2025-01-01T00:00:00Z
pub fn create_test_user(username: &str, email: &str, minutes: i64) -> UserRecord {
    let mut user = UserRecord::new(username, email);
    user.created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
    user
}

pub fn declare_attribute(key: &str, case_exact: bool, view_requires_superuser: bool) -> AttributeDeclaration {
    AttributeDeclaration {
        key: key.to_string(),
        title: None,
        case_exact,
        edit_requires_superuser: view_requires_superuser,
        view_requires_superuser,
    }
}

pub fn declare_tag(code: &str, title: &str, view_requires_superuser: bool) -> TagDeclaration {
    TagDeclaration {
        code: code.to_string(),
        title: title.to_string(),
        description: None,
        edit_requires_superuser: view_requires_superuser,
        view_requires_superuser,
    }
}

/// Store with the standard declarations:
/// `department` (case-insensitive, open), `salary` (superuser only),
/// tag `vip` (superuser only), tag `beta` (open)
pub async fn setup_test_store(users: Vec<UserRecord>) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.declare_attribute(declare_attribute("department", false, false)).await;
    store.declare_attribute(declare_attribute("salary", true, true)).await;
    store.declare_tag(declare_tag("vip", "VIP", true)).await;
    store.declare_tag(declare_tag("beta", "Beta tester", false)).await;
    for user in users {
        store.upsert_user(user).await;
    }
    store
}

pub async fn setup_test_engine(config: &AppConfig, users: Vec<UserRecord>) -> QueryEngine {
    let store = setup_test_store(users).await;
    QueryEngine::new(store, Arc::new(SuperuserPolicy), config)
}

/// john@example.com and jane@corp.com, john created first
pub fn john_and_jane() -> Vec<UserRecord> {
    let mut john = create_test_user("john", "john@example.com", 0);
    john.full_name = Some("John Smith".to_string());
    john.attributes.insert("department".to_string(), json!("Sales"));
    john.attributes.insert("salary".to_string(), json!(90000));
    john.tags.insert("vip".to_string());

    let mut jane = create_test_user("jane", "jane@corp.com", 1);
    jane.full_name = Some("Jane Doe".to_string());
    jane.is_active = false;
    jane.attributes.insert("department".to_string(), json!("Engineering"));
    jane.attributes.insert("salary".to_string(), json!(120000));
    jane.tags.insert("beta".to_string());

    vec![john, jane]
}

/// `count` users named user01, user02, ... created one minute apart
pub fn numbered_users(count: usize) -> Vec<UserRecord> {
    (1..=count)
        .map(|i| {
            create_test_user(
                &format!("user{:02}", i),
                &format!("user{:02}@example.com", i),
                i as i64,
            )
        })
        .collect()
}

pub fn user_ctx() -> EvaluationContext {
    EvaluationContext::user(Uuid::new_v4())
}

pub fn admin_ctx() -> EvaluationContext {
    EvaluationContext::superuser(Uuid::new_v4())
}

pub fn user_names(result: &QueryResult) -> Vec<String> {
    result
        .resources
        .iter()
        .map(|r| r["userName"].as_str().unwrap_or_default().to_string())
        .collect()
}
