use crate::backend::{PermissionOracle, ResourceStore};
use crate::config::{AppConfig, QueryConfig, ResponseConfig};
use crate::error::{AppError, AppResult};
use crate::logging::QueryLog;
use crate::models::{EvaluationContext, ScimListResponse, UserRecord};
use crate::parser::{parse_attribute_path, AttributePath};
use crate::query::cache::FilterCache;
use crate::query::evaluator::{compare_numbers, unwrap_complex, Evaluator, ValueRules};
use crate::resource::{project_user, AttributeFilter};
use crate::schema::definitions::AttributeType;
use crate::schema::resolver::{resource_view, AttributeResolver, Resolution, ResolvedPath};
use crate::utils::parse_scim_datetime;
use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parameters of one list request, as received
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub filter: Option<String>,
    pub start_index: Option<i64>,
    pub count: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub attributes: Option<String>,
    pub excluded_attributes: Option<String>,
}

impl SearchRequest {
    /// Build a request from raw query-string pairs. Integers that do not
    /// parse are ignored.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            filter: params.get("filter").cloned(),
            start_index: params.get("startIndex").and_then(|s| s.trim().parse::<i64>().ok()),
            count: params.get("count").and_then(|s| s.trim().parse::<i64>().ok()),
            sort_by: params.get("sortBy").cloned(),
            sort_order: params.get("sortOrder").cloned(),
            attributes: params.get("attributes").cloned(),
            excluded_attributes: params.get("excludedAttributes").cloned(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: Option<&str>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = sort_order.map(str::to_string);
        self
    }

    pub fn with_page(mut self, start_index: i64, count: i64) -> Self {
        self.start_index = Some(start_index);
        self.count = Some(count);
        self
    }
}

/// Normalized 1-based page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub start_index: usize,
    pub count: usize,
}

impl Pagination {
    /// `startIndex < 1` becomes 1, a missing `count` takes the configured
    /// default, a negative one becomes 0, and any count is clamped to the
    /// configured maximum
    pub fn normalize(start_index: Option<i64>, count: Option<i64>, config: &QueryConfig) -> Self {
        let start_index = start_index.unwrap_or(1).max(1);
        let count = match count {
            Some(count) => usize::try_from(count.max(0)).unwrap_or(usize::MAX),
            None => config.default_count,
        };
        Self {
            start_index: usize::try_from(start_index).unwrap_or(usize::MAX),
            count: count.min(config.max_count),
        }
    }

    /// Slice bounds into a result set of `total` items
    pub fn window(&self, total: usize) -> Range<usize> {
        let start = (self.start_index - 1).min(total);
        let end = start.saturating_add(self.count).min(total);
        start..end
    }
}

/// Total match count plus the requested page of projected resources
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub total: usize,
    pub start_index: usize,
    pub resources: Vec<Value>,
}

impl QueryResult {
    pub fn into_list_response(self) -> ScimListResponse {
        ScimListResponse::new(self.total, self.start_index, self.resources)
    }
}

/// `sortOrder` query parameter; anything unrecognized sorts ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_param(s: &str) -> SortOrder {
        match s.trim().to_lowercase().as_str() {
            "descending" | "desc" => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

/// Comparable sort value; ordering across kinds is by kind first
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Bool(bool),
    Number(Number),
    Date(DateTime<Utc>),
    Text(String),
}

impl SortKey {
    fn from_value(value: &Value, rules: ValueRules) -> Option<SortKey> {
        match value {
            Value::Bool(b) => Some(SortKey::Bool(*b)),
            Value::Number(n) => Some(SortKey::Number(n.clone())),
            Value::String(s) => {
                if matches!(rules.attr_type, Some(AttributeType::DateTime) | None) {
                    if let Some(dt) = parse_scim_datetime(s) {
                        return Some(SortKey::Date(dt));
                    }
                }
                Some(SortKey::Text(if rules.case_exact {
                    s.clone()
                } else {
                    s.to_lowercase()
                }))
            }
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Bool(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Date(_) => 2,
            SortKey::Text(_) => 3,
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => {
                compare_numbers(a, b).unwrap_or(Ordering::Equal)
            }
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Missing keys sort after present ones in either direction
fn compare_keys(a: &Option<SortKey>, b: &Option<SortKey>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Ascending => a.compare(b),
            SortOrder::Descending => b.compare(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

struct SortPlan<'c> {
    path: AttributePath,
    resolved: ResolvedPath<'c>,
    order: SortOrder,
}

struct Candidate {
    record: UserRecord,
    key: Option<SortKey>,
}

/// Filters, sorts, paginates and projects users for one caller at a time.
/// Holds no per-request state; one engine serves concurrent requests.
pub struct QueryEngine {
    store: Arc<dyn ResourceStore>,
    oracle: Arc<dyn PermissionOracle>,
    query: QueryConfig,
    response: ResponseConfig,
    query_log: bool,
    cache: Arc<FilterCache>,
}

impl QueryEngine {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        oracle: Arc<dyn PermissionOracle>,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            query: config.query.clone(),
            response: config.response.clone(),
            query_log: config.logging.query_log,
            cache: Arc::new(FilterCache::new(config.query.filter_cache_capacity)),
        }
    }

    /// Share a parsed-filter cache with other engines in the process
    pub fn with_cache(mut self, cache: Arc<FilterCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<FilterCache> {
        &self.cache
    }

    /// List query with the plain parameter set: filter, sort and page
    pub async fn query(
        &self,
        filter: Option<&str>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        start_index: Option<i64>,
        count: Option<i64>,
        ctx: &EvaluationContext,
    ) -> AppResult<QueryResult> {
        let request = SearchRequest {
            filter: filter.map(str::to_string),
            start_index,
            count,
            sort_by: sort_by.map(str::to_string),
            sort_order: sort_order.map(str::to_string),
            ..SearchRequest::default()
        };
        self.search(&request, ctx).await
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
        ctx: &EvaluationContext,
    ) -> AppResult<QueryResult> {
        let page = Pagination::normalize(request.start_index, request.count, &self.query);
        let sort_by = request
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let sort_order = request
            .sort_order
            .as_deref()
            .map(SortOrder::from_param)
            .unwrap_or_default();
        let filter_text = request
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty());

        let log = QueryLog::start(self.query_log, filter_text, page.start_index, page.count);

        let filter = match filter_text {
            Some(text) => Some(self.cache.get_or_parse(text).map_err(|e| {
                debug!("Filter parsing error for '{}': {}", text, e);
                AppError::InvalidFilter(e)
            })?),
            None => None,
        };

        let catalog = self.store.catalog().await?;
        let records = self.store.list_all().await?;

        let resolver = AttributeResolver::new(&catalog, self.oracle.as_ref());
        let evaluator = Evaluator::new(&resolver, ctx);
        let sort_plan = sort_by.and_then(|attr| Self::plan_sort(attr, sort_order, &resolver, ctx));

        let mut matches: Vec<Candidate> = Vec::new();
        for record in records {
            let view = resource_view(&record);
            if let Some(node) = &filter {
                if !evaluator.evaluate(node, &view).is_match() {
                    continue;
                }
            }
            let key = match &sort_plan {
                Some(plan) => evaluator
                    .values(&view, &plan.path, &plan.resolved)
                    .first()
                    .and_then(|v| {
                        let rules = ValueRules::for_descriptor(&plan.resolved.descriptor);
                        SortKey::from_value(unwrap_complex(v), rules)
                    }),
                None => Some(SortKey::Date(record.created_at)),
            };
            matches.push(Candidate { record, key });
        }

        let order = sort_plan
            .as_ref()
            .map(|plan| plan.order)
            .unwrap_or_default();
        matches.sort_by(|a, b| {
            compare_keys(&a.key, &b.key, order).then_with(|| a.record.id.cmp(&b.record.id))
        });

        let total = matches.len();
        let selection = AttributeFilter::from_params(
            request.attributes.as_deref(),
            request.excluded_attributes.as_deref(),
        );

        let mut resources = Vec::with_capacity(page.window(total).len());
        for candidate in &matches[page.window(total)] {
            let user = project_user(&candidate.record, &resolver, ctx, &self.response);
            resources.push(selection.apply_to_resource(&serde_json::to_value(&user)?));
        }

        log.finish(&describe_sort(sort_plan.as_ref()), total, resources.len());
        Ok(QueryResult {
            total,
            start_index: page.start_index,
            resources,
        })
    }

    /// Resolve `sortBy`; anything unusable falls back to the default order
    fn plan_sort<'c>(
        sort_by: &str,
        order: SortOrder,
        resolver: &AttributeResolver<'c>,
        ctx: &EvaluationContext,
    ) -> Option<SortPlan<'c>> {
        let path = match parse_attribute_path(sort_by) {
            Ok(path) => path,
            Err(e) => {
                debug!("Unparsable sortBy '{}': {}", sort_by, e);
                warn!("sortBy is not a valid attribute path; using default order");
                return None;
            }
        };

        match resolver.resolve(&path, ctx) {
            Resolution::Resolved(resolved) => Some(SortPlan {
                path,
                resolved,
                order,
            }),
            Resolution::Unknown | Resolution::Denied => {
                debug!("sortBy '{}' does not resolve for this caller", sort_by);
                warn!("sortBy attribute is not sortable; using default order");
                None
            }
        }
    }
}

fn describe_sort(plan: Option<&SortPlan<'_>>) -> String {
    match plan {
        Some(plan) => format!("{} {}", plan.path, plan.order.as_str()),
        None => "default".to_string(),
    }
}
