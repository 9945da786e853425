use crate::models::{EvaluationContext, UserRecord};
use crate::parser::{AttributePath, CompareOp, FilterNode, Literal, LogicalOp};
use crate::query::tri_state::TriState;
use crate::schema::definitions::AttributeType;
use crate::schema::resolver::{
    resource_view, AttributeDescriptor, AttributeResolver, Resolution, ResolvedPath, Scope,
};
use crate::utils::parse_scim_datetime;
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Evaluates filter trees against resource views for one caller
pub struct Evaluator<'r, 'c> {
    resolver: &'r AttributeResolver<'c>,
    ctx: &'r EvaluationContext,
}

impl<'r, 'c> Evaluator<'r, 'c> {
    pub fn new(resolver: &'r AttributeResolver<'c>, ctx: &'r EvaluationContext) -> Self {
        Self { resolver, ctx }
    }

    /// Evaluate `node` against a view built by [`resource_view`]
    pub fn evaluate(&self, node: &FilterNode, view: &Value) -> TriState {
        self.evaluate_in(Scope::Root, node, view)
    }

    fn evaluate_in(&self, scope: Scope<'c>, node: &FilterNode, root: &Value) -> TriState {
        match node {
            FilterNode::Comparison { path, op, value } => {
                self.compare(scope, path, *op, value.as_ref(), root)
            }
            FilterNode::Logical { op, left, right } => {
                let left = self.evaluate_in(scope, left, root);
                match op {
                    LogicalOp::And if left == TriState::False => TriState::False,
                    LogicalOp::Or if left == TriState::True => TriState::True,
                    LogicalOp::And => left.and(self.evaluate_in(scope, right, root)),
                    LogicalOp::Or => left.or(self.evaluate_in(scope, right, root)),
                }
            }
            FilterNode::Negation(operand) => self.evaluate_in(scope, operand, root).negate(),
        }
    }

    fn compare(
        &self,
        scope: Scope<'c>,
        path: &AttributePath,
        op: CompareOp,
        literal: Option<&Literal>,
        root: &Value,
    ) -> TriState {
        let resolved = match self.resolver.resolve_in(scope, path, self.ctx) {
            Resolution::Unknown => return TriState::False,
            Resolution::Denied => return TriState::Denied,
            Resolution::Resolved(resolved) => resolved,
        };
        let values = self.values(root, path, &resolved);

        let matched = match (op, literal) {
            (CompareOp::Pr, _) => values.iter().any(|v| is_present(v)),
            (_, Some(literal)) => {
                let rules = ValueRules::for_descriptor(&resolved.descriptor);
                values
                    .iter()
                    .any(|v| rules.matches(op, unwrap_complex(v), literal))
            }
            (_, None) => false,
        };
        matched.into()
    }

    /// Values at `path` in `root`. Multi-valued attributes are flattened
    /// and narrowed by any sub-filter attached to their segment.
    pub fn values<'v>(
        &self,
        root: &'v Value,
        path: &AttributePath,
        resolved: &ResolvedPath<'c>,
    ) -> Vec<&'v Value> {
        let mut current = vec![root];

        for (segment, step) in path.segments.iter().zip(&resolved.steps) {
            let mut next = Vec::new();
            for value in current {
                match value.get(step.key.as_str()) {
                    Some(Value::Array(items)) => next.extend(items.iter()),
                    Some(child) => next.push(child),
                    None => {}
                }
            }
            if let (Some(filter), Some(scope)) = (&segment.filter, step.filter_scope) {
                next.retain(|element| self.evaluate_in(scope, filter, element).is_match());
            }
            current = next;
        }

        current.retain(|v| !v.is_null());
        current
    }
}

/// Evaluate `node` against a single record
pub fn evaluate(
    node: &FilterNode,
    record: &UserRecord,
    resolver: &AttributeResolver<'_>,
    ctx: &EvaluationContext,
) -> TriState {
    Evaluator::new(resolver, ctx).evaluate(node, &resource_view(record))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        _ => true,
    }
}

/// A comparison against a complex value (`emails co "x"`) applies to its
/// `value` sub-attribute
pub(crate) fn unwrap_complex(value: &Value) -> &Value {
    match value {
        Value::Object(fields) => fields.get("value").unwrap_or(value),
        _ => value,
    }
}

/// Case rule and declared type for the values a comparison looks at
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueRules {
    pub case_exact: bool,
    pub attr_type: Option<AttributeType>,
}

impl ValueRules {
    pub(crate) fn for_descriptor(descriptor: &AttributeDescriptor<'_>) -> Self {
        if let AttributeDescriptor::Fixed(def) = descriptor {
            if let Some(value) = def.is_complex().then(|| def.sub_attribute("value")).flatten() {
                return Self {
                    case_exact: value.case_exact,
                    attr_type: Some(value.attr_type),
                };
            }
        }
        Self {
            case_exact: descriptor.case_exact(),
            attr_type: descriptor.attr_type(),
        }
    }

    fn fold<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if self.case_exact {
            Cow::Borrowed(s)
        } else {
            Cow::Owned(s.to_lowercase())
        }
    }

    fn matches(&self, op: CompareOp, value: &Value, literal: &Literal) -> bool {
        match op {
            CompareOp::Eq => self.equality(value, literal) == Some(true),
            CompareOp::Ne => self.equality(value, literal) == Some(false),
            CompareOp::Co | CompareOp::Sw | CompareOp::Ew => {
                let (Some(v), Some(l)) = (value.as_str(), literal.as_str()) else {
                    return false;
                };
                let (v, l) = (self.fold(v), self.fold(l));
                match op {
                    CompareOp::Co => v.contains(l.as_ref()),
                    CompareOp::Sw => v.starts_with(l.as_ref()),
                    _ => v.ends_with(l.as_ref()),
                }
            }
            CompareOp::Gt => self.ordering(value, literal) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(
                self.ordering(value, literal),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Lt => self.ordering(value, literal) == Some(Ordering::Less),
            CompareOp::Le => matches!(
                self.ordering(value, literal),
                Some(Ordering::Less | Ordering::Equal)
            ),
            CompareOp::Pr => is_present(value),
        }
    }

    /// `None` when the value and literal are of incomparable types
    fn equality(&self, value: &Value, literal: &Literal) -> Option<bool> {
        match (value, literal) {
            (Value::String(v), Literal::String(l)) => match self.datetimes(v, l) {
                Some((v, l)) => Some(v == l),
                None => Some(self.fold(v) == self.fold(l)),
            },
            (Value::Number(v), Literal::Number(l)) => Some(compare_numbers(v, l)? == Ordering::Equal),
            (Value::Bool(v), Literal::Boolean(l)) => Some(v == l),
            _ => None,
        }
    }

    fn ordering(&self, value: &Value, literal: &Literal) -> Option<Ordering> {
        match (value, literal) {
            (Value::Number(v), Literal::Number(l)) => compare_numbers(v, l),
            (Value::String(v), Literal::String(l)) => match self.datetimes(v, l) {
                Some((v, l)) => Some(v.cmp(&l)),
                // An unparsable side of a declared dateTime never orders as text
                None if matches!(
                    self.attr_type,
                    Some(AttributeType::Boolean | AttributeType::DateTime)
                ) =>
                {
                    None
                }
                None => Some(self.fold(v).cmp(&self.fold(l))),
            },
            _ => None,
        }
    }

    /// Both sides as instants, for declared dateTime attributes and for
    /// untyped dynamic values that both parse as RFC 3339
    fn datetimes(
        &self,
        value: &str,
        literal: &str,
    ) -> Option<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)> {
        match self.attr_type {
            Some(AttributeType::DateTime) | None => {
                Some((parse_scim_datetime(value)?, parse_scim_datetime(literal)?))
            }
            _ => None,
        }
    }
}

/// Orders two JSON numbers exactly while both are integers; falls back to
/// f64 only when either side is a float
pub(crate) fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64()?.partial_cmp(&b.as_f64()?);
    }
    // One side exceeds i64, so any integer that fits in u64 is the larger one
    match (a.as_u64(), b.as_u64()) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        (Some(_), None) => Some(Ordering::Greater),
        (None, Some(_)) => Some(Ordering::Less),
        (None, None) => None,
    }
}
