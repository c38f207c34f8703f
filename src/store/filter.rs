//! Filter and ordering descriptions shared by every store

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

use bilingual_cms_postgrest::{PostgrestClient, SortOrder};

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// Not equal to
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Like (case sensitive, `%` wildcard)
    Like,
    /// Like (case insensitive)
    ILike,
    IsNull,
    NotNull,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::ILike => "ilike",
            FilterOperator::IsNull => "is",
            FilterOperator::NotNull => "not.is",
        }
    }
}

/// A single column predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    pub fn new(column: &str, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOperator::Eq, value)
    }

    pub fn neq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOperator::Neq, value)
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOperator::Gte, value)
    }

    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOperator::Lte, value)
    }

    pub fn ilike(column: &str, pattern: &str) -> Self {
        Self::new(column, FilterOperator::ILike, pattern)
    }

    pub fn is_null(column: &str) -> Self {
        Self::new(column, FilterOperator::IsNull, Value::Null)
    }

    pub fn not_null(column: &str) -> Self {
        Self::new(column, FilterOperator::NotNull, Value::Null)
    }

    /// Value as it goes on the wire
    pub fn wire_value(&self) -> String {
        value_to_param(&self.value)
    }

    /// Evaluate against a row held in memory.
    pub fn matches(&self, row: &Value) -> bool {
        let field = row.get(&self.column).unwrap_or(&Value::Null);
        match self.operator {
            FilterOperator::IsNull => field.is_null(),
            FilterOperator::NotNull => !field.is_null(),
            FilterOperator::Eq => !field.is_null() && compare(field, &self.value) == Ordering::Equal,
            FilterOperator::Neq => !field.is_null() && compare(field, &self.value) != Ordering::Equal,
            FilterOperator::Gt => !field.is_null() && compare(field, &self.value) == Ordering::Greater,
            FilterOperator::Gte => !field.is_null() && compare(field, &self.value) != Ordering::Less,
            FilterOperator::Lt => !field.is_null() && compare(field, &self.value) == Ordering::Less,
            FilterOperator::Lte => !field.is_null() && compare(field, &self.value) != Ordering::Greater,
            FilterOperator::Like => match (field.as_str(), self.value.as_str()) {
                (Some(text), Some(pattern)) => like_match(pattern, text),
                _ => false,
            },
            FilterOperator::ILike => match (field.as_str(), self.value.as_str()) {
                (Some(text), Some(pattern)) => {
                    like_match(&pattern.to_lowercase(), &text.to_lowercase())
                }
                _ => false,
            },
        }
    }

    /// Attach to a PostgREST request.
    pub fn apply(&self, client: PostgrestClient) -> PostgrestClient {
        let value = self.wire_value();
        match self.operator {
            FilterOperator::Eq => client.eq(&self.column, &value),
            FilterOperator::Neq => client.neq(&self.column, &value),
            FilterOperator::Gt => client.gt(&self.column, &value),
            FilterOperator::Gte => client.gte(&self.column, &value),
            FilterOperator::Lt => client.lt(&self.column, &value),
            FilterOperator::Lte => client.lte(&self.column, &value),
            FilterOperator::Like => client.like(&self.column, &value),
            FilterOperator::ILike => client.ilike(&self.column, &value),
            FilterOperator::IsNull => client.is_null(&self.column),
            FilterOperator::NotNull => client.not_null(&self.column),
        }
    }
}

fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Total order over JSON scalars as the database would see them.
///
/// Timestamps compare as instants, numbers numerically, everything else as
/// text. `null` sorts after every other value.
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        _ => value_to_param(a).cmp(&value_to_param(b)),
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn like_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// Read description: predicates, ordering and an optional row limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.order.push((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Order two rows by the query's sort keys.
    pub fn cmp_rows(&self, a: &Value, b: &Value) -> Ordering {
        for (column, direction) in &self.order {
            let left = a.get(column).unwrap_or(&Value::Null);
            let right = b.get(column).unwrap_or(&Value::Null);
            let ord = compare(left, right);
            let ord = match direction {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Stable identity used as the cache key.
    pub fn cache_key(&self) -> String {
        let filters: Vec<String> = self
            .filters
            .iter()
            .map(|f| format!("{}={}.{}", f.column, f.operator.as_str(), f.wire_value()))
            .collect();
        let order: Vec<String> = self
            .order
            .iter()
            .map(|(c, o)| format!("{}.{:?}", c, o))
            .collect();
        format!(
            "select={};{};order={};limit={}",
            self.columns.as_deref().unwrap_or("*"),
            filters.join("&"),
            order.join(","),
            self.limit.map(|l| l.to_string()).unwrap_or_default()
        )
    }

    pub fn apply(&self, mut client: PostgrestClient) -> PostgrestClient {
        client = client.select(self.columns.as_deref().unwrap_or("*"));
        for filter in &self.filters {
            client = filter.apply(client);
        }
        for (column, direction) in &self.order {
            client = client.order(column, *direction);
        }
        if let Some(limit) = self.limit {
            client = client.limit(limit);
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_and_ranges() {
        let row = json!({ "status": "new", "created_at": "2024-03-10T12:00:00Z", "rating": 4 });
        assert!(Filter::eq("status", "new").matches(&row));
        assert!(!Filter::eq("status", "read").matches(&row));
        assert!(Filter::gte("created_at", "2024-03-01T00:00:00+00:00").matches(&row));
        assert!(!Filter::lte("created_at", "2024-03-09T23:59:59Z").matches(&row));
        assert!(Filter::new("rating", FilterOperator::Gt, 3).matches(&row));
    }

    #[test]
    fn missing_column_only_matches_null_checks() {
        let row = json!({ "id": "1" });
        assert!(Filter::is_null("published_at").matches(&row));
        assert!(!Filter::not_null("published_at").matches(&row));
        assert!(!Filter::neq("status", "new").matches(&row));
    }

    #[test]
    fn like_patterns() {
        assert!(like_match("%soft%", "software house"));
        assert!(like_match("soft%", "software"));
        assert!(!like_match("%house", "housing"));
        assert!(Filter::ilike("name_en", "%CLOUD%").matches(&json!({ "name_en": "Cloud apps" })));
    }

    #[test]
    fn descending_order_puts_nulls_first() {
        let query = ListQuery::new().order("published_at", SortOrder::Descending);
        let draft = json!({ "published_at": null });
        let old = json!({ "published_at": "2023-01-01T00:00:00Z" });
        let new = json!({ "published_at": "2024-01-01T00:00:00Z" });
        let mut rows = vec![old.clone(), draft.clone(), new.clone()];
        rows.sort_by(|a, b| query.cmp_rows(a, b));
        assert_eq!(rows, vec![draft, new, old]);
    }

    #[test]
    fn cache_key_distinguishes_filters() {
        let a = ListQuery::new().filter(Filter::eq("status", "new"));
        let b = ListQuery::new().filter(Filter::eq("status", "read"));
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), a.clone().cache_key());
    }
}
