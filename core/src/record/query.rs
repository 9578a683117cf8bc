//! Query model for record store requests
//!
//! Serializes to the shape the remote store expects (`fields`, `where`,
//! `whereGroups`, `orderBy`, `pagingInfo`) and can also be evaluated locally
//! against in-memory records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use super::{Record, ID_FIELD};

/// Comparison operator of a single condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Contains,
    EqualTo,
    ExactMatch,
    NotEqualTo,
    LessThan,
}

/// A predicate on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field_name: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            values: vec![value.into()],
        }
    }

    pub fn contains(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::Contains, value)
    }

    pub fn equal_to(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::EqualTo, value)
    }

    pub fn exact_match(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::ExactMatch, value)
    }

    pub fn not_equal_to(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::NotEqualTo, value)
    }

    pub fn less_than(field_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field_name, Operator::LessThan, value)
    }

    /// Evaluate the condition against a record
    ///
    /// With several values the condition matches if any of them does, except
    /// for `NotEqualTo` which requires the field to differ from all of them.
    pub fn matches(&self, record: &Record) -> bool {
        let field = record.get(&self.field_name);
        match self.operator {
            Operator::NotEqualTo => !self.values.iter().any(|v| loose_eq(field, v)),
            Operator::Contains => self.values.iter().any(|v| {
                match (field.and_then(as_text), as_text(v)) {
                    (Some(haystack), Some(needle)) => haystack
                        .to_lowercase()
                        .contains(&needle.to_lowercase()),
                    _ => false,
                }
            }),
            Operator::EqualTo => self.values.iter().any(|v| loose_eq(field, v)),
            Operator::ExactMatch => self.values.iter().any(|v| {
                matches!(
                    (field.and_then(as_text), as_text(v)),
                    (Some(a), Some(b)) if a == b
                )
            }),
            Operator::LessThan => match field {
                Some(f) if !f.is_null() => self
                    .values
                    .iter()
                    .any(|v| compare_values(Some(f), Some(v)) == Ordering::Less),
                _ => false,
            },
        }
    }
}

/// Boolean combinator for condition groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// Conditions combined with one operator (AND when unset)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<GroupOperator>,
}

impl ConditionGroup {
    pub fn single(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
            operator: None,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self.operator {
            Some(GroupOperator::Or) => self.conditions.iter().any(|c| c.matches(record)),
            _ => self.conditions.iter().all(|c| c.matches(record)),
        }
    }
}

/// A boolean filter tree over condition groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereGroup {
    pub operator: GroupOperator,
    pub sub_groups: Vec<ConditionGroup>,
}

impl WhereGroup {
    /// OR over single-condition sub-groups
    pub fn any_of(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self {
            operator: GroupOperator::Or,
            sub_groups: conditions.into_iter().map(ConditionGroup::single).collect(),
        }
    }

    /// AND over single-condition sub-groups
    pub fn all_of(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self {
            operator: GroupOperator::And,
            sub_groups: conditions.into_iter().map(ConditionGroup::single).collect(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.sub_groups.is_empty() {
            return true;
        }
        match self.operator {
            GroupOperator::And => self.sub_groups.iter().all(|g| g.matches(record)),
            GroupOperator::Or => self.sub_groups.iter().any(|g| g.matches(record)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    #[serde(rename = "SortType")]
    pub sort_type: SortType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    /// Unset means no upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// Options of a fetch request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub where_groups: Vec<WhereGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned fields
    pub fn with_fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    /// Add a top-level condition (conditions are ANDed)
    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a where-group (groups are ANDed with each other and the conditions)
    pub fn group(mut self, group: WhereGroup) -> Self {
        self.where_groups.push(group);
        self
    }

    pub fn order_by(mut self, field_name: impl Into<String>, sort_type: SortType) -> Self {
        self.order_by.push(OrderBy {
            field_name: field_name.into(),
            sort_type,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        let offset = self.paging_info.map(|p| p.offset).unwrap_or(0);
        self.paging_info = Some(PagingInfo {
            limit: Some(limit),
            offset,
        });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        let limit = self.paging_info.and_then(|p| p.limit);
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }

    /// Combine a base query with caller options
    ///
    /// Predicates accumulate; field selection, sort order and paging from
    /// `options` replace the base ones when set.
    pub fn merged(mut self, options: Query) -> Self {
        if !options.fields.is_empty() {
            self.fields = options.fields;
        }
        self.conditions.extend(options.conditions);
        self.where_groups.extend(options.where_groups);
        if !options.order_by.is_empty() {
            self.order_by = options.order_by;
        }
        if options.paging_info.is_some() {
            self.paging_info = options.paging_info;
        }
        self
    }

    /// Whether a record satisfies every condition and where-group
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
            && self.where_groups.iter().all(|g| g.matches(record))
    }

    /// Evaluate the query over a set of records: filter, sort, page, project
    pub fn apply<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> Vec<Record> {
        let mut matched: Vec<&Record> = records.into_iter().filter(|r| self.matches(r)).collect();

        if !self.order_by.is_empty() {
            matched.sort_by(|a, b| {
                for key in &self.order_by {
                    let ord = compare_values(a.get(&key.field_name), b.get(&key.field_name));
                    let ord = match key.sort_type {
                        SortType::Asc => ord,
                        SortType::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let (offset, limit) = self
            .paging_info
            .map(|p| (p.offset, p.limit.unwrap_or(usize::MAX)))
            .unwrap_or((0, usize::MAX));

        matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|r| self.project(r))
            .collect()
    }

    fn project(&self, record: &Record) -> Record {
        if self.fields.is_empty() {
            return record.clone();
        }
        record
            .iter()
            .filter(|(k, _)| k.as_str() == ID_FIELD || self.fields.iter().any(|f| f == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Render a scalar-ish value as text; lookup objects render as their `Id`
pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get(ID_FIELD).and_then(as_text),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(as_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn loose_eq(field: Option<&Value>, expected: &Value) -> bool {
    match (field.and_then(as_text), as_text(expected)) {
        (Some(a), Some(b)) => match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x == y,
            _ => a.to_lowercase() == b.to_lowercase(),
        },
        (None, None) => true,
        _ => false,
    }
}

/// Order two optional values: missing/null first, numbers numerically, text lexically
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(as_text), b.and_then(as_text)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match (x.trim().parse::<f64>(), y.trim().parse::<f64>()) {
            (Ok(p), Ok(q)) => p.partial_cmp(&q).unwrap_or(Ordering::Equal),
            _ => x.cmp(&y),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let r = record(json!({"Id": 1, "title": "Buy Milk"}));
        assert!(Condition::contains("title", "milk").matches(&r));
        assert!(!Condition::contains("title", "bread").matches(&r));
        assert!(!Condition::contains("description", "milk").matches(&r));
    }

    #[test]
    fn test_equal_to_is_type_lenient() {
        let r = record(json!({"Id": 1, "project": {"Id": 3, "Name": "Work"}, "status": "Pending"}));
        assert!(Condition::equal_to("project", 3).matches(&r));
        assert!(Condition::equal_to("project", "3").matches(&r));
        assert!(Condition::equal_to("status", "pending").matches(&r));
        assert!(!Condition::exact_match("status", "pending").matches(&r));
        assert!(Condition::exact_match("status", "Pending").matches(&r));
    }

    #[test]
    fn test_not_equal_to_matches_missing_field() {
        let r = record(json!({"Id": 1}));
        assert!(Condition::not_equal_to("status", "completed").matches(&r));
        let done = record(json!({"Id": 2, "status": "completed"}));
        assert!(!Condition::not_equal_to("status", "completed").matches(&done));
    }

    #[test]
    fn test_less_than_on_dates_and_missing() {
        let r = record(json!({"Id": 1, "due_date": "2024-03-01"}));
        assert!(Condition::less_than("due_date", "2024-03-02").matches(&r));
        assert!(!Condition::less_than("due_date", "2024-03-01").matches(&r));
        let none = record(json!({"Id": 2, "due_date": null}));
        assert!(!Condition::less_than("due_date", "2024-03-02").matches(&none));
    }

    #[test]
    fn test_where_groups() {
        let overdue = WhereGroup::all_of([
            Condition::less_than("due_date", "2024-03-02"),
            Condition::not_equal_to("status", "completed"),
        ]);
        let late = record(json!({"Id": 1, "due_date": "2024-03-01", "status": "pending"}));
        let done = record(json!({"Id": 2, "due_date": "2024-03-01", "status": "completed"}));
        assert!(overdue.matches(&late));
        assert!(!overdue.matches(&done));

        let search = WhereGroup::any_of([
            Condition::contains("title", "milk"),
            Condition::contains("description", "milk"),
        ]);
        let in_desc = record(json!({"Id": 3, "title": "Shopping", "description": "milk, eggs"}));
        assert!(search.matches(&in_desc));
        assert!(!search.matches(&done));
    }

    #[test]
    fn test_apply_sorts_pages_and_projects() {
        let records: Vec<Record> = (1..=5)
            .map(|i| record(json!({"Id": i, "title": format!("t{}", i), "rank": 10 - i})))
            .collect();

        let query = Query::new()
            .with_fields(&["title"])
            .order_by("rank", SortType::Asc)
            .offset(1)
            .limit(2);
        let result = query.apply(&records);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0]["Id"], json!(4));
        assert_eq!(result[1]["Id"], json!(3));
        assert!(result[0].get("rank").is_none());
        assert_eq!(result[0]["title"], json!("t4"));
    }

    #[test]
    fn test_query_serializes_to_store_shape() {
        let query = Query::new()
            .filter(Condition::equal_to("project", 7))
            .order_by("ModifiedOn", SortType::Desc)
            .limit(10);
        let value = serde_json::to_value(&query).unwrap();

        assert_eq!(value["where"][0]["fieldName"], "project");
        assert_eq!(value["where"][0]["operator"], "EqualTo");
        assert_eq!(value["orderBy"][0]["SortType"], "DESC");
        assert_eq!(value["pagingInfo"]["limit"], 10);
        assert!(value.get("whereGroups").is_none());
    }

    #[test]
    fn test_offset_alone_sends_no_limit() {
        let query = Query::new().offset(2);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["pagingInfo"], json!({ "offset": 2 }));

        let records: Vec<Record> = (1..=4).map(|i| record(json!({ "Id": i }))).collect();
        let ids: Vec<Value> = query.apply(&records).iter().map(|r| r["Id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(4)]);

        let decoded: PagingInfo = serde_json::from_value(json!({ "offset": 1 })).unwrap();
        assert_eq!(decoded.limit, None);
    }

    #[test]
    fn test_merged_keeps_base_predicates() {
        let base = Query::new()
            .with_fields(&["title"])
            .filter(Condition::equal_to("project", 1));
        let merged = base.merged(Query::new().filter(Condition::exact_match("status", "pending")).limit(3));

        assert_eq!(merged.fields, vec!["title".to_string()]);
        assert_eq!(merged.conditions.len(), 2);
        assert_eq!(merged.paging_info.unwrap().limit, Some(3));
    }
}
