use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

/// One comparison against a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Value },
    Gte { field: String, value: Value },
    Lte { field: String, value: Value },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. }
            | Condition::Gte { field, .. }
            | Condition::Lte { field, .. } => field,
        }
    }
}

/// A conjunction of field conditions, in the spirit of the `$eq`/`$gte`/
/// `$lte` subset of a document-store query language. Only the operators the
/// application actually issues are modeled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn gte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Gte {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn lte(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Lte {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against a document, for store implementations
    /// that scan in memory.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|condition| {
            let actual = doc.get(condition.field()).unwrap_or(&Value::Null);
            match condition {
                Condition::Eq { value, .. } => actual == value,
                Condition::Gte { value, .. } => {
                    matches!(compare_values(actual, value), Some(Ordering::Greater | Ordering::Equal))
                }
                Condition::Lte { value, .. } => {
                    matches!(compare_values(actual, value), Some(Ordering::Less | Ordering::Equal))
                }
            }
        })
    }
}

/// Ordering between two JSON scalars. Strings that both parse as RFC 3339
/// timestamps compare chronologically; mixed precision in the serialized
/// form would otherwise make lexicographic comparison wrong.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => Some(a.cmp(b)),
        },
        (Value::Number(a), Value::Number(b)) => a.as_f64().partial_cmp(&b.as_f64()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
