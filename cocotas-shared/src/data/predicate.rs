use serde::Serialize;
use serde_json::Value;

// --- Conditions ---

#[derive(Debug, Clone, PartialEq)]
enum Cond {
    Eq(String, Value),
    Neq(String, Value),
    In(String, Vec<Value>),
}

impl Cond {
    fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq(column, value) => row.get(column) == Some(value),
            Self::Neq(column, value) => row.get(column) != Some(value),
            Self::In(column, values) => row
                .get(column)
                .map(|field| values.contains(field))
                .unwrap_or(false),
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Eq(column, value) => format!("{column}=eq.{}", render_scalar(value)),
            Self::Neq(column, value) => format!("{column}=neq.{}", render_scalar(value)),
            Self::In(column, values) => {
                let list: Vec<String> = values.iter().map(render_scalar).collect();
                format!("{column}=in.({})", list.join(","))
            }
        }
    }
}

/// Render a JSON scalar the way PostgREST expects it in a filter: strings
/// unquoted, everything else in its JSON form.
pub(crate) fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// --- Predicate ---

/// A conjunction of column conditions, evaluable locally against a JSON row
/// and renderable as a PostgREST query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    conds: Vec<Cond>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Serialize) -> Self {
        self.conds.push(Cond::Eq(column.into(), to_value(value)));
        self
    }

    pub fn neq(mut self, column: &str, value: impl Serialize) -> Self {
        self.conds.push(Cond::Neq(column.into(), to_value(value)));
        self
    }

    pub fn is_in(mut self, column: &str, values: impl IntoIterator<Item = impl Serialize>) -> Self {
        let values = values.into_iter().map(to_value).collect();
        self.conds.push(Cond::In(column.into(), values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conds.is_empty()
    }

    /// True when every condition holds for `row`.
    pub fn matches(&self, row: &Value) -> bool {
        self.conds.iter().all(|cond| cond.matches(row))
    }

    /// Render as PostgREST filter pairs joined with `&`.
    pub fn to_query_string(&self) -> String {
        let parts: Vec<String> = self.conds.iter().map(Cond::render).collect();
        parts.join("&")
    }
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn eq_and_neq_match_locally() {
        let row = json!({ "city": "Fortaleza", "age": 24 });

        assert!(Predicate::new().eq("city", "Fortaleza").matches(&row));
        assert!(!Predicate::new().eq("city", "Recife").matches(&row));
        assert!(Predicate::new().neq("city", "Recife").matches(&row));
        assert!(Predicate::new().eq("age", 24).matches(&row));
    }

    #[test]
    fn missing_column_fails_eq_but_passes_neq() {
        let row = json!({ "city": "Fortaleza" });
        assert!(!Predicate::new().eq("bio", "x").matches(&row));
        assert!(Predicate::new().neq("bio", "x").matches(&row));
    }

    #[test]
    fn membership_matches_locally() {
        let row = json!({ "city": "Fortaleza" });
        let pred = Predicate::new().is_in("city", ["Recife", "Fortaleza"]);
        assert!(pred.matches(&row));

        let pred = Predicate::new().is_in("city", ["Recife", "Natal"]);
        assert!(!pred.matches(&row));
    }

    #[test]
    fn conjunction_requires_every_condition() {
        let row = json!({ "city": "Fortaleza", "gender": "Mulher" });
        let pred = Predicate::new().eq("city", "Fortaleza").eq("gender", "Homem");
        assert!(!pred.matches(&row));
    }

    #[test]
    fn renders_postgrest_filters() {
        let viewer: Uuid = "0b1f8f6e-9a55-4a5e-9c2e-0c1b6f5a7d10".parse().unwrap();
        let pred = Predicate::new()
            .neq("id", viewer)
            .eq("city", "Fortaleza")
            .eq("direction", Direction::Right);
        assert_eq!(
            pred.to_query_string(),
            "id=neq.0b1f8f6e-9a55-4a5e-9c2e-0c1b6f5a7d10&city=eq.Fortaleza&direction=eq.right"
        );

        let pred = Predicate::new().is_in("city", ["Recife", "Natal"]).eq("age", 24);
        assert_eq!(pred.to_query_string(), "city=in.(Recife,Natal)&age=eq.24");
    }

    #[test]
    fn empty_predicate_matches_everything() {
        let pred = Predicate::new();
        assert!(pred.is_empty());
        assert!(pred.matches(&json!({ "anything": true })));
        assert_eq!(pred.to_query_string(), "");
    }
}
