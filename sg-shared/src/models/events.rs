use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of row change reported by the store's change notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change notification for one row.
///
/// `new` and `old` stay loosely shaped: consumers only look at the columns
/// they care about.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub table: String,
    #[serde(default)]
    pub new: Option<Map<String, Value>>,
    #[serde(default)]
    pub old: Option<Map<String, Value>>,
}

impl ProductChange {
    /// True when either side of the change is an active row, i.e. the
    /// active product was edited, became active, or stopped being active.
    pub fn touches_active(&self) -> bool {
        is_active(self.new.as_ref()) || is_active(self.old.as_ref())
    }
}

fn is_active(row: Option<&Map<String, Value>>) -> bool {
    row.and_then(|r| r.get("is_active"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(value: Value) -> ProductChange {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_update_of_active_row_touches_active() {
        let c = change(json!({
            "type": "UPDATE",
            "table": "products",
            "new": { "is_active": true, "price": 80 },
            "old": { "is_active": true, "price": 75 }
        }));

        assert_eq!(c.kind, ChangeKind::Update);
        assert!(c.touches_active());
    }

    #[test]
    fn test_deactivation_touches_active() {
        let c = change(json!({
            "type": "UPDATE",
            "table": "products",
            "new": { "is_active": false },
            "old": { "is_active": true }
        }));

        assert!(c.touches_active());
    }

    #[test]
    fn test_delete_of_active_row_touches_active() {
        let c = change(json!({
            "type": "DELETE",
            "table": "products",
            "old": { "is_active": true }
        }));

        assert!(c.new.is_none());
        assert!(c.touches_active());
    }

    #[test]
    fn test_inactive_rows_are_ignored() {
        let c = change(json!({
            "type": "INSERT",
            "table": "products",
            "new": { "is_active": false },
            "old": null
        }));

        assert!(!c.touches_active());
    }

    #[test]
    fn test_non_boolean_flag_is_not_active() {
        let c = change(json!({
            "type": "INSERT",
            "table": "products",
            "new": { "is_active": "yes" }
        }));

        assert!(!c.touches_active());
    }
}
