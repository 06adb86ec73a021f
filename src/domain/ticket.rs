use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Typed view over the fields of a helpdesk ticket the relay reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HelpdeskTicket {
    #[serde(default, deserialize_with = "optional_text")]
    pub display_id: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub subject: Option<String>,
    #[serde(default, rename = "custom_field", deserialize_with = "optional_object")]
    pub custom_fields: Option<Map<String, Value>>,
}

impl HelpdeskTicket {
    pub fn custom_field_text(&self, name: &str) -> String {
        self.custom_fields
            .as_ref()
            .and_then(|fields| fields.get(name))
            .map(value_as_text)
            .unwrap_or_default()
    }

    pub fn references_issue(&self, field_name: &str, issue_number: u64) -> bool {
        self.custom_field_text(field_name) == issue_number.to_string()
    }
}

/// Text form of a JSON scalar: strings unquoted, `null` empty.
pub fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(value_as_text).filter(|text| !text.is_empty()))
}

fn optional_object<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(fields)) => Ok(Some(fields)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn matches_numeric_and_string_field_values() {
        let as_string: HelpdeskTicket = serde_json::from_value(json!({
            "display_id": 11,
            "custom_field": {"github_issue": "42"}
        }))
        .expect("ticket");
        let as_number: HelpdeskTicket = serde_json::from_value(json!({
            "display_id": "12",
            "custom_field": {"github_issue": 42}
        }))
        .expect("ticket");

        assert_eq!(as_string.display_id.as_deref(), Some("11"));
        assert_eq!(as_number.display_id.as_deref(), Some("12"));
        assert!(as_string.references_issue("github_issue", 42));
        assert!(as_number.references_issue("github_issue", 42));
        assert!(!as_number.references_issue("github_issue", 4));
    }

    #[test]
    fn missing_fields_never_match() {
        let bare: HelpdeskTicket =
            serde_json::from_value(json!({"display_id": 3, "custom_field": null})).expect("ticket");
        assert!(!bare.references_issue("github_issue", 3));
        assert_eq!(bare.custom_field_text("github_issue"), "");

        let no_id: HelpdeskTicket = serde_json::from_value(json!({})).expect("ticket");
        assert_eq!(no_id.display_id, None);
    }

    #[test]
    fn tolerates_unexpected_field_types() {
        let odd: HelpdeskTicket = serde_json::from_value(json!({
            "display_id": 1,
            "subject": 12345,
            "custom_field": ["not", "a", "map"]
        }))
        .expect("ticket");

        assert_eq!(odd.subject.as_deref(), Some("12345"));
        assert_eq!(odd.custom_fields, None);
        assert!(!odd.references_issue("issue", 1));
    }

    #[test]
    fn renders_scalars_as_text() {
        assert_eq!(value_as_text(&json!(null)), "");
        assert_eq!(value_as_text(&json!("abc")), "abc");
        assert_eq!(value_as_text(&json!(42)), "42");
        assert_eq!(value_as_text(&json!(true)), "true");
    }
}
