//! first-match lookup helpers for loosely typed device records
//! a value of the wrong type counts as absent and the lookup moves on to the next alias

use serde_json::Value;

/// find the first alias holding a value accepted by `accept`
pub fn first_value<'a>(json_data: &'a Value, aliases: &[&str], accept: impl Fn(&Value) -> bool) -> Option<&'a Value> {
    aliases
        .iter()
        .filter_map(|alias| json_data.get(*alias))
        .find(|value| accept(value))
}

/// first non-empty string
pub fn first_str(json_data: &Value, aliases: &[&str]) -> Option<String> {
    first_value(json_data, aliases, |v| v.as_str().map_or(false, |s| !s.trim().is_empty()))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// first non-empty string or any number, rendered as string
pub fn first_id(json_data: &Value, aliases: &[&str]) -> Option<String> {
    first_value(json_data, aliases, |v| match v {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    })
    .map(|v| match v {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

/// first real boolean; "false" strings or 0 are not booleans
pub fn first_bool(json_data: &Value, aliases: &[&str]) -> Option<bool> {
    first_value(json_data, aliases, |v| v.is_boolean()).and_then(|v| v.as_bool())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_str_skips_empty_and_wrong_type() {
        let data = json!({"name": "", "device_name": 12, "label": "Lobby"});
        assert_eq!(first_str(&data, &["name", "device_name", "label"]), Some("Lobby".to_string()));
        assert_eq!(first_str(&data, &["name", "device_name"]), None);
    }

    #[test]
    fn test_first_id_accepts_numbers() {
        let data = json!({"id": 13900, "uuid": "abc"});
        assert_eq!(first_id(&data, &["id", "uuid"]), Some("13900".to_string()));
        let data = json!({"id": null, "uuid": "abc"});
        assert_eq!(first_id(&data, &["id", "uuid"]), Some("abc".to_string()));
    }

    #[test]
    fn test_first_bool_only_accepts_booleans() {
        let data = json!({"online": "false", "is_online": false});
        assert_eq!(first_bool(&data, &["online"]), None);
        assert_eq!(first_bool(&data, &["online", "is_online"]), Some(false));
    }
}
