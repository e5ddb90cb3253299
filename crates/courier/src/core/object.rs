use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Flatten a serializable struct or map into ordered `(name, value)` pairs.
///
/// String fields are taken verbatim, numbers and booleans are rendered with
/// `to_string`, nested arrays and objects as compact JSON. `null` fields
/// (e.g. `None`) are skipped.
///
/// # Errors
///
/// Returns [`Error::Serialize`] if `value` fails to serialize or does not
/// serialize to a map.
pub fn flatten<S: Serialize + ?Sized>(value: &S) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| {
                let rendered = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((key, rendered))
            })
            .collect()),
        other => Err(Error::Serialize(format!(
            "expected a struct or map, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Query {
        name:   String,
        page:   u32,
        exact:  bool,
        filter: Option<String>,
        tags:   Vec<&'static str>,
    }

    #[test]
    fn test_flatten_struct_in_field_order() {
        let query = Query {
            name:   "rust lang".into(),
            page:   2,
            exact:  true,
            filter: None,
            tags:   vec!["a", "b"],
        };

        let pairs = flatten(&query).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "rust lang".to_string()),
                ("page".to_string(), "2".to_string()),
                ("exact".to_string(), "true".to_string()),
                ("tags".to_string(), "[\"a\",\"b\"]".to_string()),
            ]
        );
    }

    #[test]
    fn test_flatten_map() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("b", "2");
        map.insert("a", "1");
        let pairs = flatten(&map).unwrap();
        assert_eq!(pairs[0], ("a".to_string(), "1".to_string()));
        assert_eq!(pairs[1], ("b".to_string(), "2".to_string()));
    }

    #[test]
    fn test_flatten_rejects_scalars() {
        let err = flatten(&42).unwrap_err();
        assert!(matches!(err, Error::Serialize(_)));
        assert!(err.to_string().contains("a number"));

        assert!(flatten("text").is_err());
        assert!(flatten(&vec![1, 2]).is_err());
        assert!(flatten(&Option::<u8>::None).is_err());
    }
}
