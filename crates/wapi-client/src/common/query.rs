//! Query string helpers for WAPI requests

use crate::connector::QueryArgs;
use crate::multi::value_text;
use serde_json::{Map, Value};

/// Encode key/value pairs as a query string
pub fn build_query_string<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k.as_ref()), urlencoding::encode(v.as_ref())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Search fields followed by query args, for a read
///
/// Array-valued search fields repeat the key once per element.
pub fn search_query(search: &Map<String, Value>, args: &QueryArgs) -> String {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (key, value) in search {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().map(|item| (key.clone(), value_text(item))));
            }
            other => pairs.push((key.clone(), value_text(other))),
        }
    }
    pairs.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
    build_query_string(pairs)
}

/// Append a query string to `path` if it is not empty
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_query_encodes_ea_filters() {
        let search = json!({"name": "blue view", "*Lock": "Available"});
        let mut args = QueryArgs::new();
        args.insert("_return_fields".to_string(), "extattrs".to_string());

        assert_eq!(
            search_query(search.as_object().unwrap(), &args),
            "%2ALock=Available&name=blue%20view&_return_fields=extattrs"
        );
    }

    #[test]
    fn test_search_query_repeats_arrays() {
        let search = json!({"network_view": ["a", "b"]});
        assert_eq!(
            search_query(search.as_object().unwrap(), &QueryArgs::new()),
            "network_view=a&network_view=b"
        );
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("networkview", ""), "networkview");
        assert_eq!(with_query("networkview", "name=x"), "networkview?name=x");
    }
}
