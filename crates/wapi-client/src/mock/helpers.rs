//! Search, projection and update rules used by the mock store

use crate::connector::QueryArgs;
use crate::error::WapiError;
use crate::models::ea_value;
use crate::multi::{EA_ADD_KEY, EA_REMOVE_KEY, value_text};
use serde_json::{Map, Value};

/// True if `object` satisfies every search field
///
/// `*Name` compares extensible attribute `Name`; other keys compare fields.
/// Values are compared by their text form, as the WAPI does for query strings.
pub fn matches(object: &Value, search: &Map<String, Value>) -> bool {
    search.iter().all(|(key, wanted)| {
        let actual = match key.strip_prefix('*') {
            Some(ea) => ea_value(object, ea),
            None => object.get(key),
        };
        actual.is_some_and(|v| value_text(v) == value_text(wanted))
    })
}

/// Shape an object the way the WAPI returns it for the given query args
///
/// Without `_return_fields` extensible attributes are omitted, matching the
/// WAPI default field set.
pub fn project(object: &Value, args: &QueryArgs) -> Value {
    let Some(map) = object.as_object() else {
        return object.clone();
    };

    if let Some(fields) = args.get("_return_fields") {
        let mut out = Map::new();
        if let Some(reference) = map.get("_ref") {
            out.insert("_ref".to_string(), reference.clone());
        }
        for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if let Some(value) = map.get(field) {
                out.insert(field.to_string(), value.clone());
            }
        }
        return Value::Object(out);
    }

    if args.contains_key("_return_fields+") {
        return object.clone();
    }

    let mut out = map.clone();
    out.remove("extattrs");
    Value::Object(out)
}

/// Apply an update body to a stored object
pub fn apply_update(object: &mut Map<String, Value>, body: &Map<String, Value>) -> Result<(), WapiError> {
    for (key, value) in body {
        match key.as_str() {
            EA_ADD_KEY => {
                let add = value.as_object().ok_or_else(|| {
                    WapiError::InvalidRequest(format!("{EA_ADD_KEY} must be an object"))
                })?;
                let mut extattrs = take_extattrs(object);
                for (name, wrapped) in add {
                    extattrs.insert(name.clone(), wrapped.clone());
                }
                object.insert("extattrs".to_string(), Value::Object(extattrs));
            }
            EA_REMOVE_KEY => {
                let remove = value.as_object().ok_or_else(|| {
                    WapiError::InvalidRequest(format!("{EA_REMOVE_KEY} must be an object"))
                })?;
                let mut extattrs = take_extattrs(object);
                for name in remove.keys() {
                    extattrs.remove(name);
                }
                object.insert("extattrs".to_string(), Value::Object(extattrs));
            }
            "_ref" => {
                return Err(WapiError::Api {
                    status: 400,
                    message: "field _ref cannot be written".to_string(),
                });
            }
            _ => {
                object.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(())
}

fn take_extattrs(object: &mut Map<String, Value>) -> Map<String, Value> {
    match object.remove("extattrs") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
