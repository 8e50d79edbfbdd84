//! Argument coercion and schema validation.

use serde_json::{Map, Number, Value};

/// Primitive types declared for a schema property.
fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Convert a string to the first declared scalar type it parses as.
fn coerce_scalar(raw: &str, types: &[&str]) -> Option<Value> {
    let raw = raw.trim();
    if types.contains(&"integer")
        && let Ok(n) = raw.parse::<i64>()
    {
        return Some(Value::Number(n.into()));
    }
    if types.contains(&"number")
        && let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Some(Value::Number(n));
    }
    if types.contains(&"boolean") {
        match raw {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            _ => {}
        }
    }
    None
}

/// Coerce string values into the scalar types their properties declare:
/// `"5"` becomes `5` for an integer field, `"true"` becomes `true` for a
/// boolean. Array items are coerced against `items`. Strings that do not
/// parse, and properties declared as strings, are left alone so schema
/// validation can report them.
pub fn coerce_arguments(schema: &Value, arguments: &mut Map<String, Value>) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };
    for (name, value) in arguments.iter_mut() {
        let Some(prop) = properties.get(name) else {
            continue;
        };
        let types = declared_types(prop);
        if types.contains(&"string") {
            continue;
        }
        match value {
            Value::String(raw) => {
                if let Some(coerced) = coerce_scalar(raw, &types) {
                    *value = coerced;
                }
            }
            Value::Array(items) if types.contains(&"array") => {
                let item_types = prop.get("items").map(declared_types).unwrap_or_default();
                if item_types.contains(&"string") {
                    continue;
                }
                for item in items.iter_mut() {
                    if let Value::String(raw) = item
                        && let Some(coerced) = coerce_scalar(raw, &item_types)
                    {
                        *item = coerced;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Validate `instance` and describe each violation as `field: message`.
///
/// The field is the instance path with `/` separators turned into dots.
/// Root-level errors (a missing required property) take the quoted property
/// name from the message.
pub fn validation_errors(validator: &jsonschema::Validator, instance: &Value) -> Vec<String> {
    validator
        .iter_errors(instance)
        .map(|e| {
            let message = e.to_string();
            let path = e.instance_path().to_string();
            let field = path.trim_start_matches('/').replace('/', ".");
            let field = if field.is_empty() {
                quoted_name(&message).unwrap_or("arguments").to_string()
            } else {
                field
            };
            format!("{field}: {message}")
        })
        .collect()
}

fn quoted_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix('"')?;
    let end = rest.find('"')?;
    rest.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "limit": {"type": ["integer", "null"]},
                "done": {"type": "boolean"},
                "title": {"type": "string"},
                "ids": {"type": ["array", "null"], "items": {"type": "integer"}}
            },
            "required": ["id"]
        })
    }

    fn coerce(args: Value) -> Value {
        let Value::Object(mut map) = args else {
            panic!("expected object");
        };
        coerce_arguments(&schema(), &mut map);
        Value::Object(map)
    }

    #[test]
    fn numeric_strings_become_numbers() {
        let out = coerce(json!({"id": "5", "limit": " 10 ", "done": "true", "ids": ["1", 2]}));
        assert_eq!(out, json!({"id": 5, "limit": 10, "done": true, "ids": [1, 2]}));
    }

    #[test]
    fn string_fields_and_garbage_are_left_alone() {
        let out = coerce(json!({"id": "not-a-number", "title": "42"}));
        assert_eq!(out, json!({"id": "not-a-number", "title": "42"}));
    }

    #[test]
    fn errors_name_the_field() {
        let validator = jsonschema::validator_for(&schema()).unwrap();
        let errors = validation_errors(&validator, &json!({"id": "x"}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("id: "), "{errors:?}");

        let errors = validation_errors(&validator, &json!({}));
        assert!(errors[0].starts_with("id: "), "{errors:?}");
    }
}
