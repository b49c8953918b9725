//! Conversion of string-sourced parameter values into typed JSON values.

use serde_json::{Map, Value};

use crate::endpoint::{ParameterMeta, ParameterStyle};

/// Convert `raw` according to the schema `type`, failing on values that do
/// not parse. Untyped parameters stay strings.
pub(crate) fn convert_primitive(raw: &str, schema: Option<&Value>) -> Result<Value, String> {
    let Some(ty) = schema_type(schema) else {
        return Ok(Value::String(raw.to_string()));
    };
    match ty {
        "integer" => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("'{raw}' is not an integer")),
        "number" => {
            let n = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{raw}' is not a number"))?;
            serde_json::Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| format!("'{raw}' is not a finite number"))
        }
        "boolean" => match raw.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a boolean")),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Decode one or more raw occurrences of a parameter according to its
/// schema type, style and `explode` flag.
///
/// Label and matrix prefixes are stripped first. Arrays are then split per
/// [`ParameterStyle`]; objects without a declared style are read as JSON.
pub(crate) fn decode_param_values(raw: &[&str], meta: &ParameterMeta) -> Result<Value, String> {
    let schema = meta.schema.as_ref();
    let style = meta.effective_style();
    let values = unwrap_occurrences(raw, meta, style)?;
    match schema_type(schema) {
        Some("array") => {
            let items = schema.and_then(|s| s.get("items"));
            array_parts(&values, style, meta.explode)
                .into_iter()
                .map(|p| convert_primitive(p.trim(), items))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        Some("object") if meta.style.is_none() => {
            let last = raw.last().copied().unwrap_or_default();
            serde_json::from_str(last).map_err(|e| format!("not a JSON object: {e}"))
        }
        Some("object") => object_from_values(&values, style, meta.explode == Some(true), schema),
        _ => convert_primitive(values.last().copied().unwrap_or_default(), schema),
    }
}

/// Build an object from `name[key]=value` query pairs, already stripped to
/// `(key, value)`. Repeated keys accumulate when the property is an array.
pub(crate) fn decode_deep_object(
    pairs: &[(&str, &str)],
    meta: &ParameterMeta,
) -> Result<Value, String> {
    let properties = meta.schema.as_ref().and_then(|s| s.get("properties"));
    let mut object = Map::new();
    for &(key, raw) in pairs {
        let property = properties.and_then(|p| p.get(key));
        if schema_type(property) == Some("array") {
            let item = convert_primitive(raw, property.and_then(|s| s.get("items")))?;
            if let Value::Array(items) = object
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                items.push(item);
            }
        } else {
            object.insert(key.to_string(), convert_primitive(raw, property)?);
        }
    }
    Ok(Value::Object(object))
}

/// Coerce a decoded body field. Text-only bodies (forms) carry every field
/// as a string, so those are converted like query values.
pub(crate) fn coerce_field(value: Value, meta: &ParameterMeta) -> Result<Value, String> {
    let schema = meta.schema.as_ref();
    match value {
        Value::String(s) if !matches!(schema_type(schema), None | Some("string")) => {
            decode_param_values(&[s.as_str()], meta)
        }
        Value::Array(items) if schema_type(schema) == Some("array") => {
            let item_schema = schema.and_then(|s| s.get("items"));
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => convert_primitive(&s, item_schema),
                    other => Ok(other),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        other => Ok(other),
    }
}

/// Strip the label (`.`) or matrix (`;name=`) prefix from every occurrence.
///
/// A matrix occurrence may repeat `;name=` segments, each becoming a value.
/// Exploded matrix objects keep their `key=value` segments intact.
fn unwrap_occurrences<'a>(
    raw: &[&'a str],
    meta: &ParameterMeta,
    style: ParameterStyle,
) -> Result<Vec<&'a str>, String> {
    let exploded_object = meta.schema_type() == Some("object") && meta.explode == Some(true);
    let mut values = Vec::with_capacity(raw.len());
    for &occurrence in raw {
        match style {
            ParameterStyle::Label => values.push(
                occurrence
                    .strip_prefix('.')
                    .ok_or_else(|| format!("'{occurrence}' is missing the '.' label prefix"))?,
            ),
            ParameterStyle::Matrix => {
                let rest = occurrence
                    .strip_prefix(';')
                    .ok_or_else(|| format!("'{occurrence}' is missing the ';' matrix prefix"))?;
                for segment in rest.split(';') {
                    if exploded_object {
                        values.push(segment);
                        continue;
                    }
                    let value = match segment.split_once('=') {
                        Some((name, value)) if name == meta.name => value,
                        None if segment == meta.name => "",
                        _ => return Err(format!("'{segment}' is not a ';{}=' segment", meta.name)),
                    };
                    values.push(value);
                }
            }
            _ => values.push(occurrence),
        }
    }
    Ok(values)
}

fn delimiter(style: ParameterStyle) -> char {
    match style {
        ParameterStyle::SpaceDelimited => ' ',
        ParameterStyle::PipeDelimited => '|',
        _ => ',',
    }
}

fn split_all<'a>(values: &[&'a str], delim: char) -> Vec<&'a str> {
    values
        .iter()
        .flat_map(|v| v.split(delim))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Array items from unwrapped occurrences.
///
/// Unset `explode` splits a lone occurrence and keeps repeated ones whole.
fn array_parts<'a>(
    values: &[&'a str],
    style: ParameterStyle,
    explode: Option<bool>,
) -> Vec<&'a str> {
    match (style, explode) {
        (ParameterStyle::Simple, _) | (_, Some(false)) => split_all(values, delimiter(style)),
        (ParameterStyle::Label, Some(true)) => split_all(values, '.'),
        (ParameterStyle::Label, None) => values
            .iter()
            .flat_map(|v| v.split(if v.contains(',') { ',' } else { '.' }))
            .filter(|s| !s.is_empty())
            .collect(),
        (_, Some(true)) => values.to_vec(),
        (_, None) => match values {
            [single] => split_all(&[*single], delimiter(style)),
            _ => values.to_vec(),
        },
    }
}

/// Object from `k,v,k,v` tokens, or from `k=v` pairs when exploded.
fn object_from_values(
    values: &[&str],
    style: ParameterStyle,
    exploded: bool,
    schema: Option<&Value>,
) -> Result<Value, String> {
    let properties = schema.and_then(|s| s.get("properties"));
    let mut object = Map::new();
    if exploded {
        let pairs = match style {
            ParameterStyle::Matrix => values.iter().copied().filter(|s| !s.is_empty()).collect(),
            ParameterStyle::Label => split_all(values, '.'),
            _ => split_all(values, ','),
        };
        for pair in pairs {
            let (key, raw) = pair
                .split_once('=')
                .ok_or_else(|| format!("'{pair}' is not a key=value pair"))?;
            let value = convert_primitive(raw, properties.and_then(|p| p.get(key)))?;
            object.insert(key.to_string(), value);
        }
    } else {
        let tokens = split_all(values, delimiter(style));
        if tokens.len() % 2 != 0 {
            return Err(format!("'{}' does not hold key,value pairs", values.join(",")));
        }
        for pair in tokens.chunks(2) {
            let (key, raw) = (pair[0], pair[1]);
            let value = convert_primitive(raw, properties.and_then(|p| p.get(key)))?;
            object.insert(key.to_string(), value);
        }
    }
    Ok(Value::Object(object))
}

fn schema_type(schema: Option<&Value>) -> Option<&str> {
    schema.and_then(|s| s.get("type")).and_then(Value::as_str)
}
