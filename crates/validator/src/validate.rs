use launchkit_core::{GenerationError, SiteContent, slugify};
use serde_json::Value;
use tracing::debug;

use crate::schema::{ObjectSchema, SchemaType, site_content_schema};

/// Slug used when neither the generated slug nor the title yields one
const FALLBACK_SLUG: &str = "site";

/// Parse and validate raw generation output into a SiteContent.
///
/// The text must be a single JSON object matching [`site_content_schema`].
/// Required string fields must be non-empty; optional fields may be absent
/// or `null` and take their defaults. Any violation fails the whole call, so
/// a partially valid result is never returned.
pub fn parse_generation_result(json_text: &str) -> Result<SiteContent, GenerationError> {
    let value: Value = serde_json::from_str(json_text)
        .map_err(|e| GenerationError::Malformed(format!("not valid JSON: {}", e)))?;

    let schema = site_content_schema();
    check(&value, &schema, "$").map_err(GenerationError::Malformed)?;

    let mut content: SiteContent = serde_json::from_value(strip_nulls(value))
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;

    normalize(&mut content);
    debug!(slug = %content.slug, "generation result validated");
    Ok(content)
}

/// Structural check of `value` against `schema`, reporting the first
/// violation with its JSON path
fn check(value: &Value, schema: &SchemaType, path: &str) -> Result<(), String> {
    match (schema, value) {
        (SchemaType::String, Value::String(_)) | (SchemaType::Boolean, Value::Bool(_)) => Ok(()),
        (SchemaType::Array(items), Value::Array(elements)) => {
            for (i, element) in elements.iter().enumerate() {
                if element.is_null() {
                    continue;
                }
                check(element, items, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        (SchemaType::Object(object), Value::Object(_)) => check_object(value, object, path),
        (expected, found) => Err(format!(
            "{} must be {}, found {}",
            path,
            expected.type_name(),
            json_type_name(found)
        )),
    }
}

fn check_object(value: &Value, object: &ObjectSchema, path: &str) -> Result<(), String> {
    for field in &object.required {
        match value.get(*field) {
            None | Some(Value::Null) => {
                return Err(format!("{}.{} is required", path, field));
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(format!("{}.{} must not be empty", path, field));
            }
            _ => {}
        }
    }

    for (name, ty) in &object.properties {
        match value.get(*name) {
            None | Some(Value::Null) => {}
            Some(field) => check(field, ty, &format!("{}.{}", path, name))?,
        }
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Drop `null` members so serde defaults apply to them
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// Make the slug URL-safe. It is cosmetic and never used for addressing.
fn normalize(content: &mut SiteContent) {
    let mut slug = slugify(&content.slug);
    if slug.is_empty() {
        slug = slugify(&content.title);
    }
    if slug.is_empty() {
        slug = FALLBACK_SLUG.to_string();
    }
    content.slug = slug;
}
