//! Declarative response schema for site generation.
//!
//! The descriptor is sent to the generative backend so that its output is
//! constrained to JSON of this shape, and the same descriptor drives the
//! structural check applied to whatever comes back.

use serde_json::{Map, Value, json};

/// Fields a generation result must carry to be usable
pub const REQUIRED_FIELDS: &[&str] = &["title", "slug", "html", "css", "tailwind"];

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    String,
    Boolean,
    Array(Box<SchemaType>),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub properties: Vec<(&'static str, SchemaType)>,
    pub required: Vec<&'static str>,
}

impl ObjectSchema {
    pub fn property(&self, name: &str) -> Option<&SchemaType> {
        self.properties
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| t)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(&name)
    }
}

impl SchemaType {
    /// Name used by the backend's schema dialect
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaType::String => "STRING",
            SchemaType::Boolean => "BOOLEAN",
            SchemaType::Array(_) => "ARRAY",
            SchemaType::Object(_) => "OBJECT",
        }
    }

    /// Serialize into the OpenAPI-subset form accepted as `responseSchema`
    pub fn to_json(&self) -> Value {
        match self {
            SchemaType::String | SchemaType::Boolean => json!({ "type": self.type_name() }),
            SchemaType::Array(items) => json!({
                "type": self.type_name(),
                "items": items.to_json(),
            }),
            SchemaType::Object(object) => {
                let mut properties = Map::new();
                for (name, ty) in &object.properties {
                    properties.insert((*name).to_string(), ty.to_json());
                }
                let mut schema = json!({
                    "type": self.type_name(),
                    "properties": Value::Object(properties),
                });
                if !object.required.is_empty() {
                    schema["required"] = json!(object.required);
                }
                schema
            }
        }
    }
}

fn object(properties: Vec<(&'static str, SchemaType)>, required: &[&'static str]) -> SchemaType {
    SchemaType::Object(ObjectSchema {
        properties,
        required: required.to_vec(),
    })
}

/// The SiteContent shape
pub fn site_content_schema() -> SchemaType {
    use SchemaType::{Boolean, String};

    object(
        vec![
            ("title", String),
            ("description", String),
            ("slug", String),
            ("html", String),
            ("css", String),
            ("tailwind", Boolean),
            (
                "assets",
                SchemaType::Array(Box::new(object(
                    vec![("path", String), ("alt", String)],
                    &[],
                ))),
            ),
            ("scripts", String),
            ("previewInstructions", String),
            (
                "seo",
                object(
                    vec![
                        ("titleTag", String),
                        ("metaDescription", String),
                        ("ogTitle", String),
                        ("ogDescription", String),
                        ("ogImage", String),
                    ],
                    &[],
                ),
            ),
            ("accessibilityNotes", String),
            ("mobileFirst", Boolean),
            ("notes", String),
        ],
        REQUIRED_FIELDS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_json_shape() {
        let schema = site_content_schema().to_json();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["tailwind"]["type"], "BOOLEAN");
        assert_eq!(schema["properties"]["assets"]["type"], "ARRAY");
        assert_eq!(
            schema["properties"]["assets"]["items"]["properties"]["alt"]["type"],
            "STRING"
        );
        assert_eq!(
            schema["properties"]["seo"]["properties"]["ogImage"]["type"],
            "STRING"
        );
        assert_eq!(
            schema["required"],
            json!(["title", "slug", "html", "css", "tailwind"])
        );
        // nested objects without required fields omit the key
        assert!(schema["properties"]["seo"].get("required").is_none());
    }

    #[test]
    fn test_property_lookup() {
        let SchemaType::Object(root) = site_content_schema() else {
            panic!("root must be an object");
        };
        assert_eq!(root.property("html"), Some(&SchemaType::String));
        assert!(root.property("missing").is_none());
        assert!(root.is_required("slug"));
        assert!(!root.is_required("scripts"));
    }
}
