//! Tool descriptors and form-value coercion.
//!
//! MCP advertises tool inputs as JSON Schema. The GUI renders one widget per
//! top-level property and posts everything back as strings, so this module
//! owns both directions: schema -> form model, and submitted strings ->
//! typed JSON arguments.

use rmcp::model::Tool;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// A tool as the GUI sees it. Owned by the registry, refreshed on (re)connect.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub params: Vec<ParamField>,
}

/// One input widget.
#[derive(Debug, Clone, Serialize)]
pub struct ParamField {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Text { multiline: bool },
    Integer,
    Number,
    Boolean,
    StringEnum { variants: Vec<String> },
    /// Rendered as a warning row, never submitted.
    Unsupported { type_name: String },
}

/// Validation failure for a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("'{field}': {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ToolDescriptor {
    /// Build the form model from an rmcp tool listing entry.
    pub fn from_tool(tool: &Tool) -> Self {
        let schema = Value::Object((*tool.input_schema).clone());
        let required: Vec<String> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut params = Vec::new();
        if let Some(props) = schema.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                params.push(param_field(name, prop, required.contains(name)));
            }
        }

        Self {
            name: tool.name.to_string(),
            title: tool.title.clone(),
            description: tool.description.as_ref().map(ToString::to_string),
            params,
        }
    }

    /// Coerce submitted form strings into typed JSON arguments.
    ///
    /// Mirrors the widget semantics: empty optional fields are omitted,
    /// checkboxes are absent-means-false, numeric fields must parse, enum
    /// values must be declared variants.
    pub fn coerce_arguments(
        &self,
        form: &BTreeMap<String, String>,
    ) -> Result<Map<String, Value>, Vec<FieldError>> {
        let mut args = Map::new();
        let mut errors = Vec::new();

        for param in &self.params {
            let raw = form.get(&param.name).map(|s| s.trim());

            match &param.kind {
                ParamKind::Boolean => {
                    // Checkboxes post "on" when ticked and nothing otherwise.
                    args.insert(param.name.clone(), Value::Bool(raw.is_some()));
                }
                ParamKind::Unsupported { .. } => {}
                _ => {
                    let raw = raw.unwrap_or("");
                    if raw.is_empty() {
                        if param.required {
                            errors.push(FieldError::new(&param.name, "required"));
                        }
                        continue;
                    }
                    match coerce_value(&param.kind, raw) {
                        Ok(v) => {
                            args.insert(param.name.clone(), v);
                        }
                        Err(msg) => errors.push(FieldError::new(&param.name, msg)),
                    }
                }
            }
        }

        if errors.is_empty() { Ok(args) } else { Err(errors) }
    }
}

fn param_field(name: &str, prop: &Value, required: bool) -> ParamField {
    let label = prop
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(name)
        .to_string();
    let description = prop
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let default = prop.get("default").cloned();

    // Option<T> schemas come through as {"type": ["integer", "null"]} or
    // anyOf; take the first non-null primitive.
    let type_name = primitive_type(prop).unwrap_or_else(|| "string".to_string());

    let kind = if let Some(variants) = prop.get("enum").and_then(Value::as_array) {
        if type_name == "string" {
            ParamKind::StringEnum {
                variants: variants
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            }
        } else {
            ParamKind::Unsupported {
                type_name: format!("enum<{type_name}>"),
            }
        }
    } else {
        match type_name.as_str() {
            "string" => ParamKind::Text {
                multiline: prop.get("format").and_then(Value::as_str) == Some("textarea"),
            },
            "integer" => ParamKind::Integer,
            "number" => ParamKind::Number,
            "boolean" => ParamKind::Boolean,
            other => ParamKind::Unsupported {
                type_name: other.to_string(),
            },
        }
    };

    ParamField {
        name: name.to_string(),
        label,
        description,
        kind,
        required,
        default,
    }
}

fn primitive_type(prop: &Value) -> Option<String> {
    match prop.get("type") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(str::to_string),
        _ => prop
            .get("anyOf")
            .and_then(Value::as_array)
            .and_then(|alts| alts.iter().find_map(primitive_type)),
    }
}

fn coerce_value(kind: &ParamKind, raw: &str) -> Result<Value, String> {
    match kind {
        ParamKind::Text { .. } => Ok(Value::String(raw.to_string())),
        ParamKind::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("'{raw}' is not a valid integer")),
        ParamKind::Number => raw
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| format!("'{raw}' is not a valid number")),
        ParamKind::StringEnum { variants } => {
            if variants.iter().any(|v| v == raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(format!("'{raw}' is not one of the allowed values"))
            }
        }
        // Both kinds are filtered out by `coerce_arguments`; keep the error
        // path anyway so a future caller cannot hit a panic.
        ParamKind::Boolean | ParamKind::Unsupported { .. } => {
            Err("internal: field kind is not string-coerced".to_string())
        }
    }
}

/// Outcome of one tools/call round trip. Created per call, displayed,
/// discarded.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    /// Text content blocks, in order.
    pub content: Vec<String>,
    /// `structuredContent` payload, if the server returned one.
    pub structured: Option<Value>,
    pub is_error: bool,
}

impl Invocation {
    /// Extract the displayable pieces from a serialized `CallToolResult`.
    pub fn from_call_result(result: &Value) -> Self {
        let mut content = Vec::new();
        if let Some(blocks) = result.get("content").and_then(Value::as_array) {
            for block in blocks {
                match block.get("text").and_then(Value::as_str) {
                    Some(text) => content.push(text.to_string()),
                    // Non-text blocks (images, resources) shown as JSON.
                    None => content.push(
                        serde_json::to_string_pretty(block).unwrap_or_else(|_| block.to_string()),
                    ),
                }
            }
        }

        Self {
            content,
            structured: result.get("structuredContent").cloned(),
            is_error: result
                .get("isError")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn tool_with_schema(schema: Value) -> Tool {
        Tool {
            name: "demo".to_string().into(),
            description: Some("A demo tool".to_string().into()),
            input_schema: Arc::new(schema.as_object().unwrap().clone()),
            title: None,
            output_schema: None,
            annotations: None,
            icons: None,
            meta: None,
        }
    }

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn derives_fields_from_schema() {
        let tool = tool_with_schema(json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search terms" },
                "limit": { "type": "integer", "default": 5 },
                "exact": { "type": "boolean" },
                "mode": { "type": "string", "enum": ["fast", "thorough"] },
                "body": { "type": "string", "format": "textarea" }
            },
            "required": ["query"]
        }));

        let desc = ToolDescriptor::from_tool(&tool);
        assert_eq!(desc.name, "demo");
        assert_eq!(desc.params.len(), 5);

        let by_name = |n: &str| desc.params.iter().find(|p| p.name == n).unwrap();
        assert!(by_name("query").required);
        assert_eq!(by_name("query").kind, ParamKind::Text { multiline: false });
        assert_eq!(by_name("body").kind, ParamKind::Text { multiline: true });
        assert_eq!(by_name("limit").kind, ParamKind::Integer);
        assert_eq!(by_name("limit").default, Some(json!(5)));
        assert_eq!(by_name("exact").kind, ParamKind::Boolean);
        assert_eq!(
            by_name("mode").kind,
            ParamKind::StringEnum {
                variants: vec!["fast".into(), "thorough".into()]
            }
        );
    }

    #[test]
    fn optional_wrapper_types_unwrap_to_primitive() {
        let tool = tool_with_schema(json!({
            "type": "object",
            "properties": {
                "count": { "type": ["integer", "null"] },
                "ratio": { "anyOf": [{ "type": "number" }, { "type": "null" }] }
            }
        }));
        let desc = ToolDescriptor::from_tool(&tool);
        let by_name = |n: &str| desc.params.iter().find(|p| p.name == n).unwrap();
        assert_eq!(by_name("count").kind, ParamKind::Integer);
        assert_eq!(by_name("ratio").kind, ParamKind::Number);
    }

    #[test]
    fn unsupported_types_render_as_warnings_and_are_never_submitted() {
        let tool = tool_with_schema(json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array" },
                "name": { "type": "string" }
            }
        }));
        let desc = ToolDescriptor::from_tool(&tool);
        assert_eq!(
            desc.params.iter().find(|p| p.name == "tags").unwrap().kind,
            ParamKind::Unsupported {
                type_name: "array".into()
            }
        );

        let args = desc
            .coerce_arguments(&form(&[("tags", "[1,2]"), ("name", "x")]))
            .unwrap();
        assert!(!args.contains_key("tags"));
        assert_eq!(args["name"], json!("x"));
    }

    #[test]
    fn coerces_typed_values() {
        let tool = tool_with_schema(json!({
            "type": "object",
            "properties": {
                "n": { "type": "integer" },
                "x": { "type": "number" },
                "flag": { "type": "boolean" },
                "mode": { "type": "string", "enum": ["a", "b"] }
            },
            "required": ["n"]
        }));
        let desc = ToolDescriptor::from_tool(&tool);

        let args = desc
            .coerce_arguments(&form(&[
                ("n", "-3"),
                ("x", "2.5"),
                ("flag", "on"),
                ("mode", "b"),
            ]))
            .unwrap();
        assert_eq!(args["n"], json!(-3));
        assert_eq!(args["x"], json!(2.5));
        assert_eq!(args["flag"], json!(true));
        assert_eq!(args["mode"], json!("b"));

        // Unticked checkbox: absent from the form, coerced to false.
        let args = desc.coerce_arguments(&form(&[("n", "1")])).unwrap();
        assert_eq!(args["flag"], json!(false));
    }

    #[test]
    fn empty_optional_is_omitted_empty_required_is_an_error() {
        let tool = tool_with_schema(json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer" }
            },
            "required": ["query"]
        }));
        let desc = ToolDescriptor::from_tool(&tool);

        let args = desc
            .coerce_arguments(&form(&[("query", "hi"), ("limit", "")]))
            .unwrap();
        assert!(!args.contains_key("limit"));

        let errs = desc
            .coerce_arguments(&form(&[("query", ""), ("limit", "2")]))
            .unwrap_err();
        assert_eq!(errs, vec![FieldError::new("query", "required")]);
    }

    #[test]
    fn rejects_unparseable_and_undeclared_values() {
        let tool = tool_with_schema(json!({
            "type": "object",
            "properties": {
                "n": { "type": "integer" },
                "mode": { "type": "string", "enum": ["a", "b"] }
            }
        }));
        let desc = ToolDescriptor::from_tool(&tool);

        let errs = desc
            .coerce_arguments(&form(&[("n", "two"), ("mode", "z")]))
            .unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs[1].message.contains("not a valid integer") || errs[0].message.contains("not a valid integer"));
    }

    #[test]
    fn non_string_coerced_kinds_error_instead_of_panicking() {
        assert!(coerce_value(&ParamKind::Boolean, "on").is_err());
        let unsupported = ParamKind::Unsupported {
            type_name: "array".into(),
        };
        assert!(coerce_value(&unsupported, "[1,2]").is_err());
    }

    #[test]
    fn invocation_extracts_text_blocks_and_error_flag() {
        let result = json!({
            "content": [
                { "type": "text", "text": "hello" },
                { "type": "image", "data": "...", "mimeType": "image/png" }
            ],
            "structuredContent": { "answer": 42 },
            "isError": false
        });
        let inv = Invocation::from_call_result(&result);
        assert_eq!(inv.content[0], "hello");
        assert!(inv.content[1].contains("image/png"));
        assert_eq!(inv.structured, Some(json!({ "answer": 42 })));
        assert!(!inv.is_error);

        let err = Invocation::from_call_result(&json!({
            "content": [{ "type": "text", "text": "boom" }],
            "isError": true
        }));
        assert!(err.is_error);
    }
}
