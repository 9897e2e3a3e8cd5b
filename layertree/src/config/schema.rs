//! Structural validation of layer configuration JSON.
//!
//! The layer configuration has a fixed shape, so validation is a direct walk
//! over the [`serde_json::Value`] rather than an interpreted schema document.
//! The walk stops at the first violation and reports it together with the
//! path of the offending value (`/0/agsSource/folders/1/name`).

use serde_json::{Map, Value};

/// First schema violation found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub message: String,
    pub data_path: String,
}

type SchemaResult = Result<(), SchemaViolation>;

/// Kinds of value a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    Boolean,
    Array,
    Object,
    StringArray,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Boolean => "boolean",
            Kind::Array | Kind::StringArray => "array",
            Kind::Object => "object",
        }
    }
}

/// A field of an object in the schema.
struct Field {
    name: &'static str,
    kind: Kind,
    required: bool,
}

const fn required(name: &'static str, kind: Kind) -> Field {
    Field {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: Kind) -> Field {
    Field {
        name,
        kind,
        required: false,
    }
}

const CATALOG_FIELDS: &[Field] = &[
    required("url", Kind::String),
    required("folders", Kind::Array),
    optional("folderTitle", Kind::String),
    optional("availableInRegions", Kind::StringArray),
    optional("isNew", Kind::Boolean),
];

const FOLDER_FIELDS: &[Field] = &[
    optional("url", Kind::String),
    required("name", Kind::String),
    required("services", Kind::Array),
];

const SERVICE_FIELDS: &[Field] = &[
    required("name", Kind::String),
    optional("displayName", Kind::String),
];

const MAP_SERVICE_FIELDS: &[Field] = &[
    required("url", Kind::String),
    required("folderTitle", Kind::String),
    required("layerIds", Kind::StringArray),
    optional("availableInRegions", Kind::StringArray),
    optional("isNew", Kind::Boolean),
];

/// Validates a parsed layer configuration document.
pub fn validate(document: &Value) -> SchemaResult {
    let entries = document
        .as_array()
        .ok_or_else(|| type_violation(document, Kind::Array, ""))?;

    for (index, entry) in entries.iter().enumerate() {
        validate_entry(entry, &format!("/{}", index))?;
    }
    Ok(())
}

fn validate_entry(entry: &Value, path: &str) -> SchemaResult {
    let object = entry
        .as_object()
        .ok_or_else(|| type_violation(entry, Kind::Object, path))?;

    match (object.get("agsSource"), object.get("wmsSource")) {
        (Some(_), Some(_)) => {
            return Err(violation(
                "Data is valid against more than one schema from \"oneOf\": agsSource and wmsSource are both present",
                path,
            ))
        }
        (None, None) => {
            return Err(violation(
                "Data does not match any schemas from \"oneOf\": expected agsSource or wmsSource",
                path,
            ))
        }
        _ => {}
    }

    reject_unknown(object, &["agsSource", "wmsSource"], path)?;

    if let Some(catalog) = object.get("agsSource") {
        validate_catalog(catalog, &format!("{}/agsSource", path))?;
    }
    if let Some(map_service) = object.get("wmsSource") {
        validate_object(map_service, MAP_SERVICE_FIELDS, &format!("{}/wmsSource", path))?;
    }
    Ok(())
}

fn validate_catalog(catalog: &Value, path: &str) -> SchemaResult {
    let object = validate_object(catalog, CATALOG_FIELDS, path)?;

    let folders = object.get("folders").and_then(Value::as_array);
    for (f, folder) in folders.into_iter().flatten().enumerate() {
        let folder_path = format!("{}/folders/{}", path, f);
        let folder_object = validate_object(folder, FOLDER_FIELDS, &folder_path)?;

        let services = folder_object.get("services").and_then(Value::as_array);
        for (s, service) in services.into_iter().flatten().enumerate() {
            validate_object(
                service,
                SERVICE_FIELDS,
                &format!("{}/services/{}", folder_path, s),
            )?;
        }
    }
    Ok(())
}

/// Checks an object's fields, returning the object on success.
fn validate_object<'a>(
    value: &'a Value,
    fields: &[Field],
    path: &str,
) -> Result<&'a Map<String, Value>, SchemaViolation> {
    let object = value
        .as_object()
        .ok_or_else(|| type_violation(value, Kind::Object, path))?;

    for field in fields {
        let field_path = format!("{}/{}", path, field.name);
        match object.get(field.name) {
            None if field.required => {
                return Err(violation(
                    &format!("Missing required property: {}", field.name),
                    path,
                ))
            }
            None => {}
            Some(v) => check_kind(v, field.kind, &field_path)?,
        }
    }

    let allowed: Vec<&str> = fields.iter().map(|f| f.name).collect();
    reject_unknown(object, &allowed, path)?;
    Ok(object)
}

fn check_kind(value: &Value, kind: Kind, path: &str) -> SchemaResult {
    let matches = match kind {
        Kind::String => value.is_string(),
        Kind::Boolean => value.is_boolean(),
        Kind::Array | Kind::StringArray => value.is_array(),
        Kind::Object => value.is_object(),
    };
    if !matches {
        return Err(type_violation(value, kind, path));
    }

    if kind == Kind::StringArray {
        for (i, item) in value.as_array().into_iter().flatten().enumerate() {
            if !item.is_string() {
                return Err(type_violation(item, Kind::String, &format!("{}/{}", path, i)));
            }
        }
    }
    Ok(())
}

fn reject_unknown(object: &Map<String, Value>, allowed: &[&str], path: &str) -> SchemaResult {
    match object.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(violation(
            "Unknown property (not in schema)",
            &format!("{}/{}", path, key),
        )),
        None => Ok(()),
    }
}

fn type_violation(value: &Value, expected: Kind, path: &str) -> SchemaViolation {
    violation(
        &format!(
            "Invalid type: {} (expected {})",
            json_type_name(value),
            expected.name()
        ),
        path,
    )
}

fn violation(message: &str, path: &str) -> SchemaViolation {
    SchemaViolation {
        message: message.to_string(),
        data_path: path.to_string(),
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_document() {
        let doc = json!([
            {"agsSource": {
                "url": "https://a/rest/services",
                "folderTitle": "Base",
                "folders": [{"name": "Hydro", "services": [{"name": "Rivers"}]}]
            }},
            {"wmsSource": {
                "url": "https://x/wms",
                "folderTitle": "Imagery",
                "layerIds": ["a", "b"],
                "availableInRegions": ["main"]
            }}
        ]);
        assert_eq!(validate(&doc), Ok(()));
    }

    #[test]
    fn test_is_new_flag_on_sources() {
        let doc = json!([
            {"agsSource": {"url": "u", "folders": [], "folderTitle": "T", "isNew": true}},
            {"wmsSource": {"url": "w", "folderTitle": "W", "layerIds": [], "isNew": false}}
        ]);
        assert_eq!(validate(&doc), Ok(()));

        let bad = json!([{"wmsSource": {"url": "w", "folderTitle": "W", "layerIds": [], "isNew": "yes"}}]);
        let violation = validate(&bad).unwrap_err();
        assert_eq!(violation.message, "Invalid type: string (expected boolean)");
        assert_eq!(violation.data_path, "/0/wmsSource/isNew");
    }

    #[test]
    fn test_top_level_must_be_array() {
        let err = validate(&json!({"agsSource": {}})).unwrap_err();
        assert_eq!(err.message, "Invalid type: object (expected array)");
        assert_eq!(err.data_path, "");
    }

    #[test]
    fn test_missing_required_property() {
        let doc = json!([{"wmsSource": {"url": "u", "layerIds": []}}]);
        let err = validate(&doc).unwrap_err();
        assert_eq!(err.message, "Missing required property: folderTitle");
        assert_eq!(err.data_path, "/0/wmsSource");
    }

    #[test]
    fn test_nested_type_error_path() {
        let doc = json!([{"agsSource": {
            "url": "u",
            "folders": [
                {"name": "ok", "services": []},
                {"name": "bad", "services": [{"name": 7}]}
            ]
        }}]);
        let err = validate(&doc).unwrap_err();
        assert_eq!(err.message, "Invalid type: number (expected string)");
        assert_eq!(err.data_path, "/0/agsSource/folders/1/services/0/name");
    }

    #[test]
    fn test_both_variants_rejected() {
        let doc = json!([{"agsSource": {"url": "u", "folders": []},
                          "wmsSource": {"url": "u", "folderTitle": "t", "layerIds": []}}]);
        let err = validate(&doc).unwrap_err();
        assert!(err.message.contains("more than one"));
        assert_eq!(err.data_path, "/0");
    }

    #[test]
    fn test_neither_variant_rejected() {
        let err = validate(&json!([{}])).unwrap_err();
        assert!(err.message.contains("does not match any"));
    }

    #[test]
    fn test_unknown_property_rejected() {
        let doc = json!([{"wmsSource": {
            "url": "u", "folderTitle": "t", "layerIds": [], "colour": "red"
        }}]);
        let err = validate(&doc).unwrap_err();
        assert_eq!(err.message, "Unknown property (not in schema)");
        assert_eq!(err.data_path, "/0/wmsSource/colour");
    }

    #[test]
    fn test_region_list_items_must_be_strings() {
        let doc = json!([{"wmsSource": {
            "url": "u", "folderTitle": "t", "layerIds": [], "availableInRegions": ["a", 3]
        }}]);
        let err = validate(&doc).unwrap_err();
        assert_eq!(err.data_path, "/0/wmsSource/availableInRegions/1");
    }
}
