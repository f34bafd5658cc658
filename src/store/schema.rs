//! Schema validation for persisted annotation documents.
//!
//! Validation runs on the raw JSON value before deserialization so that a bad
//! document is rejected as a whole, with a precise location, and no partial
//! state is ever applied.

use crate::error::{ApiError, SchemaError};
use crate::store::shape::PersistedShape;
use serde_json::{Map, Value};
use std::path::Path;

const ENTRY_TYPES: &[&str] = &["finding", "note"];
const DETAIL_FIELDS: &[&str] = &[
    "severity",
    "difficulty",
    "type",
    "description",
    "exploit",
    "recommendation",
];

/// Parse and validate a persisted document read from `path`.
pub fn parse_document(text: &str, path: &Path) -> Result<PersistedShape, ApiError> {
    let value: Value = serde_json::from_str(text).map_err(|source| ApiError::MalformedJson {
        path: path.to_path_buf(),
        source,
    })?;
    validate_document(&value).map_err(|source| ApiError::InvalidAnnotations {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_value(value).map_err(|source| ApiError::MalformedJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Check the document shape. `partiallyAuditedFiles` may be absent; every
/// other collection is required.
pub fn validate_document(value: &Value) -> Result<(), SchemaError> {
    let doc = object(value, "$")?;

    for field in ["clientRemote", "gitRemote", "gitSha"] {
        if let Some(v) = doc.get(field) {
            if !v.is_string() {
                return Err(wrong_type("$", field, "a string"));
            }
        }
    }

    for (i, entry) in require_array(doc, "$", "treeEntries")?.iter().enumerate() {
        validate_entry(entry, &format!("treeEntries[{i}]"))?;
    }
    for (i, entry) in require_array(doc, "$", "resolvedEntries")?.iter().enumerate() {
        validate_entry(entry, &format!("resolvedEntries[{i}]"))?;
    }
    for (i, audited) in require_array(doc, "$", "auditedFiles")?.iter().enumerate() {
        let at = format!("auditedFiles[{i}]");
        let obj = object(audited, &at)?;
        require_str(obj, &at, "path")?;
        require_str(obj, &at, "author")?;
    }

    if let Some(regions) = doc.get("partiallyAuditedFiles") {
        let regions = regions
            .as_array()
            .ok_or_else(|| wrong_type("$", "partiallyAuditedFiles", "an array"))?;
        for (i, region) in regions.iter().enumerate() {
            let at = format!("partiallyAuditedFiles[{i}]");
            let obj = object(region, &at)?;
            require_non_empty_str(obj, &at, "path")?;
            require_non_empty_str(obj, &at, "author")?;
            require_line(obj, &at, "startLine")?;
            require_line(obj, &at, "endLine")?;
        }
    }

    Ok(())
}

fn validate_entry(entry: &Value, at: &str) -> Result<(), SchemaError> {
    let obj = object(entry, at)?;
    require_str(obj, at, "label")?;
    require_str(obj, at, "author")?;

    let entry_type = require_str(obj, at, "entryType")?;
    if !ENTRY_TYPES.contains(&entry_type) {
        return Err(SchemaError::InvalidValue {
            at: at.to_string(),
            field: "entryType",
            value: entry_type.to_string(),
        });
    }

    let details_at = format!("{at}.details");
    let details = object(require(obj, at, "details")?, &details_at)?;
    for &field in DETAIL_FIELDS {
        if let Some(v) = details.get(field) {
            if !v.is_string() {
                return Err(wrong_type(&details_at, field, "a string"));
            }
        }
    }

    let locations = require_array(obj, at, "locations")?;
    if locations.is_empty() {
        return Err(SchemaError::Empty {
            at: at.to_string(),
            field: "locations",
        });
    }
    for (i, location) in locations.iter().enumerate() {
        let loc_at = format!("{at}.locations[{i}]");
        let loc = object(location, &loc_at)?;
        require_str(loc, &loc_at, "path")?;
        require_line(loc, &loc_at, "startLine")?;
        require_line(loc, &loc_at, "endLine")?;
        require_str(loc, &loc_at, "label")?;
        require_str(loc, &loc_at, "description")?;
    }
    Ok(())
}

fn object<'a>(value: &'a Value, at: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value.as_object().ok_or_else(|| SchemaError::NotAnObject { at: at.to_string() })
}

fn require<'a>(
    obj: &'a Map<String, Value>,
    at: &str,
    field: &'static str,
) -> Result<&'a Value, SchemaError> {
    obj.get(field).ok_or_else(|| SchemaError::Missing {
        at: at.to_string(),
        field,
    })
}

fn require_str<'a>(
    obj: &'a Map<String, Value>,
    at: &str,
    field: &'static str,
) -> Result<&'a str, SchemaError> {
    require(obj, at, field)?
        .as_str()
        .ok_or_else(|| wrong_type(at, field, "a string"))
}

fn require_non_empty_str<'a>(
    obj: &'a Map<String, Value>,
    at: &str,
    field: &'static str,
) -> Result<&'a str, SchemaError> {
    let value = require_str(obj, at, field)?;
    if value.is_empty() {
        return Err(SchemaError::Empty {
            at: at.to_string(),
            field,
        });
    }
    Ok(value)
}

fn require_array<'a>(
    obj: &'a Map<String, Value>,
    at: &str,
    field: &'static str,
) -> Result<&'a Vec<Value>, SchemaError> {
    require(obj, at, field)?
        .as_array()
        .ok_or_else(|| wrong_type(at, field, "an array"))
}

fn require_line(obj: &Map<String, Value>, at: &str, field: &'static str) -> Result<u32, SchemaError> {
    require(obj, at, field)?
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| wrong_type(at, field, "a non-negative integer"))
}

fn wrong_type(at: &str, field: &'static str, expected: &'static str) -> SchemaError {
    SchemaError::WrongType {
        at: at.to_string(),
        field,
        expected,
    }
}
