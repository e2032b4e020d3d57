//! Table schema parsing and field lookup.
//!
//! A table's schema arrives as a camelCase JSON document: descriptive
//! attributes, an ordered `fields` list, and a `fieldRefs` mapping from
//! each field's numeric id (as a string key) to its external reference
//! name. [`Schema::load`] resolves every field's reference name, then
//! indexes fields by reference so callers can address them by the name
//! they see in the table.
//!
//! The field order in [`Schema::fields`] is the column order of every row
//! the read endpoint returns, with primary fields first.
//!
//! # Example
//!
//! ```rust
//! use factual::schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::load(&json!({
//!     "name": "US States",
//!     "totalRowCount": 50,
//!     "fields": [
//!         { "id": 1, "isPrimary": true },
//!         { "id": 2, "isPrimary": false, "datatype": "string" }
//!     ],
//!     "fieldRefs": { "1": "state", "2": "abbr" }
//! })).unwrap();
//!
//! assert_eq!(schema.total_row_count, Some(50));
//! assert_eq!(schema.field("abbr").unwrap().id, 2);
//! ```

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::wire::wire_key;

/// One column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Server-side numeric id, used when writing.
    pub id: u64,
    /// External reference name, used when reading and filtering.
    pub field_ref: String,
    pub is_primary: bool,
    /// Remaining descriptor keys (datatype, label, ...), uninterpreted.
    pub metadata: Map<String, Value>,
}

/// Parsed table schema. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub source: Option<String>,
    pub creator: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub total_row_count: Option<u64>,
    pub geo_enabled: bool,
    pub downloadable: bool,
    fields: Vec<Field>,
    by_ref: HashMap<String, usize>,
}

impl Schema {
    /// Parse a schema document (the object under the envelope's `schema`
    /// key).
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] when the document is not an object, lacks the
    /// `fields` list or the `fieldRefs` mapping, a field has no numeric
    /// id, a field id has no `fieldRefs` entry, a `fieldRefs` entry names
    /// no field, or two fields resolve to the same reference name.
    pub fn load(doc: &Value) -> Result<Self> {
        let obj = doc
            .as_object()
            .ok_or_else(|| Error::schema("schema document is not an object"))?;

        let attr = |name: &str| obj.get(&wire_key(name));
        let text = |name: &str| attr(name).and_then(value_text);

        let field_refs = attr("field_refs")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::schema("missing fieldRefs mapping"))?;
        let raw_fields = attr("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::schema("missing fields list"))?;

        let mut fields = Vec::with_capacity(raw_fields.len());
        let mut by_ref = HashMap::with_capacity(raw_fields.len());

        for (position, raw) in raw_fields.iter().enumerate() {
            let field = parse_field(raw, field_refs, position)?;
            if by_ref.insert(field.field_ref.clone(), position).is_some() {
                return Err(Error::schema(format!(
                    "duplicate field reference '{}'",
                    field.field_ref
                )));
            }
            fields.push(field);
        }

        if let Some(orphan) = field_refs
            .keys()
            .find(|id| !fields.iter().any(|f| f.id.to_string() == **id))
        {
            return Err(Error::schema(format!(
                "fieldRefs entry '{}' names no field",
                orphan
            )));
        }

        Ok(Self {
            name: text("name"),
            description: text("description"),
            rating: attr("rating").and_then(Value::as_f64),
            source: text("source"),
            creator: text("creator"),
            created_at: text("created_at"),
            updated_at: text("updated_at"),
            total_row_count: attr("total_row_count").and_then(Value::as_u64),
            geo_enabled: attr("geo_enabled").map(truthy).unwrap_or(false),
            downloadable: attr("downloadable").map(truthy).unwrap_or(false),
            fields,
            by_ref,
        })
    }

    /// Fields in column order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by its reference name. Exact string match.
    pub fn field(&self, field_ref: &str) -> Option<&Field> {
        self.by_ref.get(field_ref).map(|&i| &self.fields[i])
    }

    pub fn primary_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_primary)
    }

    /// All reference names, in column order.
    pub fn field_refs(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field_ref.as_str())
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

fn parse_field(raw: &Value, field_refs: &Map<String, Value>, position: usize) -> Result<Field> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::schema(format!("field #{} is not an object", position)))?;

    let id = obj
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::schema(format!("field #{} has no numeric id", position)))?;

    let field_ref = field_refs
        .get(&id.to_string())
        .and_then(Value::as_str)
        .ok_or_else(|| Error::schema(format!("field id {} has no fieldRefs entry", id)))?
        .to_string();

    let is_primary = obj.get("isPrimary").map(truthy).unwrap_or(false);

    let metadata = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "id" && k.as_str() != "isPrimary")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Field {
        id,
        field_ref,
        is_primary,
        metadata,
    })
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
