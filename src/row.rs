//! Rows and facts reconstructed from positional row data.
//!
//! The read endpoint returns each row as a JSON array aligned to the
//! schema's field order. [`project`] walks the schema and splits such an
//! array into the row's subject (the primary-field values) and one
//! [`Fact`] per non-primary field.
//!
//! Column layout depends on how the row was fetched:
//!
//! ```text
//! table scan   [subject_key, field_0, field_1, ...]   offset 1
//! single row   [field_0, field_1, ...]                offset 0
//! ```
//!
//! The offset is chosen from the `single_row` flag alone; row contents
//! are never inspected to guess it.
//!
//! Which read carries the leading subject-key column has not been
//! confirmed against the live service; revisit if single-row reads ever
//! come back misaligned.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{Field, Schema};

/// One (subject, field) value cell, as read.
///
/// The value is a snapshot: writing a suggestion through
/// [`Table::input_fact`](crate::client::Table::input_fact) does not change it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    subject_key: Option<String>,
    subject: Vec<Value>,
    field: Field,
    value: Value,
}

impl Fact {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn field_ref(&self) -> &str {
        &self.field.field_ref
    }

    pub fn subject(&self) -> &[Value] {
        &self.subject
    }

    /// Server-side key of the row this fact belongs to, when known.
    pub fn subject_key(&self) -> Option<&str> {
        self.subject_key.as_deref()
    }
}

/// One record of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    subject_key: Option<String>,
    subject: Vec<Value>,
    facts: Vec<Fact>,
}

impl Row {
    /// Server-side key identifying this row, used when writing.
    pub fn subject_key(&self) -> Option<&str> {
        self.subject_key.as_deref()
    }

    /// Primary-field values, in schema order.
    pub fn subject(&self) -> &[Value] {
        &self.subject
    }

    /// Facts for every non-primary field, in schema order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn fact(&self, field_ref: &str) -> Option<&Fact> {
        self.facts.iter().find(|f| f.field_ref() == field_ref)
    }

    pub fn value(&self, field_ref: &str) -> Option<&Value> {
        self.fact(field_ref).map(Fact::value)
    }

    /// Attach the subject key of a row fetched by key.
    pub(crate) fn with_subject_key(mut self, subject_key: &str) -> Self {
        self.subject_key = Some(subject_key.to_string());
        for fact in &mut self.facts {
            fact.subject_key = Some(subject_key.to_string());
        }
        self
    }
}

/// Build a [`Row`] from a positional row array.
///
/// With `single_row == false` the first column is the row's subject key
/// and field values start at column 1. With `single_row == true` field
/// values start at column 0 and the subject key is left unset for the
/// caller to attach.
///
/// # Errors
///
/// [`Error::Projection`] when `raw` has fewer columns than the schema
/// needs; the row is never silently truncated.
pub fn project(schema: &Schema, raw: &[Value], single_row: bool) -> Result<Row> {
    let offset = if single_row { 0 } else { 1 };
    let expected = schema.fields().len() + offset;
    if raw.len() < expected {
        return Err(Error::Projection {
            expected,
            actual: raw.len(),
        });
    }

    let subject_key = if single_row {
        None
    } else {
        Some(match &raw[0] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    let mut subject = Vec::new();
    let mut pending = Vec::new();
    for (idx, field) in schema.fields().iter().enumerate() {
        let value = raw[idx + offset].clone();
        if field.is_primary {
            subject.push(value);
        } else {
            pending.push((field.clone(), value));
        }
    }

    let facts = pending
        .into_iter()
        .map(|(field, value)| Fact {
            subject_key: subject_key.clone(),
            subject: subject.clone(),
            field,
            value,
        })
        .collect();

    Ok(Row {
        subject_key,
        subject,
        facts,
    })
}
