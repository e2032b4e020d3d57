//! Tolerant navigation over service responses.
//!
//! Every response is a JSON envelope. [`Response::from_value`] checks the
//! envelope's `status` and turns `"error"` into [`Error::Api`]; everything
//! after that is read through a [`ResponseView`], which descends one step
//! at a time and reports a missing key, an out-of-range index, or an
//! attempt to index into a scalar as a [`ResponseError`] *value* instead
//! of panicking.
//!
//! ```rust
//! use factual::response::{Node, Response, Step};
//! use serde_json::json;
//!
//! let resp = Response::from_value(json!({
//!     "status": "ok",
//!     "response": { "total_rows": 2, "data": [["a", 1]] }
//! })).unwrap();
//!
//! let view = resp.view();
//! assert_eq!(view.path(["response", "total_rows"]).unwrap().as_u64(), Some(2));
//! assert!(view.path(["response", "missing", "deeper"]).is_err());
//!
//! let cell = view.path([Step::from("response"), "data".into(), Step::Index(0), Step::Index(1)]);
//! assert!(matches!(cell, Ok(Node::Scalar(v)) if v == &json!(1)));
//! ```

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error::{Error, Result};

/// One indexing step: an object key or an array position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'k> {
    Key(&'k str),
    Index(usize),
}

impl<'k> From<&'k str> for Step<'k> {
    fn from(key: &'k str) -> Self {
        Step::Key(key)
    }
}

impl From<usize> for Step<'_> {
    fn from(index: usize) -> Self {
        Step::Index(index)
    }
}

impl fmt::Display for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(k) => write!(f, "{}", k),
            Step::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Why a traversal step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalFailure {
    MissingKey,
    IndexOutOfRange,
    /// Indexed a scalar, or used a key on an array / an index on an object.
    NotIndexable,
}

/// A failed traversal, carrying the path walked up to and including the
/// failing step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot read `{path}`: {failure:?}")]
pub struct ResponseError {
    pub path: String,
    pub failure: TraversalFailure,
}

impl From<ResponseError> for Error {
    fn from(err: ResponseError) -> Self {
        Error::api(format!("unexpected response shape: {}", err))
    }
}

/// Result of one or more indexing steps.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    /// An object or array, wrapped for further indexing.
    View(ResponseView<'a>),
    /// A string, number, boolean, or null.
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    /// The underlying JSON value regardless of kind.
    pub fn value(&self) -> &'a Value {
        match self {
            Node::View(v) => v.value(),
            Node::Scalar(v) => v,
        }
    }

    /// Continue indexing; a scalar yields [`TraversalFailure::NotIndexable`].
    pub fn get<'k>(&self, step: impl Into<Step<'k>>) -> std::result::Result<Node<'a>, ResponseError> {
        let step: Step<'k> = step.into();
        match self {
            Node::View(v) => v.get(step),
            Node::Scalar(_) => Err(ResponseError {
                path: step.to_string(),
                failure: TraversalFailure::NotIndexable,
            }),
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value().as_str()
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.value().as_u64()
    }

    pub fn as_array(&self) -> Option<&'a Vec<Value>> {
        self.value().as_array()
    }
}

/// Read-only, chainable view over part of a parsed JSON document.
#[derive(Debug, Clone, Copy)]
pub struct ResponseView<'a> {
    value: &'a Value,
}

impl<'a> ResponseView<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Descend a single step.
    pub fn get<'k>(&self, step: impl Into<Step<'k>>) -> std::result::Result<Node<'a>, ResponseError> {
        let step = step.into();
        let fail = |failure| ResponseError {
            path: step.to_string(),
            failure,
        };

        let child = match (step, self.value) {
            (Step::Key(k), Value::Object(map)) => {
                map.get(k).ok_or_else(|| fail(TraversalFailure::MissingKey))?
            }
            (Step::Index(i), Value::Array(items)) => {
                items.get(i).ok_or_else(|| fail(TraversalFailure::IndexOutOfRange))?
            }
            _ => return Err(fail(TraversalFailure::NotIndexable)),
        };

        Ok(match child {
            Value::Object(_) | Value::Array(_) => Node::View(ResponseView::new(child)),
            scalar => Node::Scalar(scalar),
        })
    }

    /// Descend several steps. The error names the full path up to the
    /// failing step.
    pub fn path<'k, I, S>(&self, steps: I) -> std::result::Result<Node<'a>, ResponseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Step<'k>>,
    {
        let mut node = Node::View(*self);
        let mut walked: Vec<String> = Vec::new();
        for step in steps {
            let step = step.into();
            walked.push(step.to_string());
            node = node.get(step).map_err(|e| ResponseError {
                path: walked.join("."),
                failure: e.failure,
            })?;
        }
        Ok(node)
    }
}

/// A checked response envelope.
#[derive(Debug, Clone)]
pub struct Response {
    body: Value,
}

impl Response {
    /// Accept a parsed envelope, failing with [`Error::Api`] when it
    /// reports `status: "error"`.
    pub fn from_value(body: Value) -> Result<Self> {
        if body.get("status").and_then(Value::as_str) == Some("error") {
            let message = match body.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "unknown error".to_string(),
            };
            return Err(Error::api(message));
        }
        Ok(Self { body })
    }

    pub fn view(&self) -> ResponseView<'_> {
        ResponseView::new(&self.body)
    }
}
