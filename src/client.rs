//! Client entry point and table handle.
//!
//! [`Factual`] owns the configuration and a [`Transport`]; it prefixes
//! every resource path with `/api/v{version}/{api_key}` and checks each
//! response envelope. [`Factual::table`] fetches a table's schema once
//! and returns a [`Table`], which issues reads and input suggestions
//! against it.
//!
//! # Example
//!
//! ```rust,no_run
//! use factual::client::{Factual, InputOptions};
//! use factual::config::Config;
//! use factual::query::SortSpec;
//! use serde_json::json;
//!
//! let api = Factual::new(Config::new("YOUR_KEY"))?;
//! let table = api.table("EZ21ij")?;
//!
//! let mut query = table.query();
//! query
//!     .filter(json!({ "state": "CA" }))
//!     .sort([SortSpec::desc("population")])
//!     .page(1, Some(10));
//!
//! for row in query.each_row()? {
//!     println!("{:?} {:?}", row.subject(), row.value("population"));
//! }
//!
//! if let Some(row) = query.find_one()? {
//!     let fact = row.fact("population").unwrap();
//!     table.input_fact(fact, Some(json!(40000000)), &InputOptions::default().source("census"))?;
//! }
//! # Ok::<(), factual::error::Error>(())
//! ```

use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::query::{Query, ReadParams};
use crate::response::{Response, Step, TraversalFailure};
use crate::row::{project, Fact, Row};
use crate::schema::Schema;
use crate::transport::{HttpTransport, Transport};
use crate::wire::{api_path, query_string, table_resource, uri_encode};

/// Client for the tables API.
pub struct Factual {
    config: Config,
    transport: Box<dyn Transport>,
}

impl Factual {
    /// Client over HTTP.
    ///
    /// # Errors
    ///
    /// [`Error::Argument`] when the configuration does not validate;
    /// [`Error::Api`] when the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::argument(format!("{:#}", e)))?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport: Box::new(transport),
        })
    }

    /// Client over a caller-supplied transport.
    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full request path for a resource.
    pub fn api_path(&self, resource: &str) -> String {
        api_path(self.config.version, &self.config.api_key, resource)
    }

    /// Issue one call and check its envelope.
    pub fn call(&self, resource: &str) -> Result<Response> {
        let body = self.transport.get(&self.api_path(resource))?;
        Response::from_value(body)
    }

    /// Fetch a table's schema and open it.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] for transport or server failures,
    /// [`Error::Schema`] when the schema document is malformed.
    pub fn table(&self, table_key: &str) -> Result<Table<'_>> {
        let resp = self.call(&table_resource(table_key, "schema.json"))?;
        let schema = Schema::load(resp.view().get("schema")?.value())?;
        tracing::debug!(
            table = table_key,
            fields = schema.fields().len(),
            "loaded schema"
        );
        Ok(Table {
            client: self,
            key: table_key.to_string(),
            schema,
        })
    }

    /// Fetch a delegated token for writing on behalf of a shadow account.
    pub fn get_token(&self, unique_id: &str) -> Result<String> {
        let resp = self.call(&format!(
            "/sessions/get_token?uniqueId={}",
            uri_encode(unique_id)
        ))?;
        let node = resp.view().get("string")?;
        node.as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::api("token response has no string value"))
    }
}

/// Options attached to an input suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    pub source: Option<String>,
    pub comment: Option<String>,
    /// Delegated token from [`Factual::get_token`].
    pub token: Option<String>,
}

impl InputOptions {
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn append_to(&self, params: &mut Vec<(String, String)>) {
        if let Some(source) = &self.source {
            params.push(("source".to_string(), source.clone()));
        }
        if let Some(comment) = &self.comment {
            params.push(("comment".to_string(), comment.clone()));
        }
        if let Some(token) = &self.token {
            params.push(("token".to_string(), token.clone()));
        }
    }
}

/// One page of a table read.
pub(crate) struct Page {
    pub rows: Vec<Row>,
    pub total_rows: Option<u64>,
}

/// An open table: its key, its schema, and the client to reach it.
pub struct Table<'c> {
    client: &'c Factual,
    key: String,
    schema: Schema,
}

impl<'c> Table<'c> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Start a read query against this table.
    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    pub(crate) fn read_page(&self, params: &ReadParams, limit_override: Option<u64>) -> Result<Page> {
        let resource = format!(
            "{}?{}",
            table_resource(&self.key, "read.jsaml"),
            params.to_query_string(limit_override)?
        );
        let resp = self.client.call(&resource)?;
        let view = resp.view();

        let total_rows = view.path(["response", "total_rows"]).ok().and_then(|n| n.as_u64());
        let data = view.path(["response", "data"])?;
        let raw_rows = data
            .as_array()
            .ok_or_else(|| Error::api("response data is not an array"))?;

        let rows = raw_rows
            .iter()
            .map(|raw| {
                let cols = raw
                    .as_array()
                    .ok_or_else(|| Error::api("row data is not an array"))?;
                project(&self.schema, cols, false)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(table = %self.key, rows = rows.len(), ?total_rows, "read page");
        Ok(Page { rows, total_rows })
    }

    /// Read a single row by its subject key. `Ok(None)` when the service
    /// returns no row.
    pub fn get_row(&self, subject_key: &str) -> Result<Option<Row>> {
        let resource = format!(
            "{}?subject_key={}",
            table_resource(&self.key, "read.jsaml"),
            uri_encode(subject_key)
        );
        let resp = self.client.call(&resource)?;
        let view = resp.view();

        let first = match view.path([Step::from("response"), "data".into(), Step::Index(0)]) {
            Ok(node) => node,
            Err(e) if e.failure == TraversalFailure::IndexOutOfRange => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let cols = first
            .as_array()
            .ok_or_else(|| Error::api("row data is not an array"))?;
        let row = project(&self.schema, cols, true)?;
        Ok(Some(row.with_subject_key(subject_key)))
    }

    /// Suggest a new value for one fact.
    ///
    /// Returns `Ok(false)` without a request when `value` is `None` or
    /// JSON null. The fact itself is not updated; re-read to observe what
    /// the service accepted.
    pub fn input_fact(
        &self,
        fact: &Fact,
        value: Option<Value>,
        options: &InputOptions,
    ) -> Result<bool> {
        let value = match value {
            None | Some(Value::Null) => return Ok(false),
            Some(v) => v,
        };
        let subject_key = fact
            .subject_key()
            .ok_or_else(|| Error::argument("fact has no subject key"))?;
        let field = self.schema.field(fact.field_ref()).ok_or_else(|| {
            Error::argument(format!(
                "field '{}' is not in table {}",
                fact.field_ref(),
                self.key
            ))
        })?;

        let mut params = vec![
            ("subjectKey".to_string(), subject_key.to_string()),
            ("fieldId".to_string(), field.id.to_string()),
            ("value".to_string(), param_text(&value)),
        ];
        options.append_to(&mut params);
        self.submit_input(&params)
    }

    /// Suggest values for several fields of an existing row.
    pub fn input_row(
        &self,
        row: &Row,
        values: &Map<String, Value>,
        options: &InputOptions,
    ) -> Result<bool> {
        let subject_key = row
            .subject_key()
            .ok_or_else(|| Error::argument("row has no subject key"))?;
        let by_id = self.values_by_field_id(values)?;
        if by_id.is_empty() {
            return Ok(false);
        }

        let mut params = vec![
            ("subjectKey".to_string(), subject_key.to_string()),
            ("values".to_string(), Value::Object(by_id).to_string()),
        ];
        options.append_to(&mut params);
        self.submit_input(&params)
    }

    /// Suggest a new row.
    pub fn input(&self, values: &Map<String, Value>, options: &InputOptions) -> Result<bool> {
        let by_id = self.values_by_field_id(values)?;
        if by_id.is_empty() {
            return Ok(false);
        }

        let mut params = vec![("values".to_string(), Value::Object(by_id).to_string())];
        options.append_to(&mut params);
        self.submit_input(&params)
    }

    /// Re-key `values` from field reference to numeric field id.
    fn values_by_field_id(&self, values: &Map<String, Value>) -> Result<Map<String, Value>> {
        values
            .iter()
            .map(|(field_ref, value)| {
                let field = self.schema.field(field_ref).ok_or_else(|| {
                    Error::argument(format!(
                        "unknown field '{}' in values for table {}",
                        field_ref, self.key
                    ))
                })?;
                Ok((field.id.to_string(), value.clone()))
            })
            .collect()
    }

    fn submit_input(&self, params: &[(String, String)]) -> Result<bool> {
        let resource = format!(
            "{}?{}",
            table_resource(&self.key, "input.js"),
            query_string(params)
        );
        self.client.call(&resource)?;
        Ok(true)
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
