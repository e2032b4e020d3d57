//! # Factual
//!
//! Client library for the Factual tables API: fetch a table's schema,
//! build filtered, sorted, and paginated reads against its rows, and
//! submit input suggestions for single facts or whole rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌──────────────┐
//! │  Query   │──▶│ ReadParams │──▶│ Transport │──▶│ ResponseView │
//! │ builder  │   │  encoding  │   │  (HTTP)   │   │  (tolerant)  │
//! └──────────┘   └────────────┘   └───────────┘   └──────┬───────┘
//!                                                        ▼
//!                                  ┌────────┐     ┌─────────────┐
//!                                  │ Schema │────▶│ project()   │──▶ Row / Fact
//!                                  └────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! factual schema EZ21ij
//! factual read EZ21ij --filter '{"state":"CA"}' --sort population:desc --size 5
//! factual row EZ21ij 6ec8ea3e-...
//! factual input EZ21ij 6ec8ea3e-... population 39000000 --source census
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | `Factual` client, `Table` handle, input suggestions |
//! | [`config`] | Configuration and TOML loading |
//! | [`error`] | Error taxonomy |
//! | [`query`] | Read-query builder and parameter encoding |
//! | [`response`] | Envelope check and tolerant JSON traversal |
//! | [`row`] | Row and fact projection |
//! | [`schema`] | Schema parsing and field lookup |
//! | [`transport`] | HTTP transport |
//! | [`wire`] | Wire-key naming and percent-encoding |

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod response;
pub mod row;
pub mod schema;
pub mod transport;
pub mod wire;

pub use client::{Factual, InputOptions, Table};
pub use config::Config;
pub use error::{Error, Result};
pub use query::{Query, ReadParams, SortSpec};
pub use row::{Fact, Row};
pub use schema::{Field, Schema};
