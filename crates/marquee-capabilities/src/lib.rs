//! # marquee-capabilities
//!
//! The pluggable units of work the orchestrator dispatches to.
//!
//! - [`traits`]: the [`traits::Capability`] contract
//!   (`describe` / `build_inputs` / `execute` / `summarize` /
//!   `response_context`) the orchestrator depends on
//! - [`registry`]: the statically built [`registry::Catalog`] — an
//!   explicit name → capability table, no runtime discovery
//! - [`query`]: structured sub-queries and the [`query::QueryPlan`]
//! - [`client`]: the analytical query service seam
//!   ([`client::QueryClient`]) and its HTTP implementation with
//!   tenant-scoped JWT auth
//! - [`multi_fetch`]: bounded-concurrency sub-query execution with
//!   partial-failure aggregation
//! - [`converse`] / [`fetch`] / [`analyze`]: the built-in capability set;
//!   their text- and insight-generation internals live behind injected
//!   collaborator traits
//! - [`help`]: the meta-capability answering "what can you do" from the
//!   catalog's grouped summary

#![deny(unsafe_code)]

pub mod analyze;
pub mod client;
pub mod converse;
pub mod errors;
pub mod fetch;
pub mod help;
pub mod multi_fetch;
pub mod query;
pub mod registry;
pub mod traits;

pub use errors::{CapabilityError, QueryError};
pub use registry::{Catalog, CatalogBuilder};
pub use traits::{Capability, CapabilityInputs, SessionScope};
