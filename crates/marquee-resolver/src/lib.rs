//! # marquee-resolver
//!
//! Fuzzy, tenant-scoped entity resolution for the Marquee engine.
//!
//! The resolver answers one question: given a mention like "chicago" and a
//! type hint like `production`, which catalog records could it mean?
//! Lookups run against a SQLite-backed entity store with a registered
//! trigram-similarity SQL function, return **all** matches above a
//! threshold (ambiguity must survive into the candidate list), and map raw
//! similarity through a discriminative score transform.
//!
//! - [`trigram`]: pg_trgm-style trigram similarity, registered as the
//!   `similarity(a, b)` scalar function on every pooled connection
//! - [`score`]: the raw → confidence transform with exact fixed points
//! - [`store`]: connection pool, migrations, and the entity table
//! - [`resolver`]: [`resolver::EntityResolver`] — type-scoped resolve,
//!   cross-type lookup with discount, frame resolution, disambiguation

#![deny(unsafe_code)]

pub mod errors;
pub mod resolver;
pub mod score;
pub mod store;
pub mod trigram;

pub use errors::{ResolverError, Result};
pub use resolver::{EntityResolver, ResolverConfig};
pub use store::{ConnectionPool, new_in_memory, new_on_disk, run_migrations};
