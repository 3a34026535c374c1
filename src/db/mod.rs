//! Database module: schema constants, row models, and the Postgres access layer.
//!
//! Layout:
//! - `schema.rs`: table inventory shared by the deploy summary and verification
//! - `models.rs`: Rust structs mirroring DB rows
//! - `executor.rs`: statement-level seam used by the deploy and verify scripts
//! - `postgres.rs`: pooled queries used by the REST API

pub mod executor;
pub mod models;
pub mod postgres;
pub mod schema;

pub use executor::StatementExecutor;
pub use models::{DbUser, JobListing};
pub use postgres::{PgPool, PortalStorage};
pub use schema::KNOWN_TABLES;
