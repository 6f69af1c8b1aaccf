//! # Pulse Database Crate
//!
//! This crate is the application-specific interface to the PostgreSQL
//! database that stores hospitals, resource snapshots and service queues.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate encapsulates all database-specific logic and hides
//!   the SQL behind a small async API. It is the history provider the analytics engine
//!   consumes and the submitter that appends new resource snapshots.
//! - **Validation at the boundary:** Resource updates, profile edits and service records
//!   are validated before they are written. Readers such as the analytics engine rely on
//!   the stored invariants and do not check them again.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a shared `PgPool`.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool creation and schema bootstrap.
//! - `DbRepository`: all data access methods.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;
