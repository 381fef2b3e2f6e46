//! Outdial DB
//!
//! PostgreSQL connection pooling shared by the dialing services.

mod error;
mod pool;

pub use error::{DbError, Result};
pub use pool::{DbPool, PoolConfig, PoolStats};

/// Re-export tokio-postgres types for convenience
pub use tokio_postgres::{types::ToSql, Row};
