/// Storage layer: the target collection behind an identity-addressed trait.
pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{LibsqlTargetStore, TargetStore};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
