pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{Database, DatabaseImpl};

use anyhow::Result;
use libsql::Connection;

/// Initialize the database schema.
pub async fn initialize_database(conn: &Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
