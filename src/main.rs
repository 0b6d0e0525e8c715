//! Pantry Stock Ledger
//!
//! An MCP server for multi-unit perishable inventory tracking.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use pantry::build_info;
use pantry::config::Config;
use pantry::db::{self, Database};
use pantry::ledger::StockLedger;
use pantry::mcp::PantryService;
use pantry::store::SqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pantry=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = Database::new(&db_path)?;

    // Run migrations
    database.with_conn_mut(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    // Load the conversion table
    let graph = config.conversion_graph()?;
    match &config.units_path {
        Some(path) => eprintln!("Unit table: {} ({} units)", path.display(), graph.len()),
        None => eprintln!("Unit table: built-in ({} units)", graph.len()),
    }

    let ledger = StockLedger::new(SqliteStore::new(database), Arc::new(graph));
    let service = PantryService::new(db_path, ledger);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
