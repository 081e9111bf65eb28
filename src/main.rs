//! Nutriplan
//!
//! An MCP server for nutrition planning and diet advice.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nutriplan::advice::{AdviceError, AdviceService, GeminiClient, Unconfigured};
use nutriplan::config::{AppConfig, GEMINI_API_KEY_ENV};
use nutriplan::mcp::NutriplanService;
use nutriplan::{build_info, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutriplan=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = AppConfig::from_env();
    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    // AI advice falls back to a stand-in that reports the missing key
    let (advice, ai_model): (Arc<dyn AdviceService>, Option<String>) =
        match GeminiClient::from_config(&config.gemini) {
            Ok(client) => {
                info!(model = client.model(), "Gemini advice enabled");
                let model = client.model().to_string();
                (Arc::new(client), Some(model))
            }
            Err(AdviceError::NotConfigured(_)) => {
                warn!("{} not set; AI advice tools are disabled", GEMINI_API_KEY_ENV);
                (Arc::new(Unconfigured), None)
            }
            Err(e) => return Err(e.into()),
        };

    // Create the Nutriplan service
    let service = NutriplanService::new(db_path, database, advice, ai_model);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
