use std::path::PathBuf;
use std::sync::Arc;

use catalog_assistant::config::{EngineConfig, env_parse};
use catalog_assistant::db;
use catalog_assistant::llm::{LlmChat, LlmClient};
use catalog_assistant::routes;
use catalog_assistant::services::assistant::Assistant;
use catalog_assistant::services::catalog::{CatalogQuery, InMemoryCatalog};
use catalog_assistant::services::transcript::{InMemoryTranscript, TranscriptStore};
use catalog_assistant::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let port: u16 = env_parse("PORT", 3000);
    let config = EngineConfig::from_env();

    let (catalog, transcripts): (Arc<dyn CatalogQuery>, Arc<dyn TranscriptStore>) =
        if let Ok(database_url) = std::env::var("DATABASE_URL") {
            let pool = db::init_pool(&database_url, env_parse("DB_MAX_CONNECTIONS", 5))
                .await
                .expect("database init failed");
            tracing::info!("catalog: postgres");
            (Arc::new(db::PgCatalog::new(pool.clone())), Arc::new(db::PgTranscript::new(pool)))
        } else {
            let catalog = match std::env::var("CATALOG_SEED_PATH") {
                Ok(path) => InMemoryCatalog::from_json_file(&PathBuf::from(path)).expect("catalog seed load failed"),
                Err(_) => {
                    tracing::warn!("neither DATABASE_URL nor CATALOG_SEED_PATH set; catalog is empty");
                    InMemoryCatalog::default()
                }
            };
            tracing::info!(books = catalog.len(), "catalog: in-memory");
            (Arc::new(catalog), Arc::new(InMemoryTranscript::new()))
        };

    let llm: Option<Arc<dyn LlmChat>> = match LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "llm: enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "llm: disabled; answering from catalog only");
            None
        }
    };

    let state = AppState::new(Assistant::new(catalog, transcripts, llm, config));
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "catalog-assistant listening");
    axum::serve(listener, app).await.expect("server failed");
}
