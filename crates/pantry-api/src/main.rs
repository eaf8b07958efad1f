use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pantry_api::config::{ApiConfig, LogFormat, StoreKind};
use pantry_api::state::AppState;
use pantry_repository::RecipeRepository;
use pantry_storage::store::{MemoryStore, ObjectStore, S3Store};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = ApiConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        // Structured JSON logging for CloudWatch
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).pretty().init(),
    }

    let store: Arc<dyn ObjectStore> = match config.store {
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store; records are lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreKind::S3 => {
            let client = match &config.s3_endpoint {
                Some(endpoint) => pantry_storage::client::build_client_with_endpoint(endpoint).await,
                None => pantry_storage::client::build_client().await,
            };
            tracing::info!(bucket = %config.bucket, "using the S3 store");
            Arc::new(S3Store::new(client, config.bucket.clone()))
        }
    };

    let state = AppState::new(RecipeRepository::new(store), config.delete_errors);
    let app = pantry_api::router(state);

    match config.listen_addr {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, app).await?;
            Ok(())
        }
        None => lambda_http::run(app).await.map_err(|e| eyre::eyre!(e)),
    }
}
