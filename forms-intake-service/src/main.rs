use forms_intake_service::{create_app, extract::TextExtractor, schema::FormSchemas};
use intake_flow::{InMemorySessionStorage, SessionStorage};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured tracing based on environment variables
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "forms_intake_service=debug,intake_flow=debug,tower_http=debug".into()
    });

    match log_format.as_str() {
        "pretty" => {
            // Human-readable logging for development
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            // Structured JSON logging for production
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let schemas = Arc::new(FormSchemas::load()?);
    let extractor = Arc::new(TextExtractor::from_env());
    let output_dir = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "generated".to_string());

    let storage = Arc::new(InMemorySessionStorage::new());

    // Sessions are ephemeral; sweep out anything older than the TTL.
    let session_ttl_secs = std::env::var("SESSION_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(3600);
    {
        let storage = storage.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                let purged = storage.purge_older_than(chrono::Duration::seconds(session_ttl_secs));
                if purged > 0 {
                    info!("purged {} expired sessions", purged);
                }
            }
        });
    }

    let session_storage: Arc<dyn SessionStorage> = storage;
    let app = create_app(schemas, session_storage, extractor, output_dir);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Form Intake Service running on http://{}", addr);
    info!("Validation endpoint: POST http://{}/intake/validate", addr);
    info!("Chat endpoint: POST http://{}/chat", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
