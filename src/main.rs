use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkpeek::config::Config;
use linkpeek::links::LinkService;
use linkpeek::metadata::MetadataExtractor;
use linkpeek::redirect::PreviewTemplate;
use linkpeek::shortcode::ShortCodeIssuer;
use linkpeek::storage::{SqliteStorage, Storage};
use linkpeek::{create_app, AppOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkpeek=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Using SQLite storage: {}", config.database.url);
    let storage: Arc<dyn Storage> = Arc::new(
        SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
    );

    info!("Initializing database...");
    storage.init().await?;
    info!("Database initialized successfully");

    let preview = match config.preview_template_path.as_deref() {
        Some(path) => {
            info!("Using preview template from {}", path);
            PreviewTemplate::from_file(path).await?
        }
        None => PreviewTemplate::default(),
    };

    let extractor = MetadataExtractor::new(
        &config.metadata.user_agent,
        Duration::from_secs(config.metadata.timeout_secs),
    )?;
    let issuer = ShortCodeIssuer::new(Arc::clone(&storage), config.short_code_length);
    let links = Arc::new(LinkService::new(storage, issuer, Arc::new(extractor)));

    let app = create_app(
        links,
        AppOptions {
            preview,
            trust_proxy_headers: config.trust_proxy_headers,
            cors_permissive: config.cors_permissive,
        },
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
