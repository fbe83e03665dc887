use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use compat_engine::config::{AnalysisProvider, LoggingSettings, Settings, StorageBackend};
use compat_engine::core::Matcher;
use compat_engine::routes::{self, auth::TokenVerifier, ApiError, AppState};
use compat_engine::services::{
    AnalysisGenerator, CodeBroker, CodeStore, FallbackCodeStore, HttpAnalysisGenerator,
    InMemoryStore, Lifecycle, LifecycleStore, LocalCodeCache, PostgresStore, SystemClock,
    TemplateAnalysisGenerator,
};

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::BadRequest(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(format!("Invalid query: {}", err)).into()
}

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| io_error("Configuration error", e))?;

    init_logging(&settings.logging);
    info!("Starting compatibility engine...");

    // Durable store for codes, invitations and matches
    let mut postgres: Option<Arc<PostgresStore>> = None;
    let (durable_codes, lifecycle_store): (Arc<dyn CodeStore>, Arc<dyn LifecycleStore>) =
        match settings.storage.backend {
            StorageBackend::Postgres => {
                let db = &settings.database;
                let store = Arc::new(
                    PostgresStore::from_settings(
                        &db.url,
                        db.max_connections,
                        db.min_connections,
                        db.acquire_timeout_secs,
                    )
                    .await
                    .map_err(|e| io_error("PostgreSQL connection error", e))?,
                );
                info!("PostgreSQL store initialized");
                postgres = Some(store.clone());
                (store.clone() as Arc<dyn CodeStore>, store as Arc<dyn LifecycleStore>)
            }
            StorageBackend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                let store = Arc::new(InMemoryStore::new());
                (store.clone() as Arc<dyn CodeStore>, store as Arc<dyn LifecycleStore>)
            }
        };

    let clock = Arc::new(SystemClock);

    let local_cache = Arc::new(LocalCodeCache::new(
        settings.broker.local_cache_capacity,
        settings.broker.local_cache_ttl(),
    ));
    let codes = FallbackCodeStore::new(durable_codes, local_cache, settings.broker.store_timeout());
    let broker = Arc::new(CodeBroker::new(codes, clock.clone(), settings.broker.code_ttl()));

    let lifecycle = Arc::new(Lifecycle::new(
        lifecycle_store,
        clock,
        settings.lifecycle.invitation_ttl(),
        settings.lifecycle.store_timeout(),
    ));

    let analysis: Arc<dyn AnalysisGenerator> = match settings.analysis.provider {
        AnalysisProvider::Http => {
            let endpoint = settings
                .analysis
                .endpoint
                .clone()
                .ok_or_else(|| io_error("Configuration error", "analysis.endpoint is required for the http provider"))?;
            info!("Analysis provider: {}", endpoint);
            Arc::new(
                HttpAnalysisGenerator::new(
                    endpoint,
                    settings.analysis.api_key.clone(),
                    std::time::Duration::from_secs(settings.analysis.timeout_secs),
                )
                .map_err(|e| io_error("Analysis client error", e))?,
            )
        }
        AnalysisProvider::Template => {
            info!("Analysis provider: template");
            Arc::new(TemplateAnalysisGenerator)
        }
    };

    // Initialize matcher with configured weights
    let matcher = Matcher::try_new(
        (&settings.scoring.weights).into(),
        (&settings.scoring.correlation).into(),
    )
    .map_err(|e| io_error("Invalid scoring weights", e))?;

    info!("Matcher initialized with weights: {:?}", matcher.weights());

    let app_state = AppState {
        broker,
        lifecycle,
        analysis,
        matcher,
        tokens: Arc::new(TokenVerifier::new(&settings.auth.jwt_secret)),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let served = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    if let Some(store) = postgres {
        store.close().await;
        info!("PostgreSQL pool closed");
    }

    served
}
