//! Nexchat server binary.

use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use nexchat::adapters::catalog::CatalogSchemaProvider;
use nexchat::adapters::clock::SystemClock;
use nexchat::adapters::document::InMemoryDocumentStore;
use nexchat::adapters::http::{chat_routes, with_middleware, ChatHandlers};
use nexchat::adapters::intent::{KeywordIntentParser, LlmIntentConfig, LlmIntentParser};
use nexchat::adapters::permissions::{RolePermissionChecker, StubPermissionChecker};
use nexchat::adapters::presenter::{MarkdownPresenter, PresenterRegistry};
use nexchat::adapters::storage::{InMemorySessionStore, RedisSessionStore};
use nexchat::application::{HandleTurnHandler, IntakePorts, TurnConfig};
use nexchat::config::{
    AppConfig, IntentConfig, IntentProvider, LogFormat, PermissionsConfig, SessionBackend,
};
use nexchat::ports::{
    Clock, DocumentStore, IntentParser, PermissionChecker, SchemaProvider, SessionStore,
};
use secrecy::ExposeSecret;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.log_format == LogFormat::Json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn session_store(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn SessionStore>, Box<dyn Error>> {
    match config.session.backend {
        SessionBackend::Memory => Ok(Arc::new(InMemorySessionStore::new(clock))),
        SessionBackend::Redis => {
            let connect = RedisSessionStore::connect(&config.redis.url, config.session.key_prefix.clone());
            let store = tokio::time::timeout(config.redis.timeout(), connect)
                .await
                .map_err(|_| "timed out connecting to Redis")??;
            Ok(Arc::new(store))
        }
    }
}

fn permission_checker(
    config: &PermissionsConfig,
) -> Result<Arc<dyn PermissionChecker>, Box<dyn Error>> {
    match &config.roles_path {
        None => {
            tracing::warn!("No role table configured, every actor may do everything");
            Ok(Arc::new(StubPermissionChecker::allowing()))
        }
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading role table");
            Ok(Arc::new(RolePermissionChecker::load(path)?))
        }
    }
}

fn intent_parser(
    config: &IntentConfig,
    schema: Arc<dyn SchemaProvider>,
    permissions: Arc<dyn PermissionChecker>,
) -> Result<Arc<dyn IntentParser>, Box<dyn Error>> {
    match config.provider {
        IntentProvider::Keyword => Ok(Arc::new(KeywordIntentParser::new(schema))),
        IntentProvider::OpenAI => {
            let api_key = config
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().clone())
                .ok_or("NEXCHAT__INTENT__API_KEY is not set")?;
            let llm_config = LlmIntentConfig::new(api_key)
                .with_model(config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            Ok(Arc::new(
                LlmIntentParser::new(llm_config, schema)?.with_permissions(permissions),
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let catalog = CatalogSchemaProvider::load(&config.catalog.path)?;
    let rules = catalog.field_rules();
    let documents = Arc::new(
        InMemoryDocumentStore::new(clock.clone()).with_title_fields(catalog.title_fields()),
    );
    if config.catalog.seed {
        let seeds = catalog.seed_records();
        for (record_type, data) in &seeds {
            documents.create(record_type, data.clone()).await?;
        }
        tracing::info!(records = seeds.len(), "Seed records loaded");
    }
    let schema: Arc<dyn SchemaProvider> = Arc::new(catalog);

    let permissions = permission_checker(&config.permissions)?;
    let sessions = session_store(&config, clock.clone()).await?;
    let intents = intent_parser(&config.intent, schema.clone(), permissions.clone())?;

    let ports = IntakePorts {
        sessions: sessions.clone(),
        schema,
        permissions,
        documents: documents as Arc<dyn DocumentStore>,
        intents,
        presenter: Arc::new(PresenterRegistry::new(Arc::new(MarkdownPresenter::new(
            config.session.page_size,
        )))),
        clock,
    };
    let turn_config = TurnConfig {
        session_ttl: config.session.ttl(),
        list_limit: config.session.list_limit,
    };
    let turn_handler = Arc::new(HandleTurnHandler::new(ports, turn_config).with_field_rules(rules));

    let app = with_middleware(
        chat_routes(ChatHandlers::new(turn_handler, sessions)),
        &config.server,
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        backend = ?config.session.backend,
        intent_provider = ?config.intent.provider,
        "Nexchat listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
