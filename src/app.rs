use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthError, IdentityProvider, JwtIdentityProvider, RemoteIdentityProvider};
use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Repository, RowStore, ViewCache};
use crate::handlers::{booking, resource};
use crate::middleware::session_middleware;
use crate::models::{Contact, Note, Resource, Todo};

/// Everything a request handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RowStore>,
    pub cache: Arc<ViewCache>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RowStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        let cache = Arc::new(ViewCache::with_limits(
            config.list_cache_enabled(),
            config.list_cache_max_age(),
            config.api.list_cache_max_entries,
        ));
        Self {
            config: Arc::new(config),
            store,
            cache,
            identity,
        }
    }

    pub fn repository<R: Resource>(&self) -> Repository<R> {
        Repository::new(self.store.clone(), self.cache.clone())
    }
}

/// Connect the configured store and identity provider
pub async fn build_state(config: AppConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn RowStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            Arc::new(PgStore::new(pool, &config.database))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let identity = identity_provider(&config)?;
    Ok(AppState::new(config, store, identity))
}

fn identity_provider(config: &AppConfig) -> Result<Arc<dyn IdentityProvider>, AuthError> {
    let security = &config.security;

    if security.jwt_secret.is_empty() {
        if let Some(url) = &security.auth_url {
            tracing::info!("Verifying sessions against {} (timeout {:?})", url, config.auth_timeout());
            let remote = RemoteIdentityProvider::new(url, security.auth_api_key.clone(), config.auth_timeout())?;
            return Ok(Arc::new(remote));
        }
        tracing::warn!("Neither JWT_SECRET nor AUTH_URL is set; every request will be anonymous");
    }

    Ok(Arc::new(JwtIdentityProvider::new(
        security.jwt_secret.clone(),
        security.jwt_audience.clone(),
    )))
}

pub fn router(state: AppState) -> Router {
    let api = &state.config.api;
    let security = &state.config.security;

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/booking", post(booking::submit))
        .merge(resource_routes::<Note>())
        .merge(resource_routes::<Contact>())
        .merge(resource_routes::<Todo>())
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes));

    if security.enable_cors {
        app = app.layer(cors_layer(&security.cors_origins));
    }
    if api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn resource_routes<R: Resource>() -> Router<AppState> {
    Router::new()
        .route(
            &format!("/{}", R::PATH),
            get(resource::list::<R>).post(resource::create::<R>),
        )
        .route(
            &format!("/{}/:id", R::PATH),
            patch(resource::update::<R>).delete(resource::delete::<R>),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Pocket API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Notes, contacts and todos over a session-guarded JSON API",
        "endpoints": {
            "notes": "/notes[/:id] (session)",
            "contacts": "/contacts[/:id] (session)",
            "todos": "/todos[/:id] (session)",
            "booking": "/booking (public)",
            "health": "/health (public)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                })),
            )
        }
    }
}

