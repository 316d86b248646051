use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{AuthError, PasswordHasher, TokenSigner};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};
use crate::services::{AuthGateway, DataAccessGuard, DocumentStore, ProfileMutators, RequestLifecycle};

/// Multipart framing on top of the document itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Services shared by every handler, built once at startup around one store
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthGateway>,
    pub guard: Arc<DataAccessGuard>,
    pub requests: Arc<RequestLifecycle>,
    pub profiles: Arc<ProfileMutators>,
    pub documents: Arc<DocumentStore>,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Result<Self, AuthError> {
        let auth = AuthGateway::new(
            store.clone(),
            TokenSigner::from_config(&config.security),
            PasswordHasher::from_config(&config.security)?,
            config.security.uniform_auth_errors,
        );

        Ok(Self {
            auth: Arc::new(auth),
            guard: Arc::new(DataAccessGuard::new(store.clone())),
            requests: Arc::new(RequestLifecycle::new(store.clone())),
            profiles: Arc::new(ProfileMutators::new(store.clone())),
            documents: Arc::new(DocumentStore::from_config(&config.storage)),
            store,
        })
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone(), config));

    // Local uploads are served back from the same origin
    if config.storage.public_url.starts_with('/') {
        router = router.nest_service(
            &config.storage.public_url,
            ServeDir::new(&config.storage.upload_dir),
        );
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security)),
        )
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root_get))
        .route("/health", get(public::health_get))
        .route("/signup", post(public::signup_post))
        .route("/login", post(public::login_post))
        .route("/getcaretakers", get(public::caretakers_get))
}

fn protected_routes(state: AppState, config: &AppConfig) -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(config.storage.max_upload_bytes + MULTIPART_OVERHEAD);

    Router::new()
        .route("/credentials", get(protected::credentials_get))
        .route("/requests", get(protected::requests_get).post(protected::requests_post))
        .route("/update-status/:requestId", put(protected::status_put))
        .route("/addtasks", post(protected::tasks_post))
        .route("/tasks", get(protected::tasks_get))
        .route("/addmedication", post(protected::medication_post))
        .route("/medication", get(protected::medication_get))
        .route("/addcontacts", post(protected::contacts_post))
        .route("/chat", get(protected::contacts_get))
        .route("/addmetrics", post(protected::metrics_post))
        .route("/metrics", get(protected::metrics_get))
        .route("/upload", post(protected::upload_post).layer(upload_limit))
        // Layers run bottom-up: credential check, then user lookup
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
