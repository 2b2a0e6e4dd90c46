// Application state and route table
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderValue,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{TokenError, TokenService};
use crate::config::{AppConfig, ServerConfig};
use crate::database::models::{Category, Cost, Transaction, User};
use crate::database::repositories::{
    CategoryRepository, CostRepository, TransactionRepository, UserRepository,
};
use crate::database::{DatabaseManager, HealthCheck, PgRepository};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, timeout_envelope};
use crate::services::{AuthService, CategoryService, CostService, TransactionService, UserService};

/// Everything a handler can reach; cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenService,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub categories: Arc<CategoryService>,
    pub costs: Arc<CostService>,
    pub transactions: Arc<TransactionService>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    /// Wire services over any set of repositories
    pub fn from_repositories(
        tokens: TokenService,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        costs: Arc<dyn CostRepository>,
        transactions: Arc<dyn TransactionRepository>,
        health: Arc<dyn HealthCheck>,
        bcrypt_cost: u32,
    ) -> Self {
        let user_service = Arc::new(UserService::new(users, bcrypt_cost));

        Self {
            tokens,
            auth: Arc::new(AuthService::new(user_service.clone())),
            users: user_service,
            categories: Arc::new(CategoryService::new(categories.clone())),
            costs: Arc::new(CostService::new(costs, categories.clone())),
            transactions: Arc::new(TransactionService::new(transactions, categories)),
            health,
        }
    }

    /// Postgres-backed state sharing one pool across every repository
    pub fn postgres(config: &AppConfig, db: &DatabaseManager) -> Result<Self, TokenError> {
        let tokens = TokenService::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        )?;
        let pool = db.pool().clone();

        Ok(Self::from_repositories(
            tokens,
            Arc::new(PgRepository::<User>::new(pool.clone())),
            Arc::new(PgRepository::<Category>::new(pool.clone())),
            Arc::new(PgRepository::<Cost>::new(pool.clone())),
            Arc::new(PgRepository::<Transaction>::new(pool)),
            Arc::new(db.clone()),
            config.security.bcrypt_cost,
        ))
    }
}

/// Full application: routes plus the global middleware stack
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    layered(router(state), server.request_timeout(), &server.cors_origins)
}

fn layered(router: Router, timeout: Duration, cors_origins: &[String]) -> Router {
    router
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(timeout_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api/v1", public_routes().merge(protected_routes(&state)))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/ready", get(public::ready))
        .route("/live", get(public::live))
        .route("/auth/register", post(public::auth_register))
        .route("/auth/login", post(public::auth_login))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    use protected::{categories, costs, transactions, users};

    Router::new()
        .route("/auth/whoami", get(protected::auth_whoami))
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get).put(users::update))
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/:id",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/costs", get(costs::list).post(costs::create))
        .route(
            "/costs/:id",
            get(costs::get).put(costs::update).delete(costs::delete),
        )
        .route("/transactions", get(transactions::list).post(transactions::create))
        .route(
            "/transactions/:id",
            get(transactions::get)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        // Only matched routes pay for token validation
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            jwt_auth_middleware,
        ))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": 200,
        "success": true,
        "data": {
            "name": "Nexo API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Personal finance backend for costs, transactions and categories",
            "endpoints": {
                "health": "/api/v1/health, /api/v1/ready, /api/v1/live (public)",
                "auth": "/api/v1/auth/register, /api/v1/auth/login (public), /api/v1/auth/whoami (protected)",
                "users": "/api/v1/users[/:id] (protected)",
                "categories": "/api/v1/categories[/:id] (protected)",
                "costs": "/api/v1/costs[/:id] (protected)",
                "transactions": "/api/v1/transactions[/:id] (protected)",
            }
        }
    }))
}
