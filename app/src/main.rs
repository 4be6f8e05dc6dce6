use axum::{
    middleware,
    routing::post,
    Router,
};
use clap::Parser;
use common::{AppState, Config, auth::auth_middleware};
use database::Database;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod handlers;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Load Config from .env, env vars and CLI args
    if dotenvy::dotenv().is_ok() {
        tracing::info!("Loaded environment from .env");
    }
    let config = Config::parse();

    // 3. Initialize Database
    let db = Database::new(&config.database_url).await?;
    db.run_migrations().await?;

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
    });

    // 4. Routing
    let app = build_router(state);

    // 5. Start Server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    if config.app_password.is_none() {
        tracing::warn!("APP_PASSWORD is not set! Authentication is DISABLED. The API is open to anyone who can reach it.");
    }
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false); // Set to true in production with HTTPS

    // Protected Routes
    let protected_routes = Router::<Arc<AppState>>::new()
        .nest("/expenses", expenses::handler::expenses_router(state.clone()))
        .nest("/budget", budgets::handler::budget_router(state.clone()))
        .nest("/forecast", forecast::handler::forecast_router(state.clone()))
        .nest("/insights", insights::handler::insights_router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::<Arc<AppState>>::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .merge(protected_routes)
        .with_state(state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use database::get_test_db;
    use tower::ServiceExt;

    async fn app(password: Option<&str>) -> Router {
        let state = Arc::new(AppState {
            db: get_test_db().await,
            config: Config {
                database_url: String::new(),
                port: 0,
                app_password: password.map(str::to_string),
            },
        });
        build_router(state)
    }

    fn login_request(password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::json!({ "password": password }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_api_without_password() {
        let app = app(None).await;

        for uri in ["/expenses", "/expenses/monthly", "/budget/current", "/forecast", "/insights"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        }
    }

    #[tokio::test]
    async fn test_password_gate() {
        let app = app(Some("secret")).await;

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/expenses").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.clone().oneshot(login_request("wrong")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.clone().oneshot(login_request("secret")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
            .expect("session cookie");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/expenses")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
