use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::services::AccountService;
use crate::state::SharedState;

mod account;
mod catalog;
mod error;
mod pages;
mod report;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn account_service(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(Arc::new(AppState { shared }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_idle_minutes,
        )));

    let cors_layer = if server.cors_allowed_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    // Only the authenticated password change sits behind the session gate;
    // the emailed-link flows deliberately work without one.
    let protected_routes = Router::new()
        .route(
            "/password-reset",
            get(account::password_reset_page).post(account::change_password),
        )
        .route_layer(middleware::from_fn(account::auth_middleware));

    Router::new()
        .merge(protected_routes)
        .route("/", get(catalog::index))
        .route(
            "/register",
            get(account::register_page).post(account::register),
        )
        .route("/activate/{uid}/{token}", get(account::activate))
        .route("/login", get(account::login_page).post(account::login))
        .route("/logout", post(account::logout))
        .route(
            "/forgot-password",
            get(account::forgot_password_page).post(account::forgot_password),
        )
        .route(
            "/password-reset-confirm/{uid}/{token}",
            get(account::reset_confirm_check).post(account::reset_confirm),
        )
        .route("/report", get(report::report_page).post(report::submit_report))
        .route("/services", get(pages::services))
        .route("/help", get(pages::help))
        .route("/contact-us", get(pages::contact_us))
        .route("/about", get(pages::about))
        .route("/terms-of-use", get(pages::terms_of_use))
        .route("/privacy-policy", get(pages::privacy))
        .route("/return", get(pages::return_policy))
        .route("/warranty", get(pages::warranty))
        .layer(session_layer)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
