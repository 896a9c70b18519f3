//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Protocol routes are bearer-token protected; `/health` is public.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` (provided via
//! `with_state`).

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::{ApiContext, AppState};

/// Build the service router.
pub fn api_router(state: Arc<AppState>) -> Router {
    build_router(ApiContext::new(state))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/payment/order", post(endpoints::payment::order))
        .route("/payment/confirm", post(endpoints::payment::confirm))
        .route("/appointments", get(endpoints::appointments::list))
        .route(
            "/appointments/:id/cancel",
            post(endpoints::appointments::cancel),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new().route("/health", get(endpoints::health::check));

    Router::new().merge(protected).merge(public)
}
