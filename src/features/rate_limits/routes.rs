use std::sync::Arc;

use axum::{routing::post, Router};

use super::handlers::provision_rate_limit;
use super::services::RateLimitReconciler;

pub fn routes(reconciler: Arc<RateLimitReconciler>) -> Router {
    Router::new()
        .route("/api/v1/ratelimits", post(provision_rate_limit))
        .with_state(reconciler)
}
