pub mod employer;
pub mod health;
pub mod jobs;
pub mod payments;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::rate_limit::{rps_middleware, RateLimiter};
use crate::utils::validation::MAX_IMAGE_BYTES;
use crate::AppState;

/// Room for the form fields next to a full-size image.
pub const MAX_FORM_BYTES: usize = MAX_IMAGE_BYTES + 1024 * 1024;

pub fn api_router(state: AppState) -> Router {
    let public_api = Router::new()
        .route("/api/jobs", get(jobs::search_jobs))
        .route("/api/jobs/:id", get(jobs::get_job))
        .route("/api/payments/success", get(payments::payment_success))
        .route("/api/payments/canceled", get(payments::payment_canceled))
        .layer(from_fn_with_state(
            RateLimiter::new(state.public_rps),
            rps_middleware,
        ));

    let employer_api = Router::new()
        .route(
            "/api/employer/jobs",
            get(employer::list_postings).post(employer::create_posting),
        )
        .route("/api/employer/jobs/:id", get(employer::get_posting))
        .route(
            "/api/employer/jobs/:id/checkout",
            post(employer::request_checkout),
        )
        .route(
            "/api/employer/jobs/:id/cancel",
            post(employer::cancel_checkout),
        )
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
        .layer(from_fn_with_state(
            RateLimiter::new(state.employer_rps),
            rps_middleware,
        ));

    let webhook_api = Router::new().route(
        "/api/webhook/payments",
        post(webhook::handle_payment_event),
    );

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(employer_api)
        .merge(webhook_api)
        .with_state(state)
}
