pub mod admin;
pub mod portal;

use axum::{Router, middleware::from_fn_with_state, routing::get, routing::post};

use crate::db::AppState;
use crate::middleware::{admin_auth, portal_auth};

/// Build the full API router with auth layers applied.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/invoices", get(admin::list_invoices))
        .route("/invoices/create", post(admin::create_invoice))
        .route("/invoices/sync-all", post(admin::sync_all_invoices))
        .route("/invoices/{id}/finalize", post(admin::finalize_invoice))
        .route("/invoices/{id}/sync", post(admin::sync_invoice))
        .route(
            "/invoices/{id}/payment-intent",
            post(admin::create_payment_intent),
        )
        .route(
            "/clients",
            get(admin::list_clients).post(admin::create_client),
        )
        .route(
            "/projects",
            get(admin::list_projects).post(admin::create_project),
        )
        .layer(from_fn_with_state(state.clone(), admin_auth));

    let portal_routes = Router::new()
        .route("/invoices", get(portal::list_invoices))
        .route("/invoices/{id}", get(portal::get_invoice))
        .route(
            "/invoices/{id}/payment-intent",
            post(portal::create_payment_intent),
        )
        .route("/projects", get(portal::list_projects))
        .route("/documents", get(portal::list_documents))
        .layer(from_fn_with_state(state.clone(), portal_auth));

    Router::new()
        .nest("/api/admin", admin_routes)
        .nest("/api", portal_routes)
        .with_state(state)
}
