//! # HTTP Routes
//!
//! One module per resource. Every handler except `auth` and `health`
//! takes a [`CurrentUser`](crate::auth::CurrentUser), so a request without
//! a valid session is rejected before the handler body runs.
//!
//! ```text
//! /api/health                      GET
//! /api/auth/...                    login, register, me, logout,
//!                                  forgot-password, reset-password
//! /api/products[/{id}]             CRUD (DELETE disables)
//! /api/categories[/{id}]           CRUD (DELETE disables)
//! /api/clients[/{id}]              CRUD, ?documentNumber=
//! /api/suppliers[/{id}]            CRUD, ?documentNumber=
//! /api/users[/{id}]                CRUD, ADMIN only
//! /api/businesses[/{id}]           CRUD
//! /api/purchases                   GET (?documentNumber=), POST
//! /api/sales                       GET (?documentNumber=), POST
//! /api/adjustments                 GET (?productId=), POST
//! /api/inventory                   GET derived view
//! /api/inventory/reconcile         GET
//! /api/inventory/import            POST
//! /api/dashboard/stats             GET
//! /api/reports                     GET
//! ```

pub mod adjustments;
pub mod auth;
pub mod businesses;
pub mod categories;
pub mod clients;
pub mod dashboard;
pub mod inventory;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Builds the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/forgot-password", post(auth::forgot_password))
        .route("/api/auth/reset-password", post(auth::reset_password))
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/{id}",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/api/clients", get(clients::list).post(clients::create))
        .route(
            "/api/clients/{id}",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .route("/api/suppliers", get(suppliers::list).post(suppliers::create))
        .route(
            "/api/suppliers/{id}",
            get(suppliers::get)
                .put(suppliers::update)
                .delete(suppliers::delete),
        )
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/api/businesses", get(businesses::list).post(businesses::create))
        .route(
            "/api/businesses/{id}",
            get(businesses::get)
                .put(businesses::update)
                .delete(businesses::delete),
        )
        .route("/api/purchases", get(purchases::list).post(purchases::create))
        .route("/api/sales", get(sales::list).post(sales::create))
        .route(
            "/api/adjustments",
            get(adjustments::list).post(adjustments::create),
        )
        .route("/api/inventory", get(inventory::derived))
        .route("/api/inventory/reconcile", get(inventory::reconcile))
        .route("/api/inventory/import", post(inventory::import))
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/reports", get(reports::report))
        .with_state(state)
}

/// `?documentNumber=` lookup used by several list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub document_number: Option<String>,
}

impl DocumentQuery {
    /// The trimmed document number, if one was given.
    pub fn document_number(&self) -> Option<&str> {
        self.document_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// Health check endpoint. 503 when the database does not answer.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
        }),
    )
}
