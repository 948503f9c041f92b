//! HTTP API Layer
//!
//! REST API for the hostel ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per domain area
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(ledger, occupancy, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_ledger::{
    BillingGenerator, BillingLocks, InvoiceIssuer, LedgerStore, LogNotifier, PaymentRecorder,
    ReconciliationEngine,
};
use domain_occupancy::{OccupancyStore, RoomAllocator};

use crate::config::ApiConfig;
use crate::handlers::{billing, health, invoice, payment, resident, room};

/// Application state shared across handlers
///
/// Services share one lock registry so payment recording and reconciliation
/// for the same billing serialize regardless of which handler they enter
/// through.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
    pub occupancy: Arc<dyn OccupancyStore>,
    pub generator: Arc<BillingGenerator>,
    pub issuer: Arc<InvoiceIssuer>,
    pub recorder: Arc<PaymentRecorder>,
    pub engine: Arc<ReconciliationEngine>,
    pub allocator: Arc<RoomAllocator>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        occupancy: Arc<dyn OccupancyStore>,
        config: ApiConfig,
    ) -> Self {
        let locks = Arc::new(BillingLocks::new());
        Self {
            generator: Arc::new(BillingGenerator::new(ledger.clone())),
            issuer: Arc::new(InvoiceIssuer::new(ledger.clone())),
            recorder: Arc::new(PaymentRecorder::new(
                ledger.clone(),
                locks.clone(),
                Arc::new(LogNotifier),
            )),
            engine: Arc::new(ReconciliationEngine::new(ledger.clone(), locks)),
            allocator: Arc::new(RoomAllocator::new(occupancy.clone())),
            ledger,
            occupancy,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Billing routes
    let billing_routes = Router::new()
        .route("/", post(billing::create_billing))
        .route("/", get(billing::list_billings))
        .route("/generate", post(billing::generate_billings))
        .route("/sweep-overdue", post(billing::sweep_overdue))
        .route("/:id", get(billing::get_billing))
        .route("/:id/cancel", post(billing::cancel_billing))
        .route("/:id/invoice", post(invoice::issue_invoice))
        .route("/:id/invoice", get(invoice::get_billing_invoice))
        .route("/:id/payments", get(payment::list_billing_payments));

    // Invoice routes
    let invoice_routes = Router::new().route("/:id", get(invoice::get_invoice));

    // Payment routes
    let payment_routes = Router::new()
        .route("/", post(payment::record_payment))
        .route("/:id", get(payment::get_payment))
        .route("/:id/refund", post(payment::refund_payment));

    // Room routes
    let room_routes = Router::new()
        .route("/", post(room::create_room))
        .route("/", get(room::list_rooms))
        .route("/:id", get(room::get_room))
        .route("/:id", delete(room::delete_room))
        .route("/:id/status", put(room::set_room_status))
        .route("/:id/allocate", post(room::allocate));

    // Resident routes
    let resident_routes = Router::new()
        .route("/", post(resident::create_resident))
        .route("/", get(resident::list_residents))
        .route("/:id", get(resident::get_resident))
        .route("/:id/billings", get(billing::resident_billings))
        .route("/:id/vacate", post(resident::vacate))
        .route("/:id/check-out", post(resident::check_out));

    let api_routes = Router::new()
        .nest("/billings", billing_routes)
        .nest("/invoices", invoice_routes)
        .nest("/payments", payment_routes)
        .nest("/rooms", room_routes)
        .nest("/residents", resident_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
