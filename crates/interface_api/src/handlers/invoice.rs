//! Invoice handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{BillingId, InvoiceId};
use domain_ledger::{LedgerStore, DEFAULT_DUE_DAYS};

use crate::dto::ledger::{InvoiceResponse, IssueInvoiceRequest};
use crate::{error::ApiError, AppState};

/// Issues the invoice for a billing
pub async fn issue_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<IssueInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let due_in_days = request.due_in_days.unwrap_or(DEFAULT_DUE_DAYS);
    let invoice = state
        .issuer
        .issue_with_term(BillingId::from(id), due_in_days)
        .await?;
    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&invoice))))
}

/// Gets the invoice issued for a billing
pub async fn get_billing_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state
        .ledger
        .invoice_for_billing(BillingId::from(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("billing {id} has no invoice")))?;
    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// Gets an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.ledger.invoice(InvoiceId::from(id)).await?;
    Ok(Json(InvoiceResponse::from(&invoice)))
}
