//! Payment handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{BillingId, InvoiceId, Money, PaymentId, UserId};
use domain_ledger::{LedgerStore, NewPayment, PaymentMethod, PaymentStatus};

use crate::dto::ledger::{PaymentOutcomeResponse, PaymentResponse, RecordPaymentRequest};
use crate::handlers::billing::parse_currency;
use crate::{error::ApiError, AppState};

/// Records a payment against a billing and returns the reconciled state
pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentOutcomeResponse>), ApiError> {
    let currency = parse_currency(request.currency.as_deref())?;
    let status = request
        .status
        .as_deref()
        .map(PaymentStatus::from_str)
        .transpose()?;

    let outcome = state
        .recorder
        .record(NewPayment {
            billing_id: BillingId::from(request.billing_id),
            invoice_id: request.invoice_id.map(InvoiceId::from),
            amount: Money::new(request.amount, currency),
            method: PaymentMethod::from_str(&request.method)?,
            status,
            reference: request.reference,
            recorded_by: request.recorded_by.map(UserId::from),
            notes: request.notes,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentOutcomeResponse::from(&outcome)),
    ))
}

/// Gets a payment by ID
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let payment = state.ledger.payment(PaymentId::from(id)).await?;
    Ok(Json(PaymentResponse::from(&payment)))
}

/// Refunds a completed payment, demoting the billing if it was settled
pub async fn refund_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentOutcomeResponse>, ApiError> {
    let outcome = state.recorder.refund(PaymentId::from(id)).await?;
    Ok(Json(PaymentOutcomeResponse::from(&outcome)))
}

/// Lists the payments recorded against a billing
pub async fn list_billing_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state
        .ledger
        .payments_for_billing(BillingId::from(id))
        .await?;
    Ok(Json(payments.iter().map(PaymentResponse::from).collect()))
}
