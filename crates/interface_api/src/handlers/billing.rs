//! Billing handlers

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use core_kernel::{BillingId, BillingPeriod, Currency, Money, ResidentId};
use domain_ledger::{Billing, BillingStatus, ChargeBreakdown, LedgerStore};

use crate::dto::ledger::*;
use crate::{error::ApiError, AppState};

pub(crate) fn parse_currency(code: Option<&str>) -> Result<Currency, ApiError> {
    match code {
        Some(code) => Currency::from_str(code).map_err(|e| ApiError::BadRequest(e.to_string())),
        None => Ok(Currency::INR),
    }
}

fn parse_period(label: &str) -> Result<BillingPeriod, ApiError> {
    let first = NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("invalid billing month: {label}")))?;
    Ok(BillingPeriod::month_of(first))
}

/// Generates the monthly billings for every checked-in resident
pub async fn generate_billings(
    State(state): State<AppState>,
    Json(request): Json<GenerateBillingsRequest>,
) -> Result<(StatusCode, Json<GenerationReportResponse>), ApiError> {
    let period = match request.period.as_deref() {
        Some(label) => parse_period(label)?,
        None => BillingPeriod::current(),
    };
    let report = state.generator.generate(period).await?;
    Ok((
        StatusCode::CREATED,
        Json(GenerationReportResponse::new(period.label(), &report)),
    ))
}

/// Creates a single ad-hoc billing with an itemized breakdown
pub async fn create_billing(
    State(state): State<AppState>,
    Json(request): Json<CreateBillingRequest>,
) -> Result<(StatusCode, Json<BillingResponse>), ApiError> {
    let currency = parse_currency(request.currency.as_deref())?;
    let zero = Money::zero(currency);
    let charges = ChargeBreakdown {
        room_fee: Money::new(request.room_fee, currency),
        utilities_fee: request
            .utilities_fee
            .map(|a| Money::new(a, currency))
            .unwrap_or(zero),
        additional_services_fee: request
            .additional_services_fee
            .map(|a| Money::new(a, currency))
            .unwrap_or(zero),
        discount_amount: request
            .discount_amount
            .map(|a| Money::new(a, currency))
            .unwrap_or(zero),
        late_fee: request.late_fee.map(|a| Money::new(a, currency)).unwrap_or(zero),
    };

    let mut billing = Billing::new(
        ResidentId::from(request.resident_id),
        BillingPeriod::month_of(request.period),
        charges,
    )?;
    billing.notes = request.notes;

    let billing = state.generator.generate_one(billing).await?;
    Ok((StatusCode::CREATED, Json(BillingResponse::from(&billing))))
}

/// Lists billings, optionally filtered by status
pub async fn list_billings(
    State(state): State<AppState>,
    Query(query): Query<BillingListQuery>,
) -> Result<Json<Vec<BillingResponse>>, ApiError> {
    let statuses = match query.status.as_deref() {
        Some(status) => vec![BillingStatus::from_str(status)?],
        None => vec![
            BillingStatus::Pending,
            BillingStatus::Paid,
            BillingStatus::Overdue,
            BillingStatus::Cancelled,
        ],
    };

    let mut billings = Vec::new();
    for status in statuses {
        billings.extend(state.ledger.billings_with_status(status).await?);
    }
    billings.sort_by_key(|b| b.period.start);

    Ok(Json(billings.iter().map(BillingResponse::from).collect()))
}

/// Gets a billing by ID
pub async fn get_billing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillingResponse>, ApiError> {
    let billing = state.ledger.billing(BillingId::from(id)).await?;
    Ok(Json(BillingResponse::from(&billing)))
}

/// Cancels a billing and its invoice
pub async fn cancel_billing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillingResponse>, ApiError> {
    let billing = state.engine.cancel_billing(BillingId::from(id)).await?;
    Ok(Json(BillingResponse::from(&billing)))
}

/// Marks elapsed unpaid billings and past-due invoices overdue
pub async fn sweep_overdue(
    State(state): State<AppState>,
    Json(request): Json<SweepRequest>,
) -> Result<Json<SweepResponse>, ApiError> {
    let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let sweep = state.engine.sweep_overdue(as_of).await?;
    Ok(Json(SweepResponse {
        as_of,
        billings_marked: sweep.billings_marked,
        invoices_marked: sweep.invoices_marked,
    }))
}

/// A resident's billing history with its grand total
pub async fn resident_billings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillingSummaryResponse>, ApiError> {
    let summary = state
        .generator
        .resident_summary(ResidentId::from(id))
        .await?;
    Ok(Json(BillingSummaryResponse::from(&summary)))
}
