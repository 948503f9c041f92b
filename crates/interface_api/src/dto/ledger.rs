//! Ledger DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_ledger::{Billing, BillingSummary, GenerationReport, Invoice, Payment, PaymentOutcome};

#[derive(Debug, Deserialize)]
pub struct GenerateBillingsRequest {
    /// Billing month as "YYYY-MM"; defaults to the current month
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBillingRequest {
    pub resident_id: Uuid,
    /// Any date inside the billing month
    pub period: NaiveDate,
    pub room_fee: Decimal,
    pub utilities_fee: Option<Decimal>,
    pub additional_services_fee: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub late_fee: Option<Decimal>,
    /// ISO 4217 code; defaults to INR
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IssueInvoiceRequest {
    /// Days until the invoice falls due; defaults to the standard term
    pub due_in_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub billing_id: Uuid,
    /// Invoice the payment is quoted against; must belong to the billing
    pub invoice_id: Option<Uuid>,
    pub amount: Decimal,
    /// ISO 4217 code; defaults to INR
    pub currency: Option<String>,
    pub method: String,
    /// completed (default), pending, or failed
    pub status: Option<String>,
    pub reference: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SweepRequest {
    /// Date to evaluate overdue against; defaults to today (UTC)
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct BillingListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BillingResponse {
    pub id: Uuid,
    pub resident_id: Uuid,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub room_fee: Decimal,
    pub utilities_fee: Decimal,
    pub additional_services_fee: Decimal,
    pub discount_amount: Decimal,
    pub late_fee: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub generated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl From<&Billing> for BillingResponse {
    fn from(billing: &Billing) -> Self {
        Self {
            id: (*billing.id.as_uuid()),
            resident_id: (*billing.resident_id.as_uuid()),
            period_start: billing.period.start,
            period_end: billing.period.end,
            room_fee: billing.charges.room_fee.amount(),
            utilities_fee: billing.charges.utilities_fee.amount(),
            additional_services_fee: billing.charges.additional_services_fee.amount(),
            discount_amount: billing.charges.discount_amount.amount(),
            late_fee: billing.charges.late_fee.amount(),
            total_amount: billing.total_amount.amount(),
            currency: billing.total_amount.currency().code().to_string(),
            status: billing.status.as_str().to_string(),
            generated_at: billing.generated_at,
            paid_at: billing.paid_at,
            notes: billing.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub billing_id: Uuid,
    pub resident_id: Uuid,
    pub invoice_number: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: (*invoice.id.as_uuid()),
            billing_id: (*invoice.billing_id.as_uuid()),
            resident_id: (*invoice.resident_id.as_uuid()),
            invoice_number: invoice.invoice_number.clone(),
            total_amount: invoice.total_amount.amount(),
            currency: invoice.total_amount.currency().code().to_string(),
            status: invoice.status.as_str().to_string(),
            issued_at: invoice.issued_at,
            due_date: invoice.due_date,
            paid_at: invoice.paid_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub billing_id: Uuid,
    pub resident_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub status: String,
    pub reference: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: (*payment.id.as_uuid()),
            billing_id: (*payment.billing_id.as_uuid()),
            resident_id: (*payment.resident_id.as_uuid()),
            amount: payment.amount.amount(),
            currency: payment.amount.currency().code().to_string(),
            method: payment.method.as_str().to_string(),
            status: payment.status.as_str().to_string(),
            reference: payment.reference.clone(),
            received_at: payment.received_at,
        }
    }
}

/// Payment with the reconciled billing and invoice it touched
#[derive(Debug, Serialize)]
pub struct PaymentOutcomeResponse {
    pub payment: PaymentResponse,
    pub billing: BillingResponse,
    pub invoice: Option<InvoiceResponse>,
}

impl From<&PaymentOutcome> for PaymentOutcomeResponse {
    fn from(outcome: &PaymentOutcome) -> Self {
        Self {
            payment: PaymentResponse::from(&outcome.payment),
            billing: BillingResponse::from(&outcome.billing),
            invoice: outcome.invoice.as_ref().map(InvoiceResponse::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationReportResponse {
    pub period: String,
    pub generated: Vec<Uuid>,
    pub skipped: usize,
}

impl GenerationReportResponse {
    pub fn new(period: String, report: &GenerationReport) -> Self {
        Self {
            period,
            generated: report.generated.iter().map(|id| *id.as_uuid()).collect(),
            skipped: report.skipped,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BillingSummaryResponse {
    pub count: usize,
    pub total: Decimal,
    pub currency: String,
    pub bills: Vec<BillingResponse>,
}

impl From<&BillingSummary> for BillingSummaryResponse {
    fn from(summary: &BillingSummary) -> Self {
        Self {
            count: summary.count,
            total: summary.total.amount(),
            currency: summary.total.currency().code().to_string(),
            bills: summary.bills.iter().map(BillingResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub as_of: NaiveDate,
    pub billings_marked: usize,
    pub invoices_marked: usize,
}
