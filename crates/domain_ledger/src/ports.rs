//! Ledger store and notification ports
//!
//! The domain talks to persistence through `LedgerStore`; adapters live in
//! `infra_store`. Update methods take the expected version and must fail with
//! `StoreError::VersionConflict` when the stored version differs, bumping the
//! version on success.

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{BillingId, InvoiceId, Money, PaymentId, ResidentId, RoomId, StoreError};

use crate::billing::{Billing, BillingStatus};
use crate::invoice::{Invoice, InvoiceStatus};
use crate::payment::Payment;

/// A resident eligible for billing generation, joined with their room rate
#[derive(Debug, Clone, PartialEq)]
pub struct BillableResident {
    pub resident_id: ResidentId,
    pub room_id: RoomId,
    pub monthly_rate: Money,
}

/// Persistence port for the ledger domain
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // Billings

    /// Inserts a new billing; fails with `Conflict` if the resident already
    /// has a billing keyed on the same period start
    async fn insert_billing(&self, billing: &Billing) -> Result<(), StoreError>;

    async fn billing(&self, id: BillingId) -> Result<Billing, StoreError>;

    /// Writes a billing if its stored version equals `expected_version`
    async fn update_billing(
        &self,
        billing: &Billing,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Looks up a resident's billing keyed on a period start date
    async fn billing_for_period(
        &self,
        resident_id: ResidentId,
        period_start: NaiveDate,
    ) -> Result<Option<Billing>, StoreError>;

    async fn billings_for_resident(
        &self,
        resident_id: ResidentId,
    ) -> Result<Vec<Billing>, StoreError>;

    async fn billings_with_status(
        &self,
        status: BillingStatus,
    ) -> Result<Vec<Billing>, StoreError>;

    // Invoices

    /// Inserts a new invoice; fails with `Conflict` if the billing already
    /// has one or the invoice number is taken
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError>;

    async fn invoice(&self, id: InvoiceId) -> Result<Invoice, StoreError>;

    async fn update_invoice(
        &self,
        invoice: &Invoice,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    async fn invoice_for_billing(
        &self,
        billing_id: BillingId,
    ) -> Result<Option<Invoice>, StoreError>;

    async fn invoices_with_status(
        &self,
        status: InvoiceStatus,
    ) -> Result<Vec<Invoice>, StoreError>;

    // Payments

    async fn payment(&self, id: PaymentId) -> Result<Payment, StoreError>;

    async fn update_payment(
        &self,
        payment: &Payment,
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// All payments recorded against a billing, any status
    async fn payments_for_billing(
        &self,
        billing_id: BillingId,
    ) -> Result<Vec<Payment>, StoreError>;

    /// Inserts the payment and writes the reconciled billing and invoice in
    /// one transaction, so a crash can never leave a payment recorded against
    /// stale statuses. Version checks apply to both writes.
    async fn apply_payment(
        &self,
        payment: &Payment,
        billing: &Billing,
        invoice: Option<&Invoice>,
    ) -> Result<(), StoreError>;

    /// Residents eligible for billing generation, joined with their room's
    /// monthly rate; checked-out and unhoused residents are excluded
    async fn billable_residents(&self) -> Result<Vec<BillableResident>, StoreError>;
}

/// Outbound notification port
///
/// Implementations must not fail the ledger operation; delivery errors are
/// logged and dropped.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A payment was recorded against a billing
    async fn payment_recorded(&self, payment: &Payment, billing: &Billing);

    /// A billing reached fully settled
    async fn billing_settled(&self, billing: &Billing);
}

/// Notifier that does nothing; the default wiring for tests
#[derive(Debug, Default, Clone)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn payment_recorded(&self, _payment: &Payment, _billing: &Billing) {}

    async fn billing_settled(&self, _billing: &Billing) {}
}

/// Notifier that emits structured log events
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn payment_recorded(&self, payment: &Payment, billing: &Billing) {
        tracing::info!(
            payment_id = %payment.id,
            billing_id = %billing.id,
            amount = %payment.amount,
            method = payment.method.as_str(),
            "payment recorded"
        );
    }

    async fn billing_settled(&self, billing: &Billing) {
        tracing::info!(
            billing_id = %billing.id,
            resident_id = %billing.resident_id,
            period = %billing.period.label(),
            total = %billing.total_amount,
            "billing settled"
        );
    }
}
