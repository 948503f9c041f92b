//! Ledger application services
//!
//! The generator, issuer, and recorder sit between the API layer and the
//! store. They own the business rules that span aggregates: idempotent
//! generation per period, one invoice per billing, and overpayment rejection.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use core_kernel::{BillingId, BillingPeriod, InvoiceId, Money, PaymentId, ResidentId, RetryPolicy};

use crate::billing::Billing;
use crate::error::LedgerError;
use crate::invoice::{Invoice, DEFAULT_DUE_DAYS};
use crate::locks::BillingLocks;
use crate::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::ports::{LedgerStore, Notifier};
use crate::reconcile::{completed_total, ReconcileMode, ReconciliationEngine};

/// Counts from a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Billings created in this run
    pub generated: Vec<BillingId>,
    /// Residents skipped because the period was already billed
    pub skipped: usize,
}

/// A resident's billing history with its grand total
#[derive(Debug, Clone)]
pub struct BillingSummary {
    pub count: usize,
    pub total: Money,
    pub bills: Vec<Billing>,
}

/// Creates the monthly room-fee billing for every billable resident
pub struct BillingGenerator {
    store: Arc<dyn LedgerStore>,
}

impl BillingGenerator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Generates one room-fee billing per billable resident for the period
    ///
    /// Idempotent per (resident, period): residents already billed for the
    /// period are skipped, and a concurrent duplicate insert is absorbed as a
    /// skip. Each resident is independent; one failure skips that resident,
    /// not the run.
    pub async fn generate(&self, period: BillingPeriod) -> Result<GenerationReport, LedgerError> {
        let residents = self.store.billable_residents().await?;
        let mut report = GenerationReport::default();

        for billable in residents {
            let existing = self
                .store
                .billing_for_period(billable.resident_id, period.start)
                .await?;
            if existing.is_some() {
                report.skipped += 1;
                continue;
            }

            let billing = Billing::for_room_fee(
                billable.resident_id,
                period,
                billable.monthly_rate,
            )?;

            match self.store.insert_billing(&billing).await {
                Ok(()) => {
                    tracing::debug!(
                        billing_id = %billing.id,
                        resident_id = %billing.resident_id,
                        period = %period.label(),
                        total = %billing.total_amount,
                        "billing generated"
                    );
                    report.generated.push(billing.id);
                }
                // Another run won the race for this resident and period
                Err(err) if matches!(err, core_kernel::StoreError::Conflict { .. }) => {
                    report.skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::info!(
            period = %period.label(),
            generated = report.generated.len(),
            skipped = report.skipped,
            "billing generation complete"
        );
        Ok(report)
    }

    /// Creates a single ad-hoc billing, e.g. with utilities or a discount
    pub async fn generate_one(&self, billing: Billing) -> Result<Billing, LedgerError> {
        let existing = self
            .store
            .billing_for_period(billing.resident_id, billing.period.start)
            .await?;
        if existing.is_some() {
            return Err(LedgerError::conflict(format!(
                "resident {} already has a billing for {}",
                billing.resident_id,
                billing.period.label()
            )));
        }
        self.store.insert_billing(&billing).await?;
        Ok(billing)
    }

    /// A resident's billing history with the sum of their totals
    pub async fn resident_summary(
        &self,
        resident_id: ResidentId,
    ) -> Result<BillingSummary, LedgerError> {
        let bills = self.store.billings_for_resident(resident_id).await?;
        let currency = bills
            .first()
            .map(|b| b.currency())
            .unwrap_or(core_kernel::Currency::INR);
        let totals: Vec<&Money> = bills.iter().map(|b| &b.total_amount).collect();
        let total = Money::sum(currency, totals)?;

        Ok(BillingSummary {
            count: bills.len(),
            total,
            bills,
        })
    }
}

/// Issues the invoice for a billing
pub struct InvoiceIssuer {
    store: Arc<dyn LedgerStore>,
}

impl InvoiceIssuer {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Issues the invoice for a billing with the default payment term
    pub async fn issue(&self, billing_id: BillingId) -> Result<Invoice, LedgerError> {
        self.issue_with_term(billing_id, DEFAULT_DUE_DAYS).await
    }

    /// Issues the invoice for a billing, due `due_in_days` after issuance
    ///
    /// A billing carries at most one invoice; a second issuance conflicts.
    /// Cancelled billings cannot be invoiced.
    pub async fn issue_with_term(
        &self,
        billing_id: BillingId,
        due_in_days: i64,
    ) -> Result<Invoice, LedgerError> {
        let billing = self.store.billing(billing_id).await?;
        if billing.status == crate::billing::BillingStatus::Cancelled {
            return Err(LedgerError::conflict("cannot invoice a cancelled billing"));
        }
        if self.store.invoice_for_billing(billing_id).await?.is_some() {
            return Err(LedgerError::conflict(format!(
                "billing {billing_id} already has an invoice"
            )));
        }

        let invoice = Invoice::issue_for_with_term(&billing, due_in_days)?;
        self.store.insert_invoice(&invoice).await?;

        tracing::info!(
            invoice_id = %invoice.id,
            billing_id = %billing_id,
            invoice_number = %invoice.invoice_number,
            due_date = %invoice.due_date,
            "invoice issued"
        );
        Ok(invoice)
    }
}

/// Input for recording a payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub billing_id: BillingId,
    /// Invoice the payer quoted, if any; must reference the same billing
    pub invoice_id: Option<InvoiceId>,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: Option<PaymentStatus>,
    pub reference: Option<String>,
    pub recorded_by: Option<core_kernel::UserId>,
    pub notes: Option<String>,
}

/// A recorded payment with the reconciled billing and invoice
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub billing: Billing,
    pub invoice: Option<Invoice>,
}

/// Records and refunds payments, keeping billing and invoice status in step
pub struct PaymentRecorder {
    store: Arc<dyn LedgerStore>,
    locks: Arc<BillingLocks>,
    engine: ReconciliationEngine,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    /// Amount by which the completed total may exceed the billing total
    /// before a payment is rejected as an overpayment
    overpayment_tolerance: Decimal,
}

impl PaymentRecorder {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        locks: Arc<BillingLocks>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let engine = ReconciliationEngine::new(Arc::clone(&store), Arc::clone(&locks));
        Self {
            store,
            locks,
            engine,
            notifier,
            retry: RetryPolicy::default(),
            overpayment_tolerance: Decimal::ZERO,
        }
    }

    pub fn with_overpayment_tolerance(mut self, tolerance: Decimal) -> Self {
        self.overpayment_tolerance = tolerance;
        self
    }

    /// Records a payment against a billing and reconciles in one step
    ///
    /// The payment amount must match the billing currency, the billing must
    /// not be cancelled, a quoted invoice must belong to the billing, and a
    /// completed payment must not push the completed total past the billing
    /// total. Payment, billing, and invoice are written in a single store
    /// transaction.
    pub async fn record(&self, input: NewPayment) -> Result<PaymentOutcome, LedgerError> {
        let _guard = self.locks.acquire(input.billing_id).await;

        let mut attempt: u32 = 0;
        loop {
            match self.record_attempt(&input).await {
                Ok(outcome) => {
                    self.notifier
                        .payment_recorded(&outcome.payment, &outcome.billing)
                        .await;
                    if outcome.billing.is_settled() {
                        self.notifier.billing_settled(&outcome.billing).await;
                    }
                    return Ok(outcome);
                }
                Err(LedgerError::Store(err)) if err.is_version_conflict() => {
                    if self.retry.should_retry(attempt) {
                        attempt += 1;
                        continue;
                    }
                    return Err(LedgerError::conflict(err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn record_attempt(&self, input: &NewPayment) -> Result<PaymentOutcome, LedgerError> {
        let mut billing = self.store.billing(input.billing_id).await?;
        if billing.status == crate::billing::BillingStatus::Cancelled {
            return Err(LedgerError::conflict(
                "cannot record a payment against a cancelled billing",
            ));
        }
        if input.amount.currency() != billing.currency() {
            return Err(LedgerError::validation(format!(
                "payment currency {} does not match billing currency {}",
                input.amount.currency(),
                billing.currency()
            )));
        }

        // A quoted invoice must exist and belong to the billing being paid;
        // otherwise the billing's own invoice (if issued) is reconciled
        let mut invoice = match input.invoice_id {
            Some(invoice_id) => {
                let invoice = self.store.invoice(invoice_id).await?;
                if invoice.billing_id != input.billing_id {
                    return Err(LedgerError::validation(format!(
                        "invoice {invoice_id} references billing {}, not billing {}",
                        invoice.billing_id, input.billing_id
                    )));
                }
                Some(invoice)
            }
            None => self.store.invoice_for_billing(input.billing_id).await?,
        };

        let mut payment = Payment::new(
            input.billing_id,
            billing.resident_id,
            input.amount,
            input.method,
        )?;
        if let Some(status) = input.status {
            payment = payment.with_status(status);
        }
        if let Some(reference) = &input.reference {
            payment = payment.with_reference(reference.clone());
        }
        if let Some(user) = input.recorded_by {
            payment = payment.with_recorded_by(user);
        }
        if let Some(notes) = &input.notes {
            payment = payment.with_notes(notes.clone());
        }

        let existing = self.store.payments_for_billing(input.billing_id).await?;
        let settled = completed_total(&billing, &existing)?;
        if payment.is_completed() {
            let after = settled.checked_add(&payment.amount)?;
            let ceiling = billing
                .total_amount
                .checked_add(&Money::new(self.overpayment_tolerance, billing.currency()))?;
            if after > ceiling {
                return Err(LedgerError::conflict(format!(
                    "payment of {} would overpay billing {} ({} already settled of {})",
                    payment.amount, billing.id, settled, billing.total_amount
                )));
            }
        }

        // Derive the post-payment statuses before the transactional write
        let mut payments = existing;
        payments.push(payment.clone());
        let total = completed_total(&billing, &payments)?;
        let now = Utc::now();

        let billing_version = billing.version;
        crate::reconcile::reconcile_billing(&mut billing, total, ReconcileMode::Standard, now);

        if let Some(inv) = invoice.as_mut() {
            crate::reconcile::reconcile_invoice(inv, &billing, ReconcileMode::Standard, now);
        }

        // `apply_payment` checks both versions inside one transaction; the
        // loaded versions ride along on the entities themselves
        billing.version = billing_version;
        self.store
            .apply_payment(&payment, &billing, invoice.as_ref())
            .await?;
        billing.version += 1;
        if let Some(inv) = invoice.as_mut() {
            inv.version += 1;
        }

        tracing::info!(
            payment_id = %payment.id,
            billing_id = %billing.id,
            amount = %payment.amount,
            billing_status = billing.status.as_str(),
            "payment recorded"
        );
        Ok(PaymentOutcome {
            payment,
            billing,
            invoice,
        })
    }

    /// Refunds a completed payment and re-derives the billing status
    ///
    /// This is the one path that demotes a paid billing.
    pub async fn refund(&self, payment_id: PaymentId) -> Result<PaymentOutcome, LedgerError> {
        let located = self.store.payment(payment_id).await?;
        let _guard = self.locks.acquire(located.billing_id).await;

        let mut attempt: u32 = 0;
        loop {
            match self.refund_attempt(payment_id).await {
                Ok(outcome) => return Ok(outcome),
                Err(LedgerError::Store(err)) if err.is_version_conflict() => {
                    if self.retry.should_retry(attempt) {
                        attempt += 1;
                        continue;
                    }
                    return Err(LedgerError::conflict(err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn refund_attempt(&self, payment_id: PaymentId) -> Result<PaymentOutcome, LedgerError> {
        let mut payment = self.store.payment(payment_id).await?;
        let version = payment.version;
        payment.refund(Utc::now())?;
        self.store.update_payment(&payment, version).await?;
        payment.version += 1;

        let outcome = self
            .engine
            .reconcile_locked(payment.billing_id, ReconcileMode::AfterRefund)
            .await?;

        tracing::info!(
            payment_id = %payment.id,
            billing_id = %payment.billing_id,
            billing_status = outcome.billing.status.as_str(),
            "payment refunded"
        );
        Ok(PaymentOutcome {
            payment,
            billing: outcome.billing,
            invoice: outcome.invoice,
        })
    }
}
