//! Reconciliation engine
//!
//! Settlement status is derived state: the completed payments against a
//! billing determine whether the billing and its invoice are pending, paid,
//! or overdue. The pure functions here compute that derivation; the engine
//! wraps them with locking, store access, and bounded retries.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{BillingId, Money, RetryPolicy};

use crate::billing::{Billing, BillingStatus};
use crate::error::LedgerError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::locks::BillingLocks;
use crate::payment::Payment;
use crate::ports::LedgerStore;

/// How terminal statuses are treated during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Paid and cancelled are terminal; a paid billing is never demoted
    Standard,
    /// A refund just removed a completed payment, so paid may be demoted to
    /// match the remaining total
    AfterRefund,
}

/// Result of reconciling one billing
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub billing: Billing,
    pub invoice: Option<Invoice>,
    pub completed_total: Money,
    /// True if the billing or invoice status changed
    pub changed: bool,
}

/// Counts from an overdue sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverdueSweep {
    pub billings_marked: usize,
    pub invoices_marked: usize,
}

/// Sums the completed payments in the billing's currency
pub fn completed_total(billing: &Billing, payments: &[Payment]) -> Result<Money, LedgerError> {
    let completed: Vec<&Money> = payments
        .iter()
        .filter(|p| p.is_completed())
        .map(|p| &p.amount)
        .collect();
    Ok(Money::sum(billing.currency(), completed)?)
}

/// Derives the billing status from its completed payment total
///
/// Returns true if the status changed. Cancelled is always terminal; paid is
/// terminal except in `AfterRefund` mode. A billing with no completed
/// payments is left as-is so that overdue markings survive reconciliation.
pub fn reconcile_billing(
    billing: &mut Billing,
    total: Money,
    mode: ReconcileMode,
    now: DateTime<Utc>,
) -> bool {
    if billing.status == BillingStatus::Cancelled {
        return false;
    }
    if billing.status == BillingStatus::Paid && mode == ReconcileMode::Standard {
        return false;
    }

    let before = billing.status;
    if total >= billing.total_amount {
        billing.mark_paid(now);
    } else if total.is_positive() {
        // Partial settlement keeps (or returns) the billing to pending
        if billing.status == BillingStatus::Paid {
            billing.demote_after_refund(now);
        } else {
            billing.mark_pending(now);
        }
    } else if billing.status == BillingStatus::Paid {
        // AfterRefund with nothing left against the billing
        billing.demote_after_refund(now);
    }
    billing.status != before
}

/// Mirrors the billing's derived status onto its invoice
pub fn reconcile_invoice(
    invoice: &mut Invoice,
    billing: &Billing,
    mode: ReconcileMode,
    now: DateTime<Utc>,
) -> bool {
    if invoice.status == InvoiceStatus::Cancelled {
        return false;
    }
    if invoice.status == InvoiceStatus::Paid && mode == ReconcileMode::Standard {
        return false;
    }

    let before = invoice.status;
    match billing.status {
        BillingStatus::Paid => invoice.mark_paid(now),
        BillingStatus::Pending => {
            if invoice.status == InvoiceStatus::Paid {
                invoice.demote_after_refund(now);
            } else if invoice.status == InvoiceStatus::Overdue {
                invoice.mark_pending(now);
            }
        }
        // Overdue marking flows through the sweep, and a cancelled billing
        // cancels its invoice through the explicit cancellation path
        BillingStatus::Overdue | BillingStatus::Cancelled => {}
    }
    invoice.status != before
}

/// Serializes payment application and status derivation per billing
///
/// Shared by the payment recorder so that a refund and a payment against the
/// same billing can never interleave.
pub struct ReconciliationEngine {
    store: Arc<dyn LedgerStore>,
    locks: Arc<BillingLocks>,
    retry: RetryPolicy,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn LedgerStore>, locks: Arc<BillingLocks>) -> Self {
        Self {
            store,
            locks,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Re-derives a billing's status from its payments and persists changes
    pub async fn reconcile(
        &self,
        billing_id: BillingId,
        mode: ReconcileMode,
    ) -> Result<ReconcileOutcome, LedgerError> {
        let _guard = self.locks.acquire(billing_id).await;
        self.reconcile_locked(billing_id, mode).await
    }

    /// Reconciliation body; the caller must hold the billing's lock
    pub(crate) async fn reconcile_locked(
        &self,
        billing_id: BillingId,
        mode: ReconcileMode,
    ) -> Result<ReconcileOutcome, LedgerError> {
        let mut attempt: u32 = 0;
        loop {
            let mut billing = self.store.billing(billing_id).await?;
            let payments = self.store.payments_for_billing(billing_id).await?;
            let mut invoice = self.store.invoice_for_billing(billing_id).await?;

            let total = completed_total(&billing, &payments)?;
            let now = Utc::now();

            let billing_version = billing.version;
            let billing_changed = reconcile_billing(&mut billing, total, mode, now);

            let mut invoice_changed = false;
            if let Some(inv) = invoice.as_mut() {
                invoice_changed = reconcile_invoice(inv, &billing, mode, now);
            }

            let result = self
                .persist(
                    &billing,
                    billing_version,
                    billing_changed,
                    invoice.as_ref(),
                    invoice_changed,
                )
                .await;

            match result {
                Ok(()) => {
                    if billing_changed {
                        billing.version += 1;
                        tracing::debug!(
                            billing_id = %billing.id,
                            status = billing.status.as_str(),
                            total = %total,
                            "billing reconciled"
                        );
                    }
                    if let (Some(inv), true) = (invoice.as_mut(), invoice_changed) {
                        inv.version += 1;
                    }
                    return Ok(ReconcileOutcome {
                        billing,
                        invoice,
                        completed_total: total,
                        changed: billing_changed || invoice_changed,
                    });
                }
                Err(err) if err.is_version_conflict() => {
                    if self.retry.should_retry(attempt) {
                        attempt += 1;
                        continue;
                    }
                    return Err(LedgerError::conflict(err.to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn persist(
        &self,
        billing: &Billing,
        billing_version: i64,
        billing_changed: bool,
        invoice: Option<&Invoice>,
        invoice_changed: bool,
    ) -> Result<(), core_kernel::StoreError> {
        if billing_changed {
            self.store.update_billing(billing, billing_version).await?;
        }
        if let (Some(inv), true) = (invoice, invoice_changed) {
            self.store.update_invoice(inv, inv.version).await?;
        }
        Ok(())
    }

    /// Marks pending billings past their period end and pending invoices past
    /// their due date as overdue
    ///
    /// Only billings with no completed payment are marked, so a partly paid
    /// billing does not flap between pending and overdue.
    pub async fn sweep_overdue(&self, today: NaiveDate) -> Result<OverdueSweep, LedgerError> {
        let mut sweep = OverdueSweep::default();

        let pending = self
            .store
            .billings_with_status(BillingStatus::Pending)
            .await?;
        for billing in pending {
            if !billing.period.has_ended_by(today) {
                continue;
            }
            let _guard = self.locks.acquire(billing.id).await;

            // Re-read under the lock; a payment may have landed meanwhile
            let mut billing = self.store.billing(billing.id).await?;
            if billing.status != BillingStatus::Pending {
                continue;
            }
            let payments = self.store.payments_for_billing(billing.id).await?;
            if payments.iter().any(|p| p.is_completed()) {
                continue;
            }

            let now = Utc::now();
            let version = billing.version;
            if billing.mark_overdue(now) {
                // A lost race means someone else just touched the billing;
                // the next sweep will catch it
                match self.store.update_billing(&billing, version).await {
                    Ok(()) => sweep.billings_marked += 1,
                    Err(err) if err.is_version_conflict() => continue,
                    Err(err) => return Err(err.into()),
                }
            }

            if let Some(mut invoice) = self.store.invoice_for_billing(billing.id).await? {
                if invoice.is_past_due(today) {
                    let inv_version = invoice.version;
                    if invoice.mark_overdue(now) {
                        self.store.update_invoice(&invoice, inv_version).await?;
                        sweep.invoices_marked += 1;
                    }
                }
            }
        }

        // Invoices can fall due before their billing period ends
        let pending_invoices = self
            .store
            .invoices_with_status(InvoiceStatus::Pending)
            .await?;
        for invoice in pending_invoices {
            if !invoice.is_past_due(today) {
                continue;
            }
            let _guard = self.locks.acquire(invoice.billing_id).await;

            let billing = self.store.billing(invoice.billing_id).await?;
            if billing.status.is_terminal() {
                continue;
            }
            let payments = self.store.payments_for_billing(billing.id).await?;
            if payments.iter().any(|p| p.is_completed()) {
                continue;
            }

            let mut invoice = self.store.invoice(invoice.id).await?;
            let version = invoice.version;
            if invoice.mark_overdue(Utc::now()) {
                match self.store.update_invoice(&invoice, version).await {
                    Ok(()) => sweep.invoices_marked += 1,
                    Err(err) if err.is_version_conflict() => continue,
                    Err(err) => return Err(err.into()),
                }
            }
        }

        tracing::info!(
            billings = sweep.billings_marked,
            invoices = sweep.invoices_marked,
            %today,
            "overdue sweep complete"
        );
        Ok(sweep)
    }

    /// Cancels a billing and its invoice
    ///
    /// Refused once a completed payment exists; the money must be refunded
    /// first.
    pub async fn cancel_billing(&self, billing_id: BillingId) -> Result<Billing, LedgerError> {
        let _guard = self.locks.acquire(billing_id).await;

        let mut billing = self.store.billing(billing_id).await?;
        let payments = self.store.payments_for_billing(billing_id).await?;
        if payments.iter().any(|p| p.is_completed()) {
            return Err(LedgerError::conflict(
                "cannot cancel a billing with completed payments",
            ));
        }

        let now = Utc::now();
        let version = billing.version;
        billing.cancel(now)?;
        self.store.update_billing(&billing, version).await?;
        billing.version += 1;

        if let Some(mut invoice) = self.store.invoice_for_billing(billing_id).await? {
            if invoice.status != InvoiceStatus::Cancelled {
                let inv_version = invoice.version;
                invoice.cancel(now)?;
                self.store.update_invoice(&invoice, inv_version).await?;
            }
        }

        tracing::info!(billing_id = %billing.id, "billing cancelled");
        Ok(billing)
    }
}
