//! Invoice aggregate
//!
//! An invoice is the issued, numbered document for a billing. Each billing
//! carries at most one invoice; the invoice mirrors the billing total and
//! follows its settlement status during reconciliation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{days_after, BillingId, InvoiceId, Money, ResidentId};

use crate::billing::Billing;
use crate::error::LedgerError;

/// Default payment term, in days from issuance
pub const DEFAULT_DUE_DAYS: i64 = 15;

/// Invoice settlement status; mirrors the billing during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(LedgerError::validation(format!(
                "unknown invoice status: {other}"
            ))),
        }
    }
}

/// Generates a unique, human-readable invoice number
///
/// The v7 UUID keeps numbers time-ordered while its random bits rule out
/// collisions between invoices issued in the same instant.
pub fn generate_invoice_number() -> String {
    format!("INV-{}", Uuid::now_v7().simple())
}

/// The issued, numbered document for a billing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// The billing this invoice documents; unique per billing
    pub billing_id: BillingId,
    pub resident_id: ResidentId,
    /// Assigned once at issuance, never reused
    pub invoice_number: String,
    /// Mirrors the billing total at issuance
    pub total_amount: Money,
    pub status: InvoiceStatus,
    pub issued_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    /// Set exactly once, on first full settlement
    pub paid_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Issues an invoice for a billing with the default payment term
    pub fn issue_for(billing: &Billing) -> Result<Self, LedgerError> {
        Self::issue_for_with_term(billing, DEFAULT_DUE_DAYS)
    }

    /// Issues an invoice for a billing, due `due_in_days` after issuance
    pub fn issue_for_with_term(billing: &Billing, due_in_days: i64) -> Result<Self, LedgerError> {
        if due_in_days < 0 {
            return Err(LedgerError::validation("payment term must not be negative"));
        }
        let now = Utc::now();

        Ok(Self {
            id: InvoiceId::new_v7(),
            billing_id: billing.id,
            resident_id: billing.resident_id,
            invoice_number: generate_invoice_number(),
            total_amount: billing.total_amount,
            status: InvoiceStatus::Pending,
            issued_at: now,
            due_date: days_after(now.date_naive(), due_in_days),
            paid_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_settled(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Returns true if the invoice is unsettled past its due date
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Pending && today > self.due_date
    }

    /// Marks the invoice fully settled; `paid_at` is only stamped the first
    /// time
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.status = InvoiceStatus::Paid;
        if self.paid_at.is_none() {
            self.paid_at = Some(now);
        }
        self.updated_at = now;
    }

    pub fn mark_pending(&mut self, now: DateTime<Utc>) {
        self.status = InvoiceStatus::Pending;
        self.updated_at = now;
    }

    /// Marks an unsettled invoice overdue; only valid from pending
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != InvoiceStatus::Pending {
            return false;
        }
        self.status = InvoiceStatus::Overdue;
        self.updated_at = now;
        true
    }

    /// Cancels the invoice alongside its billing
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.status {
            InvoiceStatus::Paid => Err(LedgerError::conflict("cannot cancel a paid invoice")),
            InvoiceStatus::Cancelled => {
                Err(LedgerError::conflict("invoice is already cancelled"))
            }
            _ => {
                self.status = InvoiceStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Demotes a paid invoice after a refund; clears `paid_at`
    pub(crate) fn demote_after_refund(&mut self, now: DateTime<Utc>) {
        self.status = InvoiceStatus::Pending;
        self.paid_at = None;
        self.updated_at = now;
    }
}
