//! Ledger domain - billing, invoicing, payments, and reconciliation
//!
//! The financial core of the hostel ledger. Billings state what a resident
//! owes for a period, invoices are the issued documents for billings, and
//! payments are immutable entries whose completed total derives the
//! settlement status of both.

pub mod billing;
pub mod error;
pub mod invoice;
pub mod locks;
pub mod payment;
pub mod ports;
pub mod reconcile;
pub mod services;

pub use billing::{Billing, BillingStatus, ChargeBreakdown};
pub use error::LedgerError;
pub use invoice::{generate_invoice_number, Invoice, InvoiceStatus, DEFAULT_DUE_DAYS};
pub use locks::BillingLocks;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use ports::{BillableResident, LedgerStore, LogNotifier, NoopNotifier, Notifier};
pub use reconcile::{
    completed_total, reconcile_billing, reconcile_invoice, OverdueSweep, ReconcileMode,
    ReconcileOutcome, ReconciliationEngine,
};
pub use services::{
    BillingGenerator, BillingSummary, GenerationReport, InvoiceIssuer, NewPayment,
    PaymentOutcome, PaymentRecorder,
};
