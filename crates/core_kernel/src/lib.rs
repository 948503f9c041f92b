//! Core Kernel - Foundational types and utilities for the hostel ledger
//!
//! This crate provides the fundamental building blocks used across all domain
//! modules:
//! - Money types with precise decimal arithmetic
//! - Billing period types
//! - Strongly-typed identifiers
//! - The shared store error taxonomy and retry policy

pub mod identifiers;
pub mod money;
pub mod ports;
pub mod temporal;

pub use identifiers::{BillingId, InvoiceId, PaymentId, ResidentId, RoomId, UserId};
pub use money::{Currency, Money, MoneyError};
pub use ports::{RetryPolicy, StoreError};
pub use temporal::{days_after, BillingPeriod, TemporalError};
