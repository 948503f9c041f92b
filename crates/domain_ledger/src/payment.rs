//! Payment aggregate
//!
//! A payment is an immutable ledger entry against a billing. Only completed
//! payments count toward settlement; refunding flips a completed payment to
//! refunded and is the one path that demotes a paid billing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BillingId, Money, PaymentId, ResidentId, UserId};

use crate::error::LedgerError;

/// How the payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
    Upi,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Online => "online",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Other => "other",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "online" => Ok(PaymentMethod::Online),
            "upi" => Ok(PaymentMethod::Upi),
            "other" => Ok(PaymentMethod::Other),
            other => Err(LedgerError::validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Funds received; counts toward settlement
    Completed,
    /// Initiated but not confirmed; does not count toward settlement
    Pending,
    /// Rejected or bounced; does not count toward settlement
    Failed,
    /// Previously completed, then returned
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(PaymentStatus::Completed),
            "pending" => Ok(PaymentStatus::Pending),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(LedgerError::validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// A recorded payment against a billing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub billing_id: BillingId,
    pub resident_id: ResidentId,
    /// Strictly positive amount in the billing currency
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// External reference, e.g. a gateway transaction id
    pub reference: Option<String>,
    /// Staff member who recorded the payment, when known
    pub recorded_by: Option<UserId>,
    pub notes: Option<String>,
    pub received_at: DateTime<Utc>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a completed payment; the amount must be strictly positive
    pub fn new(
        billing_id: BillingId,
        resident_id: ResidentId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<Self, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::validation(
                "payment amount must be strictly positive",
            ));
        }
        let now = Utc::now();

        Ok(Self {
            id: PaymentId::new_v7(),
            billing_id,
            resident_id,
            amount,
            method,
            status: PaymentStatus::Completed,
            reference: None,
            recorded_by: None,
            notes: None,
            received_at: now,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_recorded_by(mut self, user: UserId) -> Self {
        self.recorded_by = Some(user);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns true if the payment counts toward settlement
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Refunds a completed payment; any other state conflicts
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.status {
            PaymentStatus::Completed => {
                self.status = PaymentStatus::Refunded;
                self.updated_at = now;
                Ok(())
            }
            PaymentStatus::Refunded => {
                Err(LedgerError::conflict("payment is already refunded"))
            }
            other => Err(LedgerError::conflict(format!(
                "only completed payments can be refunded, found {}",
                other.as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn payment(amount: rust_decimal::Decimal) -> Result<Payment, LedgerError> {
        Payment::new(
            BillingId::new(),
            ResidentId::new(),
            Money::new(amount, Currency::INR),
            PaymentMethod::Upi,
        )
    }

    #[test]
    fn test_new_payment_is_completed() {
        let p = payment(dec!(2500)).unwrap();
        assert!(p.is_completed());
        assert!(p.reference.is_none());
    }

    #[test]
    fn test_zero_and_negative_amounts_rejected() {
        assert!(matches!(payment(dec!(0)), Err(LedgerError::Validation(_))));
        assert!(matches!(
            payment(dec!(-100)),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_refund_completed() {
        let mut p = payment(dec!(2500)).unwrap();
        p.refund(Utc::now()).unwrap();
        assert_eq!(p.status, PaymentStatus::Refunded);
        assert!(!p.is_completed());
    }

    #[test]
    fn test_refund_rejected_for_non_completed() {
        let mut pending = payment(dec!(2500)).unwrap().with_status(PaymentStatus::Pending);
        assert!(matches!(
            pending.refund(Utc::now()),
            Err(LedgerError::Conflict(_))
        ));

        let mut refunded = payment(dec!(2500)).unwrap();
        refunded.refund(Utc::now()).unwrap();
        assert!(refunded.refund(Utc::now()).is_err());
    }

    #[test]
    fn test_builder_fields() {
        let user = UserId::new();
        let p = payment(dec!(100))
            .unwrap()
            .with_reference("TXN-9981")
            .with_recorded_by(user)
            .with_notes("front desk");

        assert_eq!(p.reference.as_deref(), Some("TXN-9981"));
        assert_eq!(p.recorded_by, Some(user));
        assert_eq!(p.notes.as_deref(), Some("front desk"));
    }
}
