//! Billing aggregate
//!
//! A billing is the statement of charges for one resident over one period.
//! Its total is fixed once a payment has been recorded against it; an
//! amendment means a new billing, never a mutation in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{BillingId, BillingPeriod, Currency, Money, ResidentId};

use crate::error::LedgerError;

/// Billing settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    /// Awaiting settlement (also the state after a partial payment)
    Pending,
    /// Fully settled by completed payments
    Paid,
    /// Past its period end with no payment recorded
    Overdue,
    /// Explicitly voided; excluded from settlement
    Cancelled,
}

impl BillingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Pending => "pending",
            BillingStatus::Paid => "paid",
            BillingStatus::Overdue => "overdue",
            BillingStatus::Cancelled => "cancelled",
        }
    }

    /// Paid and cancelled are terminal for normal reconciliation
    pub fn is_terminal(&self) -> bool {
        matches!(self, BillingStatus::Paid | BillingStatus::Cancelled)
    }
}

impl std::str::FromStr for BillingStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillingStatus::Pending),
            "paid" => Ok(BillingStatus::Paid),
            "overdue" => Ok(BillingStatus::Overdue),
            "cancelled" => Ok(BillingStatus::Cancelled),
            other => Err(LedgerError::validation(format!(
                "unknown billing status: {other}"
            ))),
        }
    }
}

/// Itemized charges making up a billing total
///
/// Every component is non-negative; the discount is subtracted, everything
/// else is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub room_fee: Money,
    pub utilities_fee: Money,
    pub additional_services_fee: Money,
    pub discount_amount: Money,
    pub late_fee: Money,
}

impl ChargeBreakdown {
    /// A breakdown consisting only of the room fee
    pub fn room_only(room_fee: Money) -> Self {
        let zero = Money::zero(room_fee.currency());
        Self {
            room_fee,
            utilities_fee: zero,
            additional_services_fee: zero,
            discount_amount: zero,
            late_fee: zero,
        }
    }

    pub fn currency(&self) -> Currency {
        self.room_fee.currency()
    }

    /// Computes the billing total: fees plus late fee minus discount
    pub fn total(&self) -> Result<Money, LedgerError> {
        self.validate()?;
        let total = self
            .room_fee
            .checked_add(&self.utilities_fee)?
            .checked_add(&self.additional_services_fee)?
            .checked_add(&self.late_fee)?
            .checked_sub(&self.discount_amount)?;
        if total.is_negative() {
            return Err(LedgerError::validation(
                "discount exceeds the sum of charges",
            ));
        }
        Ok(total)
    }

    fn validate(&self) -> Result<(), LedgerError> {
        let components = [
            ("roomFee", &self.room_fee),
            ("utilitiesFee", &self.utilities_fee),
            ("additionalServicesFee", &self.additional_services_fee),
            ("discountAmount", &self.discount_amount),
            ("lateFee", &self.late_fee),
        ];
        for (name, amount) in components {
            if amount.is_negative() {
                return Err(LedgerError::validation(format!(
                    "{name} must not be negative"
                )));
            }
        }
        Ok(())
    }
}

/// A statement of charges for a resident over a billing period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Billing {
    /// Unique identifier
    pub id: BillingId,
    /// Resident being billed
    pub resident_id: ResidentId,
    /// Period the charges cover
    pub period: BillingPeriod,
    /// Itemized charges
    pub charges: ChargeBreakdown,
    /// Total due; equals the breakdown total and is immutable once a
    /// payment exists
    pub total_amount: Money,
    /// Settlement status
    pub status: BillingStatus,
    /// When the billing was generated
    pub generated_at: DateTime<Utc>,
    /// Set exactly once, on first full settlement
    pub paid_at: Option<DateTime<Utc>>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Optimistic concurrency version
    pub version: i64,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Billing {
    /// Creates a new pending billing from an itemized breakdown
    pub fn new(
        resident_id: ResidentId,
        period: BillingPeriod,
        charges: ChargeBreakdown,
    ) -> Result<Self, LedgerError> {
        let total_amount = charges.total()?;
        let now = Utc::now();

        Ok(Self {
            id: BillingId::new_v7(),
            resident_id,
            period,
            charges,
            total_amount,
            status: BillingStatus::Pending,
            generated_at: now,
            paid_at: None,
            notes: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates the standard generated billing: room fee only
    pub fn for_room_fee(
        resident_id: ResidentId,
        period: BillingPeriod,
        room_fee: Money,
    ) -> Result<Self, LedgerError> {
        Self::new(resident_id, period, ChargeBreakdown::room_only(room_fee))
    }

    pub fn currency(&self) -> Currency {
        self.total_amount.currency()
    }

    pub fn is_settled(&self) -> bool {
        self.status == BillingStatus::Paid
    }

    /// Marks the billing fully settled; `paid_at` is only stamped the first
    /// time
    pub fn mark_paid(&mut self, now: DateTime<Utc>) {
        self.status = BillingStatus::Paid;
        if self.paid_at.is_none() {
            self.paid_at = Some(now);
        }
        self.updated_at = now;
    }

    /// Returns the billing to pending, e.g. after a partial payment against
    /// an overdue billing
    pub fn mark_pending(&mut self, now: DateTime<Utc>) {
        self.status = BillingStatus::Pending;
        self.updated_at = now;
    }

    /// Marks an unsettled billing overdue; only valid from pending
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != BillingStatus::Pending {
            return false;
        }
        self.status = BillingStatus::Overdue;
        self.updated_at = now;
        true
    }

    /// Explicit cancellation; refuses once settled. The caller is
    /// responsible for verifying that no completed payment exists.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.status {
            BillingStatus::Paid => Err(LedgerError::conflict("cannot cancel a paid billing")),
            BillingStatus::Cancelled => {
                Err(LedgerError::conflict("billing is already cancelled"))
            }
            _ => {
                self.status = BillingStatus::Cancelled;
                self.updated_at = now;
                Ok(())
            }
        }
    }

    /// Demotes a paid billing after a refund; clears `paid_at` so a later
    /// settling payment stamps a fresh settlement time
    pub(crate) fn demote_after_refund(&mut self, now: DateTime<Utc>) {
        self.status = BillingStatus::Pending;
        self.paid_at = None;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn period() -> BillingPeriod {
        BillingPeriod::month_of(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())
    }

    #[test]
    fn test_room_only_breakdown_total() {
        let fee = Money::new(dec!(5000), Currency::INR);
        let billing = Billing::for_room_fee(ResidentId::new(), period(), fee).unwrap();

        assert_eq!(billing.total_amount, fee);
        assert_eq!(billing.status, BillingStatus::Pending);
        assert!(billing.paid_at.is_none());
    }

    #[test]
    fn test_breakdown_total_applies_discount() {
        let charges = ChargeBreakdown {
            room_fee: Money::new(dec!(5000), Currency::INR),
            utilities_fee: Money::new(dec!(300), Currency::INR),
            additional_services_fee: Money::new(dec!(200), Currency::INR),
            discount_amount: Money::new(dec!(500), Currency::INR),
            late_fee: Money::new(dec!(100), Currency::INR),
        };

        assert_eq!(
            charges.total().unwrap(),
            Money::new(dec!(5100), Currency::INR)
        );
    }

    #[test]
    fn test_negative_component_rejected() {
        let mut charges = ChargeBreakdown::room_only(Money::new(dec!(5000), Currency::INR));
        charges.late_fee = Money::new(dec!(-1), Currency::INR);

        assert!(matches!(
            charges.total(),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_discount_exceeding_charges_rejected() {
        let mut charges = ChargeBreakdown::room_only(Money::new(dec!(100), Currency::INR));
        charges.discount_amount = Money::new(dec!(200), Currency::INR);

        assert!(charges.total().is_err());
    }

    #[test]
    fn test_paid_at_is_stamped_once() {
        let mut billing =
            Billing::for_room_fee(ResidentId::new(), period(), Money::new(dec!(5000), Currency::INR))
                .unwrap();

        let first = Utc::now();
        billing.mark_paid(first);
        let stamped = billing.paid_at;

        billing.mark_paid(Utc::now());
        assert_eq!(billing.paid_at, stamped);
    }

    #[test]
    fn test_cancel_refuses_paid() {
        let mut billing =
            Billing::for_room_fee(ResidentId::new(), period(), Money::new(dec!(5000), Currency::INR))
                .unwrap();
        billing.mark_paid(Utc::now());

        assert!(matches!(
            billing.cancel(Utc::now()),
            Err(LedgerError::Conflict(_))
        ));
    }

    #[test]
    fn test_mark_overdue_only_from_pending() {
        let mut billing =
            Billing::for_room_fee(ResidentId::new(), period(), Money::new(dec!(5000), Currency::INR))
                .unwrap();

        assert!(billing.mark_overdue(Utc::now()));
        assert!(!billing.mark_overdue(Utc::now()));
        assert_eq!(billing.status, BillingStatus::Overdue);
    }
}
