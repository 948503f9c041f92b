//! Test Fixtures
//!
//! Pre-built values for the entities tests construct most often. Fixtures
//! are deterministic so assertions can use literal expected values.

use chrono::NaiveDate;
use core_kernel::{BillingPeriod, Currency, Money};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Money values used across the suite
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    /// The standard monthly rate used by room fixtures
    pub fn monthly_rate() -> Money {
        Self::inr(dec!(5000))
    }

    pub fn zero_inr() -> Money {
        Money::zero(Currency::INR)
    }
}

/// Dates and billing periods used across the suite
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("invalid fixture date")
    }

    /// The billing month most tests run against
    pub fn billing_month() -> BillingPeriod {
        Self::month(2026, 8)
    }

    /// The month after [`Self::billing_month`], past its period end
    pub fn after_billing_month() -> NaiveDate {
        Self::date(2026, 9, 1)
    }

    pub fn month(year: i32, month: u32) -> BillingPeriod {
        BillingPeriod::month_of(Self::date(year, month, 1))
    }
}
