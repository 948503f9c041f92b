//! Property-Based Test Generators
//!
//! Proptest strategies for domain values. Amounts are generated in cents so
//! every value is already at payment precision.

use core_kernel::{BillingPeriod, Currency, Money};
use domain_ledger::PaymentMethod;
use domain_occupancy::RoomType;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::fixtures::TemporalFixtures;

/// Positive two-decimal amounts up to 100,000.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Positive INR money at payment precision
pub fn inr_strategy() -> impl Strategy<Value = Money> {
    amount_strategy().prop_map(|amount| Money::new(amount, Currency::INR))
}

/// Calendar billing months across a few years
pub fn month_strategy() -> impl Strategy<Value = BillingPeriod> {
    (2024i32..=2027, 1u32..=12).prop_map(|(year, month)| TemporalFixtures::month(year, month))
}

pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Online),
        Just(PaymentMethod::Upi),
        Just(PaymentMethod::Other),
    ]
}

pub fn room_type_strategy() -> impl Strategy<Value = RoomType> {
    prop_oneof![
        Just(RoomType::Single),
        Just(RoomType::Double),
        Just(RoomType::Triple),
        Just(RoomType::Suite),
    ]
}
